//! Little-endian sample encoding.
//!
//! Every multi-byte scalar is flattened to its bit pattern and written
//! with one width-parameterized primitive; sample data on the wire is
//! little-endian regardless of host byte order. Metadata is copied raw —
//! it is opaque to this layer and carries no endianness transform.

use crate::types::{SampleType, Ub16, Ub32, Ub8, B16, B32, B8};

mod sealed {
    pub trait Sealed {}
}

/// A scalar that can be placed on a channel: knows its declared type,
/// its encoded width, and how to flatten itself to little-endian bits.
pub trait Scalar: sealed::Sealed + Copy {
    /// Declared channel type this scalar matches.
    const DTYPE: SampleType;
    /// Encoded width in bytes.
    const WIDTH: usize;
    /// The value's bit pattern, right-aligned in a u64.
    fn to_le_bits(self) -> u64;
}

macro_rules! impl_scalar {
    ($($ty:ty => $dtype:expr, $width:expr, |$v:ident| $bits:expr;)*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Scalar for $ty {
                const DTYPE: SampleType = $dtype;
                const WIDTH: usize = $width;

                #[inline]
                fn to_le_bits(self) -> u64 {
                    let $v = self;
                    $bits
                }
            }
        )*
    };
}

impl_scalar! {
    u8  => SampleType::U8,  1, |v| v as u64;
    i8  => SampleType::I8,  1, |v| v as u8 as u64;
    u16 => SampleType::U16, 2, |v| v as u64;
    i16 => SampleType::I16, 2, |v| v as u16 as u64;
    u32 => SampleType::U32, 4, |v| v as u64;
    i32 => SampleType::I32, 4, |v| v as u32 as u64;
    u64 => SampleType::U64, 8, |v| v;
    i64 => SampleType::I64, 8, |v| v as u64;
    f32 => SampleType::F32, 4, |v| v.to_bits() as u64;
    f64 => SampleType::F64, 8, |v| v.to_bits();
    Ub8  => SampleType::Ub8,  2, |v| v.0 as u64;
    B8   => SampleType::B8,   2, |v| v.0 as u16 as u64;
    Ub16 => SampleType::Ub16, 4, |v| v.0 as u64;
    B16  => SampleType::B16,  4, |v| v.0 as u32 as u64;
    Ub32 => SampleType::Ub32, 8, |v| v.0;
    B32  => SampleType::B32,  8, |v| v.0 as u64;
}

/// Write the low `width` bytes of `bits` into `buf`, least significant
/// first.
#[inline]
pub(crate) fn write_le(buf: &mut [u8], bits: u64, width: usize) {
    for (k, slot) in buf.iter_mut().take(width).enumerate() {
        *slot = (bits >> (8 * k)) as u8;
    }
}

/// Encode a vector of scalars; returns bytes written.
pub(crate) fn encode_vector<T: Scalar>(buf: &mut [u8], vals: &[T]) -> usize {
    let mut j = 0;
    for v in vals {
        write_le(&mut buf[j..], v.to_le_bits(), T::WIDTH);
        j += T::WIDTH;
    }
    j
}

/// Encode a char-typed sample: copy up to `dim` string bytes, NUL-fill
/// the remainder. This is a fixed-width field, not a length-prefixed
/// string; always writes exactly `dim` bytes.
pub(crate) fn encode_char(buf: &mut [u8], val: &str, dim: u8) -> usize {
    let dim = dim as usize;
    let n = val.len().min(dim);
    buf[..n].copy_from_slice(&val.as_bytes()[..n]);
    for slot in &mut buf[n..dim] {
        *slot = 0;
    }
    dim
}

/// Encode user-typed sample data: raw single-byte elements.
pub(crate) fn encode_user(buf: &mut [u8], vals: &[u8]) -> usize {
    buf[..vals.len()].copy_from_slice(vals);
    vals.len()
}

/// Append metadata bytes verbatim; returns bytes written.
pub(crate) fn encode_meta(buf: &mut [u8], meta: &[u8]) -> usize {
    buf[..meta.len()].copy_from_slice(meta);
    meta.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u16_is_little_endian() {
        let mut buf = [0u8; 2];
        encode_vector(&mut buf, &[0xBEEFu16]);
        assert_eq!(buf, [0xEF, 0xBE]);
    }

    #[test]
    fn u64_byte_order() {
        let mut buf = [0u8; 8];
        encode_vector(&mut buf, &[0x0102_0304_0506_0708u64]);
        assert_eq!(buf, [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn negative_values_keep_twos_complement_bits() {
        let mut buf = [0u8; 2];
        encode_vector(&mut buf, &[-2i16]);
        assert_eq!(buf, [0xFE, 0xFF]);

        let mut buf = [0u8; 4];
        encode_vector(&mut buf, &[-1i32]);
        assert_eq!(buf, [0xFF; 4]);
    }

    #[test]
    fn float_bit_pattern() {
        let mut buf = [0u8; 4];
        encode_vector(&mut buf, &[1.0f32]);
        assert_eq!(buf, 1.0f32.to_bits().to_le_bytes());

        let mut buf = [0u8; 8];
        encode_vector(&mut buf, &[-0.5f64]);
        assert_eq!(buf, (-0.5f64).to_bits().to_le_bytes());
    }

    #[test]
    fn fixed_point_raw_bits() {
        let mut buf = [0u8; 2];
        // 1.5 in Q8.8 = 0x0180
        encode_vector(&mut buf, &[B8(0x0180)]);
        assert_eq!(buf, [0x80, 0x01]);

        let mut buf = [0u8; 4];
        encode_vector(&mut buf, &[B16(-0x0001_8000)]); // -1.5 in Q16.16
        assert_eq!(buf, (-0x0001_8000i32).to_le_bytes());
    }

    #[test]
    fn vector_elements_are_contiguous() {
        let mut buf = [0u8; 6];
        let n = encode_vector(&mut buf, &[0x1122u16, 0x3344, 0x5566]);
        assert_eq!(n, 6);
        assert_eq!(buf, [0x22, 0x11, 0x44, 0x33, 0x66, 0x55]);
    }

    #[test]
    fn char_field_is_nul_filled() {
        let mut buf = [0xAAu8; 8];
        let n = encode_char(&mut buf, "hi", 6);
        assert_eq!(n, 6);
        assert_eq!(&buf[..6], b"hi\0\0\0\0");
        assert_eq!(buf[6], 0xAA);
    }

    #[test]
    fn char_longer_than_field_is_truncated() {
        let mut buf = [0u8; 4];
        let n = encode_char(&mut buf, "overflow", 4);
        assert_eq!(n, 4);
        assert_eq!(&buf[..4], b"over");
    }

    #[test]
    fn meta_is_copied_verbatim() {
        let mut buf = [0u8; 4];
        let n = encode_meta(&mut buf, &[0xDE, 0xAD]);
        assert_eq!(n, 2);
        assert_eq!(&buf[..2], &[0xDE, 0xAD]);
    }
}
