use crate::chan::Gate;
use crate::encode::{encode_char, encode_meta, encode_user, encode_vector, Scalar};
use crate::error::{Result, ScopeError};
use crate::instance::{send_buffer, Scope, Shared};
use crate::types::{SampleType, Ub16, Ub32, Ub8, B16, B32, B8};

/// What happened to a sample handed to a `put_*` call.
///
/// `Skipped` is success-with-no-effect (stream stopped, channel
/// disabled, or decimated by the divider); producers must treat it
/// identically to `Stored` — no retry, no log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The sample was encoded (and, for critical channels, sent).
    Stored,
    /// The sample was silently dropped by the gate.
    Skipped,
}

impl PutOutcome {
    pub fn is_stored(self) -> bool {
        matches!(self, PutOutcome::Stored)
    }
}

impl Shared {
    /// The single funnel every typed put goes through once the caller
    /// holds the lock: validate, pick a destination, encode, and for
    /// critical channels hand the bytes straight to the transport.
    fn put_common(
        &mut self,
        ch: u8,
        dtype: SampleType,
        vdim: u8,
        meta: &[u8],
        write_data: impl FnOnce(&mut [u8]) -> usize,
    ) -> Result<PutOutcome> {
        let mlen = meta.len() as u8;

        let gate = self.validate(ch, dtype, vdim, mlen)?;
        let critical = match gate {
            Gate::Skip => return Ok(PutOutcome::Skipped),
            Gate::Store { critical } => critical,
        };

        if critical {
            // Dedicated buffer, local cursor; sent immediately, never
            // persisted across calls. Critical frames carry no flags
            // byte.
            let Some(cribuf) = self.cribuf.as_mut() else {
                return Err(ScopeError::Unsupported("critical channels"));
            };
            let mut cursor = self.proto_stream.header_len();
            cribuf[cursor] = ch;
            cursor += 1;
            cursor += write_data(&mut cribuf[cursor..]);
            cursor += encode_meta(&mut cribuf[cursor..], meta);

            send_buffer(
                self.proto_stream.as_ref(),
                self.intf_stream.as_mut(),
                &mut self.stream_retry,
                cribuf,
                &mut cursor,
            )?;
            return Ok(PutOutcome::Stored);
        }

        let (buf, cursor) = self.stream.parts_mut();
        buf[*cursor] = ch;
        *cursor += 1;
        *cursor += write_data(&mut buf[*cursor..]);
        *cursor += encode_meta(&mut buf[*cursor..], meta);

        Ok(PutOutcome::Stored)
    }
}

macro_rules! put_fns {
    ($($ty:ty: $put:ident, $put_m:ident, $putv:ident, $putv_m:ident;)*) => {
        impl Scope {
            $(
                #[doc = concat!("Put one `", stringify!($ty), "` sample on channel `ch`.")]
                pub fn $put(&self, ch: u8, val: $ty) -> Result<PutOutcome> {
                    self.$putv_m(ch, &[val], &[])
                }

                #[doc = concat!("Put one `", stringify!($ty), "` sample with metadata on channel `ch`.")]
                pub fn $put_m(&self, ch: u8, val: $ty, meta: &[u8]) -> Result<PutOutcome> {
                    self.$putv_m(ch, &[val], meta)
                }

                #[doc = concat!("Put a `", stringify!($ty), "` vector sample on channel `ch`.")]
                pub fn $putv(&self, ch: u8, vals: &[$ty]) -> Result<PutOutcome> {
                    self.$putv_m(ch, vals, &[])
                }

                #[doc = concat!("Put a `", stringify!($ty), "` vector sample with metadata on channel `ch`.")]
                pub fn $putv_m(&self, ch: u8, vals: &[$ty], meta: &[u8]) -> Result<PutOutcome> {
                    let mut shared = self.lock();
                    shared.put_common(ch, <$ty as Scalar>::DTYPE, vals.len() as u8, meta, |buf| {
                        encode_vector(buf, vals)
                    })
                }
            )*
        }
    };
}

put_fns! {
    u8:   put_u8,   put_u8_m,   put_vu8,   put_vu8_m;
    i8:   put_i8,   put_i8_m,   put_vi8,   put_vi8_m;
    u16:  put_u16,  put_u16_m,  put_vu16,  put_vu16_m;
    i16:  put_i16,  put_i16_m,  put_vi16,  put_vi16_m;
    u32:  put_u32,  put_u32_m,  put_vu32,  put_vu32_m;
    i32:  put_i32,  put_i32_m,  put_vi32,  put_vi32_m;
    u64:  put_u64,  put_u64_m,  put_vu64,  put_vu64_m;
    i64:  put_i64,  put_i64_m,  put_vi64,  put_vi64_m;
    f32:  put_f32,  put_f32_m,  put_vf32,  put_vf32_m;
    f64:  put_f64,  put_f64_m,  put_vf64,  put_vf64_m;
    Ub8:  put_ub8,  put_ub8_m,  put_vub8,  put_vub8_m;
    B8:   put_b8,   put_b8_m,   put_vb8,   put_vb8_m;
    Ub16: put_ub16, put_ub16_m, put_vub16, put_vub16_m;
    B16:  put_b16,  put_b16_m,  put_vb16,  put_vb16_m;
    Ub32: put_ub32, put_ub32_m, put_vub32, put_vub32_m;
    B32:  put_b32,  put_b32_m,  put_vb32,  put_vb32_m;
}

impl Scope {
    /// Put string data on a char channel: up to `dim` bytes of `val`,
    /// NUL-filled to the channel's fixed width.
    pub fn put_vchar(&self, ch: u8, val: &str, dim: u8) -> Result<PutOutcome> {
        self.put_vchar_m(ch, val, dim, &[])
    }

    /// Put string data with metadata on a char channel.
    pub fn put_vchar_m(&self, ch: u8, val: &str, dim: u8, meta: &[u8]) -> Result<PutOutcome> {
        let mut shared = self.lock();
        shared.put_common(ch, SampleType::Char, dim, meta, |buf| {
            encode_char(buf, val, dim)
        })
    }

    /// Put metadata only (for channels declared with
    /// [`SampleType::None`] and vector dimension 0).
    pub fn put_none(&self, ch: u8, meta: &[u8]) -> Result<PutOutcome> {
        let mut shared = self.lock();
        shared.put_common(ch, SampleType::None, 0, meta, |_| 0)
    }

    /// Put user-typed data: `dtype` must be a code in the
    /// user-extensible range the channel was registered with; elements
    /// are raw bytes.
    pub fn put_user(&self, ch: u8, dtype: SampleType, vals: &[u8]) -> Result<PutOutcome> {
        self.put_user_m(ch, dtype, vals, &[])
    }

    /// Put user-typed data with metadata.
    pub fn put_user_m(
        &self,
        ch: u8,
        dtype: SampleType,
        vals: &[u8],
        meta: &[u8],
    ) -> Result<PutOutcome> {
        if !matches!(dtype, SampleType::User(_)) {
            return Err(ScopeError::InvalidArgument(
                "put_user requires a user-range type",
            ));
        }
        let mut shared = self.lock();
        shared.put_common(ch, dtype, vals.len() as u8, meta, |buf| {
            encode_user(buf, vals)
        })
    }
}
