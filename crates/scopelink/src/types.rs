use serde::{Deserialize, Serialize};

/// Maximum channel name length in bytes (names longer than this are
/// truncated at registration).
pub const CHAN_NAME_MAX: usize = 32;

/// First wire code of the user-extensible type range.
pub const USER_TYPE_FIRST: u8 = 20;

/// Last representable type code (5-bit field on the wire).
pub const TYPE_CODE_LAST: u8 = 31;

/// Common-info flag: the instance supports per-channel rate dividers.
pub const FLAG_DIVIDER_SUPPORT: u8 = 1 << 0;

/// Common-info flag: the instance confirms set requests with ACK frames.
pub const FLAG_ACK_SUPPORT: u8 = 1 << 1;

/// Stream flags byte, bit 0: at least one sample was dropped since the
/// last successful flush.
pub const STREAM_FLAG_OVERFLOW: u8 = 1 << 0;

/// Declared element type of a channel's sample data.
///
/// Wire codes are fixed protocol constants; `User` covers the
/// user-extensible range (codes 20..=31, always encoded as single bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleType {
    /// Slot never initialized; rejects enable and put operations.
    Undef,
    /// No sample data, metadata only.
    None,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    /// Unsigned Q8.8 fixed point.
    Ub8,
    /// Signed Q8.8 fixed point.
    B8,
    /// Unsigned Q16.16 fixed point.
    Ub16,
    /// Signed Q16.16 fixed point.
    B16,
    /// Unsigned Q32.32 fixed point.
    Ub32,
    /// Signed Q32.32 fixed point.
    B32,
    /// Fixed-width string data, NUL-padded to the vector dimension.
    Char,
    /// User-defined type code (20..=31), element width 1 byte.
    User(u8),
}

impl SampleType {
    /// Protocol code of this type (low 5 bits of the channel type byte).
    pub fn to_wire(self) -> u8 {
        match self {
            SampleType::Undef => 0,
            SampleType::None => 1,
            SampleType::U8 => 2,
            SampleType::I8 => 3,
            SampleType::U16 => 4,
            SampleType::I16 => 5,
            SampleType::U32 => 6,
            SampleType::I32 => 7,
            SampleType::U64 => 8,
            SampleType::I64 => 9,
            SampleType::F32 => 10,
            SampleType::F64 => 11,
            SampleType::Ub8 => 12,
            SampleType::B8 => 13,
            SampleType::Ub16 => 14,
            SampleType::B16 => 15,
            SampleType::Ub32 => 16,
            SampleType::B32 => 17,
            SampleType::Char => 18,
            SampleType::User(code) => code,
        }
    }

    /// Decode a 5-bit type code; unknown/reserved codes map to `Undef`.
    pub fn from_wire(code: u8) -> Self {
        match code & 0x1F {
            0 => SampleType::Undef,
            1 => SampleType::None,
            2 => SampleType::U8,
            3 => SampleType::I8,
            4 => SampleType::U16,
            5 => SampleType::I16,
            6 => SampleType::U32,
            7 => SampleType::I32,
            8 => SampleType::U64,
            9 => SampleType::I64,
            10 => SampleType::F32,
            11 => SampleType::F64,
            12 => SampleType::Ub8,
            13 => SampleType::B8,
            14 => SampleType::Ub16,
            15 => SampleType::B16,
            16 => SampleType::Ub32,
            17 => SampleType::B32,
            18 => SampleType::Char,
            c if c >= USER_TYPE_FIRST => SampleType::User(c),
            _ => SampleType::Undef,
        }
    }

    /// Encoded width of one element of this type in bytes.
    ///
    /// User types are always single bytes; combined with the vector
    /// dimension they can carry arbitrary fixed-size records.
    pub fn size_of(self) -> usize {
        match self {
            SampleType::Undef | SampleType::None => 0,
            SampleType::U8 | SampleType::I8 | SampleType::Char | SampleType::User(_) => 1,
            SampleType::U16 | SampleType::I16 | SampleType::Ub8 | SampleType::B8 => 2,
            SampleType::U32
            | SampleType::I32
            | SampleType::F32
            | SampleType::Ub16
            | SampleType::B16 => 4,
            SampleType::U64
            | SampleType::I64
            | SampleType::F64
            | SampleType::Ub32
            | SampleType::B32 => 8,
        }
    }
}

/// Channel type: element type plus the critical-channel flag.
///
/// On the wire this is one byte: type code in the low 5 bits, critical
/// flag in bit 7 (bits 5..6 reserved).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelType {
    pub dtype: SampleType,
    pub critical: bool,
}

const CRITICAL_BIT: u8 = 0x80;

impl ChannelType {
    /// A buffered (non-critical) channel of the given type.
    pub fn new(dtype: SampleType) -> Self {
        Self {
            dtype,
            critical: false,
        }
    }

    /// A critical channel: samples bypass the stream buffer and are sent
    /// immediately.
    pub fn critical(dtype: SampleType) -> Self {
        Self {
            dtype,
            critical: true,
        }
    }

    pub fn to_wire(self) -> u8 {
        let mut byte = self.dtype.to_wire();
        if self.critical {
            byte |= CRITICAL_BIT;
        }
        byte
    }

    pub fn from_wire(byte: u8) -> Self {
        Self {
            dtype: SampleType::from_wire(byte),
            critical: byte & CRITICAL_BIT != 0,
        }
    }
}

/// First frame id reserved for user-defined commands.
pub const USER_FRAME_FIRST: u8 = 8;

/// Well-known frame ids of the scopelink protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameId {
    /// Batched stream data (flags byte + samples).
    Stream = 1,
    /// Instance-level info request/response.
    CommonInfo = 2,
    /// Per-channel info request/response.
    ChannelInfo = 3,
    /// Set-request confirmation carrying an i32 status code.
    Ack = 4,
    /// Start/stop streaming.
    Start = 5,
    /// Enable/disable channels.
    Enable = 6,
    /// Configure channel dividers.
    Divider = 7,
}

impl FrameId {
    /// Decode a known frame id; user and reserved ids return `None`.
    pub fn from_wire(id: u8) -> Option<Self> {
        match id {
            1 => Some(FrameId::Stream),
            2 => Some(FrameId::CommonInfo),
            3 => Some(FrameId::ChannelInfo),
            4 => Some(FrameId::Ack),
            5 => Some(FrameId::Start),
            6 => Some(FrameId::Enable),
            7 => Some(FrameId::Divider),
            _ => None,
        }
    }
}

/// Instance-level info exposed to the remote peer via CMNINFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonInfo {
    /// Number of channels this instance supports.
    pub chmax: u8,
    /// Capability flags (`FLAG_*`).
    pub flags: u8,
    /// Receive padding the peer should apply (>0 if used, e.g. for DMA).
    pub rx_padding: u8,
}

impl CommonInfo {
    /// Three-byte wire image of the common-info block.
    pub fn to_wire(self) -> [u8; 3] {
        [self.chmax, self.flags, self.rx_padding]
    }
}

/// Unsigned Q8.8 fixed point, stored as raw bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Ub8(pub u16);

/// Signed Q8.8 fixed point, stored as raw bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct B8(pub i16);

/// Unsigned Q16.16 fixed point, stored as raw bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Ub16(pub u32);

/// Signed Q16.16 fixed point, stored as raw bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct B16(pub i32);

/// Unsigned Q32.32 fixed point, stored as raw bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Ub32(pub u64);

/// Signed Q32.32 fixed point, stored as raw bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct B32(pub i64);
