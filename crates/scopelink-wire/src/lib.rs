//! Frame codec layer for scopelink.
//!
//! The engine never touches delimiters or checksums itself; it hands a
//! payload region to a [`FrameCodec`] to be finalized in place, and hands
//! raw received bytes to the same codec to extract logical frames. This
//! crate defines that contract and ships [`SerialFraming`], the default
//! codec used on both the command and the stream link.

pub mod codec;
pub mod crc;
pub mod error;
pub mod serial;

pub use codec::{Frame, FrameCodec};
pub use crc::crc16;
pub use error::{Result, WireError};
pub use serial::{SerialFraming, FOOTER_LEN, HEADER_LEN, MAGIC};
