/// Errors that can occur while framing or parsing scopelink data.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A frame has started but not all of its bytes have arrived yet.
    #[error("incomplete frame, need more bytes")]
    Incomplete,

    /// No frame delimiter was found in the buffer.
    #[error("no frame found")]
    NoFrame,

    /// The finalized frame would not fit the provided buffer.
    #[error("frame does not fit buffer ({need} > {have} bytes)")]
    BufferTooSmall { need: usize, have: usize },

    /// The frame is larger than the codec's length field can express.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, WireError>;
