use crate::error::Result;

/// One logical frame extracted from a receive buffer.
///
/// Borrows from the buffer handed to [`FrameCodec::frame_get`]; valid
/// only until the caller compacts that buffer.
#[derive(Debug)]
pub struct Frame<'a> {
    /// Frame id byte (command or stream id).
    pub id: u8,
    /// Payload between header and footer.
    pub payload: &'a [u8],
    /// How many input bytes the caller should discard: the frame itself
    /// plus any garbage skipped in front of it.
    pub drop: usize,
}

/// Stamps and strips protocol framing around logical payloads.
///
/// Writers reserve `header_len` bytes in front of the payload and
/// `footer_len` behind it; `frame_final` fills both regions in place so
/// the buffer can be sent without copying.
pub trait FrameCodec: Send {
    /// Size of the frame header this codec stamps.
    fn header_len(&self) -> usize;

    /// Size of the frame footer this codec stamps.
    fn footer_len(&self) -> usize;

    /// Finalize the frame around the payload at `buf[header_len..*cursor]`.
    ///
    /// Writes the header and appends the footer, advancing `*cursor` past
    /// the footer so `buf[..*cursor]` is the complete wire frame.
    fn frame_final(&self, id: u8, buf: &mut [u8], cursor: &mut usize) -> Result<()>;

    /// Extract one logical frame from `buf`.
    ///
    /// An error means no complete frame is available yet; the caller
    /// keeps its buffer and retries once more bytes arrive.
    fn frame_get<'a>(&self, buf: &'a [u8]) -> Result<Frame<'a>>;
}
