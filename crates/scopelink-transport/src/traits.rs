use crate::error::Result;

/// A non-blocking byte link between a scopelink instance and its peer.
///
/// Both operations must return promptly: `send` either hands the whole
/// buffer to the link or fails, and `recv` returns only the bytes already
/// available. The engine's pump calls `recv` in a drain loop and treats
/// `Ok(0)` as "no data right now", so implementations must never block
/// waiting for the peer.
pub trait Transport: Send {
    /// Send a complete buffer over the link.
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Read available bytes into `buf`, returning how many were read.
    ///
    /// `Ok(0)` means no data is available now. A closed or broken link is
    /// an error, not an empty read.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize>;
}
