use scopelink_transport::TransportError;
use scopelink_wire::WireError;

/// Errors that can occur on a scopelink instance.
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// Malformed request or argument; rejected before any mutation.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Channel id outside the configured channel table.
    #[error("channel {0} out of range")]
    InvalidChannel(u8),

    /// Operation on a channel slot that was never initialized.
    #[error("channel {0} not initialized")]
    ChannelNotInitialized(u8),

    /// A put call's type, dimension, or metadata length does not match
    /// the channel's registration.
    #[error("channel {0}: sample layout does not match registration")]
    LayoutMismatch(u8),

    /// No room left in the stream buffer; the sample was dropped and the
    /// overflow flag set.
    #[error("no space left in stream buffer")]
    StreamFull,

    /// No room in the critical-channel buffer; the sample was dropped.
    #[error("no space left in critical buffer")]
    CriticalFull,

    /// The feature is not configured on this instance, or no handler is
    /// registered for a user command.
    #[error("{0} not supported by this instance")]
    Unsupported(&'static str),

    /// Instance construction rejected the configuration.
    #[error("invalid configuration: {0}")]
    Config(&'static str),

    /// Wire codec failure while finalizing a frame.
    #[error("wire codec error: {0}")]
    Wire(#[from] WireError),

    /// Transport failure; for stream data this leaves the frame buffered
    /// for a verbatim retry.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl ScopeError {
    /// Status code carried by ACK frames (0 is success; see protocol
    /// docs for the negative codes).
    pub(crate) fn wire_code(&self) -> i32 {
        match self {
            ScopeError::InvalidArgument(_)
            | ScopeError::InvalidChannel(_)
            | ScopeError::ChannelNotInitialized(_)
            | ScopeError::LayoutMismatch(_) => -1,
            ScopeError::Unsupported(_) => -2,
            ScopeError::StreamFull | ScopeError::CriticalFull => -3,
            ScopeError::Transport(_) => -4,
            ScopeError::Wire(_) | ScopeError::Config(_) => -5,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScopeError>;
