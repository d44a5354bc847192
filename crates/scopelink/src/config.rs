use serde::{Deserialize, Serialize};

use scopelink_transport::Transport;
use scopelink_wire::FrameCodec;

use crate::error::{Result, ScopeError};

/// Construction-time configuration of a [`Scope`](crate::Scope)
/// instance. Fixed for the instance lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Number of channels in the channel table.
    pub channels: u8,

    /// Stream buffer capacity in bytes, including the regions reserved
    /// for the codec header, the flags byte, and the codec footer.
    pub streambuf_len: usize,

    /// Receive accumulation buffer capacity in bytes.
    pub rxbuf_len: usize,

    /// Critical-channel buffer capacity. `None` disables critical
    /// channels entirely. The buffer must fit the largest critical
    /// sample: `header_len + 1 + type_size * vdim + mlen + footer_len`.
    pub cribuf_len: Option<usize>,

    /// Receive padding advertised to the peer in the common-info block
    /// (useful when the peer receives frames via DMA).
    pub rx_padding: u8,

    /// Enable per-channel sample-rate dividers.
    pub divider: bool,

    /// Confirm set requests (START/ENABLE/DIV) with ACK frames.
    pub ack_frames: bool,

    /// Verify critical-buffer space before encoding each critical
    /// sample. Disabling trades the clean `CriticalFull` error for a
    /// panic when an oversized sample hits the buffer.
    pub check_critical_space: bool,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            channels: 8,
            streambuf_len: 1024,
            rxbuf_len: 256,
            cribuf_len: None,
            rx_padding: 0,
            divider: true,
            ack_frames: true,
            check_critical_space: true,
        }
    }
}

impl ScopeConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(ScopeError::Config("channel count must be non-zero"));
        }
        if self.rxbuf_len == 0 {
            return Err(ScopeError::Config("receive buffer must be non-empty"));
        }
        if self.cribuf_len == Some(0) {
            return Err(ScopeError::Config("critical buffer must be non-empty"));
        }
        Ok(())
    }
}

/// Callbacks a scopelink instance invokes for events it does not handle
/// itself. All methods have conservative defaults.
pub trait ScopeCallbacks: Send {
    /// Streaming was started or stopped, locally or by the remote peer.
    fn on_start(&mut self, start: bool) -> Result<()> {
        let _ = start;
        Ok(())
    }

    /// A command frame with an unrecognized id arrived.
    fn on_user_frame(&mut self, id: u8, payload: &[u8]) -> Result<()> {
        let _ = (id, payload);
        Err(ScopeError::Unsupported("user frame id"))
    }
}

/// The collaborators a scopelink instance talks through: one transport
/// and one codec per logical link (commands and stream data; both pairs
/// may be backed by the same physical connection).
pub struct ScopeLink {
    pub intf_cmd: Box<dyn Transport>,
    pub intf_stream: Box<dyn Transport>,
    pub proto_cmd: Box<dyn FrameCodec>,
    pub proto_stream: Box<dyn FrameCodec>,
    pub callbacks: Option<Box<dyn ScopeCallbacks>>,
}
