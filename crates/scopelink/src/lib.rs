//! Channel-based telemetry/scope engine.
//!
//! Firmware-side code exposes named, typed channels of sample data; a
//! remote tool enumerates and configures them over a small binary
//! command protocol while the engine batches samples into framed stream
//! packets. Best-effort by design: samples that do not fit are dropped
//! with an explicit overflow flag, never queued.
//!
//! ```no_run
//! use scopelink::{ChannelType, SampleType, Scope, ScopeConfig, ScopeLink};
//! use scopelink_transport::Loopback;
//! use scopelink_wire::SerialFraming;
//!
//! # fn main() -> scopelink::Result<()> {
//! let (cmd, _cmd_peer) = Loopback::pair();
//! let (stream, _stream_peer) = Loopback::pair();
//!
//! let scope = Scope::new(
//!     ScopeConfig {
//!         channels: 2,
//!         ..ScopeConfig::default()
//!     },
//!     ScopeLink {
//!         intf_cmd: Box::new(cmd),
//!         intf_stream: Box::new(stream),
//!         proto_cmd: Box::new(SerialFraming::new()),
//!         proto_stream: Box::new(SerialFraming::new()),
//!         callbacks: None,
//!     },
//! )?;
//!
//! scope.chan_init(0, "vbus", ChannelType::new(SampleType::U16), 1, 0)?;
//! scope.chan_en(0, true)?;
//! scope.stream_start(true)?;
//!
//! // Producers, from any thread:
//! scope.put_u16(0, 0xBEEF)?;
//!
//! // The pump, periodically:
//! scope.recv()?;
//! scope.stream()?;
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod chan;
pub mod config;
pub mod dispatch;
pub mod encode;
pub mod error;
pub mod instance;
pub mod put;
pub mod types;

pub use chan::ChannelInfo;
pub use config::{ScopeCallbacks, ScopeConfig, ScopeLink};
pub use error::{Result, ScopeError};
pub use instance::Scope;
pub use put::PutOutcome;
pub use types::{
    ChannelType, CommonInfo, FrameId, SampleType, Ub16, Ub32, Ub8, B16, B32, B8, CHAN_NAME_MAX,
    FLAG_ACK_SUPPORT, FLAG_DIVIDER_SUPPORT, STREAM_FLAG_OVERFLOW, USER_FRAME_FIRST,
    USER_TYPE_FIRST,
};
