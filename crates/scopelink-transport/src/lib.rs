//! Non-blocking byte transports for scopelink links.
//!
//! A scopelink instance talks to its remote peer over two logical links
//! (commands and stream data) which may share a physical connection. This
//! crate defines the [`Transport`] contract both links are built on and
//! ships two implementations:
//! - [`Loopback`] — an in-memory connected pair for tests and
//!   same-process tooling
//! - [`UnixSocketTransport`] — a non-blocking Unix domain socket link
//!   for host-side development

pub mod error;
pub mod loopback;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use loopback::Loopback;
pub use traits::Transport;

#[cfg(unix)]
pub use uds::{UnixSocketListener, UnixSocketTransport};
