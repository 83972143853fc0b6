//! Bridge between the host application and its embedded 3D/AR viewers
//!
//! The viewers are web content running inside an embedded browser surface.
//! This crate owns everything about talking to them: the JSON wire protocol
//! ([`BridgeMessage`]), the delivery seam ([`ViewerChannel`]) and the
//! per-viewer lifecycle ([`ViewerSession`]), which refuses to push data
//! before the viewer is ready, retries failed sends a bounded number of
//! times and surfaces viewer-side events to the host over a broadcast
//! channel.

pub mod error;
pub mod message;
pub mod session;
pub mod transport;

pub use error::{BridgeError, BridgeResult, ChannelError};
pub use message::{BridgeMessage, MessageKind};
pub use session::{BridgeConfig, BridgeEvent, SessionState, ViewerSession};
pub use transport::{InMemoryChannel, ViewerChannel};
