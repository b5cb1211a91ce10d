//! wshub - long-lived connection actors with direct, group and broadcast routing on Tokio.
//!
//! A [`Connection`] owns one [`Transport`] and runs a read task and a write
//! task. Outbound messages are routed by a [`Dispatcher`] through a
//! caller-supplied [`Directory`]; keep-alive probes are recognised and
//! answered according to a caller-supplied [`LivenessPolicy`].

pub mod connection;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod liveness;
pub mod message;
pub mod runtime;
pub mod transport;

// Re-export core types for user convenience
pub use connection::{
  CloseReason, Connection, ConnectionEvent, ConnectionId, ConnectionOptions, ConnectionState, MonitorReceiver,
};
pub use directory::{BroadcastScope, Directory, MemoryDirectory, PeerHandle};
pub use dispatch::{Delivery, Dispatcher, DEFAULT_DELIVERY_TIMEOUT};
pub use error::{Result, WsError};
pub use liveness::{LivenessPolicy, StaticLiveness, DEFAULT_HEARTBEAT_INTERVAL};
pub use message::{Frame, Message, MessageKind, Target};
pub use runtime::{DEFAULT_INBOUND_CAPACITY, DEFAULT_OUTBOUND_CAPACITY};
pub use transport::{inproc, FramedTransport, SharedTransport, Transport};

// --- Top-Level Functions ---

const VERSION_MAJOR: i32 = 0;
const VERSION_MINOR: i32 = 1;
const VERSION_PATCH: i32 = 0;

/// Returns the library version as a tuple (major, minor, patch).
pub fn version() -> (i32, i32, i32) {
  (VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH)
}
