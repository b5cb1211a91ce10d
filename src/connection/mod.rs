// src/connection/mod.rs

//! The connection actor: one transport, two queues, one close signal, two tasks.
//!
//! The read task moves frames from the transport into the inbound queue and
//! answers liveness probes. The write task drains the outbound queue into the
//! dispatcher and runs the heartbeat check. Both stop when the close signal
//! fires; any of explicit close, transport failure, heartbeat timeout or
//! failed registration fires it, exactly once.

pub(crate) mod core;
pub mod events;
pub mod id;
pub mod options;
pub mod types;

pub use events::{CloseReason, ConnectionEvent, MonitorReceiver, MonitorSender, DEFAULT_MONITOR_CAPACITY};
pub use id::ConnectionId;
pub use options::ConnectionOptions;
pub use types::{Connection, ConnectionState};
