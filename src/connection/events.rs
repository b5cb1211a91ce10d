// src/connection/events.rs

use crate::connection::ConnectionId;
use crate::message::Target;
use std::fmt;

/// Which trigger closed a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
  /// `Connection::close` was called.
  Explicit,
  /// The transport failed on read (or the peer hung up).
  TransportError,
  /// No liveness refresh within one heartbeat period.
  HeartbeatTimeout,
  /// The directory refused the connection during `open`.
  RegistrationFailed,
}

impl fmt::Display for CloseReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      CloseReason::Explicit => "explicit close",
      CloseReason::TransportError => "transport error",
      CloseReason::HeartbeatTimeout => "heartbeat timeout",
      CloseReason::RegistrationFailed => "registration failed",
    };
    f.write_str(s)
  }
}

/// Significant events in a connection's life, delivered on its monitor channel.
#[derive(Debug, Clone)]
#[non_exhaustive] // Allow adding more events later
pub enum ConnectionEvent {
  /// Transport attached, directory registration done, tasks running.
  Opened { id: ConnectionId },
  /// A liveness probe arrived and a reply was queued.
  ProbeAnswered { id: ConnectionId },
  /// An outbound message could not be delivered. `recipient` is `None` when
  /// the target itself failed to resolve (empty or unknown direct id).
  DeliveryFailed {
    id: ConnectionId,
    target: Target,
    recipient: Option<ConnectionId>,
    error_msg: String,
  },
  /// The connection closed. Always the last event: if the channel is full,
  /// the oldest queued events are dropped to make room for it.
  Closed { id: ConnectionId, reason: CloseReason },
}

// Type alias for the channel sender used for monitor events
pub type MonitorSender = async_channel::Sender<ConnectionEvent>;
// Type alias for the channel receiver used for monitor events
pub type MonitorReceiver = async_channel::Receiver<ConnectionEvent>;

// Default capacity for monitor channel
pub const DEFAULT_MONITOR_CAPACITY: usize = 100;
