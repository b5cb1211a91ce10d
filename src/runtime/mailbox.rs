// src/runtime/mailbox.rs

//! Type aliases for the per-connection message queues based on `async-channel`.

use crate::message::Message;

/// The sending end of a connection queue. Cloneable.
pub type QueueSender = async_channel::Sender<Message>;

/// The receiving end of a connection queue. Cloneable (MPMC).
pub type QueueReceiver = async_channel::Receiver<Message>;

/// Default capacity of the inbound (transport -> application) queue.
pub const DEFAULT_INBOUND_CAPACITY: usize = 1024;

/// Default capacity of the outbound (application -> dispatcher) queue.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 1024;

/// Creates a new bounded queue pair. Capacity is fixed for the lifetime of the pair.
pub fn queue(capacity: usize) -> (QueueSender, QueueReceiver) {
  async_channel::bounded(capacity.max(1))
}
