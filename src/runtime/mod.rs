// src/runtime/mod.rs

//! Core asynchronous primitives: queues, the close signal and the liveness clock.

pub mod close_signal;
pub mod liveness_clock;
pub mod mailbox;

pub use close_signal::CloseSignal;
pub use liveness_clock::LivenessClock;
pub use mailbox::{queue, QueueReceiver, QueueSender, DEFAULT_INBOUND_CAPACITY, DEFAULT_OUTBOUND_CAPACITY};
