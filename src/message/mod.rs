// src/message/mod.rs

//! Message, frame and routing-target types.

pub mod kind;
pub mod msg;
pub mod target;

pub use kind::MessageKind;
pub use msg::{Frame, Message};
pub use target::Target;
