// src/message/msg.rs

use super::{MessageKind, Target};
use bytes::Bytes;

/// A single wire frame as the transport sees it: kind tag plus opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
  pub kind: MessageKind,
  pub payload: Bytes,
}

impl Frame {
  pub fn new(kind: MessageKind, payload: impl Into<Bytes>) -> Self {
    Self {
      kind,
      payload: payload.into(),
    }
  }

  pub fn text(payload: impl Into<Bytes>) -> Self {
    Self::new(MessageKind::TEXT, payload)
  }

  pub fn binary(payload: impl Into<Bytes>) -> Self {
    Self::new(MessageKind::BINARY, payload)
  }
}

/// A routed message. Inbound messages carry `Target::Direct(<receiving id>)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
  pub target: Target,
  pub kind: MessageKind,
  pub payload: Bytes, // Bytes is cheap to clone for fan-out
}

impl Message {
  pub fn new(target: Target, kind: MessageKind, payload: impl Into<Bytes>) -> Self {
    Self {
      target,
      kind,
      payload: payload.into(),
    }
  }

  pub fn text(target: Target, payload: impl Into<Bytes>) -> Self {
    Self::new(target, MessageKind::TEXT, payload)
  }

  pub fn binary(target: Target, payload: impl Into<Bytes>) -> Self {
    Self::new(target, MessageKind::BINARY, payload)
  }

  /// Builds a message from a frame read off the wire.
  pub fn from_frame(target: Target, frame: Frame) -> Self {
    Self {
      target,
      kind: frame.kind,
      payload: frame.payload,
    }
  }

  /// The frame to hand to a recipient's transport. Clones only the `Bytes` handle.
  pub fn to_frame(&self) -> Frame {
    Frame {
      kind: self.kind,
      payload: self.payload.clone(),
    }
  }

  pub fn size(&self) -> usize {
    self.payload.len()
  }
}
