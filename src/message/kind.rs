// src/message/kind.rs

use std::fmt;

/// Opaque payload-kind tag carried alongside every frame.
///
/// The values follow RFC 6455, section 11.8. The core never interprets the tag:
/// whatever the transport reports is handed back unchanged, including values
/// outside the named constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKind(u8);

impl MessageKind {
  /// Text data frame. The payload is interpreted as UTF-8 by the peer.
  pub const TEXT: MessageKind = MessageKind(1);
  /// Binary data frame.
  pub const BINARY: MessageKind = MessageKind(2);
  /// Close control frame.
  pub const CLOSE: MessageKind = MessageKind(8);
  /// Ping control frame.
  pub const PING: MessageKind = MessageKind(9);
  /// Pong control frame.
  pub const PONG: MessageKind = MessageKind(10);

  pub const fn new(tag: u8) -> Self {
    MessageKind(tag)
  }

  /// The raw numeric tag.
  pub const fn tag(self) -> u8 {
    self.0
  }

  pub fn is_control(self) -> bool {
    matches!(self, MessageKind::CLOSE | MessageKind::PING | MessageKind::PONG)
  }

  fn name(self) -> Option<&'static str> {
    match self {
      MessageKind::TEXT => Some("text"),
      MessageKind::BINARY => Some("binary"),
      MessageKind::CLOSE => Some("close"),
      MessageKind::PING => Some("ping"),
      MessageKind::PONG => Some("pong"),
      _ => None,
    }
  }
}

impl Default for MessageKind {
  fn default() -> Self {
    MessageKind::TEXT
  }
}

impl From<u8> for MessageKind {
  fn from(tag: u8) -> Self {
    MessageKind(tag)
  }
}

impl From<MessageKind> for u8 {
  fn from(kind: MessageKind) -> Self {
    kind.0
  }
}

impl fmt::Display for MessageKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.name() {
      Some(name) => f.write_str(name),
      None => write!(f, "kind({})", self.0),
    }
  }
}
