// src/message/target.rs

use crate::connection::ConnectionId;
use std::fmt;

/// Who an outbound message is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
  /// Every connection the directory currently reports.
  Broadcast,
  /// The members of a named group, as the directory defines them.
  Group(String),
  /// Exactly one connection.
  Direct(ConnectionId),
}

impl Target {
  pub fn group(name: impl Into<String>) -> Self {
    Target::Group(name.into())
  }

  pub fn direct(id: impl Into<ConnectionId>) -> Self {
    Target::Direct(id.into())
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Target::Broadcast => f.write_str("broadcast"),
      Target::Group(name) => write!(f, "group:{}", name),
      Target::Direct(id) => write!(f, "direct:{}", id),
    }
  }
}
