// src/connection/id.rs

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Identifier of a connection. Cheap to clone.
///
/// Uniqueness is the directory's business; this type only carries the string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(Arc<str>);

impl ConnectionId {
  pub fn new(id: impl AsRef<str>) -> Self {
    ConnectionId(Arc::from(id.as_ref()))
  }

  /// A fresh random identifier: 128 random bits, lowercase hex.
  pub fn generate() -> Self {
    let bits: u128 = rand::random();
    ConnectionId(Arc::from(format!("{:032x}", bits)))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl fmt::Display for ConnectionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for ConnectionId {
  fn from(id: &str) -> Self {
    ConnectionId::new(id)
  }
}

impl From<String> for ConnectionId {
  fn from(id: String) -> Self {
    ConnectionId(Arc::from(id))
  }
}

impl From<&ConnectionId> for ConnectionId {
  fn from(id: &ConnectionId) -> Self {
    id.clone()
  }
}

impl Borrow<str> for ConnectionId {
  fn borrow(&self) -> &str {
    &self.0
  }
}

impl AsRef<str> for ConnectionId {
  fn as_ref(&self) -> &str {
    &self.0
  }
}
