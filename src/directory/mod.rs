// src/directory/mod.rs

//! Registry of open connections and named groups, supplied by the embedder.

pub mod memory;

pub use memory::{BroadcastScope, MemoryDirectory};

use crate::connection::ConnectionId;
use crate::error::WsError;
use crate::message::Frame;
use crate::transport::SharedTransport;
use async_trait::async_trait;
use std::fmt;

/// What a directory stores per connection: its id and its transport.
///
/// This is the only way one connection's dispatcher reaches another
/// connection's transport.
#[derive(Clone)]
pub struct PeerHandle {
  id: ConnectionId,
  transport: SharedTransport,
}

impl PeerHandle {
  pub fn new(id: ConnectionId, transport: SharedTransport) -> Self {
    Self { id, transport }
  }

  pub fn id(&self) -> &ConnectionId {
    &self.id
  }

  /// Writes one frame to this peer's transport.
  pub async fn deliver(&self, frame: Frame) -> Result<(), WsError> {
    self.transport.write_frame(frame).await
  }
}

impl fmt::Debug for PeerHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PeerHandle").field("id", &self.id).finish_non_exhaustive()
  }
}

/// The set of currently open connections, keyed by id, plus named groups.
///
/// Shared by every connection of an embedder; implementations synchronize
/// internally. Group membership semantics belong entirely to the implementation.
#[async_trait]
pub trait Directory: Send + Sync + 'static {
  /// Adds an open connection. Fails with `WsError::Registration` if it cannot be added.
  async fn register(&self, peer: PeerHandle) -> Result<(), WsError>;

  async fn lookup(&self, id: &ConnectionId) -> Option<PeerHandle>;

  /// Members of a named group, in the directory's order. Unknown group -> empty.
  async fn lookup_group(&self, name: &str) -> Vec<PeerHandle>;

  /// Every current member, for a broadcast issued by `origin`.
  ///
  /// Whether `origin` itself is part of the result is a documented choice of
  /// each implementation.
  async fn lookup_all(&self, origin: &ConnectionId) -> Vec<PeerHandle>;

  /// Removes a connection. Removing an unknown id is a no-op.
  async fn deregister(&self, id: &ConnectionId);
}
