// src/directory/memory.rs

use super::{Directory, PeerHandle};
use crate::connection::ConnectionId;
use crate::error::WsError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Whether a broadcast reaches the connection that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadcastScope {
  /// `lookup_all` returns every registered connection, the origin included.
  #[default]
  IncludeOrigin,
  /// `lookup_all` leaves the origin out.
  ExcludeOrigin,
}

#[derive(Debug, Default)]
struct DirectoryState {
  // Map: Connection Id -> Peer (ordered so fan-out order is deterministic)
  peers: BTreeMap<ConnectionId, PeerHandle>,
  // Map: Group Name -> Member Ids. Members may join before they register.
  groups: HashMap<String, BTreeSet<ConnectionId>>,
}

/// In-memory directory for a single process.
///
/// Ids must be unique: registering a taken id fails. Deregistering an id also
/// drops it from every group.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
  state: RwLock<DirectoryState>,
  scope: BroadcastScope,
}

impl MemoryDirectory {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_scope(scope: BroadcastScope) -> Self {
    Self {
      state: RwLock::default(),
      scope,
    }
  }

  pub fn scope(&self) -> BroadcastScope {
    self.scope
  }

  /// Adds `id` to `group`. Returns `false` if it was already a member.
  pub fn join(&self, group: impl Into<String>, id: impl Into<ConnectionId>) -> bool {
    let group = group.into();
    let id = id.into();
    let added = self.state.write().groups.entry(group.clone()).or_default().insert(id.clone());
    if added {
      tracing::trace!(%group, conn_id = %id, "Directory: joined group");
    }
    added
  }

  /// Removes `id` from `group`. Returns `false` if it was not a member.
  pub fn leave(&self, group: &str, id: &ConnectionId) -> bool {
    let mut state = self.state.write();
    let Some(members) = state.groups.get_mut(group) else {
      return false;
    };
    let removed = members.remove(id);
    if members.is_empty() {
      state.groups.remove(group);
    }
    if removed {
      tracing::trace!(group, conn_id = %id, "Directory: left group");
    }
    removed
  }

  /// Current member ids of a group, registered or not.
  pub fn members(&self, group: &str) -> Vec<ConnectionId> {
    self
      .state
      .read()
      .groups
      .get(group)
      .map(|m| m.iter().cloned().collect())
      .unwrap_or_default()
  }

  pub fn contains(&self, id: &ConnectionId) -> bool {
    self.state.read().peers.contains_key(id)
  }

  pub fn len(&self) -> usize {
    self.state.read().peers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.state.read().peers.is_empty()
  }

  pub fn ids(&self) -> Vec<ConnectionId> {
    self.state.read().peers.keys().cloned().collect()
  }
}

#[async_trait]
impl Directory for MemoryDirectory {
  async fn register(&self, peer: PeerHandle) -> Result<(), WsError> {
    let mut state = self.state.write();
    if state.peers.contains_key(peer.id()) {
      tracing::warn!(conn_id = %peer.id(), "Directory: id already registered");
      return Err(WsError::Registration(format!("id {} already registered", peer.id())));
    }
    tracing::trace!(conn_id = %peer.id(), "Directory: registered");
    state.peers.insert(peer.id().clone(), peer);
    Ok(())
  }

  async fn lookup(&self, id: &ConnectionId) -> Option<PeerHandle> {
    self.state.read().peers.get(id).cloned()
  }

  async fn lookup_group(&self, name: &str) -> Vec<PeerHandle> {
    let state = self.state.read();
    match state.groups.get(name) {
      Some(members) => members.iter().filter_map(|id| state.peers.get(id).cloned()).collect(),
      None => Vec::new(),
    }
  }

  async fn lookup_all(&self, origin: &ConnectionId) -> Vec<PeerHandle> {
    let state = self.state.read();
    state
      .peers
      .values()
      .filter(|peer| self.scope == BroadcastScope::IncludeOrigin || peer.id() != origin)
      .cloned()
      .collect()
  }

  async fn deregister(&self, id: &ConnectionId) {
    let mut state = self.state.write();
    if state.peers.remove(id).is_some() {
      tracing::trace!(conn_id = %id, "Directory: deregistered");
    }
    state.groups.retain(|_, members| {
      members.remove(id);
      !members.is_empty()
    });
  }
}
