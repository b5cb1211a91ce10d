// src/dispatch/mod.rs

//! Resolves routing targets against the directory and delivers frames.

use crate::connection::ConnectionId;
use crate::directory::{Directory, PeerHandle};
use crate::error::WsError;
use crate::message::{Frame, Message, Target};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Default upper bound for a single recipient write.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one dispatch.
///
/// Group and broadcast fan-out never fail as a whole; per-recipient failures
/// are collected here instead.
#[derive(Debug, Default)]
pub struct Delivery {
  /// Recipients resolved from the directory.
  pub attempted: usize,
  /// Recipients whose write completed.
  pub delivered: usize,
  /// Recipients whose write failed or timed out.
  pub failed: Vec<(ConnectionId, WsError)>,
}

impl Delivery {
  pub fn is_complete(&self) -> bool {
    self.failed.is_empty()
  }
}

/// Translates a message's target into recipients and writes to each.
///
/// Independent of the issuing connection: it only needs the directory.
pub struct Dispatcher<D: ?Sized> {
  directory: Arc<D>,
  delivery_timeout: Duration,
}

impl<D: ?Sized> Clone for Dispatcher<D> {
  fn clone(&self) -> Self {
    Self {
      directory: self.directory.clone(),
      delivery_timeout: self.delivery_timeout,
    }
  }
}

impl<D: ?Sized> fmt::Debug for Dispatcher<D> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Dispatcher")
      .field("delivery_timeout", &self.delivery_timeout)
      .finish_non_exhaustive()
  }
}

impl<D: Directory + ?Sized> Dispatcher<D> {
  pub fn new(directory: Arc<D>) -> Self {
    Self::with_timeout(directory, DEFAULT_DELIVERY_TIMEOUT)
  }

  pub fn with_timeout(directory: Arc<D>, delivery_timeout: Duration) -> Self {
    Self {
      directory,
      delivery_timeout,
    }
  }

  pub fn directory(&self) -> &Arc<D> {
    &self.directory
  }

  /// Routes `msg` on behalf of `origin`.
  ///
  /// Only `Direct` can return an error; its single write outcome is surfaced.
  pub async fn dispatch(&self, origin: &ConnectionId, msg: &Message) -> Result<Delivery, WsError> {
    match &msg.target {
      Target::Direct(id) => {
        self.direct(id, msg.to_frame()).await?;
        Ok(Delivery {
          attempted: 1,
          delivered: 1,
          failed: Vec::new(),
        })
      }
      Target::Group(name) => Ok(self.group(name, msg.to_frame()).await),
      Target::Broadcast => Ok(self.broadcast(origin, msg.to_frame()).await),
    }
  }

  /// Writes to exactly one connection and returns the write's outcome.
  pub async fn direct(&self, id: &ConnectionId, frame: Frame) -> Result<(), WsError> {
    // Checked before the directory is consulted.
    if id.is_empty() {
      return Err(WsError::TargetEmpty);
    }
    let peer = self
      .directory
      .lookup(id)
      .await
      .ok_or_else(|| WsError::NotFound(id.to_string()))?;
    self.deliver_one(&peer, frame).await
  }

  /// Best-effort fan-out to a named group.
  pub async fn group(&self, name: &str, frame: Frame) -> Delivery {
    let peers = self.directory.lookup_group(name).await;
    tracing::trace!(group = name, recipients = peers.len(), "Dispatcher: group fan-out");
    self.fan_out(peers, frame).await
  }

  /// Best-effort fan-out to every connection the directory reports for `origin`.
  pub async fn broadcast(&self, origin: &ConnectionId, frame: Frame) -> Delivery {
    let peers = self.directory.lookup_all(origin).await;
    tracing::trace!(conn_id = %origin, recipients = peers.len(), "Dispatcher: broadcast fan-out");
    self.fan_out(peers, frame).await
  }

  async fn fan_out(&self, peers: Vec<PeerHandle>, frame: Frame) -> Delivery {
    let mut delivery = Delivery {
      attempted: peers.len(),
      ..Delivery::default()
    };
    if peers.is_empty() {
      return delivery;
    }

    // All writes run concurrently, each under its own timeout, so one slow
    // recipient costs at most one delivery timeout.
    let sends = peers.iter().map(|peer| {
      let frame = frame.clone(); // Bytes clone, no copy
      async move { (peer, self.deliver_one(peer, frame).await) }
    });
    for (peer, result) in futures::future::join_all(sends).await {
      match result {
        Ok(()) => delivery.delivered += 1,
        Err(e) => {
          tracing::debug!(conn_id = %peer.id(), error = %e, "Dispatcher: recipient write failed, continuing");
          delivery.failed.push((peer.id().clone(), e));
        }
      }
    }
    delivery
  }

  async fn deliver_one(&self, peer: &PeerHandle, frame: Frame) -> Result<(), WsError> {
    match timeout(self.delivery_timeout, peer.deliver(frame)).await {
      Ok(result) => result,
      Err(_elapsed) => {
        tracing::warn!(conn_id = %peer.id(), timeout = ?self.delivery_timeout, "Dispatcher: recipient write timed out");
        Err(WsError::Timeout)
      }
    }
  }
}
