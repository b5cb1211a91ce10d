// src/connection/types.rs

use crate::connection::core::ConnectionCore;
use crate::connection::events::{CloseReason, MonitorReceiver};
use crate::connection::options::ConnectionOptions;
use crate::connection::ConnectionId;
use crate::directory::Directory;
use crate::error::WsError;
use crate::liveness::LivenessPolicy;
use crate::message::Message;
use crate::transport::{SharedTransport, Transport};
use std::fmt;
use std::sync::Arc;

/// Lifecycle of a connection. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
  /// Constructed, no transport yet.
  #[default]
  Created,
  /// Transport attached, registered, read and write tasks running.
  Open,
  /// Transport released, deregistered, close signal fired.
  Closed,
}

/// The public handle for one long-lived connection.
///
/// Handles are cloneable; every clone drives the same connection. The
/// connection is generic only over its two capabilities: the directory it
/// registers with and the liveness policy it enforces.
///
/// Dropping every handle does not close an open connection: its tasks keep
/// running until the transport fails or the heartbeat expires. Call
/// [`Connection::close`] to shut it down deterministically.
pub struct Connection<D: ?Sized, L: ?Sized> {
  core: Arc<ConnectionCore<D, L>>,
}

impl<D: ?Sized, L: ?Sized> Clone for Connection<D, L> {
  fn clone(&self) -> Self {
    Self {
      core: self.core.clone(),
    }
  }
}

impl<D, L> Connection<D, L>
where
  D: Directory + ?Sized,
  L: LivenessPolicy + ?Sized,
{
  /// Creates a connection with a generated id and default options.
  pub fn new(directory: Arc<D>, liveness: Arc<L>) -> Self {
    Self::from_core(ConnectionCore::new(
      ConnectionId::generate(),
      directory,
      liveness,
      ConnectionOptions::default(),
    ))
  }

  /// Creates a connection with a caller-supplied id and default options.
  pub fn with_id(id: impl Into<ConnectionId>, directory: Arc<D>, liveness: Arc<L>) -> Self {
    Self::from_core(ConnectionCore::new(
      id.into(),
      directory,
      liveness,
      ConnectionOptions::default(),
    ))
  }

  /// Creates a connection with explicit options. Pass `None` to generate the id.
  pub fn with_options(
    id: Option<ConnectionId>,
    directory: Arc<D>,
    liveness: Arc<L>,
    options: ConnectionOptions,
  ) -> Result<Self, WsError> {
    options.validate()?;
    let id = id.unwrap_or_else(ConnectionId::generate);
    Ok(Self::from_core(ConnectionCore::new(id, directory, liveness, options)))
  }

  fn from_core(core: ConnectionCore<D, L>) -> Self {
    Self { core: Arc::new(core) }
  }

  // --- Public API Methods ---

  /// The immutable identifier.
  pub fn id(&self) -> &ConnectionId {
    self.core.id()
  }

  /// Attaches the transport, registers with the directory and starts the
  /// read and write tasks.
  ///
  /// If registration fails the connection is torn down (signal fired,
  /// transport closed) and `WsError::Registration` is returned.
  pub async fn open<T: Transport>(&self, transport: T) -> Result<(), WsError> {
    self.core.open(Arc::new(transport)).await
  }

  /// Same as [`Connection::open`] for a transport that is already shared.
  pub async fn open_shared(&self, transport: SharedTransport) -> Result<(), WsError> {
    self.core.open(transport).await
  }

  /// Closes the connection. Idempotent and safe to call concurrently; only
  /// the first call does anything. Does not wait for in-flight deliveries.
  pub async fn close(&self) -> Result<(), WsError> {
    self.core.close_with(CloseReason::Explicit).await
  }

  /// Waits for the next inbound message, or fails with `WsError::Closed`.
  pub async fn receive(&self) -> Result<Message, WsError> {
    self.core.receive().await
  }

  /// Waits for room in the outbound queue, or fails with `WsError::Closed`
  /// (in which case the message is dropped).
  pub async fn write(&self, msg: Message) -> Result<(), WsError> {
    self.core.enqueue_outbound(msg).await
  }

  pub fn state(&self) -> ConnectionState {
    self.core.state()
  }

  pub fn is_closed(&self) -> bool {
    self.core.is_closed()
  }

  /// The trigger that closed the connection, once closed.
  pub fn close_reason(&self) -> Option<CloseReason> {
    self.core.close_reason()
  }

  /// Completes once the connection is closed.
  pub async fn closed(&self) {
    self.core.closed().await
  }

  /// Receiver for this connection's lifecycle events. All receivers share
  /// one stream; the channel ends after the `Closed` event.
  pub fn monitor(&self) -> MonitorReceiver {
    self.core.monitor()
  }

  pub fn options(&self) -> &ConnectionOptions {
    self.core.options()
  }
}

impl<D: ?Sized, L: ?Sized> fmt::Debug for Connection<D, L> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Connection").field("core", &self.core).finish()
  }
}
