// src/connection/core.rs

use crate::connection::events::{CloseReason, ConnectionEvent, MonitorReceiver, MonitorSender};
use crate::connection::options::ConnectionOptions;
use crate::connection::{ConnectionId, ConnectionState};
use crate::directory::{Directory, PeerHandle};
use crate::dispatch::Dispatcher;
use crate::error::WsError;
use crate::liveness::LivenessPolicy;
use crate::message::{Message, Target};
use crate::runtime::{queue, CloseSignal, LivenessClock, QueueReceiver, QueueSender};
use crate::transport::SharedTransport;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::time::{timeout, Instant};

/// State guarded by the lifecycle lock. The close signal is fired while this
/// lock is held, so the flag and the signal can never disagree.
#[derive(Default)]
struct Lifecycle {
  state: ConnectionState,
  close_reason: Option<CloseReason>,
  transport: Option<SharedTransport>,
  // Set only once registration succeeded and the connection was still open.
  registered: bool,
}

/// Shared state of one connection. Owned through `Arc` by the public handle
/// and by the read and write tasks.
pub(crate) struct ConnectionCore<D: ?Sized, L: ?Sized> {
  id: ConnectionId,
  directory: Arc<D>,
  liveness: Arc<L>,
  dispatcher: Dispatcher<D>,
  options: ConnectionOptions,
  lifecycle: Mutex<Lifecycle>,
  close_signal: CloseSignal,
  liveness_clock: LivenessClock,
  // Transport -> application
  inbound_tx: QueueSender,
  inbound_rx: QueueReceiver,
  // Application -> dispatcher
  outbound_tx: QueueSender,
  outbound_rx: QueueReceiver,
  monitor_tx: MonitorSender,
  monitor_rx: MonitorReceiver,
}

impl<D: ?Sized, L: ?Sized> fmt::Debug for ConnectionCore<D, L> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let lifecycle = self.lifecycle.lock();
    f.debug_struct("ConnectionCore")
      .field("id", &self.id)
      .field("state", &lifecycle.state)
      .field("close_reason", &lifecycle.close_reason)
      .field("inbound_len", &self.inbound_rx.len())
      .field("outbound_len", &self.outbound_rx.len())
      .field("options", &self.options)
      .finish_non_exhaustive()
  }
}

impl<D, L> ConnectionCore<D, L>
where
  D: Directory + ?Sized,
  L: LivenessPolicy + ?Sized,
{
  pub(crate) fn new(id: ConnectionId, directory: Arc<D>, liveness: Arc<L>, options: ConnectionOptions) -> Self {
    let (inbound_tx, inbound_rx) = queue(options.inbound_capacity);
    let (outbound_tx, outbound_rx) = queue(options.outbound_capacity);
    let (monitor_tx, monitor_rx) = async_channel::bounded(options.monitor_capacity.max(1));
    let dispatcher = Dispatcher::with_timeout(directory.clone(), options.delivery_timeout);
    Self {
      id,
      directory,
      liveness,
      dispatcher,
      options,
      lifecycle: Mutex::new(Lifecycle::default()),
      close_signal: CloseSignal::new(),
      liveness_clock: LivenessClock::new(),
      inbound_tx,
      inbound_rx,
      outbound_tx,
      outbound_rx,
      monitor_tx,
      monitor_rx,
    }
  }

  pub(crate) fn id(&self) -> &ConnectionId {
    &self.id
  }

  pub(crate) fn options(&self) -> &ConnectionOptions {
    &self.options
  }

  pub(crate) fn state(&self) -> ConnectionState {
    self.lifecycle.lock().state
  }

  pub(crate) fn close_reason(&self) -> Option<CloseReason> {
    self.lifecycle.lock().close_reason
  }

  pub(crate) fn is_closed(&self) -> bool {
    self.close_signal.is_fired()
  }

  pub(crate) async fn closed(&self) {
    self.close_signal.fired().await
  }

  pub(crate) fn monitor(&self) -> MonitorReceiver {
    self.monitor_rx.clone()
  }

  fn emit(&self, event: ConnectionEvent) {
    // Monitoring is best effort: a full channel drops the event. Holding the
    // lifecycle lock keeps every event ahead of the final `Closed`.
    let lifecycle = self.lifecycle.lock();
    if lifecycle.state == ConnectionState::Closed {
      return;
    }
    let _ = self.monitor_tx.try_send(event);
  }

  /// Sends `Closed`, evicting the oldest queued events if the channel is full,
  /// then ends the channel.
  fn emit_closed(&self, reason: CloseReason) {
    let mut event = ConnectionEvent::Closed {
      id: self.id.clone(),
      reason,
    };
    loop {
      match self.monitor_tx.try_send(event) {
        Ok(()) => break,
        Err(async_channel::TrySendError::Full(rejected)) => {
          let _ = self.monitor_rx.try_recv();
          event = rejected;
        }
        Err(async_channel::TrySendError::Closed(_)) => break,
      }
    }
    self.monitor_tx.close();
  }

  // --- Lifecycle ---

  /// Attaches the transport, registers with the directory and spawns both tasks.
  pub(crate) async fn open(self: &Arc<Self>, transport: SharedTransport) -> Result<(), WsError> {
    if self.liveness.timeout().is_zero() {
      return Err(WsError::InvalidArgument("liveness timeout must be non-zero".into()));
    }

    {
      let mut lifecycle = self.lifecycle.lock();
      match lifecycle.state {
        ConnectionState::Created => {}
        ConnectionState::Open => return Err(WsError::InvalidState("connection already open")),
        ConnectionState::Closed => return Err(WsError::Closed),
      }
      // Open before registering, so a concurrent close() sees the transport
      // and closes it.
      lifecycle.state = ConnectionState::Open;
      lifecycle.transport = Some(transport.clone());
    }

    let peer = PeerHandle::new(self.id.clone(), transport.clone());
    if let Err(e) = self.directory.register(peer).await {
      tracing::error!(conn_id = %self.id, error = %e, "Directory registration failed, tearing down");
      let _ = self.close_with(CloseReason::RegistrationFailed).await;
      return Err(match e {
        WsError::Registration(msg) => WsError::Registration(msg),
        other => WsError::Registration(other.to_string()),
      });
    }

    let still_open = {
      let mut lifecycle = self.lifecycle.lock();
      if lifecycle.state == ConnectionState::Open {
        lifecycle.registered = true;
        true
      } else {
        false
      }
    };
    if !still_open {
      // Closed while registering: close() skipped deregistration, so undo it here.
      tracing::debug!(conn_id = %self.id, "Connection closed during registration, deregistering");
      self.directory.deregister(&self.id).await;
      return Err(WsError::Closed);
    }

    self.liveness_clock.touch();
    tokio::spawn(self.clone().read_loop(transport));
    tokio::spawn(self.clone().write_loop());

    tracing::info!(conn_id = %self.id, timeout = ?self.liveness.timeout(), "Connection opened");
    self.emit(ConnectionEvent::Opened { id: self.id.clone() });
    Ok(())
  }

  /// Runs the teardown sequence exactly once, whichever trigger arrives first.
  /// Later calls return `Ok(())` without doing anything.
  pub(crate) async fn close_with(&self, reason: CloseReason) -> Result<(), WsError> {
    let (transport, registered) = {
      let mut lifecycle = self.lifecycle.lock();
      if lifecycle.state == ConnectionState::Closed {
        return Ok(());
      }
      lifecycle.state = ConnectionState::Closed;
      lifecycle.close_reason = Some(reason);
      self.close_signal.fire();
      let registered = std::mem::take(&mut lifecycle.registered);
      (lifecycle.transport.take(), registered)
    };
    tracing::info!(conn_id = %self.id, %reason, "Connection closing");

    // Deregister before closing the transport; that close may stall.
    if registered {
      self.directory.deregister(&self.id).await;
    }

    let mut result = Ok(());
    if let Some(transport) = transport {
      let close_timeout = self.options.delivery_timeout;
      match timeout(close_timeout, transport.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
          tracing::warn!(conn_id = %self.id, error = %e, "Transport close failed");
          result = Err(e);
        }
        Err(_elapsed) => {
          tracing::warn!(conn_id = %self.id, timeout = ?close_timeout, "Transport close timed out, abandoning it");
          result = Err(WsError::Timeout);
        }
      }
    }

    self.emit_closed(reason);
    result
  }

  // --- Application side ---

  pub(crate) async fn receive(&self) -> Result<Message, WsError> {
    if self.close_signal.is_fired() {
      return Err(WsError::Closed);
    }
    tokio::select! {
      biased;
      _ = self.close_signal.fired() => Err(WsError::Closed),
      res = self.inbound_rx.recv() => res.map_err(|_| WsError::Closed),
    }
  }

  /// The single enqueue path for outbound messages, used by `write` and by
  /// probe replies alike.
  pub(crate) async fn enqueue_outbound(&self, msg: Message) -> Result<(), WsError> {
    if self.close_signal.is_fired() {
      return Err(WsError::Closed);
    }
    tokio::select! {
      biased;
      _ = self.close_signal.fired() => Err(WsError::Closed),
      res = self.outbound_tx.send(msg) => res.map_err(|_| WsError::Closed),
    }
  }

  // --- Tasks ---

  async fn read_loop(self: Arc<Self>, transport: SharedTransport) {
    tracing::debug!(conn_id = %self.id, "Read task started");
    loop {
      let frame_result = tokio::select! {
        biased;
        _ = self.close_signal.fired() => break,
        res = transport.read_frame() => res,
      };

      let frame = match frame_result {
        Ok(frame) => frame,
        Err(e) => {
          if !self.close_signal.is_fired() {
            tracing::warn!(conn_id = %self.id, error = %e, "Transport read failed, closing connection");
          }
          let _ = self.close_with(CloseReason::TransportError).await;
          break;
        }
      };
      tracing::trace!(conn_id = %self.id, kind = %frame.kind, size = frame.payload.len(), "Frame read");

      if self.liveness.is_probe(&frame.payload) {
        self.liveness_clock.touch();
        let reply = Message::new(
          Target::Direct(self.id.clone()),
          self.liveness.reply_kind(),
          self.liveness.reply_payload(),
        );
        tracing::debug!(conn_id = %self.id, "Liveness probe received, queueing reply");
        if self.enqueue_outbound(reply).await.is_err() {
          break; // Closed while waiting for an outbound slot
        }
        self.emit(ConnectionEvent::ProbeAnswered { id: self.id.clone() });
        continue;
      }

      if self.options.data_refreshes_liveness {
        self.liveness_clock.touch();
      }

      let msg = Message::from_frame(Target::Direct(self.id.clone()), frame);
      tokio::select! {
        biased;
        _ = self.close_signal.fired() => break,
        res = self.inbound_tx.send(msg) => {
          if res.is_err() {
            break;
          }
        }
      }
    }
    tracing::debug!(conn_id = %self.id, "Read task stopped");
  }

  async fn write_loop(self: Arc<Self>) {
    tracing::debug!(conn_id = %self.id, "Write task started");
    let heartbeat = tokio::time::sleep(self.liveness.timeout());
    tokio::pin!(heartbeat);

    loop {
      tokio::select! {
        biased;

        _ = self.close_signal.fired() => break,

        // Heartbeat ahead of the queue so a busy outbound queue cannot starve it.
        _ = &mut heartbeat => {
          let timeout = self.liveness.timeout();
          if self.liveness_clock.is_expired(timeout) {
            tracing::info!(
              conn_id = %self.id,
              ?timeout,
              since_last = ?self.liveness_clock.elapsed(),
              "No liveness within heartbeat period, closing"
            );
            let _ = self.close_with(CloseReason::HeartbeatTimeout).await;
            break;
          }
          tracing::trace!(conn_id = %self.id, "Heartbeat check passed");
          heartbeat.as_mut().reset(Instant::now() + timeout);
        }

        res = self.outbound_rx.recv() => match res {
          Ok(msg) => self.dispatch(msg).await,
          Err(_) => break,
        },
      }
    }
    tracing::debug!(conn_id = %self.id, "Write task stopped");
  }

  async fn dispatch(&self, msg: Message) {
    tracing::trace!(conn_id = %self.id, target = %msg.target, size = msg.size(), "Dispatching message");
    match self.dispatcher.dispatch(&self.id, &msg).await {
      Ok(delivery) => {
        for (recipient, e) in delivery.failed {
          self.emit(ConnectionEvent::DeliveryFailed {
            id: self.id.clone(),
            target: msg.target.clone(),
            recipient: Some(recipient),
            error_msg: e.to_string(),
          });
        }
      }
      Err(e) => {
        tracing::warn!(conn_id = %self.id, target = %msg.target, error = %e, "Direct delivery failed");
        // Resolution failures have no recipient; write failures name the one peer.
        let recipient = match (&msg.target, &e) {
          (Target::Direct(_), WsError::TargetEmpty | WsError::NotFound(_)) => None,
          (Target::Direct(id), _) => Some(id.clone()),
          _ => None,
        };
        self.emit(ConnectionEvent::DeliveryFailed {
          id: self.id.clone(),
          target: msg.target,
          recipient,
          error_msg: e.to_string(),
        });
      }
    }
  }
}
