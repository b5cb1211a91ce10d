// tests/common.rs
#![allow(dead_code)] // Not every test binary uses every helper

use async_trait::async_trait;
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wshub::inproc::{self, InprocPeer};
use wshub::{
  Connection, ConnectionEvent, ConnectionId, ConnectionOptions, Directory, Frame, MemoryDirectory, MonitorReceiver,
  MessageKind, PeerHandle, StaticLiveness, WsError,
};

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use tokio::time::timeout;

pub const SHORT_TIMEOUT: Duration = Duration::from_millis(250);
pub const LONG_TIMEOUT: Duration = Duration::from_secs(2);

pub type TestConnection = Connection<RecordingDirectory, StaticLiveness>;

static TRACING_INIT: Once = Once::new();

// Setup function to initialize tracing
pub fn setup_tracing() {
  TRACING_INIT.call_once(|| {
    // Can be overridden by RUST_LOG env variable
    let default_filter = "wshub=trace,warn";
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder()
      .with_max_level(tracing::Level::TRACE)
      .with_env_filter(env_filter)
      .with_target(true)
      .with_line_number(true)
      .with_span_events(FmtSpan::CLOSE)
      .with_test_writer()
      .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set global tracing subscriber");
  });
}

/// The ping/pong policy used throughout the tests.
pub fn ping_pong(timeout: Duration) -> Arc<StaticLiveness> {
  Arc::new(StaticLiveness::new("ping", "pong", timeout))
}

/// Wraps a `MemoryDirectory` and counts every call made through the trait.
#[derive(Debug, Default)]
pub struct RecordingDirectory {
  pub inner: MemoryDirectory,
  pub registers: AtomicUsize,
  pub deregisters: AtomicUsize,
  pub lookups: AtomicUsize,
}

impl RecordingDirectory {
  pub fn new() -> Arc<Self> {
    setup_tracing();
    Arc::new(Self::default())
  }

  pub fn with_inner(inner: MemoryDirectory) -> Arc<Self> {
    setup_tracing();
    Arc::new(Self {
      inner,
      ..Self::default()
    })
  }

  pub fn deregister_count(&self) -> usize {
    self.deregisters.load(Ordering::SeqCst)
  }

  pub fn lookup_count(&self) -> usize {
    self.lookups.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Directory for RecordingDirectory {
  async fn register(&self, peer: PeerHandle) -> Result<(), WsError> {
    self.registers.fetch_add(1, Ordering::SeqCst);
    self.inner.register(peer).await
  }

  async fn lookup(&self, id: &ConnectionId) -> Option<PeerHandle> {
    self.lookups.fetch_add(1, Ordering::SeqCst);
    self.inner.lookup(id).await
  }

  async fn lookup_group(&self, name: &str) -> Vec<PeerHandle> {
    self.lookups.fetch_add(1, Ordering::SeqCst);
    self.inner.lookup_group(name).await
  }

  async fn lookup_all(&self, origin: &ConnectionId) -> Vec<PeerHandle> {
    self.lookups.fetch_add(1, Ordering::SeqCst);
    self.inner.lookup_all(origin).await
  }

  async fn deregister(&self, id: &ConnectionId) {
    self.deregisters.fetch_add(1, Ordering::SeqCst);
    self.inner.deregister(id).await
  }
}

/// A directory that refuses every registration.
#[derive(Debug, Default)]
pub struct RejectingDirectory {
  pub deregisters: AtomicUsize,
}

#[async_trait]
impl Directory for RejectingDirectory {
  async fn register(&self, peer: PeerHandle) -> Result<(), WsError> {
    Err(WsError::Registration(format!("directory full, refusing {}", peer.id())))
  }

  async fn lookup(&self, _id: &ConnectionId) -> Option<PeerHandle> {
    None
  }

  async fn lookup_group(&self, _name: &str) -> Vec<PeerHandle> {
    Vec::new()
  }

  async fn lookup_all(&self, _origin: &ConnectionId) -> Vec<PeerHandle> {
    Vec::new()
  }

  async fn deregister(&self, _id: &ConnectionId) {
    self.deregisters.fetch_add(1, Ordering::SeqCst);
  }
}

/// Creates and opens a connection over a fresh inproc pair.
pub async fn open_connection(
  directory: &Arc<RecordingDirectory>,
  id: &str,
  liveness: &Arc<StaticLiveness>,
) -> (TestConnection, InprocPeer) {
  open_connection_with(directory, id, liveness, ConnectionOptions::default(), inproc::DEFAULT_PIPE_CAPACITY).await
}

pub async fn open_connection_with(
  directory: &Arc<RecordingDirectory>,
  id: &str,
  liveness: &Arc<StaticLiveness>,
  options: ConnectionOptions,
  pipe_capacity: usize,
) -> (TestConnection, InprocPeer) {
  let conn = Connection::with_options(Some(id.into()), directory.clone(), liveness.clone(), options)
    .expect("valid options");
  let (transport, peer) = inproc::pair_with_capacity(pipe_capacity);
  conn.open(transport).await.expect("open should succeed");
  (conn, peer)
}

// Helper for peer recv with timeout; None on timeout or closed pipe
pub async fn peer_recv_timeout(peer: &InprocPeer, duration: Duration) -> Option<Frame> {
  timeout(duration, peer.recv()).await.ok().flatten()
}

// Helper for receive with timeout assertion
pub async fn receive_timeout(conn: &TestConnection, duration: Duration) -> Result<wshub::Message, WsError> {
  match timeout(duration, conn.receive()).await {
    Ok(res) => res,
    Err(_) => Err(WsError::Timeout),
  }
}

// --- Helper function to wait for specific monitor event ---
pub async fn wait_for_monitor_event(
  monitor_rx: &MonitorReceiver,
  duration: Duration,
  check_event: impl Fn(&ConnectionEvent) -> bool,
) -> Result<ConnectionEvent, String> {
  let wait = async {
    loop {
      match monitor_rx.recv().await {
        Ok(event) => {
          if check_event(&event) {
            return Ok(event);
          }
        }
        Err(_) => return Err("Monitor channel closed before the event arrived".to_string()),
      }
    }
  };
  match timeout(duration, wait).await {
    Ok(res) => res,
    Err(_) => Err(format!("Timeout waiting for monitor event after {:?}", duration)),
  }
}

/// Wire codec for `FramedTransport` tests: [kind: u8][len: u32 BE][payload].
#[derive(Debug, Default, Clone, Copy)]
pub struct LengthPrefixedCodec;

impl Decoder for LengthPrefixedCodec {
  type Item = Frame;
  type Error = io::Error;

  fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
    if src.len() < 5 {
      return Ok(None);
    }
    let len = u32::from_be_bytes([src[1], src[2], src[3], src[4]]) as usize;
    if src.len() < 5 + len {
      src.reserve(5 + len - src.len());
      return Ok(None);
    }
    let kind = MessageKind::from(src.get_u8());
    src.advance(4);
    Ok(Some(Frame::new(kind, src.split_to(len).freeze())))
  }
}

impl Encoder<Frame> for LengthPrefixedCodec {
  type Error = io::Error;

  fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), io::Error> {
    dst.reserve(5 + frame.payload.len());
    dst.put_u8(frame.kind.tag());
    dst.put_u32(frame.payload.len() as u32);
    dst.extend_from_slice(&frame.payload);
    Ok(())
  }
}
