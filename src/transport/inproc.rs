// src/transport/inproc.rs

//! In-process transport backed by a pair of bounded `async-channel` pipes.
//!
//! `pair()` returns the connection side (`InprocTransport`, handed to
//! `Connection::open`) and the remote side (`InprocPeer`), which plays the
//! client: it pushes frames in, observes frames written out, and can hang up
//! or inject write failures.

use crate::error::WsError;
use crate::message::Frame;
use crate::transport::Transport;
use async_channel::{bounded, Receiver as AsyncReceiver, Sender as AsyncSender};
use async_trait::async_trait;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Default pipe capacity in each direction.
pub const DEFAULT_PIPE_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct PipeState {
  fail_writes: AtomicBool,
  close_calls: AtomicUsize,
  frames_written: AtomicUsize,
}

/// Connection-side end of an in-process pipe pair.
#[derive(Debug)]
pub struct InprocTransport {
  rx_from_peer: AsyncReceiver<Frame>,
  tx_to_peer: AsyncSender<Frame>,
  state: Arc<PipeState>,
}

/// Remote end of an in-process pipe pair.
#[derive(Debug, Clone)]
pub struct InprocPeer {
  tx_to_conn: AsyncSender<Frame>,
  rx_from_conn: AsyncReceiver<Frame>,
  state: Arc<PipeState>,
}

/// Creates a connected transport/peer pair with the default capacity.
pub fn pair() -> (InprocTransport, InprocPeer) {
  pair_with_capacity(DEFAULT_PIPE_CAPACITY)
}

/// Creates a connected transport/peer pair. Each direction is bounded by `capacity`.
pub fn pair_with_capacity(capacity: usize) -> (InprocTransport, InprocPeer) {
  let capacity = capacity.max(1);
  let (tx_peer_to_conn, rx_peer_to_conn) = bounded::<Frame>(capacity);
  let (tx_conn_to_peer, rx_conn_to_peer) = bounded::<Frame>(capacity);
  let state = Arc::new(PipeState::default());
  (
    InprocTransport {
      rx_from_peer: rx_peer_to_conn,
      tx_to_peer: tx_conn_to_peer,
      state: state.clone(),
    },
    InprocPeer {
      tx_to_conn: tx_peer_to_conn,
      rx_from_conn: rx_conn_to_peer,
      state,
    },
  )
}

#[async_trait]
impl Transport for InprocTransport {
  async fn read_frame(&self) -> Result<Frame, WsError> {
    self
      .rx_from_peer
      .recv()
      .await
      .map_err(|_| WsError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "inproc peer hung up")))
  }

  async fn write_frame(&self, frame: Frame) -> Result<(), WsError> {
    if self.state.fail_writes.load(Ordering::Acquire) {
      return Err(WsError::Transport("inproc write failure injected".into()));
    }
    self
      .tx_to_peer
      .send(frame)
      .await
      .map_err(|_| WsError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "inproc pipe closed")))?;
    self.state.frames_written.fetch_add(1, Ordering::Relaxed);
    Ok(())
  }

  async fn close(&self) -> Result<(), WsError> {
    self.state.close_calls.fetch_add(1, Ordering::AcqRel);
    // Closing either end of an async-channel closes it for both sides.
    self.rx_from_peer.close();
    self.tx_to_peer.close();
    Ok(())
  }
}

impl InprocPeer {
  /// Sends a frame to the connection, as a remote client would.
  pub async fn send(&self, frame: Frame) -> Result<(), WsError> {
    self.tx_to_conn.send(frame).await.map_err(|_| WsError::Closed)
  }

  /// Receives the next frame written by the connection side.
  /// Returns `None` once the pipe is closed and drained.
  pub async fn recv(&self) -> Option<Frame> {
    self.rx_from_conn.recv().await.ok()
  }

  pub fn try_recv(&self) -> Option<Frame> {
    self.rx_from_conn.try_recv().ok()
  }

  /// Hangs up the remote side. The connection's next `read_frame` fails.
  pub fn hang_up(&self) {
    self.tx_to_conn.close();
    self.rx_from_conn.close();
  }

  /// Makes every subsequent `write_frame` on the connection side fail.
  pub fn set_fail_writes(&self, fail: bool) {
    self.state.fail_writes.store(fail, Ordering::Release);
  }

  /// How many times the connection side called `Transport::close`.
  pub fn close_calls(&self) -> usize {
    self.state.close_calls.load(Ordering::Acquire)
  }

  /// Frames successfully written by the connection side so far.
  pub fn frames_written(&self) -> usize {
    self.state.frames_written.load(Ordering::Relaxed)
  }

  pub fn is_closed(&self) -> bool {
    self.tx_to_conn.is_closed()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn frames_cross_both_directions() {
    let (transport, peer) = pair();
    peer.send(Frame::text("hello")).await.unwrap();
    let frame = transport.read_frame().await.unwrap();
    assert_eq!(frame.payload.as_ref(), b"hello");

    transport.write_frame(Frame::binary(vec![1u8, 2, 3])).await.unwrap();
    let out = peer.recv().await.unwrap();
    assert_eq!(out.payload.as_ref(), &[1, 2, 3]);
    assert_eq!(peer.frames_written(), 1);
  }

  #[tokio::test]
  async fn hang_up_fails_pending_read() {
    let (transport, peer) = pair();
    let reader = tokio::spawn(async move { transport.read_frame().await });
    tokio::task::yield_now().await;
    peer.hang_up();
    let res = reader.await.unwrap();
    assert!(matches!(res, Err(WsError::Io(_))));
  }

  #[tokio::test]
  async fn injected_write_failure() {
    let (transport, peer) = pair();
    peer.set_fail_writes(true);
    let res = transport.write_frame(Frame::text("x")).await;
    assert!(matches!(res, Err(WsError::Transport(_))));
    assert!(peer.try_recv().is_none());
  }

  #[tokio::test]
  async fn close_is_counted_and_closes_pipe() {
    let (transport, peer) = pair();
    transport.close().await.unwrap();
    assert_eq!(peer.close_calls(), 1);
    assert!(peer.is_closed());
    assert!(transport.read_frame().await.is_err());
  }
}
