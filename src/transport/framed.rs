// src/transport/framed.rs

//! Adapter from any `tokio_util::codec::Framed` stream to a `Transport`.
//!
//! The codec decides the wire format. It only has to decode into and encode
//! from `Frame`. The framed stream is split so a pending read never blocks a
//! write from another task.

use crate::error::WsError;
use crate::message::Frame;
use crate::runtime::CloseSignal;
use crate::transport::Transport;
use async_trait::async_trait;
use futures::sink::SinkExt;
use futures::stream::{SplitSink, SplitStream, StreamExt};
use std::fmt;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::codec::{Decoder, Encoder, Framed};

/// Upper bound for flushing buffered bytes during `close`.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

pub struct FramedTransport<S, C> {
  sink: Mutex<SplitSink<Framed<S, C>, Frame>>,
  stream: Mutex<SplitStream<Framed<S, C>>>,
  // Fired by `close`; cancels pending reads and writes so the sink lock frees up.
  closed: CloseSignal,
  close_timeout: Duration,
}

impl<S, C> FramedTransport<S, C>
where
  S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
  C: Decoder<Item = Frame> + Encoder<Frame> + Send + 'static,
{
  /// Wraps an already upgraded stream with the given codec.
  pub fn new(stream: S, codec: C) -> Self {
    Self::from_framed(Framed::new(stream, codec))
  }

  pub fn from_framed(framed: Framed<S, C>) -> Self {
    let (sink, stream) = framed.split();
    Self {
      sink: Mutex::new(sink),
      stream: Mutex::new(stream),
      closed: CloseSignal::new(),
      close_timeout: DEFAULT_CLOSE_TIMEOUT,
    }
  }

  /// Bounds how long `close` waits for buffered bytes to drain. A peer that
  /// stopped reading can otherwise hold the flush forever.
  pub fn with_close_timeout(mut self, close_timeout: Duration) -> Self {
    self.close_timeout = close_timeout;
    self
  }
}

impl<S, C> fmt::Debug for FramedTransport<S, C> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FramedTransport").finish_non_exhaustive()
  }
}

#[async_trait]
impl<S, C> Transport for FramedTransport<S, C>
where
  S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
  C: Decoder<Item = Frame> + Encoder<Frame> + Send + 'static,
  <C as Decoder>::Error: fmt::Display + Send,
  <C as Encoder<Frame>>::Error: fmt::Display + Send,
{
  async fn read_frame(&self) -> Result<Frame, WsError> {
    if self.closed.is_fired() {
      return Err(WsError::Closed);
    }
    let next = tokio::select! {
      biased;
      _ = self.closed.fired() => return Err(WsError::Closed),
      next = async { self.stream.lock().await.next().await } => next,
    };
    match next {
      Some(Ok(frame)) => Ok(frame),
      Some(Err(e)) => Err(WsError::transport(e)),
      None => Err(WsError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "stream closed by peer",
      ))),
    }
  }

  async fn write_frame(&self, frame: Frame) -> Result<(), WsError> {
    if self.closed.is_fired() {
      return Err(WsError::Closed);
    }
    tokio::select! {
      biased;
      _ = self.closed.fired() => Err(WsError::Closed),
      res = async { self.sink.lock().await.send(frame).await } => res.map_err(WsError::transport),
    }
  }

  async fn close(&self) -> Result<(), WsError> {
    if !self.closed.fire() {
      return Ok(());
    }
    match timeout(self.close_timeout, async { self.sink.lock().await.close().await }).await {
      Ok(res) => res.map_err(WsError::transport),
      Err(_elapsed) => {
        tracing::debug!(timeout = ?self.close_timeout, "FramedTransport: flush on close timed out");
        Err(WsError::Timeout)
      }
    }
  }
}
