// src/transport/mod.rs

//! The opaque frame channel a connection owns.
//!
//! Handshake, upgrade and frame encoding live behind this trait. The core only
//! reads whole frames, writes whole frames and closes.

pub mod framed;
pub mod inproc;

pub use framed::FramedTransport;
pub use inproc::{InprocPeer, InprocTransport};

use crate::error::WsError;
use crate::message::Frame;
use async_trait::async_trait;
use std::sync::Arc;

/// Bidirectional frame channel.
///
/// Implementations synchronize internally: the owning connection's read task
/// calls `read_frame` while its own write path and other connections'
/// dispatchers call `write_frame` concurrently.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
  /// Reads the next complete frame. End of stream is reported as an error.
  async fn read_frame(&self) -> Result<Frame, WsError>;

  /// Writes one complete frame.
  async fn write_frame(&self, frame: Frame) -> Result<(), WsError>;

  /// Closes the underlying channel. A pending `read_frame` should fail afterwards.
  async fn close(&self) -> Result<(), WsError>;
}

/// Shared handle to a transport, as stored in directory entries.
pub type SharedTransport = Arc<dyn Transport>;
