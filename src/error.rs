// src/error.rs

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive] // Allows adding more variants later without breaking change
pub enum WsError {
  // --- Lifecycle Errors ---
  /// The connection is closed, or closed while the operation was waiting.
  #[error("connection already closed")]
  Closed,
  #[error("Operation is invalid for the current connection state: {0}")]
  InvalidState(&'static str),

  // --- Routing Errors ---
  #[error("Direct target identifier is empty")]
  TargetEmpty,
  #[error("No connection registered under id: {0}")]
  NotFound(String),

  // --- Directory Errors ---
  #[error("Directory registration failed: {0}")]
  Registration(String),

  // --- Transport Errors ---
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),
  #[error("Transport error: {0}")]
  Transport(String),

  // --- Timeouts ---
  #[error("Operation timed out")]
  Timeout,

  // --- Configuration ---
  #[error("Invalid argument provided: {0}")]
  InvalidArgument(String),
}

impl WsError {
  /// Wraps any displayable transport failure (codec errors, peer resets, ...).
  pub fn transport(e: impl std::fmt::Display) -> Self {
    WsError::Transport(e.to_string())
  }

  /// True for the failures that come from the wire rather than from routing or lifecycle.
  pub fn is_transport(&self) -> bool {
    matches!(self, WsError::Io(_) | WsError::Transport(_))
  }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, WsError>;
