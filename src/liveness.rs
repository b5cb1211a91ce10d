// src/liveness.rs

//! Keep-alive policy consumed by every connection.

use crate::message::MessageKind;
use bytes::Bytes;
use std::time::Duration;

/// Default heartbeat validity window: a connection with no probe for this long is closed.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(300);

/// Decides what counts as a keep-alive probe and how to answer it.
///
/// Shared by many connections at once, so implementations must be `Send + Sync`
/// and do their own synchronization if they hold mutable state.
pub trait LivenessPolicy: Send + Sync + 'static {
  /// Whether an inbound payload is a liveness probe.
  fn is_probe(&self, payload: &[u8]) -> bool;

  /// Payload sent back to the prober.
  fn reply_payload(&self) -> Bytes;

  /// Maximum gap between probes. Also the heartbeat check period.
  fn timeout(&self) -> Duration;

  /// Frame kind of the reply. Application-level probes usually travel as text.
  fn reply_kind(&self) -> MessageKind {
    MessageKind::TEXT
  }
}

/// Policy matching one fixed probe payload and answering with one fixed reply.
#[derive(Debug, Clone)]
pub struct StaticLiveness {
  probe: Bytes,
  reply: Bytes,
  reply_kind: MessageKind,
  timeout: Duration,
}

impl StaticLiveness {
  pub fn new(probe: impl Into<Bytes>, reply: impl Into<Bytes>, timeout: Duration) -> Self {
    Self {
      probe: probe.into(),
      reply: reply.into(),
      reply_kind: MessageKind::TEXT,
      timeout,
    }
  }

  pub fn with_reply_kind(mut self, kind: MessageKind) -> Self {
    self.reply_kind = kind;
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }
}

impl Default for StaticLiveness {
  fn default() -> Self {
    Self::new(Bytes::from_static(b"ping"), Bytes::from_static(b"pong"), DEFAULT_HEARTBEAT_INTERVAL)
  }
}

impl LivenessPolicy for StaticLiveness {
  fn is_probe(&self, payload: &[u8]) -> bool {
    !self.probe.is_empty() && payload == self.probe.as_ref()
  }

  fn reply_payload(&self) -> Bytes {
    self.reply.clone()
  }

  fn timeout(&self) -> Duration {
    self.timeout
  }

  fn reply_kind(&self) -> MessageKind {
    self.reply_kind
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn static_policy_matches_exact_payload() {
    let policy = StaticLiveness::default();
    assert!(policy.is_probe(b"ping"));
    assert!(!policy.is_probe(b"ping "));
    assert!(!policy.is_probe(b""));
    assert_eq!(policy.reply_payload().as_ref(), b"pong");
    assert_eq!(policy.timeout(), DEFAULT_HEARTBEAT_INTERVAL);
    assert_eq!(policy.reply_kind(), MessageKind::TEXT);
  }

  #[test]
  fn empty_probe_never_matches() {
    let policy = StaticLiveness::new(Bytes::new(), "pong", Duration::from_secs(1));
    assert!(!policy.is_probe(b""));
  }
}
