// src/runtime/liveness_clock.rs

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Last-liveness timestamp shared between the read task (writer) and the
/// write task (reader).
///
/// Stored as nanoseconds since a fixed origin so it fits in an atomic. Updates
/// use `fetch_max`, so the timestamp never moves backwards even if two
/// refreshes race.
#[derive(Debug)]
pub struct LivenessClock {
  origin: Instant,
  last_nanos: AtomicU64,
}

impl LivenessClock {
  pub fn new() -> Self {
    Self {
      origin: Instant::now(),
      last_nanos: AtomicU64::new(0),
    }
  }

  /// Records liveness at the current instant.
  pub fn touch(&self) {
    let now = Instant::now().saturating_duration_since(self.origin).as_nanos() as u64;
    self.last_nanos.fetch_max(now, Ordering::AcqRel);
  }

  /// The instant of the most recent refresh.
  pub fn last(&self) -> Instant {
    self.origin + Duration::from_nanos(self.last_nanos.load(Ordering::Acquire))
  }

  pub fn elapsed(&self) -> Duration {
    Instant::now().saturating_duration_since(self.last())
  }

  /// True once strictly more than `timeout` has passed since the last refresh.
  pub fn is_expired(&self, timeout: Duration) -> bool {
    self.elapsed() > timeout
  }
}

impl Default for LivenessClock {
  fn default() -> Self {
    Self::new()
  }
}
