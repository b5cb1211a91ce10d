// src/runtime/close_signal.rs

use tokio::sync::watch;

/// A one-shot, broadcastable event.
///
/// Once fired it stays fired. Any number of tasks may wait on it, before or
/// after the fire, and all of them complete. Firing again is a no-op.
#[derive(Debug)]
pub struct CloseSignal {
  // `true` once fired. The sender is kept alive by the signal itself so
  // waiters never observe a dropped channel while they hold `&self`.
  tx: watch::Sender<bool>,
}

impl CloseSignal {
  pub fn new() -> Self {
    let (tx, _rx) = watch::channel(false);
    Self { tx }
  }

  /// Fires the signal. Returns `true` only for the call that actually fired it.
  pub fn fire(&self) -> bool {
    self.tx.send_if_modified(|fired| {
      if *fired {
        false
      } else {
        *fired = true;
        true
      }
    })
  }

  pub fn is_fired(&self) -> bool {
    *self.tx.borrow()
  }

  /// Completes once the signal has fired (immediately if it already has).
  pub async fn fired(&self) {
    let mut rx = self.tx.subscribe();
    // wait_for checks the current value first, so a fire that happened
    // before subscribe() is still observed.
    let _ = rx.wait_for(|fired| *fired).await;
  }
}

impl Default for CloseSignal {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;
  use std::time::Duration;
  use tokio::time::timeout;

  #[tokio::test]
  async fn fires_exactly_once() {
    let signal = CloseSignal::new();
    assert!(!signal.is_fired());
    assert!(signal.fire());
    assert!(!signal.fire());
    assert!(!signal.fire());
    assert!(signal.is_fired());
  }

  #[test]
  fn pending_waiter_is_woken_by_fire() {
    let signal = CloseSignal::new();
    let mut waiter = tokio_test::task::spawn(signal.fired());
    tokio_test::assert_pending!(waiter.poll());

    signal.fire();
    assert!(waiter.is_woken());
    tokio_test::assert_ready!(waiter.poll());
  }

  #[tokio::test]
  async fn late_waiter_completes_immediately() {
    let signal = CloseSignal::new();
    signal.fire();
    timeout(Duration::from_millis(50), signal.fired())
      .await
      .expect("fired() should not block after fire");
  }

  #[tokio::test]
  async fn wakes_every_waiter() {
    let signal = Arc::new(CloseSignal::new());
    let mut waiters = Vec::new();
    for _ in 0..8 {
      let s = signal.clone();
      waiters.push(tokio::spawn(async move { s.fired().await }));
    }
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Racing fires from several tasks: only one may win.
    let mut firers = Vec::new();
    for _ in 0..4 {
      let s = signal.clone();
      firers.push(tokio::spawn(async move { s.fire() }));
    }
    let mut wins = 0;
    for f in firers {
      if f.await.unwrap() {
        wins += 1;
      }
    }
    assert_eq!(wins, 1);

    for w in waiters {
      timeout(Duration::from_millis(100), w)
        .await
        .expect("waiter should be released")
        .unwrap();
    }
  }
}
