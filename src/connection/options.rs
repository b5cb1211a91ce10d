// src/connection/options.rs

use std::time::Duration;

use crate::connection::events::DEFAULT_MONITOR_CAPACITY;
use crate::dispatch::DEFAULT_DELIVERY_TIMEOUT;
use crate::error::WsError;
use crate::runtime::{DEFAULT_INBOUND_CAPACITY, DEFAULT_OUTBOUND_CAPACITY};

/// Per-connection settings, fixed when the connection is created.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
  // Queue bounds (transport -> application, application -> dispatcher)
  pub inbound_capacity: usize,
  pub outbound_capacity: usize,
  /// Upper bound for each recipient write made by this connection's dispatcher.
  pub delivery_timeout: Duration,
  /// When set, every inbound frame refreshes liveness, not only probes.
  pub data_refreshes_liveness: bool,
  /// Capacity of the monitor event channel. Events beyond it are dropped.
  pub monitor_capacity: usize,
}

impl Default for ConnectionOptions {
  fn default() -> Self {
    Self {
      inbound_capacity: DEFAULT_INBOUND_CAPACITY,
      outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
      delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
      data_refreshes_liveness: false,
      monitor_capacity: DEFAULT_MONITOR_CAPACITY,
    }
  }
}

impl ConnectionOptions {
  pub fn with_inbound_capacity(mut self, capacity: usize) -> Self {
    self.inbound_capacity = capacity;
    self
  }

  pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
    self.outbound_capacity = capacity;
    self
  }

  pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
    self.delivery_timeout = timeout;
    self
  }

  pub fn with_data_refreshes_liveness(mut self, enabled: bool) -> Self {
    self.data_refreshes_liveness = enabled;
    self
  }

  pub fn with_monitor_capacity(mut self, capacity: usize) -> Self {
    self.monitor_capacity = capacity;
    self
  }

  pub(crate) fn validate(&self) -> Result<(), WsError> {
    if self.inbound_capacity == 0 {
      return Err(WsError::InvalidArgument("inbound_capacity must be at least 1".into()));
    }
    if self.outbound_capacity == 0 {
      return Err(WsError::InvalidArgument("outbound_capacity must be at least 1".into()));
    }
    if self.delivery_timeout.is_zero() {
      return Err(WsError::InvalidArgument("delivery_timeout must be non-zero".into()));
    }
    if self.monitor_capacity == 0 {
      return Err(WsError::InvalidArgument("monitor_capacity must be at least 1".into()));
    }
    Ok(())
  }
}
