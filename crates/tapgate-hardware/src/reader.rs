//! Card reader peripheral.
//!
//! Owns the transceiver lifecycle: bring-up with bounded retries, then
//! windowed polling that turns bus hiccups into a logged pause instead of a
//! failed read.

use crate::{
    error::{HardwareError, Result},
    traits::{NfcConnector, NfcTransceiver},
    types::{PeripheralState, ReaderHealth},
};
use std::time::Duration;
use tapgate_core::{CardId, DeviceConfig};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// Timing knobs for bring-up and polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderTimings {
    /// Pause after acquiring the bus, before the first command.
    pub bus_settle: Duration,

    /// Pause between failed bring-up attempts.
    pub init_backoff: Duration,

    /// Longest single `InListPassiveTarget` wait inside a read.
    pub poll_window: Duration,

    /// Pause after a transient read error.
    pub error_pause: Duration,
}

impl From<&DeviceConfig> for ReaderTimings {
    fn from(config: &DeviceConfig) -> Self {
        Self {
            bus_settle: config.bus_settle,
            init_backoff: config.init_backoff,
            poll_window: config.reads.poll_window,
            error_pause: config.reads.error_pause,
        }
    }
}

impl Default for ReaderTimings {
    fn default() -> Self {
        Self::from(&DeviceConfig::default())
    }
}

/// The NFC card reader.
pub struct CardReaderPeripheral<C: NfcConnector> {
    connector: C,
    device: Option<C::Transceiver>,
    state: PeripheralState,
    timings: ReaderTimings,
    consecutive_errors: u32,
    total_errors: u64,
}

impl<C: NfcConnector> CardReaderPeripheral<C> {
    pub fn new(connector: C, timings: ReaderTimings) -> Self {
        Self {
            connector,
            device: None,
            state: PeripheralState::Uninitialized,
            timings,
            consecutive_errors: 0,
            total_errors: 0,
        }
    }

    pub fn state(&self) -> PeripheralState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == PeripheralState::Ready
    }

    pub fn health(&self) -> ReaderHealth {
        ReaderHealth {
            state: self.state,
            consecutive_read_errors: self.consecutive_errors,
            total_read_errors: self.total_errors,
        }
    }

    /// Bring the transceiver up, trying at most `retry_count` times.
    ///
    /// Each attempt acquires the bus, waits for it to settle, configures the
    /// chip and probes its firmware. Attempts are separated by the init
    /// backoff; there is no pause after the last one.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InitializationExhausted`] once every attempt
    /// failed. The peripheral is then `Faulted`.
    pub async fn initialize(&mut self, retry_count: u32) -> Result<()> {
        let attempts = retry_count.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.try_initialize().await {
                Ok(device) => {
                    self.device = Some(device);
                    self.state = PeripheralState::Ready;
                    info!(attempt, "Card reader ready");
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "Card reader initialization attempt failed");
                    last_error = e.to_string();
                    if attempt < attempts {
                        sleep(self.timings.init_backoff).await;
                    }
                }
            }
        }

        self.device = None;
        self.state = PeripheralState::Faulted;
        Err(HardwareError::InitializationExhausted {
            attempts,
            last_error,
        })
    }

    async fn try_initialize(&mut self) -> Result<C::Transceiver> {
        let mut device = self.connector.open()?;
        sleep(self.timings.bus_settle).await;
        device.configure().await?;
        let firmware = device.firmware_version().await?;
        info!(%firmware, "Found NFC transceiver");
        Ok(device)
    }

    /// Wait up to `timeout` for a card and return its identifier.
    ///
    /// The wait is split into poll windows of at most `poll_window`.
    /// Transient errors are logged and followed by a short pause; they never
    /// end the read early. Returns `Ok(None)` when nothing valid was seen by
    /// the deadline.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::NotReady`] if the reader was never brought up
    /// or has faulted.
    pub async fn read_card(&mut self, timeout: Duration) -> Result<Option<CardId>> {
        if self.state != PeripheralState::Ready {
            return Err(HardwareError::not_ready(self.state));
        }
        let Some(device) = self.device.as_mut() else {
            return Err(HardwareError::not_ready(self.state));
        };

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            let window = remaining.min(self.timings.poll_window);

            let outcome = device
                .read_passive_target(window)
                .await
                .and_then(|uid| uid.map(CardId::from_bytes).transpose().map_err(|e| {
                    HardwareError::invalid_data(e.to_string())
                }));

            match outcome {
                Ok(Some(card)) => {
                    self.consecutive_errors = 0;
                    debug!(card = %card, "Card detected");
                    return Ok(Some(card));
                }
                Ok(None) => {
                    self.consecutive_errors = 0;
                }
                Err(e) => {
                    self.consecutive_errors = self.consecutive_errors.saturating_add(1);
                    self.total_errors = self.total_errors.saturating_add(1);
                    warn!(
                        error = %e,
                        consecutive = self.consecutive_errors,
                        "Card read error"
                    );
                    sleep(self.timings.error_pause).await;
                }
            }
        }
    }
}

impl<C: NfcConnector> std::fmt::Debug for CardReaderPeripheral<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardReaderPeripheral")
            .field("state", &self.state)
            .field("timings", &self.timings)
            .field("consecutive_errors", &self.consecutive_errors)
            .field("total_errors", &self.total_errors)
            .finish_non_exhaustive()
    }
}
