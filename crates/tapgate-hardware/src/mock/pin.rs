//! Mock output pins that record every level change.

use crate::{HardwareError, Result, indicator::IndicatorOutputs, traits::OutputPin};
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;
use tracing::debug;

/// One recorded level change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinEvent {
    pub pin: String,
    pub high: bool,
    pub at: Instant,
}

/// Shared record of pin events, in order.
#[derive(Debug, Clone, Default)]
pub struct PinLog {
    events: Arc<Mutex<Vec<PinEvent>>>,
}

impl PinLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PinEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Number of times `pin` was driven high.
    pub fn high_count(&self, pin: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.pin == pin && e.high)
            .count()
    }

    /// How long `pin` stayed high each time it was driven high and then low.
    pub fn held_for(&self, pin: &str) -> Vec<Duration> {
        let events = self.events.lock();
        let mut held = Vec::new();
        let mut since: Option<Instant> = None;
        for event in events.iter().filter(|e| e.pin == pin) {
            match (event.high, since) {
                (true, None) => since = Some(event.at),
                (false, Some(start)) => {
                    held.push(event.at - start);
                    since = None;
                }
                _ => {}
            }
        }
        held
    }

    /// Whether every recorded pin ended low.
    pub fn all_low(&self) -> bool {
        let events = self.events.lock();
        let mut last: Vec<(&str, bool)> = Vec::new();
        for event in events.iter() {
            match last.iter_mut().find(|(pin, _)| *pin == event.pin) {
                Some(entry) => entry.1 = event.high,
                None => last.push((event.pin.as_str(), event.high)),
            }
        }
        last.iter().all(|(_, high)| !high)
    }

    fn record(&self, pin: &str, high: bool) {
        self.events.lock().push(PinEvent {
            pin: pin.to_string(),
            high,
            at: Instant::now(),
        });
    }
}

/// Mock output pin.
#[derive(Debug)]
pub struct MockPin {
    name: String,
    log: PinLog,
    failing: bool,
}

impl MockPin {
    pub fn new(name: impl Into<String>, log: &PinLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            failing: false,
        }
    }

    /// Make every level change fail without being recorded.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn drive(&mut self, high: bool) -> Result<()> {
        if self.failing {
            return Err(HardwareError::communication(format!(
                "simulated GPIO failure on {}",
                self.name
            )));
        }
        debug!(pin = %self.name, high, "Mock pin level");
        self.log.record(&self.name, high);
        Ok(())
    }
}

impl OutputPin for MockPin {
    fn set_high(&mut self) -> Result<()> {
        self.drive(true)
    }

    fn set_low(&mut self) -> Result<()> {
        self.drive(false)
    }
}

/// Indicator outputs named `ok`, `fail` and `buzzer`, all recording to `log`.
pub fn mock_outputs(log: &PinLog) -> IndicatorOutputs<MockPin> {
    IndicatorOutputs {
        ok_led: MockPin::new("ok", log),
        fail_led: MockPin::new("fail", log),
        buzzer: MockPin::new("buzzer", log),
    }
}
