//! Indicator outputs: ok LED, fail LED and buzzer.
//!
//! Cues are timed sequences over the three outputs. Only one cue runs at a
//! time; a second caller waits for the first to finish. Output errors are
//! logged and otherwise ignored, so a dead LED never stalls an access
//! decision.

use crate::traits::OutputPin;
use parking_lot::Mutex;
use std::{fmt, time::Duration};
use tapgate_core::{CueTimings, IndicatorOutcome};
use tokio::time::sleep;
use tracing::{debug, warn};

/// One of the three indicator outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Output {
    OkLed,
    FailLed,
    Buzzer,
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OkLed => write!(f, "ok_led"),
            Self::FailLed => write!(f, "fail_led"),
            Self::Buzzer => write!(f, "buzzer"),
        }
    }
}

/// The three pins driven by [`IndicatorSignal`].
#[derive(Debug)]
pub struct IndicatorOutputs<P> {
    pub ok_led: P,
    pub fail_led: P,
    pub buzzer: P,
}

impl<P: OutputPin> IndicatorOutputs<P> {
    fn pin_mut(&mut self, output: Output) -> &mut P {
        match output {
            Output::OkLed => &mut self.ok_led,
            Output::FailLed => &mut self.fail_led,
            Output::Buzzer => &mut self.buzzer,
        }
    }
}

/// Drives the indicator cues.
pub struct IndicatorSignal<P: OutputPin> {
    outputs: Mutex<Option<IndicatorOutputs<P>>>,
    cue: tokio::sync::Mutex<()>,
    timings: CueTimings,
}

impl<P: OutputPin> IndicatorSignal<P> {
    /// Take ownership of the outputs and drive them all low.
    pub fn new(outputs: IndicatorOutputs<P>, timings: CueTimings) -> Self {
        let signal = Self {
            outputs: Mutex::new(Some(outputs)),
            cue: tokio::sync::Mutex::new(()),
            timings,
        };
        for output in [Output::OkLed, Output::FailLed, Output::Buzzer] {
            signal.set(output, false);
        }
        signal
    }

    pub fn timings(&self) -> &CueTimings {
        &self.timings
    }

    /// Whether [`cleanup`](Self::cleanup) already released the outputs.
    pub fn is_released(&self) -> bool {
        self.outputs.lock().is_none()
    }

    /// Play the cue for `outcome`.
    ///
    /// Success: one short beep, then the ok LED for the success hold time.
    /// Failure: `failure_repeat` times a short beep, a fail-LED flash and a
    /// pause.
    pub async fn signal(&self, outcome: IndicatorOutcome) {
        let _cue = self.cue.lock().await;
        debug!(%outcome, "Indicator cue");
        match outcome {
            IndicatorOutcome::Success => {
                self.pulse(Output::Buzzer, self.timings.beep).await;
                self.pulse(Output::OkLed, self.timings.success_led).await;
            }
            IndicatorOutcome::Failure => {
                for _ in 0..self.timings.failure_repeat {
                    self.pulse(Output::Buzzer, self.timings.beep).await;
                    self.pulse(Output::FailLed, self.timings.failure_led).await;
                    sleep(self.timings.failure_pause).await;
                }
            }
        }
    }

    /// Brief ok-LED flash telling the user to present a card.
    pub async fn start_enrollment_indicator(&self) {
        let _cue = self.cue.lock().await;
        self.pulse(Output::OkLed, self.timings.listening_led).await;
    }

    /// Sound the buzzer for `duration`.
    pub async fn beep(&self, duration: Duration) {
        let _cue = self.cue.lock().await;
        self.pulse(Output::Buzzer, duration).await;
    }

    /// Drive every output low and release the pins.
    ///
    /// Safe to call any number of times, also while a cue is running: the
    /// remaining steps of that cue become no-ops.
    pub fn cleanup(&self) {
        let Some(mut outputs) = self.outputs.lock().take() else {
            return;
        };
        for output in [Output::OkLed, Output::FailLed, Output::Buzzer] {
            if let Err(e) = outputs.pin_mut(output).set_low() {
                warn!(%output, error = %e, "Failed to drive output low during cleanup");
            }
        }
        debug!("Indicator outputs released");
    }

    async fn pulse(&self, output: Output, duration: Duration) {
        self.set(output, true);
        sleep(duration).await;
        self.set(output, false);
    }

    fn set(&self, output: Output, high: bool) {
        let mut guard = self.outputs.lock();
        let Some(outputs) = guard.as_mut() else {
            return;
        };
        let pin = outputs.pin_mut(output);
        let result = if high { pin.set_high() } else { pin.set_low() };
        if let Err(e) = result {
            warn!(%output, high, error = %e, "Indicator output error");
        }
    }
}

impl<P: OutputPin> Drop for IndicatorSignal<P> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl<P: OutputPin> fmt::Debug for IndicatorSignal<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicatorSignal")
            .field("released", &self.is_released())
            .field("timings", &self.timings)
            .finish_non_exhaustive()
    }
}
