//! The device controller.
//!
//! Owns the reader and the indicator of one unit and runs exactly one of
//! the two mode loops:
//!
//! ```text
//! Reader:    ┌─> read_card(1 s) ─ None ──────────────────────────────┐
//!            │        │ Some(card)                                   │
//!            │        └─> check_access ─> signal(outcome) ─> cooldown┤
//!            └───────────────────────────────────────────────────────┘
//!
//! Enroller (server trigger):
//!            POST /api ─> listening cue ─> read_card(10 s) ─> enroll ─> signal
//!
//! Enroller (auto-capture):
//!            ┌─> read_card(10 s) ─ None ─> pause ──────────────────────┐
//!            │        │ Some(card)                                     │
//!            │        └─> enroll_temporary ─> signal ─> cooldown ──────┤
//!            └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every card event produces exactly one indicator cue, played only after
//! the remote outcome is known. Remote failures always count as a failure.

use crate::error::{ControllerError, ControllerResult};
use crate::state_machine::{ControllerState, StateMachine, StateTransition};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tapgate_core::{CardId, DeviceConfig, DeviceMode, EnrollmentTrigger, IndicatorOutcome};
use tapgate_hardware::{
    AudioOutput, CardReaderPeripheral, HardwareError, IndicatorOutputs, IndicatorSignal,
    NfcConnector, OutputPin, ReaderHealth, ReaderTimings,
};
use tapgate_network::{
    CommandError, CommandServer, CommandServerConfig, CommandSurface, EnrolledCard,
    RemoteAccessClient,
};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Outcome of one completed card event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardEvent {
    pub card: CardId,
    pub outcome: IndicatorOutcome,
}

/// Controller of one access-control unit.
pub struct DeviceController<C, P, A, R>
where
    C: NfcConnector,
    P: OutputPin,
{
    config: Arc<DeviceConfig>,
    reader: tokio::sync::Mutex<CardReaderPeripheral<C>>,
    indicator: IndicatorSignal<P>,
    audio: A,
    remote: R,
    machine: Mutex<StateMachine>,
    enrollment_gate: tokio::sync::Mutex<()>,
    shutdown: CancellationToken,
}

impl<C, P, A, R> DeviceController<C, P, A, R>
where
    C: NfcConnector + 'static,
    P: OutputPin + 'static,
    A: AudioOutput + 'static,
    R: RemoteAccessClient + 'static,
{
    pub fn new(
        config: Arc<DeviceConfig>,
        connector: C,
        outputs: IndicatorOutputs<P>,
        audio: A,
        remote: R,
    ) -> Self {
        let reader = CardReaderPeripheral::new(connector, ReaderTimings::from(config.as_ref()));
        let indicator = IndicatorSignal::new(outputs, config.cues);
        Self {
            config,
            reader: tokio::sync::Mutex::new(reader),
            indicator,
            audio,
            remote,
            machine: Mutex::new(StateMachine::new()),
            enrollment_gate: tokio::sync::Mutex::new(()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn state(&self) -> ControllerState {
        self.machine.lock().current_state()
    }

    pub fn history(&self) -> Vec<StateTransition> {
        self.machine.lock().history().iter().cloned().collect()
    }

    pub async fn reader_health(&self) -> ReaderHealth {
        self.reader.lock().await.health()
    }

    /// Token that stops the controller when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop the loops at their next await point and release the outputs.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.indicator.cleanup();
    }

    fn enter(&self, to: ControllerState) -> ControllerResult<()> {
        let transition = self.machine.lock().transition_to(to)?;
        debug!(from = %transition.from, to = %transition.to, "State transition");
        Ok(())
    }

    /// Enter `Faulted` and release the outputs.
    fn fault(&self, reason: &HardwareError) {
        if let Err(e) = self.enter(ControllerState::Faulted) {
            error!(error = %e, "Could not record fault");
        }
        error!(error = %reason, "Reader faulted");
        self.indicator.cleanup();
    }

    /// Bring up the reader.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::PeripheralInit`] once every attempt failed.
    /// The controller is then `Faulted` and its outputs are released.
    pub async fn boot(&self) -> ControllerResult<()> {
        info!(mode = %self.config.mode, "Booting controller");
        let result = self
            .reader
            .lock()
            .await
            .initialize(self.config.retry_count)
            .await;
        match result {
            Ok(()) => {
                self.enter(ControllerState::Idle)?;
                info!("Controller ready");
                Ok(())
            }
            Err(e) => {
                self.fault(&e);
                Err(ControllerError::PeripheralInit(e))
            }
        }
    }

    /// Run the configured mode until shutdown or a fatal fault. Releases
    /// the outputs before returning.
    pub async fn run(self: Arc<Self>) -> ControllerResult<()> {
        let result = match self.config.mode {
            DeviceMode::Reader => self.run_verification_loop().await,
            DeviceMode::Enroller => self.run_enroller().await,
        };
        self.indicator.cleanup();
        match &result {
            Ok(()) => info!("Controller stopped"),
            Err(e) => error!(error = %e, "Controller stopped with error"),
        }
        result
    }

    /// Reader mode: verify cards until shutdown.
    pub async fn run_verification_loop(&self) -> ControllerResult<()> {
        info!("Verification loop started");
        while !self.shutdown.is_cancelled() {
            if let Some(event) = self.verify_once().await? {
                debug!(card_id = %event.card, outcome = %event.outcome, "Verification event");
            }
        }
        Ok(())
    }

    /// One verification cycle: read window, remote check, cue, cooldown.
    ///
    /// Returns `Ok(None)` when no card was presented or shutdown interrupted
    /// the read.
    pub async fn verify_once(&self) -> ControllerResult<Option<CardEvent>> {
        let reads = self.config.reads;
        self.enter(ControllerState::Verifying)?;

        let read = {
            let mut reader = self.reader.lock().await;
            tokio::select! {
                _ = self.shutdown.cancelled() => None,
                read = reader.read_card(reads.verify_read_timeout) => Some(read),
            }
        };
        let card = match read {
            None | Some(Ok(None)) => {
                self.enter(ControllerState::Idle)?;
                return Ok(None);
            }
            Some(Err(e)) => {
                self.read_failed(e)?;
                return Ok(None);
            }
            Some(Ok(Some(card))) => card,
        };

        self.enter(ControllerState::Signaling)?;
        let outcome = match self.remote.check_access(&card).await {
            Ok(decision) => IndicatorOutcome::from_granted(decision.allowed),
            Err(e) => {
                warn!(card_id = %card, error = %e, "Access check failed, denying");
                IndicatorOutcome::Failure
            }
        };
        info!(card_id = %card, %outcome, "Access decision");
        self.indicator.signal(outcome).await;

        self.pause(reads.verify_cooldown).await;
        self.enter(ControllerState::Idle)?;
        Ok(Some(CardEvent { card, outcome }))
    }

    /// Enroller mode: serve the command surface and, with auto-capture,
    /// run the capture loop.
    async fn run_enroller(self: &Arc<Self>) -> ControllerResult<()> {
        let server =
            CommandServer::bind(CommandServerConfig::on_port(self.config.command_port)).await?;
        let server_shutdown = self.shutdown.child_token();
        let mut server_task = tokio::spawn(server.serve(Arc::clone(self), server_shutdown.clone()));

        let driver = async {
            match self.config.enrollment_trigger {
                EnrollmentTrigger::Server => {
                    info!("Waiting for enrollment triggers");
                    self.shutdown.cancelled().await;
                    Ok(())
                }
                EnrollmentTrigger::AutoCapture => self.run_auto_capture_loop().await,
            }
        };

        let result = tokio::select! {
            result = driver => result,
            joined = &mut server_task => {
                return match joined {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e.into()),
                    Err(e) => Err(ControllerError::Task(e.to_string())),
                };
            }
        };

        server_shutdown.cancel();
        match server_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Command surface ended with error"),
            Err(e) => warn!(error = %e, "Command surface task failed"),
        }
        result
    }

    /// Auto-capture: enroll every presented card as a temporary user.
    pub async fn run_auto_capture_loop(&self) -> ControllerResult<()> {
        info!("Auto-capture loop started");
        while !self.shutdown.is_cancelled() {
            if let Some(event) = self.capture_once().await? {
                debug!(card_id = %event.card, outcome = %event.outcome, "Capture event");
            }
        }
        Ok(())
    }

    /// One auto-capture cycle.
    ///
    /// The cue reports what the remote service said: success only when the
    /// temporary enrollment was accepted.
    pub async fn capture_once(&self) -> ControllerResult<Option<CardEvent>> {
        let reads = self.config.reads;
        self.enter(ControllerState::EnrollingWait)?;

        let read = {
            let mut reader = self.reader.lock().await;
            tokio::select! {
                _ = self.shutdown.cancelled() => None,
                read = reader.read_card(reads.enroll_read_timeout) => Some(read),
            }
        };
        let card = match read {
            None => {
                self.enter(ControllerState::Idle)?;
                return Ok(None);
            }
            Some(Ok(None)) => {
                self.enter(ControllerState::Idle)?;
                self.pause(reads.auto_capture_idle_pause).await;
                return Ok(None);
            }
            Some(Err(e)) => {
                self.read_failed(e)?;
                return Ok(None);
            }
            Some(Ok(Some(card))) => card,
        };

        self.enter(ControllerState::Signaling)?;
        let outcome = match self.remote.enroll_temporary(&card).await {
            Ok(ack) => IndicatorOutcome::from_granted(ack.accepted),
            Err(e) => {
                warn!(card_id = %card, error = %e, "Temporary enrollment failed");
                IndicatorOutcome::Failure
            }
        };
        info!(card_id = %card, %outcome, "Temporary enrollment");
        self.indicator.signal(outcome).await;

        self.pause(reads.auto_capture_cooldown).await;
        self.enter(ControllerState::Idle)?;
        Ok(Some(CardEvent { card, outcome }))
    }

    /// Server-triggered enrollment: listening cue, read window, remote
    /// enrollment, cue.
    ///
    /// # Errors
    ///
    /// - [`CommandError::Disabled`] in auto-capture configuration
    /// - [`CommandError::Busy`] while another enrollment runs
    /// - [`CommandError::ReadTimeout`] when no card was presented
    /// - [`CommandError::RemoteEnrollFailed`] when the remote service did not accept
    /// - [`CommandError::Hardware`] when the reader is not usable
    pub async fn enroll_once(&self) -> Result<EnrolledCard, CommandError> {
        if self.config.enrollment_trigger == EnrollmentTrigger::AutoCapture {
            return Err(CommandError::Disabled(
                "Enrollment is driven by auto-capture on this unit".to_string(),
            ));
        }
        let Ok(_gate) = self.enrollment_gate.try_lock() else {
            return Err(CommandError::Busy);
        };
        match self.state() {
            ControllerState::Idle => {}
            state => {
                return Err(CommandError::Hardware(format!(
                    "Controller is not ready (state: {state})"
                )));
            }
        }

        let timeout = self.config.reads.enroll_read_timeout;
        let read = {
            let mut reader = self.reader.lock().await;
            self.enter(ControllerState::EnrollingWait)?;
            self.indicator.start_enrollment_indicator().await;
            reader.read_card(timeout).await
        };

        let card = match read {
            Ok(Some(card)) => card,
            Ok(None) => {
                info!("Enrollment read window closed without a card");
                self.enter(ControllerState::Signaling)?;
                self.indicator.signal(IndicatorOutcome::Failure).await;
                self.enter(ControllerState::Idle)?;
                let waited_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                return Err(CommandError::ReadTimeout(waited_ms));
            }
            Err(e) => {
                let message = e.to_string();
                self.read_failed(e)?;
                return Err(CommandError::Hardware(message));
            }
        };

        self.enter(ControllerState::Signaling)?;
        let result = match self.remote.enroll(&card).await {
            Ok(ack) if ack.accepted => Ok(EnrolledCard { card_id: card.clone() }),
            Ok(_) => Err(CommandError::RemoteEnrollFailed(
                "Remote service refused the card".to_string(),
            )),
            Err(e) => Err(CommandError::RemoteEnrollFailed(e.to_string())),
        };
        let outcome = IndicatorOutcome::from_granted(result.is_ok());
        match &result {
            Ok(_) => info!(card_id = %card, "Card enrolled"),
            Err(e) => warn!(card_id = %card, error = %e, "Enrollment failed"),
        }
        self.indicator.signal(outcome).await;
        self.enter(ControllerState::Idle)?;
        result
    }

    /// Sound the buzzer test tone.
    pub async fn test_tone(&self) -> Result<(), CommandError> {
        if self.indicator.is_released() {
            return Err(CommandError::Hardware(
                "Indicator outputs are released".to_string(),
            ));
        }
        self.indicator.beep(self.config.test_tone).await;
        Ok(())
    }

    /// Play the configured alarm clip.
    pub async fn play_alarm(&self) -> Result<(), CommandError> {
        let clip = &self.config.alarm_clip;
        self.audio.play(clip).await.map_err(|e| {
            warn!(clip = %clip.display(), error = %e, "Alarm playback failed");
            CommandError::Hardware(e.to_string())
        })
    }

    /// Classify a read error. Fatal errors fault the controller and are
    /// returned; anything else ends the cycle and returns to `Idle`.
    fn read_failed(&self, error: HardwareError) -> ControllerResult<()> {
        if error.is_fatal() {
            self.fault(&error);
            return Err(ControllerError::PeripheralFault(error));
        }
        warn!(error = %error, "Card read failed");
        self.enter(ControllerState::Idle)
    }

    /// Sleep for `duration` unless shutdown comes first.
    async fn pause(&self, duration: Duration) {
        tokio::select! {
            _ = self.shutdown.cancelled() => {}
            _ = sleep(duration) => {}
        }
    }
}

impl<C, P, A, R> CommandSurface for DeviceController<C, P, A, R>
where
    C: NfcConnector + 'static,
    P: OutputPin + 'static,
    A: AudioOutput + 'static,
    R: RemoteAccessClient + 'static,
{
    async fn trigger_enrollment(&self) -> Result<EnrolledCard, CommandError> {
        self.enroll_once().await
    }

    async fn test_tone(&self) -> Result<(), CommandError> {
        DeviceController::test_tone(self).await
    }

    async fn play_alarm(&self) -> Result<(), CommandError> {
        DeviceController::play_alarm(self).await
    }
}

impl<C, P, A, R> std::fmt::Debug for DeviceController<C, P, A, R>
where
    C: NfcConnector,
    P: OutputPin,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceController")
            .field("mode", &self.config.mode)
            .field("state", &self.machine.lock().current_state())
            .field("cancelled", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}
