//! Shared fixtures for controller integration tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tapgate_controller::DeviceController;
use tapgate_core::{CardId, DeviceConfig, DeviceMode, EnrollmentTrigger};
use tapgate_hardware::mock::{
    MockAudio, MockConnector, MockNfcHandle, MockPin, PinLog, mock_outputs,
};
use tapgate_network::{AccessDecision, EnrollAck, RemoteAccessClient, RemoteCallError};

/// What the fake remote answers to one kind of call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Yes,
    No,
    Unreachable,
    Slow(Duration),
}

impl Reply {
    async fn resolve(self) -> Result<bool, RemoteCallError> {
        match self {
            Reply::Yes => Ok(true),
            Reply::No => Ok(false),
            Reply::Unreachable => Err(RemoteCallError::Connect("connection refused".into())),
            Reply::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Err(RemoteCallError::Timeout(
                    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                ))
            }
        }
    }
}

#[derive(Debug)]
struct RemoteState {
    access: Reply,
    enroll: Reply,
    temporary: Reply,
    calls: Vec<String>,
}

/// Scripted remote service recording every call.
#[derive(Debug, Clone)]
pub struct FakeRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RemoteState {
                access: Reply::Yes,
                enroll: Reply::Yes,
                temporary: Reply::Yes,
                calls: Vec::new(),
            })),
        }
    }

    pub fn access(self, reply: Reply) -> Self {
        self.state.lock().access = reply;
        self
    }

    pub fn enroll(self, reply: Reply) -> Self {
        self.state.lock().enroll = reply;
        self
    }

    pub fn temporary(self, reply: Reply) -> Self {
        self.state.lock().temporary = reply;
        self
    }

    /// Every call so far as `kind:card`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn calls_of(&self, kind: &str) -> usize {
        let prefix = format!("{kind}:");
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    fn record(&self, kind: &str, card: &CardId) -> (Reply, Reply, Reply) {
        let mut state = self.state.lock();
        state.calls.push(format!("{kind}:{card}"));
        (state.access, state.enroll, state.temporary)
    }
}

impl RemoteAccessClient for FakeRemote {
    async fn check_access(&self, card: &CardId) -> Result<AccessDecision, RemoteCallError> {
        let (reply, _, _) = self.record("entry", card);
        reply.resolve().await.map(|allowed| AccessDecision { allowed })
    }

    async fn enroll(&self, card: &CardId) -> Result<EnrollAck, RemoteCallError> {
        let (_, reply, _) = self.record("enroll", card);
        reply.resolve().await.map(|accepted| EnrollAck { accepted })
    }

    async fn enroll_temporary(&self, card: &CardId) -> Result<EnrollAck, RemoteCallError> {
        let (_, _, reply) = self.record("temporary", card);
        reply.resolve().await.map(|accepted| EnrollAck { accepted })
    }
}

pub type TestController = DeviceController<MockConnector, MockPin, MockAudio, FakeRemote>;

/// A controller over mocks, plus the handles tests drive it with.
pub struct Rig {
    pub controller: Arc<TestController>,
    pub nfc: MockNfcHandle,
    pub connector: MockConnector,
    pub pins: PinLog,
    pub audio: MockAudio,
    pub remote: FakeRemote,
}

impl Rig {
    /// Pin events recorded during bring-up are discarded.
    pub fn new(config: DeviceConfig, remote: FakeRemote) -> Self {
        Self::build(config, remote, |c| c, MockAudio::new())
    }

    pub fn with_connector(
        config: DeviceConfig,
        remote: FakeRemote,
        shape: impl FnOnce(MockConnector) -> MockConnector,
    ) -> Self {
        Self::build(config, remote, shape, MockAudio::new())
    }

    pub fn with_audio(config: DeviceConfig, remote: FakeRemote, audio: MockAudio) -> Self {
        Self::build(config, remote, |c| c, audio)
    }

    fn build(
        config: DeviceConfig,
        remote: FakeRemote,
        shape: impl FnOnce(MockConnector) -> MockConnector,
        audio: MockAudio,
    ) -> Self {
        let (connector, nfc) = MockConnector::new();
        let connector = shape(connector);
        let pins = PinLog::new();
        let controller = Arc::new(DeviceController::new(
            Arc::new(config),
            connector.clone(),
            mock_outputs(&pins),
            audio.clone(),
            remote.clone(),
        ));
        pins.clear();
        Self {
            controller,
            nfc,
            connector,
            pins,
            audio,
            remote,
        }
    }

    /// Boot the controller, panicking if bring-up fails.
    pub async fn booted(self) -> Self {
        self.controller.boot().await.unwrap();
        self
    }
}

pub fn reader_config() -> DeviceConfig {
    DeviceConfig {
        mode: DeviceMode::Reader,
        ..DeviceConfig::default()
    }
}

pub fn enroller_config(trigger: EnrollmentTrigger) -> DeviceConfig {
    DeviceConfig {
        mode: DeviceMode::Enroller,
        enrollment_trigger: trigger,
        ..DeviceConfig::default()
    }
}

pub const CARD: [u8; 4] = [0x04, 0xA3, 0xB2, 0xC1];
