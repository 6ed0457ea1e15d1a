//! Mock NFC transceiver and connector.

use crate::{
    HardwareError, Result,
    traits::{NfcConnector, NfcTransceiver},
    types::FirmwareVersion,
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};
use tokio::sync::{Mutex, mpsc};

/// Something that happens in the mock reader's field.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NfcEvent {
    /// A card with this raw UID is presented.
    Card(Vec<u8>),

    /// The next poll fails with a transient error.
    Error(String),
}

/// State shared by the connector and every transceiver it opens.
#[derive(Debug)]
struct Shared {
    events: Mutex<mpsc::UnboundedReceiver<NfcEvent>>,
    opens: AtomicU32,
    failing_opens: AtomicU32,
    failing_configures: AtomicU32,
    firmware: FirmwareVersion,
}

/// Consume one unit of a "fail the next n" budget.
fn take_failure(budget: &AtomicU32) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Mock bus connector handing out [`MockNfc`] transceivers.
///
/// # Examples
///
/// ```
/// use tapgate_hardware::mock::MockConnector;
/// use tapgate_hardware::reader::{CardReaderPeripheral, ReaderTimings};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> tapgate_hardware::Result<()> {
///     let (connector, handle) = MockConnector::new();
///     let mut reader = CardReaderPeripheral::new(connector, ReaderTimings::default());
///     reader.initialize(3).await?;
///
///     handle.present_card(vec![0x04, 0xAB, 0xCD, 0xEF]);
///     let card = reader.read_card(Duration::from_secs(1)).await?;
///     assert_eq!(card.unwrap().to_hex(), "04abcdef");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockConnector {
    shared: Arc<Shared>,
}

impl MockConnector {
    /// Create a connector that always comes up, plus the handle that feeds
    /// its field.
    pub fn new() -> (Self, MockNfcHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = Self {
            shared: Arc::new(Shared {
                events: Mutex::new(rx),
                opens: AtomicU32::new(0),
                failing_opens: AtomicU32::new(0),
                failing_configures: AtomicU32::new(0),
                firmware: FirmwareVersion::new(0x32, 1, 6, 0x07),
            }),
        };
        (connector, MockNfcHandle { tx })
    }

    /// Fail the next `count` bus acquisitions.
    pub fn failing_opens(self, count: u32) -> Self {
        self.shared.failing_opens.store(count, Ordering::SeqCst);
        self
    }

    /// Fail the next `count` SAM configurations.
    pub fn failing_configures(self, count: u32) -> Self {
        self.shared.failing_configures.store(count, Ordering::SeqCst);
        self
    }

    /// Number of `open` calls so far, i.e. bring-up attempts.
    pub fn open_count(&self) -> u32 {
        self.shared.opens.load(Ordering::SeqCst)
    }
}

impl NfcConnector for MockConnector {
    type Transceiver = MockNfc;

    fn open(&self) -> Result<MockNfc> {
        self.shared.opens.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.shared.failing_opens) {
            return Err(HardwareError::initialization_failed(
                "simulated I2C bus acquisition failure",
            ));
        }
        Ok(MockNfc {
            shared: Arc::clone(&self.shared),
        })
    }
}

/// Mock NFC transceiver.
///
/// A poll returns the next queued card or error immediately; with nothing
/// queued it waits out the whole window and reports no card.
#[derive(Debug)]
pub struct MockNfc {
    shared: Arc<Shared>,
}

impl NfcTransceiver for MockNfc {
    async fn configure(&mut self) -> Result<()> {
        if take_failure(&self.shared.failing_configures) {
            return Err(HardwareError::communication(
                "simulated SAM configuration failure",
            ));
        }
        Ok(())
    }

    async fn firmware_version(&mut self) -> Result<FirmwareVersion> {
        Ok(self.shared.firmware)
    }

    async fn read_passive_target(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let mut events = self.shared.events.lock().await;
        match tokio::time::timeout(timeout, events.recv()).await {
            Ok(Some(NfcEvent::Card(uid))) => Ok(Some(uid)),
            Ok(Some(NfcEvent::Error(message))) => Err(HardwareError::communication(message)),
            Ok(None) => Err(HardwareError::disconnected("mock NFC field closed")),
            Err(_) => Ok(None),
        }
    }
}

/// Handle for feeding a mock reader's field.
#[derive(Debug, Clone)]
pub struct MockNfcHandle {
    tx: mpsc::UnboundedSender<NfcEvent>,
}

impl MockNfcHandle {
    /// Queue a card for the next poll.
    pub fn present_card(&self, uid: impl Into<Vec<u8>>) {
        let _ = self.tx.send(NfcEvent::Card(uid.into()));
    }

    /// Make the next poll fail with a transient error.
    pub fn inject_error(&self, message: impl Into<String>) {
        let _ = self.tx.send(NfcEvent::Error(message.into()));
    }
}
