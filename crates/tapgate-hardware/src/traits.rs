//! Hardware device trait definitions.
//!
//! These traits establish the contract between the controller and the
//! physical peripherals: the NFC transceiver (and the bus connector that
//! produces it), the binary indicator outputs, and the audio output. They
//! allow the controller to run unchanged against the PN532/GPIO bindings or
//! against the mocks in [`crate::mock`].
//!
//! Async methods are declared as `fn … -> impl Future<Output = …> + Send`
//! rather than `async fn` so that futures built on top of them can be
//! spawned on the multi-threaded Tokio runtime and served by axum.
//! Implementors can still write plain `async fn` in their `impl` blocks.

use crate::error::Result;
use crate::types::FirmwareVersion;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

/// A connected NFC transceiver (PN532 or compatible).
///
/// # Examples
///
/// ```no_run
/// use tapgate_hardware::traits::NfcTransceiver;
/// use std::time::Duration;
///
/// async fn poll_once<T: NfcTransceiver>(nfc: &mut T) -> tapgate_hardware::Result<()> {
///     nfc.configure().await?;
///     if let Some(uid) = nfc.read_passive_target(Duration::from_millis(500)).await? {
///         println!("card: {uid:02x?}");
///     }
///     Ok(())
/// }
/// ```
pub trait NfcTransceiver: Send {
    /// Put the transceiver in normal mode (PN532 `SAMConfiguration`).
    fn configure(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Query the firmware identity. Used as a liveness probe.
    fn firmware_version(&mut self) -> impl Future<Output = Result<FirmwareVersion>> + Send;

    /// Wait up to `timeout` for a passive ISO 14443A target and return its
    /// UID. `Ok(None)` means no card entered the field in time.
    ///
    /// # Errors
    ///
    /// Returns an error on bus failures or malformed responses. Callers treat
    /// these as transient.
    fn read_passive_target(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;
}

/// Acquires the bus and hands out a fresh transceiver.
///
/// Each bring-up attempt calls [`open`](NfcConnector::open) again, so a
/// failed attempt never leaves a half-configured handle behind.
pub trait NfcConnector: Send + Sync {
    type Transceiver: NfcTransceiver;

    /// Acquire the bus and wrap it in a transceiver.
    fn open(&self) -> Result<Self::Transceiver>;
}

/// A single binary output (LED, buzzer).
pub trait OutputPin: Send {
    fn set_high(&mut self) -> Result<()>;

    fn set_low(&mut self) -> Result<()>;
}

/// Audio output able to play a clip from disk.
pub trait AudioOutput: Send + Sync {
    /// Play `clip` to completion.
    ///
    /// # Errors
    ///
    /// Returns an error when the clip is missing or the player fails.
    fn play(&self, clip: &Path) -> impl Future<Output = Result<()>> + Send;
}
