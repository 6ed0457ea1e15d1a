//! Hardware layer of the Tapgate NFC access-control controller.
//!
//! This crate covers the physical side of one unit: the PN532 NFC reader
//! on I2C, the three indicator outputs (ok LED, fail LED, buzzer) and the
//! audio output used by the alarm. Every peripheral sits behind a trait so
//! the controller runs the same against the Raspberry Pi bindings and the
//! in-process mocks.
//!
//! # Layers
//!
//! - [`traits`]: `NfcTransceiver`, `NfcConnector`, `OutputPin`, `AudioOutput`
//! - [`pn532`]: frame codec and command driver over an [`pn532::I2cBus`]
//! - [`reader`]: [`CardReaderPeripheral`], bring-up retries and windowed reads
//! - [`indicator`]: [`IndicatorSignal`], the success, failure and listening cues
//! - [`audio`]: playback through `aplay`
//! - [`mock`]: simulated devices with test handles
//! - [`devices`]: enum dispatch over mock and hardware variants
//! - `rpi` (feature `hardware-rpi`): rppal-backed I2C and GPIO
//!
//! # Reading a card
//!
//! ```no_run
//! use tapgate_hardware::mock::MockConnector;
//! use tapgate_hardware::reader::{CardReaderPeripheral, ReaderTimings};
//! use std::time::Duration;
//!
//! # async fn example() -> tapgate_hardware::Result<()> {
//! let (connector, _handle) = MockConnector::new();
//! let mut reader = CardReaderPeripheral::new(connector, ReaderTimings::default());
//! reader.initialize(3).await?;
//!
//! match reader.read_card(Duration::from_secs(1)).await? {
//!     Some(card) => println!("card {card}"),
//!     None => println!("no card"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod devices;
pub mod error;
pub mod indicator;
pub mod mock;
pub mod pn532;
pub mod reader;
#[cfg(feature = "hardware-rpi")]
pub mod rpi;
pub mod traits;
pub mod types;

pub use error::{HardwareError, Result};
pub use indicator::{IndicatorOutputs, IndicatorSignal, Output};
pub use reader::{CardReaderPeripheral, ReaderTimings};
pub use traits::{AudioOutput, NfcConnector, NfcTransceiver, OutputPin};
pub use types::{FirmwareVersion, PeripheralState, ReaderHealth};
