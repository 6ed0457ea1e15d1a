//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits is not object-safe, so the binary cannot pick
//! between the simulated and the Raspberry Pi peripherals with `Box<dyn _>`.
//! These enums give it one concrete type per peripheral instead, with the
//! hardware variants behind the `hardware-rpi` feature.
//!
//! # Examples
//!
//! ```
//! use tapgate_hardware::devices::AnyNfcConnector;
//! use tapgate_hardware::mock::MockConnector;
//!
//! let (connector, _handle) = MockConnector::new();
//! let any_connector = AnyNfcConnector::Mock(connector);
//! ```

use crate::{
    Result,
    audio::AplayAudio,
    mock::{MockAudio, MockConnector, MockNfc, MockPin},
    traits::{AudioOutput, NfcConnector, NfcTransceiver, OutputPin},
    types::FirmwareVersion,
};
use std::{path::Path, time::Duration};

#[cfg(feature = "hardware-rpi")]
use crate::{
    pn532::Pn532,
    rpi::{GpioPin, RppalConnector, RppalI2c},
};

/// Any NFC connector.
#[derive(Debug, Clone)]
pub enum AnyNfcConnector {
    Mock(MockConnector),
    #[cfg(feature = "hardware-rpi")]
    Rpi(RppalConnector),
}

/// Transceiver opened by an [`AnyNfcConnector`].
#[derive(Debug)]
pub enum AnyNfcTransceiver {
    Mock(MockNfc),
    #[cfg(feature = "hardware-rpi")]
    Pn532(Pn532<RppalI2c>),
}

impl NfcConnector for AnyNfcConnector {
    type Transceiver = AnyNfcTransceiver;

    fn open(&self) -> Result<AnyNfcTransceiver> {
        match self {
            Self::Mock(connector) => connector.open().map(AnyNfcTransceiver::Mock),
            #[cfg(feature = "hardware-rpi")]
            Self::Rpi(connector) => connector.open().map(AnyNfcTransceiver::Pn532),
        }
    }
}

impl NfcTransceiver for AnyNfcTransceiver {
    async fn configure(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.configure().await,
            #[cfg(feature = "hardware-rpi")]
            Self::Pn532(device) => device.configure().await,
        }
    }

    async fn firmware_version(&mut self) -> Result<FirmwareVersion> {
        match self {
            Self::Mock(device) => device.firmware_version().await,
            #[cfg(feature = "hardware-rpi")]
            Self::Pn532(device) => device.firmware_version().await,
        }
    }

    async fn read_passive_target(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        match self {
            Self::Mock(device) => device.read_passive_target(timeout).await,
            #[cfg(feature = "hardware-rpi")]
            Self::Pn532(device) => device.read_passive_target(timeout).await,
        }
    }
}

/// Any indicator output pin.
#[derive(Debug)]
pub enum AnyOutputPin {
    Mock(MockPin),
    #[cfg(feature = "hardware-rpi")]
    Gpio(GpioPin),
}

impl OutputPin for AnyOutputPin {
    fn set_high(&mut self) -> Result<()> {
        match self {
            Self::Mock(pin) => pin.set_high(),
            #[cfg(feature = "hardware-rpi")]
            Self::Gpio(pin) => pin.set_high(),
        }
    }

    fn set_low(&mut self) -> Result<()> {
        match self {
            Self::Mock(pin) => pin.set_low(),
            #[cfg(feature = "hardware-rpi")]
            Self::Gpio(pin) => pin.set_low(),
        }
    }
}

/// Any audio output.
#[derive(Debug, Clone)]
pub enum AnyAudioOutput {
    Aplay(AplayAudio),
    Mock(MockAudio),
}

impl AudioOutput for AnyAudioOutput {
    async fn play(&self, clip: &Path) -> Result<()> {
        match self {
            Self::Aplay(audio) => audio.play(clip).await,
            Self::Mock(audio) => audio.play(clip).await,
        }
    }
}
