//! Mock device implementations for testing and development.
//!
//! These simulate the NFC transceiver, the raw I2C bus, the indicator pins
//! and the audio output so the controller can run without a Raspberry Pi.
//! Every mock comes with a cloneable handle or log for driving and
//! observing it from a test.

pub mod audio;
pub mod i2c;
pub mod nfc;
pub mod pin;

pub use audio::MockAudio;
pub use i2c::{MockI2cBus, MockI2cHandle};
pub use nfc::{MockConnector, MockNfc, MockNfcHandle};
pub use pin::{MockPin, PinEvent, PinLog, mock_outputs};
