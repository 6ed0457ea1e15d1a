//! PN532 NFC transceiver over I2C.
//!
//! The PN532 speaks the PN53x host-controller protocol: every command is an
//! information frame carrying `D4 <command> <params…>`, acknowledged by an
//! ACK frame and answered by `D5 <command + 1> <data…>`. Over I2C each read
//! from the chip starts with a status byte that is `0x01` once a frame is
//! waiting.
//!
//! ```text
//! host                         PN532
//!  │  00 00 FF LEN LCS D4 CMD … DCS 00  │
//!  ├──────────────────────────────────►│
//!  │  [01] 00 00 FF 00 FF 00 (ACK)       │
//!  │◄──────────────────────────────────┤
//!  │  [01] 00 00 FF LEN LCS D5 CMD+1 …   │
//!  │◄──────────────────────────────────┤
//! ```
//!
//! [`frame`] holds the pure codec; [`Pn532`] drives it over an [`I2cBus`].

pub mod driver;
pub mod frame;

pub use driver::Pn532;

use crate::error::Result;

/// `GetFirmwareVersion` command code.
pub const CMD_GET_FIRMWARE_VERSION: u8 = 0x02;

/// `SAMConfiguration` command code.
pub const CMD_SAM_CONFIGURATION: u8 = 0x14;

/// `InListPassiveTarget` command code.
pub const CMD_IN_LIST_PASSIVE_TARGET: u8 = 0x4A;

/// SAM normal mode, 50 ms * 20 = 1 s virtual card timeout, use IRQ pin.
pub const SAM_NORMAL_MODE_PARAMS: [u8; 3] = [0x01, 0x14, 0x01];

/// Baud rate / modulation for ISO 14443A at 106 kbps.
pub const BRTY_ISO14443A_106: u8 = 0x00;

/// Status byte reported by the PN532 when a frame is ready to be read.
pub const I2C_READY: u8 = 0x01;

/// Raw I2C access to the PN532.
///
/// The slave address is fixed when the bus is opened; `write` and `read`
/// each perform one complete I2C transaction.
pub trait I2cBus: Send {
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    fn read(&mut self, buffer: &mut [u8]) -> Result<()>;
}
