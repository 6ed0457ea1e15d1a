//! Common types shared across hardware device implementations.

use std::fmt;

/// Firmware identity reported by a PN53x transceiver.
///
/// Returned by the `GetFirmwareVersion` probe that closes every bring-up
/// attempt. A PN532 reports `ic = 0x32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    /// IC identifier (0x32 for the PN532).
    pub ic: u8,

    /// Firmware version.
    pub version: u8,

    /// Firmware revision.
    pub revision: u8,

    /// Supported protocol bitmask (ISO 14443A, ISO 14443B, ISO 18092).
    pub support: u8,
}

impl FirmwareVersion {
    /// Create a firmware version record.
    pub fn new(ic: u8, version: u8, revision: u8, support: u8) -> Self {
        Self {
            ic,
            version,
            revision,
            support,
        }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PN5{:02x} v{}.{} (support 0x{:02x})",
            self.ic, self.version, self.revision, self.support
        )
    }
}

/// Lifecycle of the card reader peripheral.
///
/// `Uninitialized → Ready` after a successful bring-up, `Uninitialized →
/// Faulted` once every attempt failed. `Faulted` is terminal for the
/// process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PeripheralState {
    #[default]
    Uninitialized,
    Ready,
    Faulted,
}

impl fmt::Display for PeripheralState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Ready => write!(f, "Ready"),
            Self::Faulted => write!(f, "Faulted"),
        }
    }
}

/// Health snapshot of the card reader.
///
/// Transient read errors never surface past a read window, so this is the
/// place a supervisor looks to see whether the reader keeps hiccupping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderHealth {
    pub state: PeripheralState,

    /// Transient errors since the last successful poll.
    pub consecutive_read_errors: u32,

    /// Transient errors since bring-up.
    pub total_read_errors: u64,
}
