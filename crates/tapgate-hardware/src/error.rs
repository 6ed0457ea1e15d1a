//! Error types for hardware operations.
//!
//! This module defines error types specific to the reader and indicator
//! hardware, covering bus failures, protocol violations, bring-up
//! exhaustion and reads against a reader that is not ready.

use std::time::Duration;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Bus-level communication error (I2C, GPIO).
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Invalid data received from device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// One bring-up attempt failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Every bring-up attempt failed; the reader is faulted.
    #[error("Reader initialization failed after {attempts} attempts: {last_error}")]
    InitializationExhausted { attempts: u32, last_error: String },

    /// The reader was used before a successful bring-up or after a fault.
    #[error("Reader not ready (state: {state})")]
    NotReady { state: String },

    /// Audio playback failed.
    #[error("Audio playback failed: {message}")]
    Audio { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new timeout error. Durations beyond `u64::MAX` ms saturate.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout {
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new not-ready error.
    pub fn not_ready(state: impl std::fmt::Display) -> Self {
        Self::NotReady {
            state: state.to_string(),
        }
    }

    /// Create a new audio error.
    pub fn audio(message: impl Into<String>) -> Self {
        Self::Audio {
            message: message.into(),
        }
    }

    /// Whether the error leaves the reader unusable for the rest of the
    /// process. Everything else is transient within a read window.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InitializationExhausted { .. } | Self::NotReady { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("PN532");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: PN532");
    }

    #[test]
    fn test_timeout_error() {
        let error = HardwareError::timeout(Duration::from_millis(500));
        assert_eq!(error.to_string(), "Operation timeout after 500ms");
    }

    #[test]
    fn test_timeout_saturates() {
        let error = HardwareError::timeout(Duration::MAX);
        assert!(matches!(
            error,
            HardwareError::Timeout {
                duration_ms: u64::MAX
            }
        ));
    }

    #[test]
    fn test_initialization_exhausted_display() {
        let error = HardwareError::InitializationExhausted {
            attempts: 3,
            last_error: "no ACK".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Reader initialization failed after 3 attempts: no ACK"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(HardwareError::not_ready("Faulted").is_fatal());
        assert!(
            HardwareError::InitializationExhausted {
                attempts: 1,
                last_error: String::new()
            }
            .is_fatal()
        );
        assert!(!HardwareError::communication("NACK").is_fatal());
        assert!(!HardwareError::invalid_data("bad UID").is_fatal());
        assert!(!HardwareError::timeout(Duration::from_millis(10)).is_fatal());
    }
}
