//! Controller error types.

use tapgate_hardware::HardwareError;
use tapgate_network::{CommandError, CommandServerError};
use thiserror::Error;

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Errors that end a controller run.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Reader bring-up exhausted its attempts
    #[error("Peripheral initialization failed: {0}")]
    PeripheralInit(#[source] HardwareError),

    /// Reader became unusable during operation
    #[error("Peripheral fault: {0}")]
    PeripheralFault(#[source] HardwareError),

    /// Internal state machine violation
    #[error(transparent)]
    State(#[from] tapgate_core::Error),

    /// The command surface could not be started or stopped unexpectedly
    #[error(transparent)]
    CommandSurface(#[from] CommandServerError),

    /// A controller task panicked or was aborted
    #[error("Controller task failed: {0}")]
    Task(String),
}

impl ControllerError {
    /// Whether the error came from the reader hardware.
    pub fn is_peripheral(&self) -> bool {
        matches!(self, Self::PeripheralInit(_) | Self::PeripheralFault(_))
    }
}

impl From<ControllerError> for CommandError {
    fn from(error: ControllerError) -> Self {
        CommandError::Hardware(error.to_string())
    }
}
