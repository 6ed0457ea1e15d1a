use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Card identifier errors
    #[error("Invalid card identifier: {0}")]
    InvalidCardId(String),

    // Mode / state errors
    #[error("Unknown device mode: {0}")]
    UnknownMode(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),
}

impl Error {
    pub fn invalid_card_id(message: impl Into<String>) -> Self {
        Self::InvalidCardId(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
