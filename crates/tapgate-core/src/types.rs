use crate::{
    Result,
    constants::{MAX_UID_LENGTH, MIN_UID_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier broadcast by a passive NFC tag.
///
/// Holds the raw UID bytes (4-10 bytes, typically 4 or 7). The canonical
/// transport form is lowercase hex without separators, e.g. `04a3b2c1`.
/// Equality is byte-wise, so identifiers parsed from upper- and lowercase
/// hex compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardId(Vec<u8>);

impl CardId {
    /// Create a card identifier from raw UID bytes.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardId` if the UID is not 4-10 bytes long.
    pub fn from_bytes(uid: impl Into<Vec<u8>>) -> Result<Self> {
        let uid = uid.into();
        let len = uid.len();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len) {
            return Err(Error::invalid_card_id(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} bytes, got {len}"
            )));
        }
        Ok(CardId(uid))
    }

    /// Parse a card identifier from its hex form (case-insensitive).
    ///
    /// # Errors
    /// Returns `Error::InvalidCardId` on odd length, non-hex digits or a
    /// decoded length outside 4-10 bytes.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::invalid_card_id(format!("not a hex UID: {hex}")));
        }
        if hex.len() % 2 != 0 {
            return Err(Error::invalid_card_id(format!(
                "hex UID must have an even number of digits: {hex}"
            )));
        }

        let bytes = hex
            .as_bytes()
            .chunks(2)
            .map(|pair| (hex_value(pair[0]) << 4) | hex_value(pair[1]))
            .collect::<Vec<u8>>();

        Self::from_bytes(bytes)
    }

    /// Raw UID bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// UID length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; a valid identifier carries at least four bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical lowercase hex form used on the wire.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

// Caller guarantees `digit` is an ASCII hex digit.
fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for CardId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CardId::from_hex(s)
    }
}

impl TryFrom<String> for CardId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        CardId::from_hex(&value)
    }
}

impl From<CardId> for String {
    fn from(id: CardId) -> Self {
        id.to_hex()
    }
}

/// Operating mode of a unit, fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceMode {
    /// Validate presented cards against the remote authorization service.
    Reader,

    /// Capture new cards and register them with the remote service.
    Enroller,
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceMode::Reader => write!(f, "reader"),
            DeviceMode::Enroller => write!(f, "enroller"),
        }
    }
}

impl std::str::FromStr for DeviceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reader" | "0" => Ok(DeviceMode::Reader),
            "enroller" | "1" => Ok(DeviceMode::Enroller),
            other => Err(Error::UnknownMode(other.to_string())),
        }
    }
}

/// How an enroller opens its read windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentTrigger {
    /// One read window per command-surface request.
    #[default]
    Server,

    /// Read windows open back to back without an external trigger.
    AutoCapture,
}

impl fmt::Display for EnrollmentTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollmentTrigger::Server => write!(f, "server"),
            EnrollmentTrigger::AutoCapture => write!(f, "auto-capture"),
        }
    }
}

impl std::str::FromStr for EnrollmentTrigger {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(EnrollmentTrigger::Server),
            "auto-capture" | "auto_capture" | "auto" => Ok(EnrollmentTrigger::AutoCapture),
            other => Err(Error::UnknownMode(other.to_string())),
        }
    }
}

/// Outcome shown to the person at the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorOutcome {
    Success,
    Failure,
}

impl IndicatorOutcome {
    /// Map a yes/no decision onto an outcome.
    #[must_use]
    pub fn from_granted(granted: bool) -> Self {
        if granted {
            IndicatorOutcome::Success
        } else {
            IndicatorOutcome::Failure
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, IndicatorOutcome::Success)
    }
}

impl fmt::Display for IndicatorOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorOutcome::Success => write!(f, "success"),
            IndicatorOutcome::Failure => write!(f, "failure"),
        }
    }
}
