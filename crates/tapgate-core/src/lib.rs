//! Core domain types for the Tapgate NFC access-control controller.
//!
//! Everything here is hardware- and transport-agnostic: card identifiers,
//! device modes, indicator outcomes, the validated device configuration and
//! the default timings every other crate builds on.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{CueTimings, DeviceConfig, IndicatorPins, ReadTimings};
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
