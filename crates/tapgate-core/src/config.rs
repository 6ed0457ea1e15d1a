//! Device configuration.
//!
//! A [`DeviceConfig`] is built once at startup, validated with
//! [`DeviceConfig::validate`], and then shared read-only (typically behind an
//! `Arc`) by every component. Nothing mutates it afterwards.
//!
//! # Examples
//!
//! ```
//! use tapgate_core::{DeviceConfig, DeviceMode};
//!
//! let config = DeviceConfig {
//!     mode: DeviceMode::Enroller,
//!     api_base_url: "http://10.0.0.5:8080/api".to_string(),
//!     ..DeviceConfig::default()
//! };
//! config.validate().unwrap();
//! ```

use crate::constants::*;
use crate::error::{Error, Result};
use crate::types::{DeviceMode, EnrollmentTrigger};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// BCM pin assignment of the indicator outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorPins {
    /// Ok (green) LED.
    pub ok_led: u8,

    /// Fail (red) LED.
    pub fail_led: u8,

    /// Buzzer.
    pub buzzer: u8,
}

impl Default for IndicatorPins {
    fn default() -> Self {
        Self {
            ok_led: DEFAULT_OK_LED_PIN,
            fail_led: DEFAULT_FAIL_LED_PIN,
            buzzer: DEFAULT_BUZZER_PIN,
        }
    }
}

impl IndicatorPins {
    fn validate(&self) -> Result<()> {
        let pins = [self.ok_led, self.fail_led, self.buzzer];
        if let Some(pin) = pins.iter().find(|pin| **pin > 27) {
            return Err(Error::config(format!("BCM pin {pin} is out of range 0-27")));
        }
        if pins[0] == pins[1] || pins[0] == pins[2] || pins[1] == pins[2] {
            return Err(Error::config(format!(
                "indicator pins must be distinct, got {pins:?}"
            )));
        }
        Ok(())
    }
}

/// Timings of the indicator cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueTimings {
    pub beep: Duration,
    pub success_led: Duration,
    pub failure_led: Duration,
    pub failure_pause: Duration,
    pub failure_repeat: u32,
    pub listening_led: Duration,
}

impl Default for CueTimings {
    fn default() -> Self {
        Self {
            beep: Duration::from_millis(CUE_BEEP_MS),
            success_led: Duration::from_millis(SUCCESS_LED_MS),
            failure_led: Duration::from_millis(FAILURE_LED_MS),
            failure_pause: Duration::from_millis(FAILURE_PAUSE_MS),
            failure_repeat: FAILURE_REPEAT,
            listening_led: Duration::from_millis(LISTENING_LED_MS),
        }
    }
}

/// Read windows, polling cadence and cooldowns of the controller loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadTimings {
    /// Upper bound of one passive-target poll.
    pub poll_window: Duration,

    /// Pause after a transient read error.
    pub error_pause: Duration,

    /// Read window of the verification loop.
    pub verify_read_timeout: Duration,

    /// Read window of one enrollment.
    pub enroll_read_timeout: Duration,

    /// Cooldown after a verification event.
    pub verify_cooldown: Duration,

    /// Cooldown after an auto-capture enrollment.
    pub auto_capture_cooldown: Duration,

    /// Pause after an empty auto-capture window.
    pub auto_capture_idle_pause: Duration,
}

impl Default for ReadTimings {
    fn default() -> Self {
        Self {
            poll_window: Duration::from_millis(POLL_WINDOW_MS),
            error_pause: Duration::from_millis(READ_ERROR_PAUSE_MS),
            verify_read_timeout: Duration::from_millis(VERIFY_READ_TIMEOUT_MS),
            enroll_read_timeout: Duration::from_millis(ENROLL_READ_TIMEOUT_MS),
            verify_cooldown: Duration::from_millis(VERIFY_COOLDOWN_MS),
            auto_capture_cooldown: Duration::from_millis(AUTO_CAPTURE_COOLDOWN_MS),
            auto_capture_idle_pause: Duration::from_millis(AUTO_CAPTURE_IDLE_PAUSE_MS),
        }
    }
}

/// Complete, immutable configuration of one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Operating mode.
    pub mode: DeviceMode,

    /// Enrollment sub-design, only meaningful in `Enroller` mode.
    pub enrollment_trigger: EnrollmentTrigger,

    /// Base URL of the remote authorization/enrollment service.
    pub api_base_url: String,

    /// Timeout of every remote call.
    pub request_timeout: Duration,

    /// Bring-up attempts before the reader is declared faulted.
    pub retry_count: u32,

    /// Pause between failed bring-up attempts.
    pub init_backoff: Duration,

    /// Delay between bus acquisition and configuration.
    pub bus_settle: Duration,

    /// Port of the inbound command surface (enroller only).
    pub command_port: u16,

    /// Indicator pin assignment.
    pub pins: IndicatorPins,

    /// I2C bus of the PN532.
    pub i2c_bus: u8,

    /// I2C address of the PN532.
    pub i2c_address: u16,

    /// Indicator cue timings.
    pub cues: CueTimings,

    /// Loop timings.
    pub reads: ReadTimings,

    /// Length of the `/beep` test tone.
    pub test_tone: Duration,

    /// WAV clip played by `/alarm`.
    pub alarm_clip: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            mode: DeviceMode::Reader,
            enrollment_trigger: EnrollmentTrigger::default(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
            retry_count: DEFAULT_RETRY_COUNT,
            init_backoff: Duration::from_millis(INIT_BACKOFF_MS),
            bus_settle: Duration::from_millis(BUS_SETTLE_MS),
            command_port: DEFAULT_COMMAND_PORT,
            pins: IndicatorPins::default(),
            i2c_bus: DEFAULT_I2C_BUS,
            i2c_address: PN532_I2C_ADDRESS,
            cues: CueTimings::default(),
            reads: ReadTimings::default(),
            test_tone: Duration::from_millis(TEST_TONE_MS),
            alarm_clip: PathBuf::from(DEFAULT_ALARM_CLIP),
        }
    }
}

impl DeviceConfig {
    /// Check the configuration once at startup.
    ///
    /// # Errors
    /// Returns `Error::Config` or `Error::MissingConfig` describing the
    /// first invalid value.
    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(Error::MissingConfig("api_base_url".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::config(format!(
                "api_base_url must be an http(s) URL, got {url}"
            )));
        }
        if self.retry_count == 0 {
            return Err(Error::config("retry_count must be at least 1"));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::config("request_timeout must be positive"));
        }
        if self.reads.poll_window.is_zero() {
            return Err(Error::config("poll_window must be positive"));
        }
        if self.reads.verify_read_timeout.is_zero() || self.reads.enroll_read_timeout.is_zero() {
            return Err(Error::config("read timeouts must be positive"));
        }
        if self.cues.failure_repeat == 0 {
            return Err(Error::config("failure cue must repeat at least once"));
        }
        if self.mode == DeviceMode::Enroller && self.command_port == 0 {
            return Err(Error::config("command_port must be set in enroller mode"));
        }
        self.pins.validate()
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }
}
