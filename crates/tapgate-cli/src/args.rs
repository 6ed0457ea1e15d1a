//! Command-line and environment configuration.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tapgate_core::constants::{
    DEFAULT_ALARM_CLIP, DEFAULT_API_BASE_URL, DEFAULT_BUZZER_PIN, DEFAULT_COMMAND_PORT,
    DEFAULT_FAIL_LED_PIN, DEFAULT_I2C_BUS, DEFAULT_OK_LED_PIN, DEFAULT_RETRY_COUNT,
    REQUEST_TIMEOUT_MS, TEST_TONE_MS,
};
use tapgate_core::{DeviceConfig, DeviceMode, EnrollmentTrigger, IndicatorPins};

#[derive(Parser, Debug, Clone)]
#[command(name = "tapgate", version)]
#[command(about = "NFC access-control edge controller")]
pub struct Args {
    /// Operating mode: reader or enroller
    #[arg(short, long, env = "TAPGATE_MODE", default_value = "reader")]
    pub mode: DeviceMode,

    /// Enroller only: server (one read per POST /api) or auto-capture
    #[arg(long, env = "TAPGATE_ENROLLMENT_TRIGGER", default_value = "server")]
    pub enrollment_trigger: EnrollmentTrigger,

    /// Base URL of the remote authorization service
    #[arg(long, env = "TAPGATE_API_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_url: String,

    /// Timeout of each remote call in milliseconds
    #[arg(long, env = "TAPGATE_REQUEST_TIMEOUT_MS", default_value_t = REQUEST_TIMEOUT_MS)]
    pub request_timeout_ms: u64,

    /// Reader bring-up attempts before giving up
    #[arg(long, env = "TAPGATE_RETRY_COUNT", default_value_t = DEFAULT_RETRY_COUNT)]
    pub retry_count: u32,

    /// Port of the command surface (enroller only)
    #[arg(short, long, env = "TAPGATE_PORT", default_value_t = DEFAULT_COMMAND_PORT)]
    pub port: u16,

    /// BCM pin of the ok (green) LED
    #[arg(long, env = "TAPGATE_OK_LED_PIN", default_value_t = DEFAULT_OK_LED_PIN)]
    pub ok_led_pin: u8,

    /// BCM pin of the fail (red) LED
    #[arg(long, env = "TAPGATE_FAIL_LED_PIN", default_value_t = DEFAULT_FAIL_LED_PIN)]
    pub fail_led_pin: u8,

    /// BCM pin of the buzzer
    #[arg(long, env = "TAPGATE_BUZZER_PIN", default_value_t = DEFAULT_BUZZER_PIN)]
    pub buzzer_pin: u8,

    /// I2C bus of the PN532
    #[arg(long, env = "TAPGATE_I2C_BUS", default_value_t = DEFAULT_I2C_BUS)]
    pub i2c_bus: u8,

    /// I2C address of the PN532, decimal or 0x-prefixed hex
    #[arg(long, env = "TAPGATE_I2C_ADDRESS", default_value = "0x24", value_parser = parse_address)]
    pub i2c_address: u16,

    /// WAV clip played by POST /alarm
    #[arg(long, env = "TAPGATE_ALARM_CLIP", default_value = DEFAULT_ALARM_CLIP)]
    pub alarm_clip: PathBuf,

    /// Length of the POST /beep test tone in milliseconds
    #[arg(long, env = "TAPGATE_TEST_TONE_MS", default_value_t = TEST_TONE_MS)]
    pub test_tone_ms: u64,

    /// Run against simulated hardware; card UIDs are read from stdin as hex
    #[arg(long, env = "TAPGATE_SIMULATE")]
    pub simulate: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Build and validate the device configuration.
    pub fn to_config(&self) -> tapgate_core::Result<DeviceConfig> {
        let config = DeviceConfig {
            mode: self.mode,
            enrollment_trigger: self.enrollment_trigger,
            api_base_url: self.api_url.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            retry_count: self.retry_count,
            command_port: self.port,
            pins: IndicatorPins {
                ok_led: self.ok_led_pin,
                fail_led: self.fail_led_pin,
                buzzer: self.buzzer_pin,
            },
            i2c_bus: self.i2c_bus,
            i2c_address: self.i2c_address,
            test_tone: Duration::from_millis(self.test_tone_ms),
            alarm_clip: self.alarm_clip.clone(),
            ..DeviceConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_address(value: &str) -> Result<u16, String> {
    let value = value.trim();
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid I2C address {value:?}: {e}"))
}
