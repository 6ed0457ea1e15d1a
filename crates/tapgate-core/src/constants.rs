//! Default timings, limits and hardware assignments.
//!
//! These values describe how a field unit behaves out of the box. Every one
//! of them can be overridden through [`DeviceConfig`](crate::DeviceConfig);
//! the constants only seed the defaults.
//!
//! # Timing Overview
//!
//! | Phase | Constant | Default |
//! |-------|----------|---------|
//! | Init attempt settle | `BUS_SETTLE_MS` | 1000 ms |
//! | Init backoff | `INIT_BACKOFF_MS` | 2000 ms |
//! | Passive-target poll window | `POLL_WINDOW_MS` | 500 ms |
//! | Pause after a read error | `READ_ERROR_PAUSE_MS` | 100 ms |
//! | Verification read window | `VERIFY_READ_TIMEOUT_MS` | 1000 ms |
//! | Enrollment read window | `ENROLL_READ_TIMEOUT_MS` | 10000 ms |
//! | Cooldown after a verification | `VERIFY_COOLDOWN_MS` | 500 ms |
//! | Cooldown after an auto-capture | `AUTO_CAPTURE_COOLDOWN_MS` | 3000 ms |
//! | Remote request timeout | `REQUEST_TIMEOUT_MS` | 5000 ms |

// ============================================================================
// Card Identifiers
// ============================================================================

/// Minimum UID length in bytes (ISO 14443 single-size UID).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum UID length in bytes (ISO 14443 triple-size UID).
pub const MAX_UID_LENGTH: usize = 10;

// ============================================================================
// Peripheral Initialization
// ============================================================================

/// Number of bring-up attempts before the reader is declared faulted.
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Pause between two failed bring-up attempts.
pub const INIT_BACKOFF_MS: u64 = 2000;

/// Delay between bus acquisition and the first command of an attempt.
pub const BUS_SETTLE_MS: u64 = 1000;

// ============================================================================
// Card Reading
// ============================================================================

/// Upper bound of a single passive-target poll.
pub const POLL_WINDOW_MS: u64 = 500;

/// Pause after a transient read error before polling again.
pub const READ_ERROR_PAUSE_MS: u64 = 100;

/// Read window used by the verification loop.
pub const VERIFY_READ_TIMEOUT_MS: u64 = 1000;

/// Read window opened for each enrollment.
pub const ENROLL_READ_TIMEOUT_MS: u64 = 10_000;

/// Cooldown after a verification event, so a card still resting on the
/// reader is not reported twice within the same dwell.
pub const VERIFY_COOLDOWN_MS: u64 = 500;

/// Cooldown after an auto-capture enrollment.
pub const AUTO_CAPTURE_COOLDOWN_MS: u64 = 3000;

/// Pause after an auto-capture read window closed without a card.
pub const AUTO_CAPTURE_IDLE_PAUSE_MS: u64 = 500;

// ============================================================================
// Indicator Cues
// ============================================================================

/// Beep length used inside success and failure cues.
pub const CUE_BEEP_MS: u64 = 100;

/// How long the ok LED stays lit after a success.
pub const SUCCESS_LED_MS: u64 = 2000;

/// Fail LED pulse length inside one failure repetition.
pub const FAILURE_LED_MS: u64 = 100;

/// Pause between failure repetitions.
pub const FAILURE_PAUSE_MS: u64 = 100;

/// Number of repetitions of the failure cue.
pub const FAILURE_REPEAT: u32 = 2;

/// Ok LED pulse shown when an enrollment read window opens.
pub const LISTENING_LED_MS: u64 = 500;

/// Duration of the `/beep` test tone.
pub const TEST_TONE_MS: u64 = 2000;

// ============================================================================
// GPIO (BCM numbering)
// ============================================================================

/// Ok (green) LED pin.
pub const DEFAULT_OK_LED_PIN: u8 = 15;

/// Fail (red) LED pin.
pub const DEFAULT_FAIL_LED_PIN: u8 = 14;

/// Buzzer pin.
pub const DEFAULT_BUZZER_PIN: u8 = 10;

// ============================================================================
// PN532 over I2C
// ============================================================================

/// I2C bus the PN532 is wired to (`/dev/i2c-1` on a Raspberry Pi).
pub const DEFAULT_I2C_BUS: u8 = 1;

/// 7-bit I2C address of the PN532.
pub const PN532_I2C_ADDRESS: u16 = 0x24;

// ============================================================================
// Network
// ============================================================================

/// Timeout for every remote authorization or enrollment call.
pub const REQUEST_TIMEOUT_MS: u64 = 5000;

/// Port of the inbound command surface.
pub const DEFAULT_COMMAND_PORT: u16 = 5000;

/// Remote service used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080/api";

/// Clip played by the `/alarm` command.
pub const DEFAULT_ALARM_CLIP: &str = "example.wav";
