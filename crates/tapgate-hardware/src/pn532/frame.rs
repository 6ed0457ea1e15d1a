//! PN53x information frame codec.
//!
//! Format: `[Preamble 00] [Start 00 FF] [LEN] [LCS] [TFI + data (LEN bytes)] [DCS] [Postamble 00]`
//!
//! - `LCS` makes `LEN + LCS == 0 (mod 256)`
//! - `DCS` makes `sum(TFI + data) + DCS == 0 (mod 256)`
//! - `TFI` is `D4` host→PN532 and `D5` PN532→host

use crate::error::{HardwareError, Result};

pub const PREAMBLE: [u8; 3] = [0x00, 0x00, 0xFF];
pub const START_CODE: [u8; 2] = [0x00, 0xFF];
pub const POSTAMBLE: u8 = 0x00;
pub const ACK_FRAME: [u8; 6] = [0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00];

pub const HOST_TO_PN532: u8 = 0xD4;
pub const PN532_TO_HOST: u8 = 0xD5;

/// TFI of the syntax-error frame `00 00 FF 01 FF 7F 81 00`.
pub const ERROR_TFI: u8 = 0x7F;

/// Largest payload (TFI included) a normal information frame can carry.
pub const MAX_PAYLOAD: usize = 255;

/// Length checksum.
pub fn lcs(len: u8) -> u8 {
    0u8.wrapping_sub(len)
}

/// Data checksum.
pub fn dcs(payload: &[u8]) -> u8 {
    let sum = payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    0u8.wrapping_sub(sum)
}

/// Encode a host command into a complete wire frame.
pub fn encode_command(command: u8, params: &[u8]) -> Result<Vec<u8>> {
    let len = params.len() + 2;
    if len > MAX_PAYLOAD {
        return Err(HardwareError::invalid_data(format!(
            "PN532 command payload too long: {len} bytes"
        )));
    }

    let mut payload = Vec::with_capacity(len);
    payload.push(HOST_TO_PN532);
    payload.push(command);
    payload.extend_from_slice(params);

    let mut out = Vec::with_capacity(len + 7);
    out.extend_from_slice(&PREAMBLE);
    out.push(len as u8);
    out.push(lcs(len as u8));
    out.extend_from_slice(&payload);
    out.push(dcs(&payload));
    out.push(POSTAMBLE);
    Ok(out)
}

/// Whether `raw` starts with the ACK frame.
pub fn is_ack(raw: &[u8]) -> bool {
    raw.starts_with(&ACK_FRAME)
}

/// Decode a response frame to `command` and return the bytes following
/// `D5 <command + 1>`.
///
/// Leading bytes before the start code and trailing padding are ignored, so
/// a fixed-size I2C read can be passed in as-is (minus the status byte).
pub fn decode_response(raw: &[u8], command: u8) -> Result<Vec<u8>> {
    let start = raw
        .windows(2)
        .position(|w| w == START_CODE)
        .ok_or_else(|| HardwareError::communication("PN532 response has no start code"))?;

    let header = start + 2;
    let (len, lcs_actual) = match (raw.get(header), raw.get(header + 1)) {
        (Some(&len), Some(&lcs_actual)) => (len, lcs_actual),
        _ => return Err(HardwareError::communication("PN532 response truncated")),
    };
    if len.wrapping_add(lcs_actual) != 0 {
        return Err(HardwareError::communication(format!(
            "PN532 length checksum mismatch: len 0x{len:02x}, lcs 0x{lcs_actual:02x}"
        )));
    }

    let body_start = header + 2;
    let body_end = body_start + len as usize;
    let payload = raw
        .get(body_start..body_end)
        .ok_or_else(|| HardwareError::communication("PN532 response truncated"))?;
    let dcs_actual = *raw
        .get(body_end)
        .ok_or_else(|| HardwareError::communication("PN532 response missing DCS"))?;
    if dcs(payload) != dcs_actual {
        return Err(HardwareError::communication(format!(
            "PN532 data checksum mismatch: expected 0x{:02x}, got 0x{dcs_actual:02x}",
            dcs(payload)
        )));
    }

    match payload {
        [ERROR_TFI, ..] => Err(HardwareError::communication(
            "PN532 reported a syntax error frame",
        )),
        [PN532_TO_HOST, code, rest @ ..] if *code == command.wrapping_add(1) => Ok(rest.to_vec()),
        [PN532_TO_HOST, code, ..] => Err(HardwareError::invalid_data(format!(
            "PN532 answered command 0x{:02x}, expected 0x{:02x}",
            code.wrapping_sub(1),
            command
        ))),
        _ => Err(HardwareError::invalid_data("PN532 response has unexpected TFI")),
    }
}
