//! PN532 command driver.

use super::{
    BRTY_ISO14443A_106, CMD_GET_FIRMWARE_VERSION, CMD_IN_LIST_PASSIVE_TARGET,
    CMD_SAM_CONFIGURATION, I2C_READY, I2cBus, SAM_NORMAL_MODE_PARAMS, frame,
};
use crate::{
    error::{HardwareError, Result},
    traits::NfcTransceiver,
    types::FirmwareVersion,
};
use std::time::Duration;
use tapgate_core::constants::MAX_UID_LENGTH;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

/// Interval between status-byte polls while waiting for the chip.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long the chip gets to acknowledge a command frame.
const ACK_TIMEOUT: Duration = Duration::from_millis(100);

/// How long configuration and firmware queries may take to answer.
const COMMAND_TIMEOUT: Duration = Duration::from_millis(1000);

/// Frame overhead around the response data: preamble, start code, LEN, LCS,
/// TFI, response code, DCS and postamble.
const RESPONSE_OVERHEAD: usize = 9;

/// `InListPassiveTarget` response: NbTg, Tg, SENS_RES (2), SEL_RES, NFCIDLength.
const TARGET_HEADER_LEN: usize = 6;

/// PN532 attached through an [`I2cBus`].
#[derive(Debug)]
pub struct Pn532<B: I2cBus> {
    bus: B,
}

impl<B: I2cBus> Pn532<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Give the bus back, e.g. to inspect a mock after a test.
    pub fn into_inner(self) -> B {
        self.bus
    }

    /// Poll the status byte until the chip reports a pending frame or
    /// `timeout` runs out.
    async fn wait_ready(&mut self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            let mut status = [0u8; 1];
            self.bus.read(&mut status)?;
            if status[0] == I2C_READY {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Read `len` frame bytes, stripping the leading status byte.
    fn read_frame(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; len + 1];
        self.bus.read(&mut buffer)?;
        if buffer[0] != I2C_READY {
            return Err(HardwareError::communication("PN532 not ready for frame read"));
        }
        buffer.remove(0);
        Ok(buffer)
    }

    async fn send_command(&mut self, command: u8, params: &[u8]) -> Result<()> {
        let request = frame::encode_command(command, params)?;
        trace!(command = format_args!("0x{command:02x}"), bytes = ?request, "PN532 write");
        self.bus.write(&request)?;

        if !self.wait_ready(ACK_TIMEOUT).await? {
            return Err(HardwareError::timeout(ACK_TIMEOUT));
        }
        let ack = self.read_frame(frame::ACK_FRAME.len())?;
        if !frame::is_ack(&ack) {
            return Err(HardwareError::communication(format!(
                "PN532 did not acknowledge command 0x{command:02x}"
            )));
        }
        Ok(())
    }

    /// Send `command` and wait up to `timeout` for its response.
    ///
    /// Returns `Ok(None)` when the chip never became ready within `timeout`.
    async fn call(
        &mut self,
        command: u8,
        params: &[u8],
        response_len: usize,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>> {
        self.send_command(command, params).await?;
        if !self.wait_ready(timeout).await? {
            return Ok(None);
        }
        let raw = self.read_frame(response_len + RESPONSE_OVERHEAD)?;
        frame::decode_response(&raw, command).map(Some)
    }

    async fn call_required(
        &mut self,
        command: u8,
        params: &[u8],
        response_len: usize,
    ) -> Result<Vec<u8>> {
        self.call(command, params, response_len, COMMAND_TIMEOUT)
            .await?
            .ok_or_else(|| HardwareError::timeout(COMMAND_TIMEOUT))
    }
}

/// Extract the UID of the single target reported by `InListPassiveTarget`.
pub(crate) fn parse_passive_target(data: &[u8]) -> Result<Option<Vec<u8>>> {
    let Some(&count) = data.first() else {
        return Err(HardwareError::invalid_data("empty InListPassiveTarget response"));
    };
    match count {
        0 => return Ok(None),
        1 => {}
        n => {
            return Err(HardwareError::invalid_data(format!(
                "expected one target, PN532 reported {n}"
            )));
        }
    }

    let header = data
        .get(..TARGET_HEADER_LEN)
        .ok_or_else(|| HardwareError::invalid_data("target header truncated"))?;
    let uid_len = header[TARGET_HEADER_LEN - 1] as usize;
    if uid_len > MAX_UID_LENGTH {
        return Err(HardwareError::invalid_data(format!(
            "UID of {uid_len} bytes exceeds {MAX_UID_LENGTH}"
        )));
    }
    let uid = data
        .get(TARGET_HEADER_LEN..TARGET_HEADER_LEN + uid_len)
        .ok_or_else(|| HardwareError::invalid_data("UID truncated"))?;
    Ok(Some(uid.to_vec()))
}

impl<B: I2cBus> NfcTransceiver for Pn532<B> {
    async fn configure(&mut self) -> Result<()> {
        self.call_required(CMD_SAM_CONFIGURATION, &SAM_NORMAL_MODE_PARAMS, 0)
            .await?;
        debug!("PN532 SAM configured");
        Ok(())
    }

    async fn firmware_version(&mut self) -> Result<FirmwareVersion> {
        let data = self
            .call_required(CMD_GET_FIRMWARE_VERSION, &[], 4)
            .await?;
        match data.as_slice() {
            [ic, version, revision, support] => {
                Ok(FirmwareVersion::new(*ic, *version, *revision, *support))
            }
            other => Err(HardwareError::invalid_data(format!(
                "firmware response has {} bytes, expected 4",
                other.len()
            ))),
        }
    }

    async fn read_passive_target(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let response = self
            .call(
                CMD_IN_LIST_PASSIVE_TARGET,
                &[0x01, BRTY_ISO14443A_106],
                TARGET_HEADER_LEN + MAX_UID_LENGTH,
                timeout,
            )
            .await?;
        match response {
            Some(data) => parse_passive_target(&data),
            None => Ok(None),
        }
    }
}
