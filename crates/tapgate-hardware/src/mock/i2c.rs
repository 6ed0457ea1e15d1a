//! Scripted I2C bus for exercising the PN532 driver.

use crate::{Result, pn532::I2cBus};
use parking_lot::Mutex;
use std::{collections::VecDeque, sync::Arc};

#[derive(Debug, Default)]
struct Script {
    reads: VecDeque<Vec<u8>>,
    writes: Vec<Vec<u8>>,
}

/// I2C bus that answers reads from a script and records writes.
///
/// Each `read` consumes one scripted response, truncated or zero-padded to
/// the buffer size. With the script exhausted every read returns zeros,
/// which the PN532 driver sees as "not ready".
#[derive(Debug)]
pub struct MockI2cBus {
    script: Arc<Mutex<Script>>,
}

impl MockI2cBus {
    pub fn new() -> (Self, MockI2cHandle) {
        let script = Arc::new(Mutex::new(Script::default()));
        (
            Self {
                script: Arc::clone(&script),
            },
            MockI2cHandle { script },
        )
    }
}

impl I2cBus for MockI2cBus {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.script.lock().writes.push(bytes.to_vec());
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<()> {
        buffer.fill(0);
        if let Some(response) = self.script.lock().reads.pop_front() {
            let n = response.len().min(buffer.len());
            buffer[..n].copy_from_slice(&response[..n]);
        }
        Ok(())
    }
}

/// Test-side handle of a [`MockI2cBus`].
#[derive(Debug, Clone)]
pub struct MockI2cHandle {
    script: Arc<Mutex<Script>>,
}

impl MockI2cHandle {
    /// Queue the bytes returned by the next unanswered read.
    pub fn push_read(&self, bytes: &[u8]) {
        self.script.lock().reads.push_back(bytes.to_vec());
    }

    /// Every frame written so far.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.script.lock().writes.clone()
    }
}
