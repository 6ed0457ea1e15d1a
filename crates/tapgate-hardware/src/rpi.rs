//! Raspberry Pi bindings: PN532 on `/dev/i2c-*` and GPIO outputs, via rppal.

use crate::{
    HardwareError, Result,
    indicator::IndicatorOutputs,
    pn532::{I2cBus, Pn532},
    traits::{NfcConnector, OutputPin},
};
use rppal::{gpio::Gpio, i2c::I2c};
use tapgate_core::IndicatorPins;
use tracing::debug;

/// The Linux I2C device opened through rppal.
#[derive(Debug)]
pub struct RppalI2c {
    i2c: I2c,
}

impl RppalI2c {
    /// Open bus `bus` and address the slave at `address`.
    pub fn open(bus: u8, address: u16) -> Result<Self> {
        let mut i2c = I2c::with_bus(bus).map_err(|e| {
            HardwareError::initialization_failed(format!("cannot open I2C bus {bus}: {e}"))
        })?;
        i2c.set_slave_address(address).map_err(|e| {
            HardwareError::initialization_failed(format!(
                "cannot address I2C slave 0x{address:02x}: {e}"
            ))
        })?;
        debug!(bus, address = format_args!("0x{address:02x}"), "I2C bus acquired");
        Ok(Self { i2c })
    }
}

impl I2cBus for RppalI2c {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let written = self
            .i2c
            .write(bytes)
            .map_err(|e| HardwareError::communication(format!("I2C write: {e}")))?;
        if written != bytes.len() {
            return Err(HardwareError::communication(format!(
                "I2C short write: {written} of {} bytes",
                bytes.len()
            )));
        }
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<()> {
        self.i2c
            .read(buffer)
            .map_err(|e| HardwareError::communication(format!("I2C read: {e}")))?;
        Ok(())
    }
}

/// Opens a PN532 on a fixed I2C bus and address.
#[derive(Debug, Clone, Copy)]
pub struct RppalConnector {
    bus: u8,
    address: u16,
}

impl RppalConnector {
    pub fn new(bus: u8, address: u16) -> Self {
        Self { bus, address }
    }
}

impl NfcConnector for RppalConnector {
    type Transceiver = Pn532<RppalI2c>;

    fn open(&self) -> Result<Self::Transceiver> {
        RppalI2c::open(self.bus, self.address).map(Pn532::new)
    }
}

/// A BCM GPIO pin configured as output.
#[derive(Debug)]
pub struct GpioPin {
    pin: rppal::gpio::OutputPin,
}

impl OutputPin for GpioPin {
    fn set_high(&mut self) -> Result<()> {
        self.pin.set_high();
        Ok(())
    }

    fn set_low(&mut self) -> Result<()> {
        self.pin.set_low();
        Ok(())
    }
}

/// Claim the three indicator pins as outputs, initially low.
pub fn gpio_outputs(pins: &IndicatorPins) -> Result<IndicatorOutputs<GpioPin>> {
    let gpio = Gpio::new()
        .map_err(|e| HardwareError::initialization_failed(format!("GPIO unavailable: {e}")))?;
    let claim = |bcm: u8| -> Result<GpioPin> {
        let pin = gpio.get(bcm).map_err(|e| {
            HardwareError::initialization_failed(format!("cannot claim BCM pin {bcm}: {e}"))
        })?;
        Ok(GpioPin {
            pin: pin.into_output_low(),
        })
    };
    Ok(IndicatorOutputs {
        ok_led: claim(pins.ok_led)?,
        fail_led: claim(pins.fail_led)?,
        buzzer: claim(pins.buzzer)?,
    })
}
