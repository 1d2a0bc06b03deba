//! DRV2605 haptic motor driver, ERM open-loop, internal trigger.

use embedded_hal::i2c::I2c;
use log::info;

use super::{DeviceError, HapticActuator};

const DEVICE: &str = "DRV2605";

pub const DEFAULT_ADDRESS: u8 = 0x5A;

const REG_STATUS: u8 = 0x00;
const REG_MODE: u8 = 0x01;
const REG_RTP_INPUT: u8 = 0x02;
const REG_LIBRARY: u8 = 0x03;
const REG_WAVESEQ1: u8 = 0x04;
const REG_WAVESEQ2: u8 = 0x05;
const REG_GO: u8 = 0x0C;
const REG_OVERDRIVE: u8 = 0x0D;
const REG_SUSTAIN_POS: u8 = 0x0E;
const REG_SUSTAIN_NEG: u8 = 0x0F;
const REG_BREAK: u8 = 0x10;
const REG_AUDIO_MAX: u8 = 0x13;
const REG_FEEDBACK: u8 = 0x1A;
const REG_CONTROL3: u8 = 0x1D;

const MODE_INTERNAL_TRIGGER: u8 = 0x00;
const LIBRARY_TS2200_A: u8 = 0x01;
/// DEVICE_ID field (STATUS bits 7:5) for DRV2605 and DRV2605L.
const KNOWN_IDS: [u8; 2] = [3, 7];
const FEEDBACK_N_ERM_LRA: u8 = 0x80;
const CONTROL3_ERM_OPEN_LOOP: u8 = 0x20;

pub struct Drv2605<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Drv2605<I2C> {
    /// Identify the part and put it into ERM open-loop, internal-trigger mode
    /// with library 1 selected.
    pub fn new(i2c: I2C, address: u8) -> Result<Self, DeviceError> {
        let mut driver = Self { i2c, address };

        let found = driver.read(REG_STATUS, "read status")? >> 5;
        if !KNOWN_IDS.contains(&found) {
            return Err(DeviceError::UnexpectedIdentity {
                device: DEVICE,
                found,
            });
        }

        driver.write(REG_MODE, MODE_INTERNAL_TRIGGER, "leave standby")?;
        driver.write(REG_RTP_INPUT, 0x00, "clear RTP input")?;
        driver.write(REG_WAVESEQ1, 0x01, "write sequence slot 1")?;
        driver.write(REG_WAVESEQ2, 0x00, "terminate sequence")?;
        for reg in [REG_OVERDRIVE, REG_SUSTAIN_POS, REG_SUSTAIN_NEG, REG_BREAK] {
            driver.write(reg, 0x00, "clear time offsets")?;
        }
        driver.write(REG_AUDIO_MAX, 0x64, "write audio max")?;

        let feedback = driver.read(REG_FEEDBACK, "read feedback control")?;
        driver.write(REG_FEEDBACK, feedback & !FEEDBACK_N_ERM_LRA, "select ERM")?;
        let control3 = driver.read(REG_CONTROL3, "read control 3")?;
        driver.write(REG_CONTROL3, control3 | CONTROL3_ERM_OPEN_LOOP, "select open loop")?;

        driver.write(REG_LIBRARY, LIBRARY_TS2200_A, "select library")?;

        info!("{} ready at {:#04x}", DEVICE, address);
        Ok(driver)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    fn read(&mut self, reg: u8, operation: &'static str) -> Result<u8, DeviceError> {
        let mut value = [0u8];
        self.i2c
            .write_read(self.address, &[reg], &mut value)
            .map_err(|e| DeviceError::from_bus(DEVICE, operation, self.address, e))?;
        Ok(value[0])
    }

    fn write(&mut self, reg: u8, value: u8, operation: &'static str) -> Result<(), DeviceError> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(|e| DeviceError::from_bus(DEVICE, operation, self.address, e))
    }
}

impl<I2C: I2c> HapticActuator for Drv2605<I2C> {
    fn trigger_effect(&mut self, effect: u8) -> Result<(), DeviceError> {
        self.write(REG_WAVESEQ1, effect, "load effect")
    }

    fn play(&mut self) -> Result<(), DeviceError> {
        self.write(REG_GO, 0x01, "set GO")
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.write(REG_GO, 0x00, "clear GO")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::fake_bus::{FakeBus, FakeDevice};
    use core::cell::RefCell;
    use embedded_hal_bus::i2c::RefCellDevice;

    fn drv() -> FakeDevice {
        FakeDevice::new()
            .with_reg(REG_STATUS, &[7 << 5])
            .with_reg(REG_FEEDBACK, &[0xB6])
            .with_reg(REG_CONTROL3, &[0x80])
    }

    #[test]
    fn test_bring_up_selects_erm_open_loop() {
        let bus = RefCell::new(FakeBus::new().with_root(DEFAULT_ADDRESS, drv()));
        Drv2605::new(RefCellDevice::new(&bus), DEFAULT_ADDRESS).unwrap();

        let bus = bus.borrow();
        let device = bus.root(DEFAULT_ADDRESS);
        assert_eq!(device.reg(REG_MODE), &[MODE_INTERNAL_TRIGGER]);
        assert_eq!(device.reg(REG_FEEDBACK), &[0x36]);
        assert_eq!(device.reg(REG_CONTROL3), &[0xA0]);
        assert_eq!(device.reg(REG_LIBRARY), &[LIBRARY_TS2200_A]);
        assert_eq!(device.reg(REG_AUDIO_MAX), &[0x64]);
    }

    #[test]
    fn test_effect_play_stop() {
        let bus = RefCell::new(FakeBus::new().with_root(DEFAULT_ADDRESS, drv()));
        let mut driver = Drv2605::new(RefCellDevice::new(&bus), DEFAULT_ADDRESS).unwrap();

        driver.trigger_effect(47).unwrap();
        assert_eq!(bus.borrow().root(DEFAULT_ADDRESS).reg(REG_WAVESEQ1), &[47]);

        driver.play().unwrap();
        assert_eq!(bus.borrow().root(DEFAULT_ADDRESS).reg(REG_GO), &[1]);
        driver.stop().unwrap();
        assert_eq!(bus.borrow().root(DEFAULT_ADDRESS).reg(REG_GO), &[0]);
    }

    #[test]
    fn test_unknown_identity() {
        let device = FakeDevice::new().with_reg(REG_STATUS, &[0x20]);
        let bus = RefCell::new(FakeBus::new().with_root(DEFAULT_ADDRESS, device));
        let result = Drv2605::new(RefCellDevice::new(&bus), DEFAULT_ADDRESS);
        assert_eq!(
            result.err(),
            Some(DeviceError::UnexpectedIdentity {
                device: DEVICE,
                found: 1
            })
        );
    }

    #[test]
    fn test_absent_driver_is_not_found() {
        let bus = RefCell::new(FakeBus::new());
        let result = Drv2605::new(RefCellDevice::new(&bus), DEFAULT_ADDRESS);
        assert_eq!(
            result.err(),
            Some(DeviceError::NotFound {
                device: DEVICE,
                address: DEFAULT_ADDRESS
            })
        );
    }
}
