//! INA219 high-side current and power monitor, on top of the `ina219` driver.
//!
//! Calibrated for the 32 V / 2 A range with a 0.1 Ω shunt: 0.1 mA per current
//! bit and 2 mW per power bit.

use embedded_hal::i2c::I2c;
use ina219::SyncIna219;
use ina219::address::Address;
use ina219::calibration::{Calibration, IntCalibration, MicroAmpere};
use ina219::configuration::Configuration;
use ina219::errors::BusVoltageReadError;
use log::info;

use super::{DeviceError, PowerMonitor, PowerReading};

const DEVICE: &str = "INA219";

pub const DEFAULT_ADDRESS: u8 = 0x40;

const CURRENT_LSB_UA: i64 = 100;
const SHUNT_MICRO_OHMS: u32 = 100_000;

pub struct Ina219Monitor<I2C> {
    monitor: SyncIna219<I2C, IntCalibration>,
    calibration: IntCalibration,
    address: u8,
}

impl<I2C: I2c> Ina219Monitor<I2C> {
    /// Write the power-on configuration (32 V bus, ±320 mV shunt, 12-bit,
    /// continuous) and the calibration register.
    pub fn new(i2c: I2C, address: u8) -> Result<Self, DeviceError> {
        let pins = Address::from_byte(address).map_err(|_| DeviceError::InvalidAddress {
            device: DEVICE,
            address,
        })?;
        let calibration = IntCalibration::new(MicroAmpere(CURRENT_LSB_UA), SHUNT_MICRO_OHMS)
            .ok_or(DeviceError::OutOfRange {
                device: DEVICE,
                operation: "compute calibration",
            })?;

        let mut monitor = SyncIna219::new_unchecked(i2c, pins, calibration);
        monitor
            .set_configuration(Configuration::default())
            .map_err(|e| DeviceError::from_bus(DEVICE, "write configuration", address, e))?;
        monitor
            .calibrate(calibration)
            .map_err(|e| DeviceError::from_bus(DEVICE, "write calibration", address, e))?;

        info!("{} ready at {:#04x}", DEVICE, address);
        Ok(Self {
            monitor,
            calibration,
            address,
        })
    }

    pub fn bus_voltage_v(&mut self) -> Result<f64, DeviceError> {
        let address = self.address;
        let voltage = self.monitor.bus_voltage().map_err(|e| match e {
            BusVoltageReadError::I2cError(e) => {
                DeviceError::from_bus(DEVICE, "read bus voltage", address, e)
            }
            BusVoltageReadError::BusVoltageOutOfRange { .. } => DeviceError::OutOfRange {
                device: DEVICE,
                operation: "read bus voltage",
            },
        })?;
        Ok(f64::from(voltage.voltage_mv()) / 1000.0)
    }

    pub fn current_ma(&mut self) -> Result<f64, DeviceError> {
        let address = self.address;
        let raw = self
            .monitor
            .current_raw()
            .map_err(|e| DeviceError::from_bus(DEVICE, "read current", address, e))?;
        Ok(self.calibration.current_from_register(raw).0 as f64 / 1000.0)
    }

    pub fn power_mw(&mut self) -> Result<f64, DeviceError> {
        let address = self.address;
        let raw = self
            .monitor
            .power_raw()
            .map_err(|e| DeviceError::from_bus(DEVICE, "read power", address, e))?;
        Ok(self.calibration.power_from_register(raw).0 as f64 / 1000.0)
    }
}

impl<I2C: I2c> PowerMonitor for Ina219Monitor<I2C> {
    fn read(&mut self) -> Result<PowerReading, DeviceError> {
        Ok(PowerReading {
            bus_voltage_v: self.bus_voltage_v()?,
            current_ma: self.current_ma()?,
            power_mw: self.power_mw()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::fake_bus::{FakeBus, FakeDevice};
    use approx::assert_relative_eq;
    use core::cell::RefCell;
    use embedded_hal_bus::i2c::RefCellDevice;

    const REG_CONFIG: u8 = 0x00;
    const REG_BUS_VOLTAGE: u8 = 0x02;
    const REG_POWER: u8 = 0x03;
    const REG_CURRENT: u8 = 0x04;
    const REG_CALIBRATION: u8 = 0x05;

    fn bus_with(device: FakeDevice) -> RefCell<FakeBus> {
        RefCell::new(FakeBus::new().with_root(DEFAULT_ADDRESS, device))
    }

    #[test]
    fn test_bring_up_configures_and_calibrates() {
        let bus = bus_with(FakeDevice::new());
        Ina219Monitor::new(RefCellDevice::new(&bus), DEFAULT_ADDRESS).unwrap();

        let bus = bus.borrow();
        let device = bus.root(DEFAULT_ADDRESS);
        assert_eq!(device.reg(REG_CONFIG), &[0x39, 0x9F]);
        assert_eq!(device.reg(REG_CALIBRATION), &[0x10, 0x00]);
    }

    #[test]
    fn test_reading_conversions() {
        // 5.000 V → 1250 << 3, 123.4 mA → 1234, 616 mW → 308.
        let device = FakeDevice::new()
            .with_reg(REG_BUS_VOLTAGE, &(1250u16 << 3 | 0b10).to_be_bytes())
            .with_reg(REG_CURRENT, &1234i16.to_be_bytes())
            .with_reg(REG_POWER, &308u16.to_be_bytes());
        let bus = bus_with(device);
        let mut monitor = Ina219Monitor::new(RefCellDevice::new(&bus), DEFAULT_ADDRESS).unwrap();

        let reading = monitor.read().unwrap();
        assert_relative_eq!(reading.bus_voltage_v, 5.0, epsilon = 1e-12);
        assert_relative_eq!(reading.current_ma, 123.4, epsilon = 1e-9);
        assert_relative_eq!(reading.power_mw, 616.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reverse_current_is_negative() {
        let device = FakeDevice::new().with_reg(REG_CURRENT, &(-250i16).to_be_bytes());
        let bus = bus_with(device);
        let mut monitor = Ina219Monitor::new(RefCellDevice::new(&bus), DEFAULT_ADDRESS).unwrap();
        assert_relative_eq!(monitor.current_ma().unwrap(), -25.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bus_voltage_beyond_range() {
        let device = FakeDevice::new().with_reg(REG_BUS_VOLTAGE, &0xFFF8u16.to_be_bytes());
        let bus = bus_with(device);
        let mut monitor = Ina219Monitor::new(RefCellDevice::new(&bus), DEFAULT_ADDRESS).unwrap();
        assert_eq!(
            monitor.bus_voltage_v(),
            Err(DeviceError::OutOfRange {
                device: DEVICE,
                operation: "read bus voltage"
            })
        );
    }

    #[test]
    fn test_address_outside_part_range() {
        let bus = bus_with(FakeDevice::new());
        assert_eq!(
            Ina219Monitor::new(RefCellDevice::new(&bus), 0x5A).err(),
            Some(DeviceError::InvalidAddress {
                device: DEVICE,
                address: 0x5A
            })
        );
    }
}
