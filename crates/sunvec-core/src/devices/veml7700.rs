//! VEML7700 ambient light sensor, on top of the `veml7700` driver.
//!
//! Configured for the widest range the part offers (gain 1/8, 25 ms
//! integration), which tops out just above direct sunlight. Lux is a linear
//! scale of the raw counts.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, info};
use veml7700::{Error, Gain, IntegrationTime, Veml7700};

use super::{DeviceError, LightSensor};

const DEVICE: &str = "VEML7700";

/// The part has one fixed address.
pub const ADDRESS: u8 = 0x10;

const REG_ID: u8 = 0x07;
const DEVICE_ID: u8 = 0x81;

/// Resolution at gain 1/8 and 25 ms: 0.0036 lx/count at gain 2 / 800 ms,
/// scaled by 16 for gain and 32 for integration time.
pub const LUX_PER_COUNT: f64 = 0.0036 * 16.0 * 32.0;

/// Power-on settle time plus one integration period.
const STARTUP_MS: u32 = 3 + 25;

pub struct Veml7700Sensor<I2C> {
    sensor: Veml7700<I2C>,
}

impl<I2C: I2c> Veml7700Sensor<I2C> {
    /// Check the device ID, configure gain and integration time, power the
    /// sensor on and wait for the first integration to complete.
    pub fn new(mut i2c: I2C, delay: &mut impl DelayNs) -> Result<Self, DeviceError> {
        let mut id = [0u8; 2];
        i2c.write_read(ADDRESS, &[REG_ID], &mut id)
            .map_err(|e| DeviceError::from_bus(DEVICE, "read device id", ADDRESS, e))?;
        if id[0] != DEVICE_ID {
            return Err(DeviceError::UnexpectedIdentity {
                device: DEVICE,
                found: id[0],
            });
        }

        let mut sensor = Veml7700::new(i2c);
        sensor.set_gain(Gain::OneEighth).map_err(bus_error("set gain"))?;
        sensor
            .set_integration_time(IntegrationTime::_25ms)
            .map_err(bus_error("set integration time"))?;
        sensor.enable().map_err(bus_error("power on"))?;
        delay.delay_ms(STARTUP_MS);

        info!("{} ready at {:#04x}", DEVICE, ADDRESS);
        Ok(Self { sensor })
    }

    /// Raw ALS channel counts.
    pub fn read_raw(&mut self) -> Result<u16, DeviceError> {
        self.sensor.read_raw().map_err(bus_error("read ALS"))
    }
}

fn bus_error<E: embedded_hal::i2c::Error>(
    operation: &'static str,
) -> impl FnOnce(Error<E>) -> DeviceError {
    move |e| match e {
        Error::I2C(e) => DeviceError::from_bus(DEVICE, operation, ADDRESS, e),
    }
}

impl<I2C: I2c> LightSensor for Veml7700Sensor<I2C> {
    fn read_lux(&mut self) -> Result<f64, DeviceError> {
        let counts = self.read_raw()?;
        let lux = f64::from(counts) * LUX_PER_COUNT;
        debug!("{}: {} counts = {} lx", DEVICE, counts, lux);
        Ok(lux)
    }
}
