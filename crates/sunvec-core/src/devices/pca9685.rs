//! PCA9685 16-channel PWM controller, used only to hold output-enable lines
//! on. Built on the `pwm-pca9685` driver.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::info;
use pwm_pca9685::{Channel, Error, Pca9685};

use super::DeviceError;

const DEVICE: &str = "PCA9685";

const OSCILLATOR_HZ: f64 = 25_000_000.0;
const OSCILLATOR_WAKE_MS: u32 = 5;

/// Prescaler value for an output frequency, limited to what the register
/// accepts.
pub fn prescale_for(frequency_hz: u16) -> u8 {
    let prescale = libm::round(OSCILLATOR_HZ / (4096.0 * f64::from(frequency_hz.max(1)))) - 1.0;
    prescale.clamp(3.0, 255.0) as u8
}

pub struct Pca9685Outputs<I2C> {
    pwm: Pca9685<I2C>,
    address: u8,
}

impl<I2C: I2c> Pca9685Outputs<I2C> {
    /// Put the oscillator to sleep, latch the prescaler for `frequency_hz`
    /// and wake it again.
    pub fn new(
        i2c: I2C,
        address: u8,
        frequency_hz: u16,
        delay: &mut impl DelayNs,
    ) -> Result<Self, DeviceError> {
        let mut pwm = Pca9685::new(i2c, address).map_err(|_| DeviceError::InvalidAddress {
            device: DEVICE,
            address,
        })?;
        let prescale = prescale_for(frequency_hz);

        pwm.disable().map_err(pwm_error("sleep", address))?;
        pwm.set_prescale(prescale)
            .map_err(pwm_error("write prescale", address))?;
        pwm.enable().map_err(pwm_error("wake", address))?;
        delay.delay_ms(OSCILLATOR_WAKE_MS);

        info!("{}: {} Hz (prescale {})", DEVICE, frequency_hz, prescale);
        Ok(Self { pwm, address })
    }

    /// Drive `channel` at 100% duty cycle.
    pub fn set_full_on(&mut self, channel: u8) -> Result<(), DeviceError> {
        let output = Channel::try_from(channel).map_err(|()| DeviceError::InvalidChannel {
            device: DEVICE,
            channel,
        })?;
        self.pwm
            .set_channel_full_on(output, 0)
            .map_err(pwm_error("set full on", self.address))
    }
}

fn pwm_error<E: embedded_hal::i2c::Error>(
    operation: &'static str,
    address: u8,
) -> impl FnOnce(Error<E>) -> DeviceError {
    move |e| match e {
        Error::I2C(e) => DeviceError::from_bus(DEVICE, operation, address, e),
        Error::InvalidInputData => DeviceError::OutOfRange {
            device: DEVICE,
            operation,
        },
    }
}
