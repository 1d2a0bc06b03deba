//! Hardware bring-up for the sensor bench
//!
//! Constructs every device exactly once, in dependency order, from bus objects
//! the caller owns. Nothing here is global: the returned [`Instruments`] are
//! handed to the sample loop by value.
//!
//! Only one failure is recovered: the second haptic driver may answer at its
//! alternate address (see [`with_address_fallback`]). Everything else aborts
//! bring-up.

use core::cell::RefCell;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::info;

use crate::config::HardwareConfig;
use crate::devices::{
    DeviceError, Drv2605, Ina219Monitor, MuxBus, MuxChannel, Pca9685Outputs, Tca9548a,
    Veml7700Sensor, with_address_fallback,
};
use crate::sampling::Instruments;

/// The instrument set produced by [`bring_up`], every device on a mux channel.
pub type BenchInstruments<'a, I2C> = Instruments<
    MuxChannel<'a, I2C, Veml7700Sensor<MuxBus<'a, I2C>>>,
    MuxChannel<'a, I2C, Drv2605<MuxBus<'a, I2C>>>,
    MuxChannel<'a, I2C, Ina219Monitor<MuxBus<'a, I2C>>>,
>;

/// Configure the PWM controller and latch the output-enable channels fully on.
///
/// This is a one-time step; the driver is returned so the caller keeps the
/// device alive but the sample loop never touches it.
pub fn enable_outputs<I2C: I2c>(
    i2c: I2C,
    config: &HardwareConfig,
    delay: &mut impl DelayNs,
) -> Result<Pca9685Outputs<I2C>, DeviceError> {
    info!("Configuring PWM outputs at {:#04x}", config.pwm_address);
    let mut pwm = Pca9685Outputs::new(i2c, config.pwm_address, config.pwm_frequency_hz, delay)?;
    for channel in config.pwm_channels {
        pwm.set_full_on(channel)?;
    }
    Ok(pwm)
}

/// Bring up the light sensors, haptic drivers and power monitor behind `mux`.
pub fn bring_up<'a, I2C: I2c>(
    mux: &'a RefCell<Tca9548a<I2C>>,
    config: &HardwareConfig,
    delay: &mut impl DelayNs,
) -> Result<BenchInstruments<'a, I2C>, DeviceError> {
    info!("Checking I2C mux at {:#04x}", mux.borrow().address());
    mux.borrow_mut().channel_status()?;

    info!("Configuring light sensors");
    let x_sensor = MuxChannel::attach(mux, config.x_channel, |bus| {
        Veml7700Sensor::new(bus, &mut *delay)
    })?;
    let y_sensor = MuxChannel::attach(mux, config.y_channel, |bus| {
        Veml7700Sensor::new(bus, &mut *delay)
    })?;

    info!("Configuring haptic drivers");
    let x_haptic = MuxChannel::attach(mux, config.x_channel, |bus| {
        Drv2605::new(bus, config.haptic_primary_address)
    })?;
    let (y_haptic, address) = with_address_fallback(
        config.haptic_primary_address,
        config.haptic_alternate_address,
        |address| MuxChannel::attach(mux, config.y_channel, |bus| Drv2605::new(bus, address)),
    )?;
    if address != config.haptic_primary_address {
        info!("Second haptic driver using alternate address {:#04x}", address);
    }

    info!("Configuring power monitor");
    let power = MuxChannel::attach(mux, config.power_channel, |bus| {
        Ina219Monitor::new(bus, config.power_address)
    })?;

    Ok(Instruments::new(x_sensor, y_sensor, [x_haptic, y_haptic], power))
}
