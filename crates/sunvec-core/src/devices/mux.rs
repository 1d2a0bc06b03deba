//! TCA9548A 1-to-8 I2C multiplexer.
//!
//! [`Tca9548a`] wraps the `xca9548a` driver and is shared through a `RefCell`.
//! Devices behind it talk over a [`MuxBus`], which forwards transactions
//! without touching the channel mask, and are held in a [`MuxChannel`] that
//! selects its channel before every operation. A channel never inherits state
//! left behind by another handle.
//!
//! A failed select is reported against the mux itself, never against the
//! device behind it, so it cannot be mistaken for an absent device.

use core::cell::RefCell;

use embedded_hal::i2c::{Error as _, ErrorType, I2c, Operation};
use embedded_hal_bus::i2c::RefCellDevice;
use log::error;
use xca9548a::{SlaveAddr, Xca9548a};

use super::{DeviceError, HapticActuator, LightSensor, PowerMonitor, PowerReading};

const DEVICE: &str = "TCA9548A";

const BASE_ADDRESS: u8 = 0x70;
pub const CHANNEL_COUNT: u8 = 8;

/// Bus handed to a device behind the mux.
pub type MuxBus<'a, I2C> = RefCellDevice<'a, Tca9548a<I2C>>;

pub struct Tca9548a<I2C> {
    mux: Xca9548a<I2C>,
    address: u8,
}

impl<I2C: I2c> Tca9548a<I2C> {
    /// `address` must be one of 0x70..=0x77.
    pub fn new(i2c: I2C, address: u8) -> Result<Self, DeviceError> {
        if address & !0b111 != BASE_ADDRESS {
            return Err(DeviceError::InvalidAddress {
                device: DEVICE,
                address,
            });
        }
        let pins = SlaveAddr::Alternative(
            address & 0b100 != 0,
            address & 0b010 != 0,
            address & 0b001 != 0,
        );
        Ok(Self {
            mux: Xca9548a::new(i2c, pins),
            address,
        })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Read the control register. Doubles as a presence check.
    pub fn channel_status(&mut self) -> Result<u8, DeviceError> {
        self.mux
            .get_channel_status()
            .map_err(|e| DeviceError::from_bus(DEVICE, "read control register", self.address, e))
    }

    /// Disconnect every downstream channel.
    pub fn disable_all(&mut self) -> Result<(), DeviceError> {
        self.mux
            .select_channels(0)
            .map_err(|e| DeviceError::from_bus(DEVICE, "disable channels", self.address, e))
    }

    /// Connect `channel` alone. Every failure, a NACK included, is a bus error.
    fn select(&mut self, channel: u8) -> Result<(), DeviceError> {
        self.mux.select_channels(1 << channel).map_err(|e| {
            error!(
                "{} at {:#04x}: selecting channel {} failed: {:?}",
                DEVICE, self.address, channel, e
            );
            DeviceError::Bus {
                device: DEVICE,
                operation: "select channel",
                kind: e.kind(),
            }
        })
    }
}

impl<I2C: I2c> ErrorType for Tca9548a<I2C> {
    type Error = xca9548a::Error<I2C::Error>;
}

impl<I2C: I2c> I2c for Tca9548a<I2C> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.mux.transaction(address, operations)
    }
}

/// A device on one downstream channel of a shared [`Tca9548a`].
pub struct MuxChannel<'a, I2C, D> {
    mux: &'a RefCell<Tca9548a<I2C>>,
    channel: u8,
    device: D,
}

impl<'a, I2C: I2c, D> MuxChannel<'a, I2C, D> {
    /// Select `channel` and bring up the device behind it with `attach`.
    pub fn attach<F>(
        mux: &'a RefCell<Tca9548a<I2C>>,
        channel: u8,
        attach: F,
    ) -> Result<Self, DeviceError>
    where
        F: FnOnce(MuxBus<'a, I2C>) -> Result<D, DeviceError>,
    {
        if channel >= CHANNEL_COUNT {
            return Err(DeviceError::InvalidChannel {
                device: DEVICE,
                channel,
            });
        }
        mux.borrow_mut().select(channel)?;
        let device = attach(RefCellDevice::new(mux))?;
        Ok(Self {
            mux,
            channel,
            device,
        })
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    fn on_channel<R>(
        &mut self,
        operation: impl FnOnce(&mut D) -> Result<R, DeviceError>,
    ) -> Result<R, DeviceError> {
        self.mux.borrow_mut().select(self.channel)?;
        operation(&mut self.device)
    }
}

impl<I2C: I2c, D: LightSensor> LightSensor for MuxChannel<'_, I2C, D> {
    fn read_lux(&mut self) -> Result<f64, DeviceError> {
        self.on_channel(|sensor| sensor.read_lux())
    }
}

impl<I2C: I2c, D: HapticActuator> HapticActuator for MuxChannel<'_, I2C, D> {
    fn trigger_effect(&mut self, effect: u8) -> Result<(), DeviceError> {
        self.on_channel(|haptic| haptic.trigger_effect(effect))
    }

    fn play(&mut self) -> Result<(), DeviceError> {
        self.on_channel(|haptic| haptic.play())
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.on_channel(|haptic| haptic.stop())
    }
}

impl<I2C: I2c, D: PowerMonitor> PowerMonitor for MuxChannel<'_, I2C, D> {
    fn read(&mut self) -> Result<PowerReading, DeviceError> {
        self.on_channel(|monitor| monitor.read())
    }
}
