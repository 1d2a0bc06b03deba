//! Collaborator traits and device drivers for the sensor bench.
//!
//! The sample loop only sees the traits ([`LightSensor`], [`HapticActuator`],
//! [`PowerMonitor`]). The wrappers here implement them on top of the
//! `embedded-hal` driver crates and are usually held in a [`MuxChannel`].

pub mod drv2605;
pub mod ina219;
pub mod mux;
pub mod pca9685;
pub mod veml7700;

#[cfg(test)]
pub(crate) mod fake_bus;

pub use drv2605::Drv2605;
pub use ina219::Ina219Monitor;
pub use mux::{MuxBus, MuxChannel, Tca9548a};
pub use pca9685::Pca9685Outputs;
pub use veml7700::Veml7700Sensor;

use embedded_hal::i2c::{Error as _, ErrorKind, NoAcknowledgeSource};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::estimation::{NormalizedIntensity, normalize};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// Nothing acknowledged the address. The only error that address fallback
    /// recovers from.
    #[error("{device} not responding at address {address:#04x}")]
    NotFound { device: &'static str, address: u8 },
    #[error("{device} reported unexpected identity {found:#04x}")]
    UnexpectedIdentity { device: &'static str, found: u8 },
    #[error("{device} bus error during {operation}: {kind}")]
    Bus {
        device: &'static str,
        operation: &'static str,
        kind: ErrorKind,
    },
    #[error("{device} channel {channel} out of range")]
    InvalidChannel { device: &'static str, channel: u8 },
    #[error("{device} cannot use address {address:#04x}")]
    InvalidAddress { device: &'static str, address: u8 },
    #[error("{device} value out of range during {operation}")]
    OutOfRange {
        device: &'static str,
        operation: &'static str,
    },
}

impl DeviceError {
    /// Classify a raw bus error. An address NACK becomes [`DeviceError::NotFound`].
    pub fn from_bus<E: embedded_hal::i2c::Error>(
        device: &'static str,
        operation: &'static str,
        address: u8,
        e: E,
    ) -> Self {
        match e.kind() {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => {
                Self::NotFound { device, address }
            }
            kind => {
                error!("{} {} failed at {:#04x}: {:?}", device, operation, address, e);
                Self::Bus {
                    device,
                    operation,
                    kind,
                }
            }
        }
    }
}

/// Ambient light sensor.
pub trait LightSensor {
    /// Illuminance in lux.
    fn read_lux(&mut self) -> Result<f64, DeviceError>;

    fn read_normalized(&mut self) -> Result<NormalizedIntensity, DeviceError> {
        self.read_lux().map(normalize)
    }
}

/// Haptic driver that plays a preloaded library effect.
pub trait HapticActuator {
    /// Load `effect` into the first sequence slot.
    fn trigger_effect(&mut self, effect: u8) -> Result<(), DeviceError>;
    fn play(&mut self) -> Result<(), DeviceError>;
    fn stop(&mut self) -> Result<(), DeviceError>;
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct PowerReading {
    pub bus_voltage_v: f64,
    pub current_ma: f64,
    pub power_mw: f64,
}

/// Supply telemetry. Reads have no side effects.
pub trait PowerMonitor {
    fn read(&mut self) -> Result<PowerReading, DeviceError>;
}

/// Bring a device up at `primary`, retrying once at `alternate` if and only if
/// nothing answered at `primary`.
///
/// Returns the device together with the address it answered at. Any other
/// failure, including one at the alternate address, is returned unchanged.
pub fn with_address_fallback<T, F>(
    primary: u8,
    alternate: u8,
    mut bring_up: F,
) -> Result<(T, u8), DeviceError>
where
    F: FnMut(u8) -> Result<T, DeviceError>,
{
    match bring_up(primary) {
        Ok(device) => Ok((device, primary)),
        Err(DeviceError::NotFound { device, .. }) => {
            warn!(
                "{} absent at {:#04x}, trying alternate {:#04x}",
                device, primary, alternate
            );
            bring_up(alternate).map(|device| (device, alternate))
        }
        Err(e) => Err(e),
    }
}
