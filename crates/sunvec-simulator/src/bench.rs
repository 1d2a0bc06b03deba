//! Register-level emulation of the reference sensor bench.
//!
//! [`VirtualBench`] implements the blocking [`I2c`] trait so the real drivers,
//! bring-up and sample loop run against it unchanged. Light levels follow a
//! [`SyntheticSun`] that sweeps across the sky in wall-clock time.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::time::Instant;

use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use sunvec_core::config::HardwareConfig;
use sunvec_core::devices::veml7700::{ADDRESS as LIGHT_ADDRESS, LUX_PER_COUNT};

const VEML_REG_ALS: u8 = 0x04;
const VEML_REG_ID: u8 = 0x07;
const VEML_ID: u16 = 0x0081;

const DRV_REG_STATUS: u8 = 0x00;
/// DRV2605L: device ID 7 in STATUS bits 7:5.
const DRV_STATUS: u16 = 7 << 5;

const INA_REG_BUS_VOLTAGE: u8 = 0x02;
const INA_REG_POWER: u8 = 0x03;
const INA_REG_CURRENT: u8 = 0x04;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchError(ErrorKind);

impl i2c::Error for BenchError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

const NACK: BenchError = BenchError(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));

/// A sun moving at a fixed elevation while its azimuth sweeps a quarter turn,
/// from the +X sensor towards the +Y sensor, once per `sweep_secs`.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticSun {
    pub zenith_deg: f64,
    pub sweep_secs: f64,
    /// Illuminance seen by a sensor pointing straight at the sun.
    pub peak_lux: f64,
}

impl Default for SyntheticSun {
    fn default() -> Self {
        Self {
            zenith_deg: 40.0,
            sweep_secs: 30.0,
            peak_lux: 110_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl SyntheticSun {
    pub fn azimuth_deg(&self, elapsed_secs: f64) -> f64 {
        let phase = (elapsed_secs / self.sweep_secs).fract();
        90.0 * phase
    }

    /// Lux on a sensor facing along `axis`. Sensors facing away read dark.
    pub fn lux(&self, axis: Axis, elapsed_secs: f64) -> f64 {
        let theta = self.zenith_deg * PI / 180.0;
        let phi = self.azimuth_deg(elapsed_secs) * PI / 180.0;
        let component = match axis {
            Axis::X => theta.sin() * phi.cos(),
            Axis::Y => theta.sin() * phi.sin(),
        };
        component.max(0.0) * self.peak_lux
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    /// 8-bit registers with auto-increment.
    Byte,
    LittleEndian,
    BigEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// Plain register file: PWM controller and haptic drivers.
    Registers,
    Light(Axis),
    Power,
}

struct Peripheral {
    role: Role,
    encoding: Encoding,
    pointer: u8,
    registers: BTreeMap<u8, u16>,
}

impl Peripheral {
    fn new(role: Role, encoding: Encoding) -> Self {
        Self {
            role,
            encoding,
            pointer: 0,
            registers: BTreeMap::new(),
        }
    }

    fn with(mut self, reg: u8, value: u16) -> Self {
        self.registers.insert(reg, value);
        self
    }

    fn register(&self, reg: u8) -> u16 {
        self.registers.get(&reg).copied().unwrap_or(0)
    }

    fn write(&mut self, bytes: &[u8]) {
        let Some((&pointer, data)) = bytes.split_first() else {
            return;
        };
        self.pointer = pointer;
        match self.encoding {
            Encoding::Byte => {
                for (offset, &byte) in data.iter().enumerate() {
                    let reg = pointer.wrapping_add(offset as u8);
                    self.registers.insert(reg, u16::from(byte));
                }
            }
            Encoding::LittleEndian => {
                if let [lo, hi, ..] = *data {
                    self.registers.insert(pointer, u16::from_le_bytes([lo, hi]));
                }
            }
            Encoding::BigEndian => {
                if let [hi, lo, ..] = *data {
                    self.registers.insert(pointer, u16::from_be_bytes([hi, lo]));
                }
            }
        }
    }

    fn read(&mut self, buffer: &mut [u8]) {
        match self.encoding {
            Encoding::Byte => {
                for byte in buffer.iter_mut() {
                    *byte = self.register(self.pointer) as u8;
                    self.pointer = self.pointer.wrapping_add(1);
                }
            }
            Encoding::LittleEndian | Encoding::BigEndian => {
                let value = self.register(self.pointer);
                let bytes = if self.encoding == Encoding::LittleEndian {
                    value.to_le_bytes()
                } else {
                    value.to_be_bytes()
                };
                for (byte, value) in buffer.iter_mut().zip(bytes.iter().cycle()) {
                    *byte = *value;
                }
            }
        }
    }
}

/// Downstream segment of the mux, or the root bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Segment {
    Root,
    Channel(u8),
}

/// The whole bench as seen from the host's I2C port.
pub struct VirtualBench {
    sun: SyntheticSun,
    origin: Instant,
    mux_address: u8,
    selected: u8,
    peripherals: BTreeMap<(Segment, u8), Peripheral>,
}

impl VirtualBench {
    /// Populate the bench described by `config`. The haptic driver on the Y
    /// channel answers only at the alternate address.
    pub fn new(config: &HardwareConfig, sun: SyntheticSun) -> Self {
        let haptic =
            || Peripheral::new(Role::Registers, Encoding::Byte).with(DRV_REG_STATUS, DRV_STATUS);
        let light = |axis| {
            Peripheral::new(Role::Light(axis), Encoding::LittleEndian).with(VEML_REG_ID, VEML_ID)
        };

        let mut peripherals = BTreeMap::new();
        peripherals.insert(
            (Segment::Root, config.pwm_address),
            Peripheral::new(Role::Registers, Encoding::Byte),
        );
        let x = Segment::Channel(config.x_channel);
        let y = Segment::Channel(config.y_channel);
        peripherals.insert((x, LIGHT_ADDRESS), light(Axis::X));
        peripherals.insert((y, LIGHT_ADDRESS), light(Axis::Y));
        peripherals.insert((x, config.haptic_primary_address), haptic());
        peripherals.insert((y, config.haptic_alternate_address), haptic());
        peripherals.insert(
            (Segment::Channel(config.power_channel), config.power_address),
            Peripheral::new(Role::Power, Encoding::BigEndian),
        );

        Self {
            sun,
            origin: Instant::now(),
            mux_address: config.mux_address,
            selected: 0,
            peripherals,
        }
    }

    fn route(&mut self, address: u8) -> Result<&mut Peripheral, BenchError> {
        let selected = self.selected;
        let key = self
            .peripherals
            .keys()
            .copied()
            .find(|(segment, addr)| {
                *addr == address
                    && match segment {
                        Segment::Root => true,
                        Segment::Channel(ch) => selected & (1u8 << *ch) != 0,
                    }
            })
            .ok_or(NACK)?;
        self.peripherals.get_mut(&key).ok_or(NACK)
    }

    fn refresh(&mut self, address: u8) -> Result<(), BenchError> {
        let elapsed = self.origin.elapsed().as_secs_f64();
        let sun = self.sun;
        let peripheral = self.route(address)?;
        match peripheral.role {
            Role::Light(axis) if peripheral.pointer == VEML_REG_ALS => {
                let counts = (sun.lux(axis, elapsed) / LUX_PER_COUNT).round();
                let counts = counts.clamp(0.0, f64::from(u16::MAX)) as u16;
                peripheral.registers.insert(VEML_REG_ALS, counts);
            }
            Role::Power => {
                // 5 V rail with a slowly wandering load.
                let current_ma = 120.0 + 15.0 * (elapsed / 3.0).sin();
                peripheral
                    .registers
                    .insert(INA_REG_BUS_VOLTAGE, ((5.0 / 0.004) as u16) << 3);
                peripheral
                    .registers
                    .insert(INA_REG_CURRENT, (current_ma / 0.1).round() as i16 as u16);
                peripheral
                    .registers
                    .insert(INA_REG_POWER, (current_ma * 5.0 / 2.0).round() as u16);
            }
            _ => {}
        }
        Ok(())
    }

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), BenchError> {
        if address == self.mux_address {
            if let Some(&mask) = bytes.first() {
                self.selected = mask;
            }
            return Ok(());
        }
        self.route(address)?.write(bytes);
        Ok(())
    }

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), BenchError> {
        if address == self.mux_address {
            buffer.fill(self.selected);
            return Ok(());
        }
        self.refresh(address)?;
        self.route(address)?.read(buffer);
        Ok(())
    }
}

impl ErrorType for VirtualBench {
    type Error = BenchError;
}

impl I2c for VirtualBench {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            match operation {
                Operation::Write(bytes) => self.write(address, *bytes)?,
                Operation::Read(buffer) => self.read(address, &mut **buffer)?,
            }
        }
        Ok(())
    }
}
