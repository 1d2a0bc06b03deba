//! Periodic sun-vector sampling.
//!
//! [`SunSampler`] drives the estimation pipeline on a fixed cadence for a
//! bounded run: pulse the haptics, read the light sensors, estimate, emit a
//! [`Record`], log a [`CycleStatus`], then block through the active and settle
//! periods. It is single-threaded and every wait is a blocking delay.

mod status;

pub use status::CycleStatus;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};
use thiserror_no_std::Error;

use crate::config::SamplerConfig;
use crate::devices::{DeviceError, HapticActuator, LightSensor, PowerMonitor};
use crate::estimation::{angles_from, estimate};
use crate::storage::{Record, RecordSink, StorageError};

/// Haptic drivers the bench can carry.
pub const MAX_HAPTICS: usize = 2;

/// Monotonic time since an arbitrary origin.
pub trait MonotonicClock {
    fn now_micros(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Finished,
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum RunError {
    #[error("light sensor failed: {0}")]
    Sensor(DeviceError),
    #[error("haptic driver failed: {0}")]
    Actuator(DeviceError),
    #[error("power telemetry failed: {0}")]
    Telemetry(DeviceError),
    #[error("record sink failed: {0}")]
    Storage(StorageError),
    #[error("sampler is {0:?}; a run can only start from Idle")]
    NotIdle(RunState),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub records: usize,
    pub elapsed_secs: f64,
}

/// Everything the loop talks to, constructed once at bring-up.
///
/// The Y sensor is read twice per cycle: once for Y and once for the emulated
/// Z axis.
pub struct Instruments<L, H, P> {
    pub x_sensor: L,
    pub y_sensor: L,
    pub haptics: heapless::Vec<H, MAX_HAPTICS>,
    pub power: P,
}

impl<L, H, P> Instruments<L, H, P> {
    /// Haptics beyond [`MAX_HAPTICS`] are dropped.
    pub fn new(
        x_sensor: L,
        y_sensor: L,
        haptics: impl IntoIterator<Item = H>,
        power: P,
    ) -> Self {
        let haptics: heapless::Vec<H, MAX_HAPTICS> =
            haptics.into_iter().take(MAX_HAPTICS).collect();
        Self {
            x_sensor,
            y_sensor,
            haptics,
            power,
        }
    }
}

pub struct SunSampler<L, H, P, C, D> {
    instruments: Instruments<L, H, P>,
    clock: C,
    delay: D,
    config: SamplerConfig,
    state: RunState,
}

impl<L, H, P, C, D> SunSampler<L, H, P, C, D>
where
    L: LightSensor,
    H: HapticActuator,
    P: PowerMonitor,
    C: MonotonicClock,
    D: DelayNs,
{
    pub fn new(
        instruments: Instruments<L, H, P>,
        clock: C,
        delay: D,
        config: SamplerConfig,
    ) -> Self {
        Self {
            instruments,
            clock,
            delay,
            config,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn instruments(&self) -> &Instruments<L, H, P> {
        &self.instruments
    }

    pub fn into_instruments(self) -> Instruments<L, H, P> {
        self.instruments
    }

    /// Sample until the configured duration has elapsed.
    ///
    /// `sink` is opened on entry and closed before returning, whether the run
    /// completed or failed. A failure inside the loop takes precedence over a
    /// failure to close.
    pub fn run<S: RecordSink>(&mut self, sink: &mut S) -> Result<RunSummary, RunError> {
        if self.state != RunState::Idle {
            return Err(RunError::NotIdle(self.state));
        }

        let start = self.clock.now_micros();
        self.state = RunState::Running;
        info!(
            "Sampling for {} ms ({} ms active, {} ms settle)",
            self.config.run_duration_ms, self.config.active_ms, self.config.settle_ms
        );

        let outcome = self.sample(sink, start);
        let closed = sink.close().map_err(RunError::Storage);
        self.state = RunState::Finished;

        match &outcome {
            Ok(summary) => info!(
                "Run finished: {} records in {:.1} s",
                summary.records, summary.elapsed_secs
            ),
            Err(e) => warn!("Run aborted: {}", e),
        }

        let summary = outcome?;
        closed?;
        Ok(summary)
    }

    fn sample<S: RecordSink>(&mut self, sink: &mut S, start: u64) -> Result<RunSummary, RunError> {
        sink.open().map_err(RunError::Storage)?;

        let effect = self.config.haptic_effect;
        for haptic in self.instruments.haptics.iter_mut() {
            haptic.trigger_effect(effect).map_err(RunError::Actuator)?;
        }

        let duration_us = u64::from(self.config.run_duration_ms) * 1_000;
        let mut records = 0;
        while self.elapsed_micros(start) < duration_us {
            self.cycle(sink, start)?;
            records += 1;
        }

        Ok(RunSummary {
            records,
            elapsed_secs: micros_to_secs(self.elapsed_micros(start)),
        })
    }

    fn cycle<S: RecordSink>(&mut self, sink: &mut S, start: u64) -> Result<Record, RunError> {
        for haptic in self.instruments.haptics.iter_mut() {
            haptic.play().map_err(RunError::Actuator)?;
        }

        let x = self.instruments.x_sensor.read_normalized().map_err(RunError::Sensor)?;
        let y = self.instruments.y_sensor.read_normalized().map_err(RunError::Sensor)?;
        let z = self
            .instruments
            .y_sensor
            .read_normalized()
            .map_err(RunError::Sensor)?
            .scaled(self.config.z_from_y_scale);

        let vector = estimate(x, y, z);
        if vector.is_zero() {
            debug!("All sensors dark; sun vector is degenerate");
        }
        let angles = angles_from(&vector);

        let record = Record::new(micros_to_secs(self.elapsed_micros(start)), vector, angles);
        sink.append(&record).map_err(RunError::Storage)?;

        let power = self.instruments.power.read().map_err(RunError::Telemetry)?;
        info!(
            "{}",
            CycleStatus {
                readings: [x, y, z],
                record,
                power,
            }
        );

        self.delay.delay_ms(self.config.active_ms);
        for haptic in self.instruments.haptics.iter_mut() {
            haptic.stop().map_err(RunError::Actuator)?;
        }
        self.delay.delay_ms(self.config.settle_ms);

        Ok(record)
    }

    fn elapsed_micros(&self, start: u64) -> u64 {
        self.clock.now_micros().saturating_sub(start)
    }
}

fn micros_to_secs(micros: u64) -> f64 {
    micros as f64 / 1_000_000.0
}
