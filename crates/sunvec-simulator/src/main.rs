//! Desktop simulator for the sunvec sun-vector sampler.
//!
//! Runs the real bring-up and sample loop against a [`VirtualBench`] whose
//! light levels follow a synthetic moving sun. Time is wall-clock and every
//! wait is a real sleep, so the default run takes 30 seconds.
//!
//! Settings come from the environment (see [`settings`]); a `.env` file in the
//! working directory is loaded first. Logging is controlled by `RUST_LOG`.

mod bench;
mod host;
mod settings;

use std::cell::RefCell;
use std::process::ExitCode;

use embedded_hal_bus::i2c::RefCellDevice;
use log::{error, info};
use thiserror::Error;

use sunvec_core::config::HardwareConfig;
use sunvec_core::devices::{DeviceError, Tca9548a};
use sunvec_core::hardware::{bring_up, enable_outputs};
use sunvec_core::sampling::{RunError, RunSummary, SunSampler};
use sunvec_core::storage::{CsvSink, PostcardSink};

use crate::bench::{SyntheticSun, VirtualBench};
use crate::host::{FileWriter, StdClock, StdDelay};
use crate::settings::{OutputFormat, Settings, SettingsError};

#[derive(Error, Debug)]
enum SimulatorError {
    #[error("configuration: {0}")]
    Settings(#[from] SettingsError),
    #[error("cannot create output file: {0}")]
    Output(#[from] std::io::Error),
    #[error("hardware bring-up failed: {0}")]
    BringUp(DeviceError),
    #[error("sampling run failed: {0}")]
    Run(RunError),
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(summary) => {
            info!(
                "Wrote {} records in {:.1} s",
                summary.records, summary.elapsed_secs
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<RunSummary, SimulatorError> {
    let settings = Settings::from_env()?;
    let hardware = HardwareConfig::default();
    info!(
        "Writing {:?} records to {}",
        settings.format,
        settings.output.display()
    );

    let bus = RefCell::new(VirtualBench::new(&hardware, SyntheticSun::default()));
    let mut delay = StdDelay;

    let _pwm = enable_outputs(RefCellDevice::new(&bus), &hardware, &mut delay)
        .map_err(SimulatorError::BringUp)?;
    let mux = Tca9548a::new(RefCellDevice::new(&bus), hardware.mux_address)
        .map_err(SimulatorError::BringUp)?;
    let mux = RefCell::new(mux);
    let instruments = bring_up(&mux, &hardware, &mut delay).map_err(SimulatorError::BringUp)?;

    let writer = FileWriter::create(&settings.output)?;
    let mut sampler = SunSampler::new(instruments, StdClock::new(), delay, settings.sampler);

    let summary = match settings.format {
        OutputFormat::Csv => sampler.run(&mut CsvSink::new(writer)),
        OutputFormat::Postcard => sampler.run(&mut PostcardSink::new(writer)),
    };
    summary.map_err(SimulatorError::Run)
}
