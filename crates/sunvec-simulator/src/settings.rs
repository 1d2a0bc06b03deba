//! Simulator settings read from the environment.
//!
//! | Variable          | Meaning                                   | Default           |
//! |-------------------|-------------------------------------------|-------------------|
//! | `SUNVEC_OUTPUT`   | Record file path                          | `sun_vectors.csv` |
//! | `SUNVEC_FORMAT`   | `csv` or `postcard`                       | `csv`             |
//! | `SUNVEC_RUN_SECS` | Run length in seconds                     | 30                |
//! | `SUNVEC_Z_SCALE`  | Factor applied to the emulated Z reading  | 0.8               |

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use sunvec_core::config::SamplerConfig;

pub const DEFAULT_OUTPUT: &str = "sun_vectors.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Postcard,
}

impl FromStr for OutputFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "postcard" | "bin" => Ok(Self::Postcard),
            _ => Err(()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{variable} has invalid value {value:?}")]
pub struct SettingsError {
    pub variable: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub output: PathBuf,
    pub format: OutputFormat,
    pub sampler: SamplerConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            format: OutputFormat::Csv,
            sampler: SamplerConfig::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source; unset variables keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        if let Some(output) = lookup("SUNVEC_OUTPUT") {
            settings.output = PathBuf::from(output);
        }
        if let Some(format) = parse(&lookup, "SUNVEC_FORMAT")? {
            settings.format = format;
        }
        if let Some(secs) = parse::<f64>(&lookup, "SUNVEC_RUN_SECS")? {
            if !(0.0..=f64::from(u32::MAX) / 1_000.0).contains(&secs) {
                return Err(invalid(&lookup, "SUNVEC_RUN_SECS"));
            }
            settings.sampler.run_duration_ms = (secs * 1_000.0).round() as u32;
        }
        if let Some(scale) = parse::<f64>(&lookup, "SUNVEC_Z_SCALE")? {
            if !scale.is_finite() || scale < 0.0 {
                return Err(invalid(&lookup, "SUNVEC_Z_SCALE"));
            }
            settings.sampler.z_from_y_scale = scale;
        }

        Ok(settings)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    variable: &'static str,
) -> Result<Option<T>, SettingsError> {
    match lookup(variable) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SettingsError {
                variable,
                value: raw,
            }),
    }
}

fn invalid(lookup: &impl Fn(&str) -> Option<String>, variable: &'static str) -> SettingsError {
    SettingsError {
        variable,
        value: lookup(variable).unwrap_or_default(),
    }
}
