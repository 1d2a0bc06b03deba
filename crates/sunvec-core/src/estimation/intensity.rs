use serde::{Deserialize, Serialize};

/// Illuminance treated as full scale (direct sunlight).
pub const SATURATION_LUX: f64 = 120_000.0;

/// A light reading rescaled against [`SATURATION_LUX`].
///
/// Values are at most 1.0. There is no lower clamp: light sensors never report
/// negative illuminance.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct NormalizedIntensity(f64);

impl NormalizedIntensity {
    pub const FULL: Self = Self(1.0);
    pub const DARK: Self = Self(0.0);

    /// Wrap an already-normalized value, clamping into `[0, 1]`.
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    /// Apply an acquisition-policy factor. The result stays within `[0, 1]`.
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.0 * factor)
    }
}

/// Map a raw lux reading onto `[0, 1]`.
pub fn normalize(raw_lux: f64) -> NormalizedIntensity {
    NormalizedIntensity((raw_lux / SATURATION_LUX).min(1.0))
}
