//! Run and bus configuration.
//!
//! Defaults describe the reference bench: two light sensors on mux channels 0
//! and 1, a haptic driver beside each, the power monitor on channel 5, and the
//! PWM driver on the root bus.

use serde::{Deserialize, Serialize};

/// Scale applied to the second Y-sensor read to stand in for a Z axis.
///
/// There is no physical Z sensor; this is a placeholder policy, not a
/// calibration constant.
pub const DEFAULT_Z_FROM_Y_SCALE: f64 = 0.8;

/// Haptic library effect armed on every actuator before the loop starts.
pub const DEFAULT_HAPTIC_EFFECT: u8 = 47;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    /// Total run length. The loop starts no new cycle once this has elapsed.
    pub run_duration_ms: u32,
    /// How long the haptic pulse plays after a record is emitted.
    pub active_ms: u32,
    /// Quiet time after the pulse stops, before the next cycle.
    pub settle_ms: u32,
    pub z_from_y_scale: f64,
    pub haptic_effect: u8,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            run_duration_ms: 30_000,
            active_ms: 1_000,
            settle_ms: 1_000,
            z_from_y_scale: DEFAULT_Z_FROM_Y_SCALE,
            haptic_effect: DEFAULT_HAPTIC_EFFECT,
        }
    }
}

impl SamplerConfig {
    /// Nominal length of one cycle, ignoring bus and sink latency.
    pub const fn cycle_ms(&self) -> u32 {
        self.active_ms + self.settle_ms
    }
}

/// Where each device sits on the bus.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareConfig {
    pub pwm_address: u8,
    pub pwm_frequency_hz: u16,
    pub pwm_channels: [u8; 2],
    pub mux_address: u8,
    pub x_channel: u8,
    pub y_channel: u8,
    pub haptic_primary_address: u8,
    pub haptic_alternate_address: u8,
    pub power_channel: u8,
    pub power_address: u8,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            pwm_address: 0x56,
            pwm_frequency_hz: 60,
            pwm_channels: [0, 1],
            mux_address: 0x77,
            x_channel: 0,
            y_channel: 1,
            haptic_primary_address: 0x5A,
            haptic_alternate_address: 0x5F,
            power_channel: 5,
            power_address: 0x40,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cycle_is_two_seconds() {
        let config = SamplerConfig::default();
        assert_eq!(config.cycle_ms(), 2_000);
        assert_eq!(config.run_duration_ms / config.cycle_ms(), 15);
    }
}
