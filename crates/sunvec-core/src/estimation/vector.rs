use serde::{Deserialize, Serialize};

use super::NormalizedIntensity;

/// Direction in the sensor's local frame.
///
/// Holds either a raw triple straight from three intensities or, after
/// [`estimate`], a unit vector. The one exception to unit length is
/// [`DirectionVector::ZERO`], produced when every input was dark.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct DirectionVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl DirectionVector {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        libm::sqrt(self.x * self.x + self.y * self.y + self.z * self.z)
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Scale to unit length. A zero-magnitude vector stays zero.
    pub fn normalized(self) -> Self {
        let magnitude = self.magnitude();
        if magnitude == 0.0 {
            return Self::ZERO;
        }

        Self::new(self.x / magnitude, self.y / magnitude, self.z / magnitude)
    }
}

/// Combine three axis intensities into a unit sun vector.
pub fn estimate(
    x: NormalizedIntensity,
    y: NormalizedIntensity,
    z: NormalizedIntensity,
) -> DirectionVector {
    DirectionVector::new(x.value(), y.value(), z.value()).normalized()
}
