use serde::{Deserialize, Serialize};

use super::DirectionVector;

/// Zenith and azimuth of a sun vector, in degrees.
///
/// `zenith_deg` is in `[0, 180]`, `azimuth_deg` in `(-180, 180]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct AnglePair {
    /// Angle from the local +Z axis.
    pub zenith_deg: f64,
    /// Angle of the X-Y projection, counter-clockwise from +X.
    pub azimuth_deg: f64,
}

/// Derive spherical angles from a unit vector.
///
/// The zero vector yields zenith 90° and azimuth 0°. That pair carries no
/// directional meaning and is passed through as-is.
pub fn angles_from(v: &DirectionVector) -> AnglePair {
    // Unit components can overshoot ±1 by an ulp.
    let z = v.z.clamp(-1.0, 1.0);
    let zenith_deg = libm::acos(z).to_degrees().clamp(0.0, 180.0);

    let mut azimuth_deg = libm::atan2(v.y, v.x).to_degrees();
    if azimuth_deg <= -180.0 || azimuth_deg > 180.0 {
        azimuth_deg = 180.0;
    }

    AnglePair {
        zenith_deg,
        azimuth_deg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::{NormalizedIntensity, estimate};
    use approx::assert_abs_diff_eq;

    fn from_spherical(zenith_deg: f64, azimuth_deg: f64) -> DirectionVector {
        let (theta, phi) = (zenith_deg.to_radians(), azimuth_deg.to_radians());
        DirectionVector::new(
            libm::sin(theta) * libm::cos(phi),
            libm::sin(theta) * libm::sin(phi),
            libm::cos(theta),
        )
    }

    #[test]
    fn test_spherical_round_trip_away_from_poles() {
        let mut zenith = 5.0;
        while zenith < 180.0 {
            let mut azimuth = -175.0;
            while azimuth < 180.0 {
                let angles = angles_from(&from_spherical(zenith, azimuth));
                assert_abs_diff_eq!(angles.zenith_deg, zenith, epsilon = 1e-9);
                assert_abs_diff_eq!(angles.azimuth_deg, azimuth, epsilon = 1e-9);
                azimuth += 12.5;
            }
            zenith += 7.5;
        }
    }

    #[test]
    fn test_ranges_hold_on_branch_cut_and_poles() {
        let cases = [
            DirectionVector::new(0.0, 0.0, 1.0),
            DirectionVector::new(0.0, 0.0, -1.0),
            DirectionVector::new(-1.0, 0.0, 0.0),
            DirectionVector::new(-1.0, -0.0, 0.0),
            DirectionVector::new(-0.6, -0.0, 0.8),
            DirectionVector::new(0.0, -1.0, 0.0),
        ];
        for v in cases {
            let angles = angles_from(&v);
            assert!((0.0..=180.0).contains(&angles.zenith_deg), "{v:?}");
            assert!(
                angles.azimuth_deg > -180.0 && angles.azimuth_deg <= 180.0,
                "{v:?} -> {}",
                angles.azimuth_deg
            );
        }
        assert_eq!(angles_from(&DirectionVector::new(-1.0, -0.0, 0.0)).azimuth_deg, 180.0);
    }

    #[test]
    fn test_overshooting_z_is_clamped() {
        let up = angles_from(&DirectionVector::new(0.0, 0.0, 1.000_000_000_000_000_2));
        assert_eq!(up.zenith_deg, 0.0);
        let down = angles_from(&DirectionVector::new(0.0, 0.0, -1.000_000_000_000_000_2));
        assert_abs_diff_eq!(down.zenith_deg, 180.0, epsilon = 1e-12);
        assert!(!down.zenith_deg.is_nan());
    }

    #[test]
    fn test_two_bright_axes_angles() {
        let v = estimate(
            NormalizedIntensity::new(1.0),
            NormalizedIntensity::new(1.0),
            NormalizedIntensity::new(0.8),
        );
        let angles = angles_from(&v);
        assert_abs_diff_eq!(angles.zenith_deg, 60.503_791_503_433_57, epsilon = 1e-9);
        assert_abs_diff_eq!(angles.azimuth_deg, 45.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_vector_angles() {
        let angles = angles_from(&DirectionVector::ZERO);
        assert_eq!(angles.zenith_deg, 90.0);
        assert_eq!(angles.azimuth_deg, 0.0);
    }
}
