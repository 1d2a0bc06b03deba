//! Sun-vector estimation pipeline
//!
//! raw lux → [`normalize`] → three [`NormalizedIntensity`] values →
//! [`estimate`] → unit [`DirectionVector`] → [`angles_from`] → [`AnglePair`].
//!
//! Every stage is a pure function with no failure path.

mod angles;
mod intensity;
mod vector;

pub use angles::*;
pub use intensity::*;
pub use vector::*;
