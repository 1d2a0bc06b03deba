use core::fmt;

use crate::devices::PowerReading;
use crate::estimation::NormalizedIntensity;
use crate::storage::Record;

/// Human-readable summary of one cycle. Advisory only; the record sink is the
/// authoritative output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleStatus {
    /// X, Y and emulated Z inputs, in that order.
    pub readings: [NormalizedIntensity; 3],
    pub record: Record,
    pub power: PowerReading,
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.readings;
        let v = self.record.vector;
        writeln!(f, "Normalized light readings:")?;
        writeln!(f, "X: {:.2}, Y: {:.2}, Z: {:.2}", x.value(), y.value(), z.value())?;
        writeln!(f, "Estimated sun vector: [{:.2}, {:.2}, {:.2}]", v.x, v.y, v.z)?;
        writeln!(f, "Zenith angle: {:.2} degrees", self.record.angles.zenith_deg)?;
        writeln!(f, "Azimuth angle: {:.2} degrees", self.record.angles.azimuth_deg)?;
        write!(
            f,
            "Power: {:6.3}V, {:7.2}mA, {:8.2}mW",
            self.power.bus_voltage_v, self.power.current_ma, self.power.power_mw
        )
    }
}
