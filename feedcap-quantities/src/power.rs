use std::{
    fmt::{Debug, Display, Formatter},
    ops::Mul,
};

use chrono::TimeDelta;

use crate::{Quantity, energy::KilowattHours};

pub type Kilowatts = Quantity<1, 0, 0>;

impl Kilowatts {
    pub fn from_watts(watts: f64) -> Self {
        Self::from(watts / 1000.0)
    }
}

impl Display for Kilowatts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0} W", self.0 * 1000.0)
    }
}

impl Debug for Kilowatts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}W", self.0 * 1000.0)
    }
}

impl Mul<TimeDelta> for Kilowatts {
    type Output = KilowattHours;

    fn mul(self, rhs: TimeDelta) -> Self::Output {
        let hours = rhs.as_seconds_f64() / 3600.0;
        Quantity(self.0 * hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_hour_is_exact() {
        let energy = Kilowatts::from(0.7) * TimeDelta::hours(1);
        assert_eq!(energy, KilowattHours::from(0.7));
    }

    #[test]
    fn test_display() {
        assert_eq!(Kilowatts::from_watts(800.0).to_string(), "800 W");
    }
}
