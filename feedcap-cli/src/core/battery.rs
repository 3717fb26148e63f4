use feedcap_quantities::energy::KilowattHours;

/// Lossless battery buffer which lives for a single simulation run.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct Battery {
    capacity: KilowattHours,

    /// Current state of charge, always within `[0, capacity]`.
    residual_energy: KilowattHours,
}

impl Battery {
    pub const fn empty(capacity: KilowattHours) -> Self {
        Self { capacity, residual_energy: KilowattHours::ZERO }
    }

    pub const fn residual_energy(&self) -> KilowattHours {
        self.residual_energy
    }

    /// Store as much of the surplus as fits and return the stored energy.
    ///
    /// Whatever does not fit is curtailed.
    pub fn charge(&mut self, surplus: KilowattHours) -> KilowattHours {
        let before = self.residual_energy;
        self.residual_energy = (self.residual_energy + surplus).min(self.capacity);
        self.clamp();
        self.residual_energy - before
    }

    /// Release up to the requested energy and return the released energy.
    pub fn discharge(&mut self, requested: KilowattHours) -> KilowattHours {
        let released = requested.min(self.residual_energy);
        self.residual_energy -= released;
        self.clamp();
        released
    }

    fn clamp(&mut self) {
        self.residual_energy = self.residual_energy.clamp(KilowattHours::ZERO, self.capacity);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn charge_overflow() {
        let mut battery = Battery::empty(KilowattHours::from(1.0));
        assert_eq!(battery.charge(KilowattHours::from(0.75)), KilowattHours::from(0.75));
        assert_abs_diff_eq!(f64::from(battery.charge(KilowattHours::from(0.75))), 0.25);
        assert_eq!(battery.residual_energy(), KilowattHours::from(1.0));
    }

    #[test]
    fn discharge_underflow() {
        let mut battery = Battery::empty(KilowattHours::from(1.0));
        let _ = battery.charge(KilowattHours::from(0.5));
        assert_eq!(battery.discharge(KilowattHours::from(0.75)), KilowattHours::from(0.5));
        assert_eq!(battery.residual_energy(), KilowattHours::ZERO);
        assert_eq!(battery.discharge(KilowattHours::from(0.75)), KilowattHours::ZERO);
    }

    #[test]
    fn zero_capacity() {
        let mut battery = Battery::empty(KilowattHours::ZERO);
        assert_eq!(battery.charge(KilowattHours::from(5.0)), KilowattHours::ZERO);
        assert_eq!(battery.discharge(KilowattHours::from(5.0)), KilowattHours::ZERO);
    }
}
