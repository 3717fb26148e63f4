use chrono::{DateTime, Utc};
use feedcap_quantities::{energy::KilowattHours, power::Kilowatts};
use itertools::Itertools;

use crate::core::{
    Error,
    battery::Battery,
    series::{Accumulate, PowerSeries, YearMonth},
};

/// Energy fed into the grid within a step, or accumulated since the series start.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, derive_more::Add, derive_more::AddAssign)]
pub struct Yields {
    /// Raw production, as if there were no export cap.
    pub uncapped: KilowattHours,

    /// Production limited by the export cap.
    pub capped: KilowattHours,

    /// Production limited by the export cap and smoothed by the battery.
    pub buffered: KilowattHours,
}

impl Yields {
    /// Energy recovered by the battery which would otherwise be curtailed.
    pub fn buffer_gain(&self) -> KilowattHours {
        self.buffered - self.capped
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub timestamp: DateTime<Utc>,
    pub yields: Yields,
    pub cumulative: Yields,

    /// Battery state of charge at the end of the step.
    pub residual_energy: KilowattHours,
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MonthlyAggregate {
    pub month: YearMonth,

    /// Yields within the month.
    pub total: Yields,

    /// Cumulative yields at the end of the month.
    pub cumulative: Yields,
}

/// Output of a single simulation run, aligned with the input series.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationResult {
    pub steps: Vec<Step>,
}

impl SimulationResult {
    /// Yields over the whole series.
    pub fn total(&self) -> Yields {
        self.steps.last().map_or_else(Yields::default, |step| step.cumulative)
    }

    /// Resample the steps to calendar months.
    pub fn monthly(&self) -> Vec<MonthlyAggregate> {
        let chunks = self.steps.iter().chunk_by(|step| YearMonth::from(&step.timestamp));
        chunks
            .into_iter()
            .map(|(month, steps)| {
                let mut aggregate =
                    MonthlyAggregate { month, total: Yields::default(), cumulative: Yields::default() };
                for step in steps {
                    aggregate.total += step.yields;
                    aggregate.cumulative = step.cumulative;
                }
                aggregate
            })
            .collect()
    }
}

/// Greedy battery dispatch under a grid export cap.
///
/// Surplus above the cap charges the battery, and the battery discharges
/// whenever production falls below the cap. No round-trip losses are modelled.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct Simulator {
    export_cap: Kilowatts,
    battery_capacity: KilowattHours,
}

impl Simulator {
    pub fn try_new(export_cap: Kilowatts, battery_capacity: KilowattHours) -> Result<Self, Error> {
        if !export_cap.is_finite() || export_cap <= Kilowatts::ZERO {
            return Err(Error::invalid_parameter(format!(
                "export cap must be positive, got {export_cap:?}",
            )));
        }
        if !battery_capacity.is_finite() || battery_capacity < KilowattHours::ZERO {
            return Err(Error::invalid_parameter(format!(
                "battery capacity must be non-negative, got {battery_capacity:?}",
            )));
        }
        Ok(Self { export_cap, battery_capacity })
    }

    /// Run the dispatch over the series, starting with an empty battery.
    pub fn simulate(&self, series: &PowerSeries) -> SimulationResult {
        let cap = self.export_cap * PowerSeries::TIME_STEP;
        let steps = series
            .iter()
            .scan(Battery::empty(self.battery_capacity), |battery, (timestamp, power)| {
                let yields = Self::dispatch(battery, *power * PowerSeries::TIME_STEP, cap);
                Some((*timestamp, (yields, battery.residual_energy())))
            })
            .collect_vec();
        let cumulative = steps.iter().map(|(timestamp, (yields, _))| (*timestamp, *yields)).accumulate();
        let steps = steps
            .iter()
            .zip(cumulative)
            .map(|((timestamp, (yields, residual_energy)), (_, cumulative))| Step {
                timestamp: *timestamp,
                yields: *yields,
                cumulative,
                residual_energy: *residual_energy,
            })
            .collect();
        SimulationResult { steps }
    }

    fn dispatch(battery: &mut Battery, production: KilowattHours, cap: KilowattHours) -> Yields {
        let capped = production.min(cap);
        let buffered = if production >= cap {
            let _ = battery.charge(production - cap);
            cap
        } else {
            let deficit = cap - production;
            let released = battery.discharge(deficit);
            if released == deficit {
                // Pin to the cap, `production + deficit` may round above it:
                cap
            } else {
                (production + released).min(cap)
            }
        };
        debug_assert!(buffered <= cap, "buffered {buffered:?} exceeds the cap {cap:?}");
        debug_assert!(buffered >= capped, "buffered {buffered:?} is below capped {capped:?}");
        Yields { uncapped: production, capped, buffered }
    }
}
