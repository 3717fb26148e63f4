use feedcap_quantities::{energy::KilowattHours, power::Kilowatts};
use itertools::Itertools;
use serde::Deserialize;

use crate::{
    core::{
        Error,
        series::PowerSeries,
        simulator::{MonthlyAggregate, SimulationResult, Simulator, Yields},
    },
    prelude::*,
};

#[must_use]
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Installation {
    /// For example, `1.0 kWp`.
    pub label: String,

    /// Installed peak power.
    pub peak_power: Kilowatts,
}

#[must_use]
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatteryOption {
    /// For example, `2.048 kWh`.
    pub label: String,

    /// Usable capacity.
    pub capacity: KilowattHours,
}

#[must_use]
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ScenarioKey {
    pub installation: String,
    pub battery: String,
}

#[must_use]
pub struct Scenario {
    pub key: ScenarioKey,
    pub battery_capacity: KilowattHours,
    pub result: SimulationResult,
    pub monthly: Vec<MonthlyAggregate>,
}

impl Scenario {
    pub fn total(&self) -> Yields {
        self.result.total()
    }
}

/// All scenarios of a single installation, in the configured battery order.
#[must_use]
pub struct InstallationRun {
    pub installation: Installation,
    pub scenarios: Vec<Scenario>,
}

impl InstallationRun {
    /// Annual yield without a battery.
    ///
    /// The capped series does not depend on the battery, so any scenario would do.
    pub fn capped_total(&self) -> KilowattHours {
        self.scenarios.first().map_or(KilowattHours::ZERO, |scenario| scenario.total().capped)
    }

    /// Compare each battery option with the previous one.
    pub fn increments(&self) -> impl Iterator<Item = Increment<'_>> {
        self.scenarios.iter().tuple_windows().map(|(smaller, larger)| {
            let (smaller_total, larger_total) = (smaller.total().buffered, larger.total().buffered);
            Increment {
                from: &smaller.key.battery,
                to: &larger.key.battery,
                additional_yield: larger_total - smaller_total,
                relative: (smaller_total > KilowattHours::ZERO)
                    .then(|| ((larger_total - smaller_total) / smaller_total).0),
            }
        })
    }
}

/// Additional buffered yield of a battery option over the previous one.
#[must_use]
pub struct Increment<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub additional_yield: KilowattHours,

    /// Relative to the smaller option's buffered yield, when it is non-zero.
    pub relative: Option<f64>,
}

/// Runs the simulator over the battery options for each installation.
#[must_use]
pub struct Aggregator<'a> {
    simulators: Vec<(&'a BatteryOption, Simulator)>,
}

impl<'a> Aggregator<'a> {
    pub fn try_new(export_cap: Kilowatts, batteries: &'a [BatteryOption]) -> Result<Self, Error> {
        if batteries.is_empty() {
            return Err(Error::invalid_parameter("at least one battery option is required"));
        }
        let simulators = batteries
            .iter()
            .map(|battery| Ok((battery, Simulator::try_new(export_cap, battery.capacity)?)))
            .collect::<Result<_, Error>>()?;
        Ok(Self { simulators })
    }

    /// Simulate every battery option against the installation's series.
    ///
    /// Scenarios do not share any state, the order follows the battery options.
    #[instrument(skip_all, fields(installation = %installation.label))]
    pub fn run(&self, installation: &Installation, series: &PowerSeries) -> InstallationRun {
        let scenarios = self
            .simulators
            .iter()
            .map(|(battery, simulator)| {
                let result = simulator.simulate(series);
                let monthly = result.monthly();
                let total = result.total();
                debug!(
                    battery = %battery.label,
                    uncapped = ?total.uncapped,
                    capped = ?total.capped,
                    buffered = ?total.buffered,
                    residual = ?result.steps.last().map(|step| step.residual_energy),
                    "simulated",
                );
                Scenario {
                    key: ScenarioKey {
                        installation: installation.label.clone(),
                        battery: battery.label.clone(),
                    },
                    battery_capacity: battery.capacity,
                    result,
                    monthly,
                }
            })
            .collect();
        InstallationRun { installation: installation.clone(), scenarios }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::core::series::hourly_points;

    fn installation() -> Installation {
        Installation { label: "1.0 kWp".to_string(), peak_power: Kilowatts::from(1.0) }
    }

    fn batteries() -> Vec<BatteryOption> {
        vec![
            BatteryOption { label: "0.5 kWh".to_string(), capacity: KilowattHours::from(0.5) },
            BatteryOption { label: "2 kWh".to_string(), capacity: KilowattHours::from(2.0) },
        ]
    }

    #[test]
    fn test_run_cross_product() -> Result {
        let batteries = batteries();
        let series = PowerSeries::try_new(hourly_points(&[1.2, 1.2, 1.2, 0.0, 0.0]))?;
        let run = Aggregator::try_new(Kilowatts::from(0.8), &batteries)?.run(&installation(), &series);

        assert_eq!(run.scenarios.len(), 2);
        assert_eq!(run.scenarios[0].key.battery, "0.5 kWh");
        assert_eq!(run.scenarios[1].key.battery, "2 kWh");
        assert_eq!(run.scenarios[1].battery_capacity, KilowattHours::from(2.0));
        assert_eq!(run.scenarios[0].monthly.len(), 1);

        // The capped series does not depend on the battery:
        assert_eq!(run.scenarios[0].total().capped, run.scenarios[1].total().capped);
        assert_abs_diff_eq!(f64::from(run.capped_total()), 2.4, epsilon = 1e-9);

        assert_abs_diff_eq!(f64::from(run.scenarios[0].total().buffered), 2.9, epsilon = 1e-9);
        assert_abs_diff_eq!(f64::from(run.scenarios[1].total().buffered), 3.6, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_increments() -> Result {
        let batteries = batteries();
        let series = PowerSeries::try_new(hourly_points(&[1.2, 1.2, 1.2, 0.0, 0.0]))?;
        let run = Aggregator::try_new(Kilowatts::from(0.8), &batteries)?.run(&installation(), &series);
        let increments = run.increments().collect_vec();

        assert_eq!(increments.len(), 1);
        assert_eq!(increments[0].from, "0.5 kWh");
        assert_eq!(increments[0].to, "2 kWh");
        assert_abs_diff_eq!(f64::from(increments[0].additional_yield), 0.7, epsilon = 1e-9);
        assert_abs_diff_eq!(increments[0].relative.unwrap(), 0.7 / 2.9, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_requires_battery_options() {
        assert!(matches!(
            Aggregator::try_new(Kilowatts::from(0.8), &[]),
            Err(Error::InvalidParameter(_)),
        ));
    }

    #[test]
    fn test_rejects_negative_capacity() {
        let batteries = vec![BatteryOption {
            label: "broken".to_string(),
            capacity: KilowattHours::from(-1.0),
        }];
        assert!(matches!(
            Aggregator::try_new(Kilowatts::from(0.8), &batteries),
            Err(Error::InvalidParameter(_)),
        ));
    }
}
