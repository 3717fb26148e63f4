use clap::Parser;
use futures_util::future::join_all;

use crate::{
    api::{PowerSeriesSource, Site, pvgis},
    cli::ConfigArgs,
    core::{
        finance::Analyzer,
        scenario::{Aggregator, Installation, InstallationRun},
    },
    prelude::*,
    tables::{build_increments_table, build_monthly_table, build_payback_table, build_yields_table},
};

#[derive(Parser)]
pub struct AnalyzeArgs {
    #[clap(flatten)]
    config: ConfigArgs,

    /// Also print the monthly yields of every scenario.
    #[clap(long)]
    monthly: bool,
}

impl AnalyzeArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let config = self.config.load()?;
        info!(
            export_cap = ?config.export_cap,
            electricity_price = ?config.electricity_price,
            "analysing…",
        );

        // Prices are checked before anything is fetched:
        let analyzer = Analyzer::try_new(
            &config.prices,
            config.electricity_price,
            &config.installations,
            &config.batteries,
        )?;
        let aggregator = Aggregator::try_new(config.export_cap, &config.batteries)?;

        let source = pvgis::Api::new()?;
        let runs = simulate(&source, &config.site, &config.installations, &aggregator).await;
        ensure!(!runs.is_empty(), "none of the installations could be simulated");

        println!("{}", build_yields_table(&runs));
        println!("{}", build_increments_table(&runs));
        if self.monthly {
            for scenario in runs.iter().flat_map(|run| &run.scenarios) {
                println!("{} + {}", scenario.key.installation, scenario.key.battery);
                println!("{}", build_monthly_table(&scenario.monthly));
            }
        }

        let finances = runs.iter().map(|run| analyzer.analyze(run)).collect::<Result<Vec<_>, _>>()?;
        println!("{}", build_payback_table(&finances));
        for finance in &finances {
            if let Some(best) = finance.best() {
                info!(
                    installation = %finance.installation,
                    tier = %best.tier,
                    payback_years = ?best.payback.years(),
                    "best option",
                );
            }
        }
        Ok(())
    }
}

/// Fetch the power series concurrently and simulate every installation which has one.
///
/// Installations without a power series are skipped.
pub async fn simulate<S: PowerSeriesSource>(
    source: &S,
    site: &Site,
    installations: &[Installation],
    aggregator: &Aggregator<'_>,
) -> Vec<InstallationRun> {
    let fetched = join_all(installations.iter().map(|installation| async move {
        (installation, source.fetch_power_series(site, installation.peak_power).await)
    }))
    .await;
    fetched
        .into_iter()
        .filter_map(|(installation, result)| match result {
            Ok(series) => Some(aggregator.run(installation, &series)),
            Err(error) => {
                warn!(installation = %installation.label, ?error, "skipping the installation");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use feedcap_quantities::{energy::KilowattHours, power::Kilowatts};
    use itertools::Itertools;

    use super::*;
    use crate::core::{
        Error,
        scenario::BatteryOption,
        series::{PowerSeries, hourly_points},
    };

    /// Scales the same day for every installation, fails above 3 kWp.
    struct FakeSource;

    impl PowerSeriesSource for FakeSource {
        async fn fetch_power_series(
            &self,
            _site: &Site,
            peak_power: Kilowatts,
        ) -> Result<PowerSeries, Error> {
            if peak_power > Kilowatts::from(3.0) {
                return Err(Error::DataUnavailable("service is down".into()));
            }
            let profile =
                [0.0, 0.4, 0.8, 1.0, 0.8, 0.4, 0.0].map(|value| value * f64::from(peak_power));
            PowerSeries::try_new(hourly_points(&profile))
        }
    }

    fn installations() -> Vec<Installation> {
        [1.0, 2.0, 4.0]
            .into_iter()
            .map(|peak_power| Installation {
                label: format!("{peak_power:.1} kWp"),
                peak_power: Kilowatts::from(peak_power),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_simulate_skips_unavailable() -> Result {
        let batteries =
            vec![BatteryOption { label: "1 kWh".to_string(), capacity: KilowattHours::from(1.0) }];
        let aggregator = Aggregator::try_new(Kilowatts::from(0.8), &batteries)?;
        let site = crate::config::Config::default().site;

        let runs = simulate(&FakeSource, &site, &installations(), &aggregator).await;

        let labels = runs.iter().map(|run| run.installation.label.as_str()).collect_vec();
        assert_eq!(labels, ["1.0 kWp", "2.0 kWp"]);
        assert!(runs.iter().all(|run| run.scenarios.len() == 1));
        Ok(())
    }
}
