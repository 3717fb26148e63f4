use clap::{Parser, Subcommand};
use feedcap_quantities::{energy::KilowattHours, power::Kilowatts};

use crate::{
    api::{PowerSeriesSource, pvgis},
    cli::ConfigArgs,
    core::simulator::Simulator,
    prelude::*,
    tables::build_monthly_table,
};

#[derive(Parser)]
pub struct BurrowArgs {
    #[command(subcommand)]
    command: BurrowCommand,
}

impl BurrowArgs {
    pub async fn run(self) -> Result {
        match self.command {
            BurrowCommand::PowerSeries(args) => args.run().await,
        }
    }
}

#[derive(Subcommand)]
enum BurrowCommand {
    /// Fetch the production of a single installation and print its monthly yields.
    PowerSeries(BurrowPowerSeriesArgs),
}

#[derive(Parser)]
struct BurrowPowerSeriesArgs {
    #[clap(flatten)]
    config: ConfigArgs,

    /// Installed peak power, kilowatts.
    #[clap(long = "peak-power-kilowatts", default_value = "1.0")]
    peak_power: Kilowatts,
}

impl BurrowPowerSeriesArgs {
    #[instrument(skip_all)]
    async fn run(self) -> Result {
        let config = self.config.load()?;
        let series = pvgis::Api::new()?
            .fetch_power_series(&config.site, self.peak_power)
            .await
            .context("failed to fetch the power series")?;
        info!(
            n_points = series.len(),
            total = ?series.total_energy(),
            peak = ?series.peak_power(),
            "gotcha",
        );
        let result = Simulator::try_new(config.export_cap, KilowattHours::ZERO)?.simulate(&series);
        println!("{}", build_monthly_table(&result.monthly()));
        Ok(())
    }
}
