mod analyze;
mod burrow;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use feedcap_quantities::{power::Kilowatts, rate::KilowattHourRate};

pub use self::{analyze::AnalyzeArgs, burrow::BurrowArgs};
use crate::{config::Config, prelude::*};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: fetch the production, simulate the scenarios, and print the payback periods.
    #[clap(name = "analyze")]
    Analyze(Box<AnalyzeArgs>),

    /// Development tools.
    #[clap(name = "burrow")]
    Burrow(BurrowArgs),
}

#[derive(Parser)]
pub struct ConfigArgs {
    /// Scenario configuration file, the built-in Brunsbüttel study is used when omitted.
    #[clap(long = "config", env = "FEEDCAP_CONFIG")]
    path: Option<PathBuf>,

    /// Override the feed-in cap, kilowatts.
    #[clap(long = "export-cap-kilowatts", env = "FEEDCAP_EXPORT_CAP_KILOWATTS")]
    export_cap: Option<Kilowatts>,

    /// Override the electricity price, euros per kilowatt-hour.
    #[clap(long = "electricity-price", env = "FEEDCAP_ELECTRICITY_PRICE")]
    electricity_price: Option<KilowattHourRate>,
}

impl ConfigArgs {
    /// Read the configuration, apply the overrides, and validate the result.
    pub fn load(&self) -> Result<Config> {
        let mut config = match &self.path {
            Some(path) => Config::read(path)?,
            None => Config::default(),
        };
        if let Some(export_cap) = self.export_cap {
            config.export_cap = export_cap;
        }
        if let Some(electricity_price) = self.electricity_price {
            config.electricity_price = electricity_price;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}
