use std::path::Path;

use feedcap_quantities::{
    cost::Cost,
    energy::KilowattHours,
    power::Kilowatts,
    rate::KilowattHourRate,
};
use itertools::Itertools;
use serde::Deserialize;

use crate::{
    api::Site,
    core::{
        Error,
        finance::{PriceTable, Tier},
        scenario::{BatteryOption, Installation},
    },
    prelude::*,
};

/// Scenario configuration: the site, the options to compare and their prices.
#[must_use]
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Maximum feed-in power.
    pub export_cap: Kilowatts,

    /// Price of the electricity which is not bought from the grid.
    pub electricity_price: KilowattHourRate,

    pub site: Site,

    /// Installations in the reporting order.
    pub installations: Vec<Installation>,

    /// Battery options in the reporting order, from the smallest one.
    pub batteries: Vec<BatteryOption>,

    /// Capital costs by installation label and then by `no-storage` or battery label.
    pub prices: PriceTable,
}

impl Config {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let config = toml::from_str::<Self>(&contents)
            .with_context(|| format!("failed to parse `{}`", path.display()))?;
        info!(
            n_installations = config.installations.len(),
            n_batteries = config.batteries.len(),
            "loaded",
        );
        Ok(config)
    }

    /// Check the configuration as a whole, before anything is fetched or computed.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.export_cap.is_finite() || self.export_cap <= Kilowatts::ZERO {
            return Err(Error::configuration(format!(
                "export cap must be positive, got {:?}",
                self.export_cap,
            )));
        }
        if self.installations.is_empty() {
            return Err(Error::configuration("at least one installation is required"));
        }
        if self.batteries.is_empty() {
            return Err(Error::configuration("at least one battery option is required"));
        }
        if let Some(label) =
            self.installations.iter().map(|installation| &installation.label).duplicates().next()
        {
            return Err(Error::configuration(format!("duplicate installation `{label}`")));
        }
        if let Some(label) = self
            .batteries
            .iter()
            .map(|battery| battery.label.as_str())
            .chain([Tier::NO_STORAGE_LABEL])
            .duplicates()
            .next()
        {
            return Err(Error::configuration(format!("duplicate battery option `{label}`")));
        }
        self.prices.validate(&self.installations, &self.batteries)
    }
}

impl Default for Config {
    /// Balcony installation in Brunsbüttel with the 800 W feed-in cap.
    fn default() -> Self {
        let installations = [1.0, 2.0, 4.0]
            .into_iter()
            .map(|peak_power| Installation {
                label: format!("{peak_power:.1} kWp"),
                peak_power: Kilowatts::from(peak_power),
            })
            .collect_vec();
        let batteries = [2.048, 4.096]
            .into_iter()
            .map(|capacity| BatteryOption {
                label: format!("{capacity:.3} kWh"),
                capacity: KilowattHours::from(capacity),
            })
            .collect_vec();

        let mut prices = PriceTable::default();
        let price_rows = [[500.0, 1100.0, 1700.0], [700.0, 1390.0, 1990.0], [1100.0, 1970.0, 2570.0]];
        for (installation, tier_prices) in installations.iter().zip(price_rows) {
            for (tier, price) in Tier::all(&batteries).zip(tier_prices) {
                prices.insert(&installation.label, &tier, Cost::from(price));
            }
        }

        Self {
            export_cap: Kilowatts::from(0.8),
            electricity_price: KilowattHourRate::from(0.36),
            site: Site::builder()
                .latitude(54.17)
                .longitude(9.38)
                .year(2023)
                .loss_percent(15.0)
                .tilt(35.0)
                .azimuth(180.0)
                .radiation_database("PVGIS-SARAH3")
                .build(),
            installations,
            batteries,
            prices,
        }
    }
}
