pub mod pvgis;

use bon::Builder;
use feedcap_quantities::power::Kilowatts;
use serde::Deserialize;

use crate::core::{Error, series::PowerSeries};

/// Location and orientation of the installations.
#[must_use]
#[derive(Clone, Debug, Deserialize, Builder)]
#[serde(deny_unknown_fields)]
pub struct Site {
    pub latitude: f64,
    pub longitude: f64,

    /// Calendar year of the radiation data.
    pub year: i32,

    /// System losses in percent.
    pub loss_percent: f64,

    /// Surface tilt in degrees from the horizontal.
    pub tilt: f64,

    /// Surface azimuth in compass degrees, `180` is south.
    pub azimuth: f64,

    #[builder(into)]
    pub radiation_database: String,
}

/// Supplies the hourly production of an installation.
#[allow(async_fn_in_trait)]
pub trait PowerSeriesSource {
    async fn fetch_power_series(
        &self,
        site: &Site,
        peak_power: Kilowatts,
    ) -> Result<PowerSeries, Error>;
}
