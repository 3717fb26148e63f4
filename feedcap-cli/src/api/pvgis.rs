use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use feedcap_quantities::power::Kilowatts;
use reqwest::Url;
use serde::{Deserialize, Deserializer, de};

use crate::{
    api::{PowerSeriesSource, Site},
    core::{Error, series::PowerSeries},
    prelude::*,
};

/// PVGIS hourly radiation and PV production service.
pub struct Api {
    client: reqwest::Client,
}

impl Api {
    const URL: &'static str = "https://re.jrc.ec.europa.eu/api/v5_3/seriescalc";

    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("feedcap")
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { client })
    }

    fn build_url(site: &Site, peak_power: Kilowatts) -> Result<Url, Error> {
        let year = site.year.to_string();
        Url::parse_with_params(
            Self::URL,
            [
                ("lat", site.latitude.to_string()),
                ("lon", site.longitude.to_string()),
                ("startyear", year.clone()),
                ("endyear", year),
                ("pvcalculation", "1".to_string()),
                ("peakpower", f64::from(peak_power).to_string()),
                ("loss", site.loss_percent.to_string()),
                ("angle", site.tilt.to_string()),
                // PVGIS counts the aspect from the south, west is positive:
                ("aspect", (site.azimuth - 180.0).to_string()),
                ("raddatabase", site.radiation_database.clone()),
                ("outputformat", "json".to_string()),
            ],
        )
        .map_err(|error| Error::DataUnavailable(error.into()))
    }

    async fn get(&self, url: Url) -> Result<Response, reqwest::Error> {
        self.client.get(url).send().await?.error_for_status()?.json::<Response>().await
    }
}

impl PowerSeriesSource for Api {
    #[instrument(skip_all, fields(peak_power = ?peak_power))]
    async fn fetch_power_series(
        &self,
        site: &Site,
        peak_power: Kilowatts,
    ) -> Result<PowerSeries, Error> {
        let url = Self::build_url(site, peak_power)?;
        info!(year = site.year, "fetching…");
        let response = self.get(url).await.map_err(|error| Error::DataUnavailable(error.into()))?;
        let series =
            response.into_power_series().map_err(|error| Error::DataUnavailable(error.into()))?;
        info!(n_points = series.len(), total = ?series.total_energy(), "fetched");
        Ok(series)
    }
}

#[derive(Deserialize)]
struct Response {
    outputs: Outputs,
}

impl Response {
    fn into_power_series(self) -> Result<PowerSeries, Error> {
        PowerSeries::try_new(
            self.outputs
                .hourly
                .into_iter()
                .map(|point| (point.time, Kilowatts::from_watts(point.power)))
                .collect(),
        )
    }
}

#[derive(Deserialize)]
struct Outputs {
    hourly: Vec<HourlyPoint>,
}

#[derive(Deserialize)]
struct HourlyPoint {
    #[serde(deserialize_with = "deserialize_time")]
    time: DateTime<Utc>,

    /// AC power in watts.
    #[serde(rename = "P")]
    power: f64,
}

fn deserialize_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let time = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(&time, "%Y%m%d:%H%M")
        .map(|time| time.and_utc())
        .map_err(de::Error::custom)
}
