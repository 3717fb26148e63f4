use std::{
    fmt::{Display, Formatter},
    ops::Add,
};

use chrono::{DateTime, Datelike, TimeDelta, Utc};
use feedcap_quantities::{energy::KilowattHours, power::Kilowatts};
use itertools::Itertools;

use crate::core::Error;

pub type Point<V> = (DateTime<Utc>, V);

/// Hourly AC power production of a single installation.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PowerSeries(Vec<Point<Kilowatts>>);

impl PowerSeries {
    pub const TIME_STEP: TimeDelta = TimeDelta::hours(1);

    /// Validate the points and wrap them into the series.
    ///
    /// The points must be non-empty, exactly [`Self::TIME_STEP`] apart,
    /// and carry finite non-negative power.
    pub fn try_new(points: Vec<Point<Kilowatts>>) -> Result<Self, Error> {
        if points.is_empty() {
            return Err(Error::invalid_parameter("the power series is empty"));
        }
        if let Some((timestamp, power)) =
            points.iter().find(|(_, power)| !power.is_finite() || *power < Kilowatts::ZERO)
        {
            return Err(Error::invalid_parameter(format!(
                "production at {timestamp} must be finite and non-negative, got {power:?}",
            )));
        }
        if let Some(((from, _), (to, _))) =
            points.iter().tuple_windows().find(|((from, _), (to, _))| *to - *from != Self::TIME_STEP)
        {
            return Err(Error::invalid_parameter(format!(
                "the power series is not hourly between {from} and {to}",
            )));
        }
        Ok(Self(points))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point<Kilowatts>> {
        self.0.iter()
    }

    /// Total energy produced over the whole series.
    pub fn total_energy(&self) -> KilowattHours {
        self.0.iter().map(|(_, power)| *power * Self::TIME_STEP).sum()
    }

    pub fn peak_power(&self) -> Kilowatts {
        self.0.iter().map(|(_, power)| *power).max().unwrap_or(Kilowatts::ZERO)
    }
}

impl<T> Accumulate for T where T: ?Sized {}

pub trait Accumulate {
    /// Running sum of the values, keeping the keys.
    fn accumulate<K, V>(self) -> impl Iterator<Item = (K, V)>
    where
        Self: Iterator<Item = (K, V)> + Sized,
        V: Copy + Add<Output = V>,
    {
        self.scan(None, |total: &mut Option<V>, (key, value)| {
            let next = total.map_or(value, |total| total + value);
            *total = Some(next);
            Some((key, next))
        })
    }
}

/// Calendar month of a timestamp.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl<Tz: chrono::TimeZone> From<&DateTime<Tz>> for YearMonth {
    fn from(timestamp: &DateTime<Tz>) -> Self {
        Self { year: timestamp.year(), month: timestamp.month() }
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Build hourly points starting at the first hour of 2023.
#[cfg(test)]
pub fn hourly_points(values: &[f64]) -> Vec<Point<Kilowatts>> {
    use chrono::TimeZone;

    let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 10, 0).unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            (start + PowerSeries::TIME_STEP * i32::try_from(i).unwrap(), Kilowatts::from(*value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_try_new_ok() -> Result<(), Error> {
        let series = PowerSeries::try_new(hourly_points(&[0.0, 0.5, 1.2]))?;
        assert_eq!(series.len(), 3);
        assert_abs_diff_eq!(f64::from(series.total_energy()), 1.7);
        assert_eq!(series.peak_power(), Kilowatts::from(1.2));
        Ok(())
    }

    #[test]
    fn test_try_new_empty() {
        let result = PowerSeries::try_new(Vec::new());
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_try_new_negative() {
        let result = PowerSeries::try_new(hourly_points(&[0.1, -0.1]));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_try_new_nan() {
        let result = PowerSeries::try_new(hourly_points(&[f64::NAN]));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_try_new_gap() {
        let mut points = hourly_points(&[0.1, 0.2]);
        points[1].0 += TimeDelta::minutes(30);
        let result = PowerSeries::try_new(points);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_accumulate() {
        let cumulative = vec![(1, 1), (2, 0), (3, 5)].into_iter().accumulate().collect_vec();
        assert_eq!(cumulative, vec![(1, 1), (2, 1), (3, 6)]);
    }

    #[test]
    fn test_year_month() {
        let timestamp = Utc.with_ymd_and_hms(2023, 3, 31, 23, 10, 0).unwrap();
        let month = YearMonth::from(&timestamp);
        assert_eq!(month, YearMonth { year: 2023, month: 3 });
        assert_eq!(month.to_string(), "2023-03");
    }
}
