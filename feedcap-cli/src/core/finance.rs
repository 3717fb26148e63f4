use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use feedcap_quantities::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate};
use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::Deserialize;

use crate::core::{
    Error,
    scenario::{BatteryOption, Installation, InstallationRun, ScenarioKey},
};

/// Purchasable configuration of an installation.
#[must_use]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Tier {
    NoStorage,
    Battery(String),
}

impl Tier {
    pub const NO_STORAGE_LABEL: &'static str = "no-storage";

    /// Key of the tier in the price table.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::NoStorage => Self::NO_STORAGE_LABEL,
            Self::Battery(label) => label,
        }
    }

    /// All tiers in the ranking order: no storage first, then the battery options.
    pub fn all(batteries: &[BatteryOption]) -> impl Iterator<Item = Self> {
        std::iter::once(Self::NoStorage)
            .chain(batteries.iter().map(|battery| Self::Battery(battery.label.clone())))
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoStorage => write!(f, "No storage"),
            Self::Battery(label) => write!(f, "{label} battery"),
        }
    }
}

/// Simple payback period.
///
/// Variant order makes any finite payback better than [`Payback::Never`].
#[must_use]
#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Payback {
    Years(OrderedFloat<f64>),
    Never,
}

impl Payback {
    pub fn new(capital_cost: Cost, annual_savings: Cost) -> Self {
        if annual_savings > Cost::ZERO {
            Self::Years(capital_cost / annual_savings)
        } else {
            Self::Never
        }
    }

    #[must_use]
    pub const fn years(self) -> Option<f64> {
        match self {
            Self::Years(years) => Some(years.0),
            Self::Never => None,
        }
    }
}

impl Display for Payback {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Years(years) => write!(f, "{years:.1} years"),
            Self::Never => write!(f, "never"),
        }
    }
}

/// Capital costs by installation label and tier label.
#[must_use]
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct PriceTable(BTreeMap<String, BTreeMap<String, Cost>>);

impl PriceTable {
    pub fn get(&self, installation: &str, tier: &Tier) -> Option<Cost> {
        self.0.get(installation)?.get(tier.label()).copied()
    }

    pub fn insert(&mut self, installation: &str, tier: &Tier, capital_cost: Cost) {
        self.0
            .entry(installation.to_string())
            .or_default()
            .insert(tier.label().to_string(), capital_cost);
    }

    /// Ensure that every configured installation and tier has a price.
    pub fn validate(
        &self,
        installations: &[Installation],
        batteries: &[BatteryOption],
    ) -> Result<(), Error> {
        let missing = installations
            .iter()
            .cartesian_product(Tier::all(batteries).collect_vec())
            .filter(|(installation, tier)| self.get(&installation.label, tier).is_none())
            .map(|(installation, tier)| format!("`{}` / `{}`", installation.label, tier.label()))
            .collect_vec();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::configuration(format!("missing prices for {}", missing.join(", "))))
        }
    }
}

#[must_use]
#[derive(Clone, Debug)]
pub struct FinancialProfile {
    pub tier: Tier,
    pub capital_cost: Cost,
    pub annual_yield: KilowattHours,
    pub annual_savings: Cost,
    pub payback: Payback,
}

impl FinancialProfile {
    pub fn new(
        tier: Tier,
        capital_cost: Cost,
        annual_yield: KilowattHours,
        rate: KilowattHourRate,
    ) -> Self {
        let annual_savings = annual_yield * rate;
        let payback = Payback::new(capital_cost, annual_savings);
        Self { tier, capital_cost, annual_yield, annual_savings, payback }
    }
}

/// Financial profiles of a single installation, in the tier order.
#[must_use]
pub struct InstallationFinance {
    pub installation: String,
    pub profiles: Vec<FinancialProfile>,
}

impl InstallationFinance {
    /// The tier with the shortest payback, the earliest tier wins a tie.
    pub fn best(&self) -> Option<&FinancialProfile> {
        self.profiles.iter().min_by_key(|profile| profile.payback)
    }
}

/// Converts annual yields into savings and payback periods.
#[must_use]
pub struct Analyzer<'a> {
    prices: &'a PriceTable,
    rate: KilowattHourRate,
}

impl<'a> Analyzer<'a> {
    /// Check the price table against the configuration before anything is analysed.
    pub fn try_new(
        prices: &'a PriceTable,
        rate: KilowattHourRate,
        installations: &[Installation],
        batteries: &[BatteryOption],
    ) -> Result<Self, Error> {
        if !rate.is_finite() {
            return Err(Error::configuration(format!(
                "electricity price must be finite, got {rate:?}",
            )));
        }
        prices.validate(installations, batteries)?;
        Ok(Self { prices, rate })
    }

    pub fn analyze(&self, run: &InstallationRun) -> Result<InstallationFinance, Error> {
        let label = &run.installation.label;
        let no_storage = Tier::NoStorage;
        let mut profiles = vec![FinancialProfile::new(
            Tier::NoStorage,
            self.capital_cost(label, &no_storage)?,
            run.capped_total(),
            self.rate,
        )];
        for scenario in &run.scenarios {
            let tier = Tier::Battery(scenario.key.battery.clone());
            let capital_cost = self.capital_cost(label, &tier)?;
            let annual_yield = scenario.total().buffered;
            profiles.push(FinancialProfile::new(tier, capital_cost, annual_yield, self.rate));
        }
        Ok(InstallationFinance { installation: label.clone(), profiles })
    }

    fn capital_cost(&self, installation: &str, tier: &Tier) -> Result<Cost, Error> {
        self.prices.get(installation, tier).ok_or_else(|| {
            let key = ScenarioKey {
                installation: installation.to_string(),
                battery: tier.label().to_string(),
            };
            Error::configuration(format!("missing price for {key:?}"))
        })
    }
}
