use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use feedcap_quantities::energy::KilowattHours;

use crate::core::{
    finance::InstallationFinance,
    scenario::InstallationRun,
    simulator::MonthlyAggregate,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

fn gain_cell(gain: KilowattHours) -> Cell {
    Cell::new(gain).set_alignment(CellAlignment::Right).fg(if gain >= KilowattHours::ONE_WATT_HOUR {
        Color::Green
    } else {
        Color::DarkYellow
    })
}

/// Annual yields of every scenario.
pub fn build_yields_table(runs: &[InstallationRun]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Installation",
        "Battery",
        "Capacity",
        "Unlimited",
        "Limited",
        "Buffered",
        "Gain",
    ]);
    for run in runs {
        for scenario in &run.scenarios {
            let total = scenario.total();
            table.add_row(vec![
                Cell::new(&run.installation.label),
                Cell::new(&scenario.key.battery),
                Cell::new(scenario.battery_capacity).set_alignment(CellAlignment::Right),
                Cell::new(total.uncapped)
                    .set_alignment(CellAlignment::Right)
                    .add_attribute(Attribute::Dim),
                Cell::new(total.capped).set_alignment(CellAlignment::Right),
                Cell::new(total.buffered).set_alignment(CellAlignment::Right),
                gain_cell(total.buffer_gain()),
            ]);
        }
    }
    table
}

/// Additional buffered yield of each battery option over the previous one.
pub fn build_increments_table(runs: &[InstallationRun]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Installation", "From", "To", "Additional", "Increase"]);
    for run in runs {
        for increment in run.increments() {
            table.add_row(vec![
                Cell::new(&run.installation.label),
                Cell::new(increment.from).add_attribute(Attribute::Dim),
                Cell::new(increment.to),
                gain_cell(increment.additional_yield),
                Cell::new(increment.relative.map_or_else(
                    || "n/a".to_string(),
                    |relative| format!("{:+.1} %", relative * 100.0),
                ))
                .set_alignment(CellAlignment::Right),
            ]);
        }
    }
    table
}

pub fn build_monthly_table(months: &[MonthlyAggregate]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Month", "Unlimited", "Limited", "Buffered", "Gain", "Total"]);
    for month in months {
        table.add_row(vec![
            Cell::new(month.month).add_attribute(Attribute::Dim),
            Cell::new(month.total.uncapped)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            Cell::new(month.total.capped).set_alignment(CellAlignment::Right),
            Cell::new(month.total.buffered).set_alignment(CellAlignment::Right),
            gain_cell(month.total.buffer_gain()),
            Cell::new(month.cumulative.buffered).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Investment, savings, and payback per tier, the best tier is highlighted.
pub fn build_payback_table(finances: &[InstallationFinance]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Installation", "Tier", "Investment", "Yield", "Savings", "Payback"]);
    for finance in finances {
        let best = finance.best().map(|profile| &profile.tier);
        for profile in &finance.profiles {
            let is_best = best == Some(&profile.tier);
            let mut tier = Cell::new(&profile.tier);
            let mut payback = Cell::new(profile.payback).set_alignment(CellAlignment::Right);
            if is_best {
                tier = tier.add_attribute(Attribute::Bold);
                payback = payback.fg(Color::Green).add_attribute(Attribute::Bold);
            }
            table.add_row(vec![
                Cell::new(&finance.installation),
                tier,
                Cell::new(profile.capital_cost).set_alignment(CellAlignment::Right),
                Cell::new(profile.annual_yield)
                    .set_alignment(CellAlignment::Right)
                    .add_attribute(Attribute::Dim),
                Cell::new(profile.annual_savings).set_alignment(CellAlignment::Right),
                payback,
            ]);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use feedcap_quantities::{cost::Cost, rate::KilowattHourRate};

    use super::*;
    use crate::core::finance::{FinancialProfile, Tier};

    #[test]
    fn test_payback_table_ok() {
        let finance = InstallationFinance {
            installation: "1.0 kWp".to_string(),
            profiles: vec![
                FinancialProfile::new(
                    Tier::NoStorage,
                    Cost::from(500.0),
                    KilowattHours::from(600.0),
                    KilowattHourRate::from(0.36),
                ),
                FinancialProfile::new(
                    Tier::Battery("2.048 kWh".to_string()),
                    Cost::from(1100.0),
                    KilowattHours::ZERO,
                    KilowattHourRate::from(0.36),
                ),
            ],
        };
        let rendered = build_payback_table(&[finance]).to_string();
        assert!(rendered.contains("No storage"), "{rendered}");
        assert!(rendered.contains("2.048 kWh battery"), "{rendered}");
        assert!(rendered.contains("216.00 €"), "{rendered}");
        assert!(rendered.contains("2.3 years"), "{rendered}");
        assert!(rendered.contains("never"), "{rendered}");
    }
}
