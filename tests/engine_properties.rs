//! Property tests for the aggregation engine.
//!
//! Random trade sets over a handful of countries and companies, checked
//! against the invariants every report must hold:
//!
//! - directional totals equal the sum of per-transaction values
//! - average prices are 0 when there is no volume
//! - rankings are sorted descending and truncated to N
//! - yearly series are strictly ascending
//! - output is a pure function of the input
//! - counterpart home countries are exactly the ones supplied

mod common;

use approx::assert_relative_eq;
use common::*;
use proptest::prelude::*;
use trademap::domain::aggregate::{CompanyTotal, CountryTotal, YearPoint};
use trademap::domain::company_stats::CompanyStats;
use trademap::domain::country_stats::CountryStats;
use trademap::domain::directory::{Directory, index_transactions};
use trademap::domain::map_summary::map_countries;
use trademap::domain::transaction::{TradeTransaction, round_cents};

const COUNTRIES: &[&str] = &["Turkey", "Germany", "Brazil", "Peru"];
const COMPANIES: &[&str] = &["Acme", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Eta"];

fn arb_country() -> impl Strategy<Value = &'static str> {
    prop::sample::select(COUNTRIES)
}

fn arb_company() -> impl Strategy<Value = &'static str> {
    prop::sample::select(COMPANIES)
}

/// Whole kilograms, including zero.
fn arb_quantity() -> impl Strategy<Value = f64> {
    (0u32..5_000).prop_map(f64::from)
}

/// Prices with up to four decimals.
fn arb_price() -> impl Strategy<Value = f64> {
    (0u32..1_000_000).prop_map(|p| f64::from(p) / 10_000.0)
}

fn arb_trade() -> impl Strategy<Value = TradeTransaction> {
    (
        arb_country(),
        arb_company(),
        arb_country(),
        arb_company(),
        arb_quantity(),
        arb_price(),
        prop::option::of((2018i32..2025, 1u32..13, 1u32..29)),
    )
        .prop_map(|(origin, seller, dest, buyer, qty, price, date)| {
            let t = trade(origin, seller, dest, buyer, qty, price);
            match date {
                Some((y, m, d)) => dated(t, y, m, d),
                None => t,
            }
        })
}

fn arb_trades() -> impl Strategy<Value = Vec<TradeTransaction>> {
    prop::collection::vec(arb_trade(), 0..60).prop_map(|mut trades| {
        index_transactions(&mut trades);
        trades
    })
}

fn sum_values<'a>(trades: impl Iterator<Item = &'a TradeTransaction>) -> f64 {
    trades.map(|t| t.value).sum()
}

fn companies_sorted(list: &[CompanyTotal]) -> bool {
    list.windows(2).all(|w| w[0].value >= w[1].value)
}

fn countries_sorted(list: &[CountryTotal]) -> bool {
    list.windows(2).all(|w| w[0].value >= w[1].value)
}

fn years_ascending(series: &[YearPoint]) -> bool {
    series.windows(2).all(|w| w[0].year < w[1].year)
}

mod country_properties {
    use super::*;

    proptest! {
        #[test]
        fn absent_iff_no_trade_touches_country(trades in arb_trades(), country in arb_country()) {
            let touched = trades
                .iter()
                .any(|t| t.is_outbound_for(country) || t.is_inbound_for(country));
            let stats = CountryStats::compute(country, &trades, 10);
            prop_assert_eq!(stats.is_some(), touched);
        }

        #[test]
        fn totals_equal_sums(trades in arb_trades(), country in arb_country()) {
            if let Some(stats) = CountryStats::compute(country, &trades, 10) {
                let exports = sum_values(trades.iter().filter(|t| t.is_outbound_for(country)));
                let imports = sum_values(trades.iter().filter(|t| t.is_inbound_for(country)));
                assert_relative_eq!(stats.total_export_value, exports, max_relative = 1e-9);
                assert_relative_eq!(stats.total_import_value, imports, max_relative = 1e-9);
                prop_assert_eq!(
                    stats.trade_balance,
                    stats.total_export_value - stats.total_import_value
                );
            }
        }

        #[test]
        fn avg_price_zero_without_volume(trades in arb_trades(), country in arb_country()) {
            if let Some(stats) = CountryStats::compute(country, &trades, 10) {
                if stats.total_export_volume == 0.0 {
                    prop_assert_eq!(stats.avg_export_price, 0.0);
                }
                if stats.total_import_volume == 0.0 {
                    prop_assert_eq!(stats.avg_import_price, 0.0);
                }
                prop_assert!(stats.avg_export_price.is_finite());
                prop_assert!(stats.avg_import_price.is_finite());
            }
        }

        #[test]
        fn rankings_sorted_and_truncated(
            trades in arb_trades(),
            country in arb_country(),
            top_n in 1usize..6,
        ) {
            if let Some(stats) = CountryStats::compute(country, &trades, top_n) {
                for list in [
                    &stats.top_exporters,
                    &stats.top_buyers,
                    &stats.top_importers,
                    &stats.top_sellers,
                ] {
                    prop_assert!(list.len() <= top_n);
                    prop_assert!(companies_sorted(list));
                }
                for list in [&stats.top_destinations, &stats.top_sources] {
                    prop_assert!(list.len() <= top_n);
                    prop_assert!(countries_sorted(list));
                }
                prop_assert!(stats.exit_ports.windows(2).all(|w| w[0].count >= w[1].count));
                prop_assert!(stats.entry_ports.windows(2).all(|w| w[0].count >= w[1].count));
            }
        }

        #[test]
        fn yearly_series_strictly_ascending(trades in arb_trades(), country in arb_country()) {
            if let Some(stats) = CountryStats::compute(country, &trades, 10) {
                prop_assert!(years_ascending(&stats.yearly_exports));
                prop_assert!(years_ascending(&stats.yearly_imports));
            }
        }

        #[test]
        fn domestic_trades_count_both_ways(trades in arb_trades(), country in arb_country()) {
            if let Some(stats) = CountryStats::compute(country, &trades, 10) {
                let exports = trades.iter().filter(|t| t.is_outbound_for(country)).count();
                let imports = trades.iter().filter(|t| t.is_inbound_for(country)).count();
                let domestic = trades
                    .iter()
                    .filter(|t| t.is_outbound_for(country) && t.is_inbound_for(country))
                    .count();
                prop_assert_eq!(stats.trade_count, exports + imports - domestic);
            }
        }

        #[test]
        fn home_country_is_the_supplied_one(trades in arb_trades(), country in arb_country()) {
            let directory = Directory::from_transactions(&trades);
            let home = directory.home_countries();
            if let Some(stats) = CountryStats::compute_with_homes(country, &trades, 10, &home) {
                for list in [
                    &stats.top_exporters,
                    &stats.top_buyers,
                    &stats.top_importers,
                    &stats.top_sellers,
                ] {
                    for company in list {
                        prop_assert_eq!(
                            company.home_country.as_deref(),
                            home.get(company.name.as_str()).copied()
                        );
                    }
                }
            }
        }

        #[test]
        fn idempotent(trades in arb_trades(), country in arb_country()) {
            prop_assert_eq!(
                CountryStats::compute(country, &trades, 10),
                CountryStats::compute(country, &trades, 10)
            );
        }
    }
}

mod company_properties {
    use super::*;

    proptest! {
        #[test]
        fn totals_follow_ids(trades in arb_trades(), top_n in 1usize..6) {
            let mut trades = trades;
            let directory = index_transactions(&mut trades);
            for entry in directory.companies() {
                let stats = CompanyStats::compute(entry.id, &trades, top_n);
                let sold = sum_values(trades.iter().filter(|t| t.seller_id == Some(entry.id)));
                let bought = sum_values(trades.iter().filter(|t| t.buyer_id == Some(entry.id)));
                assert_relative_eq!(stats.total_export_value, sold, max_relative = 1e-9);
                assert_relative_eq!(stats.total_import_value, bought, max_relative = 1e-9);

                prop_assert!(stats.top_customers.len() <= top_n);
                prop_assert!(stats.top_suppliers.len() <= top_n);
                prop_assert!(companies_sorted(&stats.top_customers));
                prop_assert!(companies_sorted(&stats.top_suppliers));
                prop_assert!(countries_sorted(&stats.top_destination_countries));
                prop_assert!(countries_sorted(&stats.top_source_countries));
                prop_assert!(years_ascending(&stats.yearly_exports));
                prop_assert!(years_ascending(&stats.yearly_imports));

                if stats.total_export_volume == 0.0 {
                    prop_assert_eq!(stats.avg_export_price, 0.0);
                }
                if stats.total_import_volume == 0.0 {
                    prop_assert_eq!(stats.avg_import_price, 0.0);
                }
            }
        }
    }
}

mod value_properties {
    use super::*;

    proptest! {
        #[test]
        fn value_is_rounded_product(qty in arb_quantity(), price in arb_price()) {
            let t = TradeTransaction::priced(qty, price);
            prop_assert_eq!(t.value, round_cents(qty * price));
            prop_assert!(t.value >= 0.0);
        }

        #[test]
        fn map_volumes_cover_every_trade(trades in arb_trades()) {
            let map = map_countries(&trades);
            let exported: f64 = map.iter().map(|c| c.export_volume).sum();
            let imported: f64 = map.iter().map(|c| c.import_volume).sum();
            let shipped: f64 = trades.iter().map(|t| t.quantity_kg).sum();
            assert_relative_eq!(exported, shipped, max_relative = 1e-9, epsilon = 1e-9);
            assert_relative_eq!(imported, shipped, max_relative = 1e-9, epsilon = 1e-9);
            for c in &map {
                prop_assert_eq!(c.total_trade, c.export_volume + c.import_volume);
            }
        }
    }
}
