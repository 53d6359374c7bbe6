//! Country-scope trade statistics.

use std::collections::HashMap;

use serde::Serialize;

use super::aggregate::{
    CompanyTotal, CountryTotal, PortCount, YearPoint, distinct_names, port_counts, top_companies,
    top_countries, totals, yearly_series,
};
use super::country_code::country_code;
use super::directory::Directory;
use super::transaction::TradeTransaction;

/// Counterpart ranking length at country scope.
pub const COUNTRY_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryStats {
    pub country_name: String,
    pub country_code: String,

    // as origin
    pub top_exporters: Vec<CompanyTotal>,
    pub export_companies: Vec<String>,
    pub top_buyers: Vec<CompanyTotal>,
    pub avg_export_price: f64,
    pub total_export_volume: f64,
    pub total_export_value: f64,

    // as destination
    pub top_importers: Vec<CompanyTotal>,
    pub import_companies: Vec<String>,
    pub top_sellers: Vec<CompanyTotal>,
    pub avg_import_price: f64,
    pub total_import_volume: f64,
    pub total_import_value: f64,

    pub top_destinations: Vec<CountryTotal>,
    pub top_sources: Vec<CountryTotal>,
    pub exit_ports: Vec<PortCount>,
    pub entry_ports: Vec<PortCount>,
    pub yearly_exports: Vec<YearPoint>,
    pub yearly_imports: Vec<YearPoint>,
    pub trade_balance: f64,
    pub trade_count: usize,
}

impl CountryStats {
    /// Statistics for `country` over `transactions`, or `None` when the country
    /// is neither origin nor destination of any transaction.
    ///
    /// A transaction whose origin and destination are both `country` counts on
    /// both sides. Company home countries are where each company first appears
    /// in `transactions`.
    pub fn compute(
        country: &str,
        transactions: &[TradeTransaction],
        top_n: usize,
    ) -> Option<Self> {
        let directory = Directory::from_transactions(transactions);
        Self::compute_with_homes(country, transactions, top_n, &directory.home_countries())
    }

    /// Same as [`CountryStats::compute`], with company home countries taken
    /// from `home` (company name to country). Companies missing from `home`
    /// get no home country.
    pub fn compute_with_homes(
        country: &str,
        transactions: &[TradeTransaction],
        top_n: usize,
        home: &HashMap<&str, &str>,
    ) -> Option<Self> {
        let exports: Vec<&TradeTransaction> = transactions
            .iter()
            .filter(|t| t.is_outbound_for(country))
            .collect();
        let imports: Vec<&TradeTransaction> = transactions
            .iter()
            .filter(|t| t.is_inbound_for(country))
            .collect();

        if exports.is_empty() && imports.is_empty() {
            return None;
        }

        let export_total = totals(exports.iter().copied());
        let import_total = totals(imports.iter().copied());

        let trade_count = transactions
            .iter()
            .filter(|t| t.is_outbound_for(country) || t.is_inbound_for(country))
            .count();

        Some(CountryStats {
            country_name: country.to_string(),
            country_code: country_code(country),

            top_exporters: top_companies(
                exports.iter().copied(),
                |t| t.origin_company.as_deref(),
                top_n,
                home,
            ),
            export_companies: distinct_names(exports.iter().copied(), |t| {
                t.origin_company.as_deref()
            }),
            top_buyers: top_companies(
                exports.iter().copied(),
                |t| t.destination_company.as_deref(),
                top_n,
                home,
            ),
            avg_export_price: export_total.avg_price(),
            total_export_volume: export_total.volume,
            total_export_value: export_total.value,

            top_importers: top_companies(
                imports.iter().copied(),
                |t| t.destination_company.as_deref(),
                top_n,
                home,
            ),
            import_companies: distinct_names(imports.iter().copied(), |t| {
                t.destination_company.as_deref()
            }),
            top_sellers: top_companies(
                imports.iter().copied(),
                |t| t.origin_company.as_deref(),
                top_n,
                home,
            ),
            avg_import_price: import_total.avg_price(),
            total_import_volume: import_total.volume,
            total_import_value: import_total.value,

            top_destinations: top_countries(
                exports.iter().copied(),
                |t| t.destination_country.as_deref(),
                top_n,
            ),
            top_sources: top_countries(
                imports.iter().copied(),
                |t| t.origin_country.as_deref(),
                top_n,
            ),
            exit_ports: port_counts(exports.iter().copied(), |t| t.exit_port.as_deref()),
            entry_ports: port_counts(imports.iter().copied(), |t| t.entry_port.as_deref()),
            yearly_exports: yearly_series(exports.iter().copied()),
            yearly_imports: yearly_series(imports.iter().copied()),
            trade_balance: export_total.value - import_total.value,
            trade_count,
        })
    }
}

/// Country statistics with the default ranking length.
pub fn summarize_by_country(
    country: &str,
    transactions: &[TradeTransaction],
) -> Option<CountryStats> {
    CountryStats::compute(country, transactions, COUNTRY_TOP_N)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trade(
        origin: &str,
        seller: &str,
        dest: &str,
        buyer: &str,
        qty: f64,
        price: f64,
    ) -> TradeTransaction {
        let mut t = TradeTransaction::priced(qty, price);
        t.origin_country = Some(origin.into());
        t.origin_company = Some(seller.into());
        t.destination_country = Some(dest.into());
        t.destination_company = Some(buyer.into());
        t
    }

    #[test]
    fn single_export_scenario() {
        let trades = vec![trade("Turkey", "A", "Germany", "B", 100.0, 2.0)];
        let stats = summarize_by_country("Turkey", &trades).unwrap();

        assert_eq!(stats.total_export_volume, 100.0);
        assert_eq!(stats.total_export_value, 200.0);
        assert_eq!(stats.avg_export_price, 2.0);
        assert_eq!(stats.top_buyers.len(), 1);
        assert_eq!(stats.top_buyers[0].name, "B");
        assert_eq!(stats.top_buyers[0].volume, 100.0);
        assert_eq!(stats.top_buyers[0].value, 200.0);
        assert_eq!(stats.top_buyers[0].home_country.as_deref(), Some("Germany"));
        assert_eq!(
            stats.top_destinations,
            vec![CountryTotal {
                country: "Germany".into(),
                volume: 100.0,
                value: 200.0
            }]
        );
        assert_eq!(stats.top_exporters[0].name, "A");
        assert_eq!(stats.export_companies, vec!["A".to_string()]);
        assert!(stats.top_importers.is_empty());
        assert_eq!(stats.total_import_value, 0.0);
        assert_eq!(stats.avg_import_price, 0.0);
        assert_eq!(stats.trade_balance, 200.0);
        assert_eq!(stats.country_code, "TUR");
        assert_eq!(stats.trade_count, 1);
    }

    #[test]
    fn home_countries_from_caller() {
        let trades = vec![trade("Turkey", "X", "Germany", "Beta", 10.0, 1.0)];
        let home = HashMap::from([("X", "Germany"), ("Beta", "Austria")]);
        let stats = CountryStats::compute_with_homes("Turkey", &trades, 10, &home).unwrap();

        assert_eq!(stats.top_exporters[0].home_country.as_deref(), Some("Germany"));
        assert_eq!(stats.top_buyers[0].home_country.as_deref(), Some("Austria"));

        let none = CountryStats::compute_with_homes("Turkey", &trades, 10, &HashMap::new()).unwrap();
        assert!(none.top_buyers[0].home_country.is_none());
    }

    #[test]
    fn absent_country_is_none() {
        let trades = vec![trade("Turkey", "A", "Germany", "B", 100.0, 2.0)];
        assert!(summarize_by_country("France", &trades).is_none());
        assert!(summarize_by_country("Turkey", &[]).is_none());
    }

    #[test]
    fn zero_value_trade_still_present() {
        let trades = vec![trade("Turkey", "A", "Germany", "B", 0.0, 5.0)];
        let stats = summarize_by_country("Turkey", &trades).unwrap();
        assert_eq!(stats.top_buyers.len(), 1);
        assert_eq!(stats.top_buyers[0].value, 0.0);
        assert_eq!(stats.top_buyers[0].volume, 0.0);
        assert_eq!(stats.avg_export_price, 0.0);
    }

    #[test]
    fn imports_and_balance() {
        let trades = vec![
            trade("Turkey", "A", "Germany", "B", 100.0, 2.0),
            trade("Brazil", "C", "Turkey", "A", 50.0, 3.0),
            trade("China", "D", "Turkey", "E", 10.0, 1.0),
        ];
        let stats = summarize_by_country("Turkey", &trades).unwrap();
        assert_eq!(stats.total_import_volume, 60.0);
        assert_eq!(stats.total_import_value, 160.0);
        assert_eq!(stats.trade_balance, 40.0);
        let sellers: Vec<_> = stats.top_sellers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(sellers, vec!["C", "D"]);
        let importers: Vec<_> = stats.top_importers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(importers, vec!["A", "E"]);
        let sources: Vec<_> = stats.top_sources.iter().map(|c| c.country.as_str()).collect();
        assert_eq!(sources, vec!["Brazil", "China"]);
        assert_eq!(stats.import_companies, vec!["A".to_string(), "E".to_string()]);
        assert_eq!(stats.trade_count, 3);
    }

    #[test]
    fn domestic_trade_counts_both_ways() {
        let trades = vec![trade("Turkey", "A", "Turkey", "B", 10.0, 1.0)];
        let stats = summarize_by_country("Turkey", &trades).unwrap();
        assert_eq!(stats.total_export_value, 10.0);
        assert_eq!(stats.total_import_value, 10.0);
        assert_eq!(stats.trade_balance, 0.0);
        assert_eq!(stats.trade_count, 1);
    }

    #[test]
    fn rankings_truncate_to_top_n() {
        let trades: Vec<_> = (0..15)
            .map(|i| trade("Turkey", "A", "Germany", &format!("B{i}"), 1.0 + i as f64, 1.0))
            .collect();
        let stats = summarize_by_country("Turkey", &trades).unwrap();
        assert_eq!(stats.top_buyers.len(), COUNTRY_TOP_N);
        assert_eq!(stats.top_buyers[0].name, "B14");

        let narrow = CountryStats::compute("Turkey", &trades, 3).unwrap();
        assert_eq!(narrow.top_buyers.len(), 3);
        // distinct name list is never truncated
        assert_eq!(narrow.export_companies.len(), 1);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let trades = vec![
            trade("Turkey", "A", "Germany", "X", 10.0, 2.0),
            trade("Turkey", "A", "Germany", "Y", 20.0, 1.0),
        ];
        let stats = summarize_by_country("Turkey", &trades).unwrap();
        let buyers: Vec<_> = stats.top_buyers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(buyers, vec!["X", "Y"]);
    }

    #[test]
    fn ports_and_yearly_series() {
        let mut a = trade("Turkey", "A", "Germany", "B", 10.0, 1.0);
        a.exit_port = Some("Mersin".into());
        a.date = NaiveDate::from_ymd_opt(2021, 5, 1);
        let mut b = trade("Turkey", "A", "Germany", "B", 10.0, 2.0);
        b.exit_port = Some("Izmir".into());
        b.date = NaiveDate::from_ymd_opt(2020, 5, 1);
        let mut c = trade("Turkey", "A", "Germany", "B", 10.0, 3.0);
        c.exit_port = Some("Izmir".into());
        let mut d = trade("Germany", "B", "Turkey", "A", 5.0, 1.0);
        d.entry_port = Some("Ambarli".into());
        d.date = NaiveDate::from_ymd_opt(2021, 1, 1);

        let stats = summarize_by_country("Turkey", &[a, b, c, d]).unwrap();
        assert_eq!(stats.exit_ports[0].port, "Izmir");
        assert_eq!(stats.exit_ports[0].count, 2);
        assert_eq!(stats.exit_ports[1].port, "Mersin");
        assert_eq!(stats.entry_ports.len(), 1);

        let years: Vec<_> = stats.yearly_exports.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2020, 2021]);
        // undated export excluded from the series but present in totals
        let series_value: f64 = stats.yearly_exports.iter().map(|p| p.value).sum();
        assert_eq!(series_value, 30.0);
        assert_eq!(stats.total_export_value, 60.0);
        assert_eq!(stats.yearly_imports.len(), 1);
    }

    #[test]
    fn missing_counterpart_skipped_per_grouping() {
        let mut t = trade("Turkey", "A", "Germany", "B", 10.0, 1.0);
        t.destination_company = None;
        let stats = summarize_by_country("Turkey", &[t]).unwrap();
        assert!(stats.top_buyers.is_empty());
        assert_eq!(stats.top_exporters.len(), 1);
        assert_eq!(stats.top_destinations.len(), 1);
        assert_eq!(stats.total_export_value, 10.0);
    }

    #[test]
    fn serializes_camel_case() {
        let trades = vec![trade("Turkey", "A", "Germany", "B", 100.0, 2.0)];
        let stats = summarize_by_country("Turkey", &trades).unwrap();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalExportValue"], 200.0);
        assert_eq!(json["topBuyers"][0]["name"], "B");
        assert_eq!(json["topBuyers"][0]["companyCountry"], "Germany");
        assert_eq!(json["topDestinations"][0]["country"], "Germany");
        assert_eq!(json["countryCode"], "TUR");
    }
}
