//! Company-scope trade statistics.
//!
//! Outbound trades are those where the company is the seller, inbound those
//! where it is the buyer. Partitions match on [`CompanyId`], never on name.

use serde::Serialize;
use std::collections::HashMap;

use super::aggregate::{
    CompanyTotal, CountryTotal, YearPoint, top_companies, top_countries, totals, yearly_series,
};
use super::transaction::{CompanyId, TradeTransaction};

/// Counterpart ranking length at company scope.
pub const COMPANY_TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStats {
    pub company_id: CompanyId,
    pub company_name: String,
    pub country_name: String,

    pub total_export_volume: f64,
    pub total_export_value: f64,
    pub avg_export_price: f64,
    pub total_import_volume: f64,
    pub total_import_value: f64,
    pub avg_import_price: f64,

    pub top_customers: Vec<CompanyTotal>,
    pub top_destination_countries: Vec<CountryTotal>,
    pub yearly_exports: Vec<YearPoint>,
    pub top_suppliers: Vec<CompanyTotal>,
    pub top_source_countries: Vec<CountryTotal>,
    pub yearly_imports: Vec<YearPoint>,
    pub trade_count: usize,
}

impl CompanyStats {
    /// Statistics for `company` over `transactions`. A company without trades
    /// yields a zeroed report; whether it exists at all is a lookup concern.
    pub fn compute(company: CompanyId, transactions: &[TradeTransaction], top_n: usize) -> Self {
        let exports: Vec<&TradeTransaction> = transactions
            .iter()
            .filter(|t| t.seller_id == Some(company))
            .collect();
        let imports: Vec<&TradeTransaction> = transactions
            .iter()
            .filter(|t| t.buyer_id == Some(company))
            .collect();

        let (company_name, country_name) = identify(company, &exports, &imports);

        let export_total = totals(exports.iter().copied());
        let import_total = totals(imports.iter().copied());
        let no_home = HashMap::new();
        let trade_count = transactions
            .iter()
            .filter(|t| t.seller_id == Some(company) || t.buyer_id == Some(company))
            .count();

        CompanyStats {
            company_id: company,
            company_name,
            country_name,

            total_export_volume: export_total.volume,
            total_export_value: export_total.value,
            avg_export_price: export_total.avg_price(),
            total_import_volume: import_total.volume,
            total_import_value: import_total.value,
            avg_import_price: import_total.avg_price(),

            top_customers: top_companies(
                exports.iter().copied(),
                |t| t.destination_company.as_deref(),
                top_n,
                &no_home,
            ),
            top_destination_countries: top_countries(
                exports.iter().copied(),
                |t| t.destination_country.as_deref(),
                top_n,
            ),
            yearly_exports: yearly_series(exports.iter().copied()),
            top_suppliers: top_companies(
                imports.iter().copied(),
                |t| t.origin_company.as_deref(),
                top_n,
                &no_home,
            ),
            top_source_countries: top_countries(
                imports.iter().copied(),
                |t| t.origin_country.as_deref(),
                top_n,
            ),
            yearly_imports: yearly_series(imports.iter().copied()),
            trade_count,
        }
    }

    pub fn has_trades(&self) -> bool {
        self.trade_count > 0
    }
}

/// Company statistics with the default ranking length.
pub fn summarize_by_company(company: CompanyId, transactions: &[TradeTransaction]) -> CompanyStats {
    CompanyStats::compute(company, transactions, COMPANY_TOP_N)
}

/// Display name and country of the company, from the first trade naming it.
fn identify(
    company: CompanyId,
    exports: &[&TradeTransaction],
    imports: &[&TradeTransaction],
) -> (String, String) {
    let as_seller = exports
        .iter()
        .find(|t| t.seller_id == Some(company) && t.origin_company.is_some())
        .map(|t| (t.origin_company.clone(), t.origin_country.clone()));
    let as_buyer = imports
        .iter()
        .find(|t| t.buyer_id == Some(company) && t.destination_company.is_some())
        .map(|t| (t.destination_company.clone(), t.destination_country.clone()));

    let (name, country) = as_seller.or(as_buyer).unwrap_or((None, None));
    (name.unwrap_or_default(), country.unwrap_or_default())
}
