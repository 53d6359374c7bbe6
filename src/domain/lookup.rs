//! Store-backed report lookups shared by the CLI and the web API.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::domain::company_stats::{COMPANY_TOP_N, CompanyStats};
use crate::domain::country_stats::{COUNTRY_TOP_N, CountryStats};
use crate::domain::error::TradeMapError;
use crate::domain::transaction::TradeTransaction;
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_store::{Contact, TradeStore};

/// Ranking lengths for the two report scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsLimits {
    pub country_top_n: usize,
    pub company_top_n: usize,
}

impl Default for StatsLimits {
    fn default() -> Self {
        Self {
            country_top_n: COUNTRY_TOP_N,
            company_top_n: COMPANY_TOP_N,
        }
    }
}

impl StatsLimits {
    /// Reads `[stats]`. Values below 1 fall back to the defaults; validation
    /// reports them separately.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        Self {
            country_top_n: config.get_count("stats", "country_top_n", COUNTRY_TOP_N),
            company_top_n: config.get_count("stats", "company_top_n", COMPANY_TOP_N),
        }
    }
}

/// Company report: stored profile plus trade statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetail {
    pub address: Option<String>,
    pub website: Option<String>,
    pub contacts: Vec<Contact>,
    #[serde(flatten)]
    pub stats: CompanyStats,
}

/// Every company named as seller or buyer, first-seen order.
fn company_names(transactions: &[TradeTransaction]) -> Vec<&str> {
    let mut seen = HashSet::new();
    transactions
        .iter()
        .flat_map(|t| [t.origin_company.as_deref(), t.destination_company.as_deref()])
        .flatten()
        .filter(|name| seen.insert(*name))
        .collect()
}

/// Country report. Counterpart home countries come from the store's company
/// records.
pub fn country_report(
    store: &dyn TradeStore,
    name: &str,
    limits: StatsLimits,
) -> Result<CountryStats, TradeMapError> {
    let name = name.trim();
    let transactions = store.country_transactions(name)?;
    tracing::debug!(country = name, trades = transactions.len(), "country lookup");
    if transactions.is_empty() {
        return Err(TradeMapError::CountryNotFound {
            name: name.to_string(),
        });
    }

    let homes = store.company_countries(&company_names(&transactions))?;
    let home: HashMap<&str, &str> = homes
        .iter()
        .map(|(company, country)| (company.as_str(), country.as_str()))
        .collect();

    CountryStats::compute_with_homes(name, &transactions, limits.country_top_n, &home).ok_or_else(
        || TradeMapError::CountryNotFound {
            name: name.to_string(),
        },
    )
}

pub fn company_report(
    store: &dyn TradeStore,
    name: &str,
    limits: StatsLimits,
) -> Result<CompanyDetail, TradeMapError> {
    let name = name.trim();
    let record = store
        .find_company(name)?
        .ok_or_else(|| TradeMapError::CompanyNotFound {
            name: name.to_string(),
        })?;
    let transactions = store.company_transactions(record.id)?;
    let contacts = store.company_contacts(record.id)?;
    tracing::debug!(company = name, id = %record.id, trades = transactions.len(), "company lookup");

    let mut stats = CompanyStats::compute(record.id, &transactions, limits.company_top_n);
    stats.company_name = record.name;
    if let Some(country) = record.country_name {
        stats.country_name = country;
    }

    Ok(CompanyDetail {
        address: record.address,
        website: record.website,
        contacts,
        stats,
    })
}
