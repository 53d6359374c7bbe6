//! Trade storage port traits.

use serde::Serialize;
use std::collections::HashMap;

use crate::domain::error::TradeMapError;
use crate::domain::map_summary::{MapCountry, map_countries};
use crate::domain::transaction::{CompanyId, TradeTransaction};

/// A company as the store knows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRecord {
    pub id: CompanyId,
    pub name: String,
    pub country_name: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
}

/// Contact person fields as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    pub contact_name: String,
    pub position: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
}

/// A stored contact person of a company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contact {
    pub id: i64,
    #[serde(flatten)]
    pub details: ContactDetails,
}

/// Read side. Transactions come back flattened, with names already resolved
/// from ids, in insertion order.
pub trait TradeStore {
    fn all_transactions(&self) -> Result<Vec<TradeTransaction>, TradeMapError>;

    /// Transactions where `country` is origin or destination. Empty when the
    /// country is unknown.
    fn country_transactions(&self, country: &str) -> Result<Vec<TradeTransaction>, TradeMapError>;

    /// Transactions where `company` is seller or buyer.
    fn company_transactions(
        &self,
        company: CompanyId,
    ) -> Result<Vec<TradeTransaction>, TradeMapError>;

    fn find_company(&self, name: &str) -> Result<Option<CompanyRecord>, TradeMapError>;

    fn list_countries(&self) -> Result<Vec<String>, TradeMapError>;

    /// Stored country of each named company. Unknown companies and companies
    /// without a country are left out.
    fn company_countries(&self, names: &[&str]) -> Result<HashMap<String, String>, TradeMapError> {
        let mut homes = HashMap::new();
        for name in names {
            if let Some(country) = self.find_company(name)?.and_then(|c| c.country_name) {
                homes.insert((*name).to_string(), country);
            }
        }
        Ok(homes)
    }

    /// Stores without contact data have none.
    fn company_contacts(&self, _company: CompanyId) -> Result<Vec<Contact>, TradeMapError> {
        Ok(Vec::new())
    }

    /// Default implementation: aggregates every transaction in memory.
    fn map_countries(&self) -> Result<Vec<MapCountry>, TradeMapError> {
        Ok(map_countries(&self.all_transactions()?))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub countries: usize,
    pub companies: usize,
    pub trades: usize,
}

/// Write side used by the import and profile commands.
pub trait TradeSink {
    /// Upsert countries and companies by name, then insert trades in batches of
    /// `batch_size`.
    fn import(
        &self,
        transactions: &[TradeTransaction],
        batch_size: usize,
    ) -> Result<ImportSummary, TradeMapError>;

    /// Set the address and/or website of an existing company; `None` leaves a
    /// field as stored. `false` when no company has that name.
    fn update_company_profile(
        &self,
        name: &str,
        address: Option<&str>,
        website: Option<&str>,
    ) -> Result<bool, TradeMapError>;

    /// Attach a contact person to an existing company. `None` when no company
    /// has that name.
    fn add_contact(
        &self,
        company: &str,
        contact: &ContactDetails,
    ) -> Result<Option<i64>, TradeMapError>;
}
