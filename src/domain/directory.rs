//! Country and company directory for a dataset.
//!
//! Mirrors what the import does against a database: every distinct country
//! name is registered, every distinct company name gets an id and the country
//! it was first seen with.

use std::collections::HashMap;

use super::transaction::{CompanyId, TradeTransaction};

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyEntry {
    pub id: CompanyId,
    pub name: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Directory {
    countries: Vec<String>,
    country_index: HashMap<String, usize>,
    companies: Vec<CompanyEntry>,
    company_index: HashMap<String, usize>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from transactions in iteration order.
    pub fn from_transactions(transactions: &[TradeTransaction]) -> Self {
        let mut dir = Self::new();
        for t in transactions {
            dir.observe(t);
        }
        dir
    }

    /// Register the names carried by one transaction. Seller before buyer, so
    /// a company first seen as seller takes its origin country.
    pub fn observe(&mut self, t: &TradeTransaction) {
        if let Some(c) = &t.origin_country {
            self.intern_country(c);
        }
        if let Some(c) = &t.destination_country {
            self.intern_country(c);
        }
        if let Some(name) = &t.origin_company {
            self.intern_company(name, t.origin_country.as_deref());
        }
        if let Some(name) = &t.destination_company {
            self.intern_company(name, t.destination_country.as_deref());
        }
    }

    pub fn intern_country(&mut self, name: &str) {
        if !self.country_index.contains_key(name) {
            self.country_index.insert(name.to_string(), self.countries.len());
            self.countries.push(name.to_string());
        }
    }

    pub fn intern_company(&mut self, name: &str, country: Option<&str>) -> CompanyId {
        if let Some(&idx) = self.company_index.get(name) {
            return self.companies[idx].id;
        }
        let id = CompanyId(self.companies.len() as i64 + 1);
        self.company_index.insert(name.to_string(), self.companies.len());
        self.companies.push(CompanyEntry {
            id,
            name: name.to_string(),
            country: country.map(str::to_string),
        });
        id
    }

    /// Fill seller/buyer ids from company names.
    pub fn assign_ids(&self, t: &mut TradeTransaction) {
        t.seller_id = t.origin_company.as_deref().and_then(|n| self.company_id(n));
        t.buyer_id = t.destination_company.as_deref().and_then(|n| self.company_id(n));
    }

    pub fn company_id(&self, name: &str) -> Option<CompanyId> {
        self.company_index.get(name).map(|&i| self.companies[i].id)
    }

    pub fn company(&self, name: &str) -> Option<&CompanyEntry> {
        self.company_index.get(name).map(|&i| &self.companies[i])
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn companies(&self) -> &[CompanyEntry] {
        &self.companies
    }

    /// Company name to first-seen country, as used for `home_country`.
    pub fn home_countries(&self) -> HashMap<&str, &str> {
        self.companies
            .iter()
            .filter_map(|c| c.country.as_deref().map(|country| (c.name.as_str(), country)))
            .collect()
    }
}

/// Intern every transaction and stamp company ids onto them.
pub fn index_transactions(transactions: &mut [TradeTransaction]) -> Directory {
    let dir = Directory::from_transactions(transactions);
    for t in transactions.iter_mut() {
        dir.assign_ids(t);
    }
    dir
}
