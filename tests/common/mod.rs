#![allow(dead_code)]

use chrono::NaiveDate;
use std::io::Write;
use trademap::domain::directory::index_transactions;
use trademap::domain::error::TradeMapError;
use trademap::domain::transaction::{CompanyId, TradeTransaction};
use trademap::ports::trade_store::{CompanyRecord, Contact, ContactDetails, TradeStore};

/// Small export with Turkish headers: two directions between Turkey and
/// Germany, a Brazilian supplier, a domestic Turkish trade and a blank row.
pub const SAMPLE_CSV: &str = "\
GÖNDERİCİ ÜLKE,GÖNDERİCİ FİRMA,ÜRÜN TARİFE KODU / HS CODE / GTİP,ÜRÜN AÇIKLAMA,ÜRÜN MİKTARI (KG),TARİH,ÜRÜN FİYATI (USD),ALICI FİRMA,ALICI ÜLKE,ÇIKIŞ LİMANI,VARIŞ LİMANI
Turkey,Acme Gida,080221,Hazelnuts,1000,2022-05-10,4.5,Beta GmbH,Germany,Mersin,Hamburg
Turkey,Acme Gida,080221,Hazelnuts,500,10.01.2023,4.75,Beta GmbH,Germany,Mersin,Hamburg
Turkey,Delta Tekstil,520100,Cotton,2000,2023-02-01,2,Gamma Trading,Brazil,Izmir,Santos
Germany,Beta GmbH,842121,Filters,100,2023-03-15,30,Acme Gida,Turkey,Hamburg,Mersin
Brazil,Gamma Trading,090111,Coffee,800,44986,3.25,Delta Tekstil,Turkey,Santos,Izmir
Turkey,Delta Tekstil,520100,Cotton,50,2023-06-01,2,Acme Gida,Turkey,Izmir,Mersin
,,,,,,,,,,
";

pub fn write_temp_file(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn write_temp_csv(content: &str) -> tempfile::NamedTempFile {
    write_temp_file(content, ".csv")
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    write_temp_file(content, ".ini")
}

pub fn trade(
    origin: &str,
    seller: &str,
    destination: &str,
    buyer: &str,
    quantity_kg: f64,
    unit_price: f64,
) -> TradeTransaction {
    let mut t = TradeTransaction::priced(quantity_kg, unit_price);
    t.origin_country = Some(origin.to_string());
    t.origin_company = Some(seller.to_string());
    t.destination_country = Some(destination.to_string());
    t.destination_company = Some(buyer.to_string());
    t
}

pub fn dated(mut t: TradeTransaction, year: i32, month: u32, day: u32) -> TradeTransaction {
    t.date = NaiveDate::from_ymd_opt(year, month, day);
    t
}

pub fn with_ports(mut t: TradeTransaction, exit: &str, entry: &str) -> TradeTransaction {
    t.exit_port = Some(exit.to_string());
    t.entry_port = Some(entry.to_string());
    t
}

/// In-memory store with optional failure injection.
pub struct MockTradeStore {
    pub transactions: Vec<TradeTransaction>,
    pub companies: Vec<CompanyRecord>,
    pub contacts: Vec<(CompanyId, Contact)>,
    pub failure: Option<String>,
}

impl MockTradeStore {
    pub fn new(mut transactions: Vec<TradeTransaction>) -> Self {
        let directory = index_transactions(&mut transactions);
        let companies = directory
            .companies()
            .iter()
            .map(|c| CompanyRecord {
                id: c.id,
                name: c.name.clone(),
                country_name: c.country.clone(),
                address: None,
                website: None,
            })
            .collect();
        Self {
            transactions,
            companies,
            contacts: Vec::new(),
            failure: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            transactions: Vec::new(),
            companies: Vec::new(),
            contacts: Vec::new(),
            failure: Some(reason.to_string()),
        }
    }

    pub fn with_profile(mut self, name: &str, address: &str, website: &str) -> Self {
        if let Some(c) = self.companies.iter_mut().find(|c| c.name == name) {
            c.address = Some(address.to_string());
            c.website = Some(website.to_string());
        }
        self
    }

    pub fn with_contact(mut self, company: &str, contact_name: &str, email: &str) -> Self {
        if let Some(id) = self.companies.iter().find(|c| c.name == company).map(|c| c.id) {
            let contact = Contact {
                id: self.contacts.len() as i64 + 1,
                details: ContactDetails {
                    contact_name: contact_name.to_string(),
                    email: Some(email.to_string()),
                    ..Default::default()
                },
            };
            self.contacts.push((id, contact));
        }
        self
    }

    fn check(&self) -> Result<(), TradeMapError> {
        match &self.failure {
            Some(reason) => Err(TradeMapError::DatabaseQuery {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl TradeStore for MockTradeStore {
    fn all_transactions(&self) -> Result<Vec<TradeTransaction>, TradeMapError> {
        self.check()?;
        Ok(self.transactions.clone())
    }

    fn country_transactions(&self, country: &str) -> Result<Vec<TradeTransaction>, TradeMapError> {
        self.check()?;
        Ok(self
            .transactions
            .iter()
            .filter(|t| t.is_outbound_for(country) || t.is_inbound_for(country))
            .cloned()
            .collect())
    }

    fn company_transactions(
        &self,
        company: CompanyId,
    ) -> Result<Vec<TradeTransaction>, TradeMapError> {
        self.check()?;
        Ok(self
            .transactions
            .iter()
            .filter(|t| t.seller_id == Some(company) || t.buyer_id == Some(company))
            .cloned()
            .collect())
    }

    fn find_company(&self, name: &str) -> Result<Option<CompanyRecord>, TradeMapError> {
        self.check()?;
        Ok(self.companies.iter().find(|c| c.name == name).cloned())
    }

    fn list_countries(&self) -> Result<Vec<String>, TradeMapError> {
        self.check()?;
        let mut names: Vec<String> = self
            .transactions
            .iter()
            .flat_map(|t| [t.origin_country.clone(), t.destination_country.clone()])
            .flatten()
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn company_contacts(&self, company: CompanyId) -> Result<Vec<Contact>, TradeMapError> {
        self.check()?;
        Ok(self
            .contacts
            .iter()
            .filter(|(id, _)| *id == company)
            .map(|(_, c)| c.clone())
            .collect())
    }
}
