//! CSV trade export adapter.
//!
//! Loads a whole export into memory and serves it through [`TradeStore`]. This
//! is the demo source: no database, ids assigned in first-seen order.

use crate::domain::directory::{Directory, index_transactions};
use crate::domain::error::TradeMapError;
use crate::domain::ingest::RawTradeRow;
use crate::domain::transaction::{CompanyId, TradeTransaction};
use crate::ports::trade_store::{CompanyRecord, TradeStore};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub struct CsvAdapter {
    transactions: Vec<TradeTransaction>,
    directory: Directory,
}

impl CsvAdapter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TradeMapError> {
        let path = path.as_ref();
        let adapter = Self::from_reader(open_export(path)?)?;
        tracing::info!(
            path = %path.display(),
            trades = adapter.transactions.len(),
            companies = adapter.directory.companies().len(),
            "loaded trade export"
        );
        Ok(adapter)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TradeMapError> {
        Ok(Self::from_transactions(read_transactions(reader)?))
    }

    pub fn from_transactions(mut transactions: Vec<TradeTransaction>) -> Self {
        let directory = index_transactions(&mut transactions);
        Self {
            transactions,
            directory,
        }
    }

    pub fn transactions(&self) -> &[TradeTransaction] {
        &self.transactions
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }
}

/// Open an export file, naming the path in the error.
pub fn open_export<P: AsRef<Path>>(path: P) -> Result<File, TradeMapError> {
    let path = path.as_ref();
    File::open(path).map_err(|e| {
        TradeMapError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open {}: {}", path.display(), e),
        ))
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader)
}

fn import_error(e: csv::Error) -> TradeMapError {
    TradeMapError::Import {
        line: e.position().map(|p| p.line()).unwrap_or(0),
        reason: e.to_string(),
    }
}

/// Read and coerce every row. Blank rows are skipped.
pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<TradeTransaction>, TradeMapError> {
    let mut rdr = csv_reader(reader);
    let mut transactions = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.deserialize::<RawTradeRow>() {
        let row = result.map_err(import_error)?;
        if row.is_blank() {
            skipped += 1;
            continue;
        }
        transactions.push(row.into_transaction());
    }

    if skipped > 0 {
        tracing::warn!(skipped, "skipped blank rows");
    }
    Ok(transactions)
}

/// Shape of an export, before any coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub rows: usize,
    /// Column name with its number of distinct raw values.
    pub columns: Vec<(String, usize)>,
    /// First rows, raw, for eyeballing.
    pub sample: Vec<Vec<String>>,
}

pub const SAMPLE_ROWS: usize = 3;

pub fn inspect<R: Read>(reader: R) -> Result<DatasetSummary, TradeMapError> {
    let mut rdr = csv_reader(reader);
    let headers: Vec<String> = rdr
        .headers()
        .map_err(import_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut distinct: Vec<HashSet<String>> = vec![HashSet::new(); headers.len()];
    let mut sample = Vec::new();
    let mut rows = 0usize;

    for result in rdr.records() {
        let record = result.map_err(import_error)?;
        rows += 1;
        for (i, seen) in distinct.iter_mut().enumerate() {
            seen.insert(record.get(i).unwrap_or("").to_string());
        }
        if sample.len() < SAMPLE_ROWS {
            sample.push(record.iter().map(str::to_string).collect());
        }
    }

    Ok(DatasetSummary {
        rows,
        columns: headers
            .into_iter()
            .zip(distinct.iter().map(HashSet::len))
            .collect(),
        sample,
    })
}

impl TradeStore for CsvAdapter {
    fn all_transactions(&self) -> Result<Vec<TradeTransaction>, TradeMapError> {
        Ok(self.transactions.clone())
    }

    fn country_transactions(&self, country: &str) -> Result<Vec<TradeTransaction>, TradeMapError> {
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
        Ok(self
            .transactions
            .iter()
            .filter(|t| t.seller_id == Some(company) || t.buyer_id == Some(company))
            .cloned()
            .collect())
    }

    fn find_company(&self, name: &str) -> Result<Option<CompanyRecord>, TradeMapError> {
        Ok(self.directory.company(name).map(|c| CompanyRecord {
            id: c.id,
            name: c.name.clone(),
            country_name: c.country.clone(),
            address: None,
            website: None,
        }))
    }

    fn list_countries(&self) -> Result<Vec<String>, TradeMapError> {
        let mut countries = self.directory.countries().to_vec();
        countries.sort();
        Ok(countries)
    }
}
