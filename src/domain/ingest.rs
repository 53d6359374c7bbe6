//! Ingestion boundary: loosely typed spreadsheet rows to [`TradeTransaction`].
//!
//! Every coercion (text trimming, number parsing, date parsing, value rounding)
//! happens here, once, before a record reaches the aggregation code.

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use super::transaction::{TradeTransaction, sanitize_amount, trade_value};

/// Largest serial day number a spreadsheet date can carry (9999-12-31).
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

/// One row of the trade export as it appears in the file. Headers are accepted
/// in Turkish or as snake_case English aliases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTradeRow {
    #[serde(rename = "GÖNDERİCİ ÜLKE", alias = "origin_country")]
    pub origin_country: Option<String>,
    #[serde(rename = "GÖNDERİCİ FİRMA", alias = "seller_company")]
    pub seller_company: Option<String>,
    #[serde(rename = "ÜRÜN TARİFE KODU / HS CODE / GTİP", alias = "hs_code")]
    pub hs_code: Option<String>,
    #[serde(rename = "ÜRÜN AÇIKLAMA", alias = "product_description")]
    pub product_description: Option<String>,
    #[serde(rename = "ÜRÜN MİKTARI (KG)", alias = "quantity_kg")]
    pub quantity_kg: Option<String>,
    #[serde(rename = "TARİH", alias = "date")]
    pub date: Option<String>,
    #[serde(rename = "ÜRÜN FİYATI (USD)", alias = "unit_price")]
    pub unit_price: Option<String>,
    #[serde(rename = "ALICI FİRMA", alias = "buyer_company")]
    pub buyer_company: Option<String>,
    #[serde(rename = "ALICI ÜLKE", alias = "destination_country")]
    pub destination_country: Option<String>,
    #[serde(rename = "ÇIKIŞ LİMANI", alias = "exit_port")]
    pub exit_port: Option<String>,
    #[serde(rename = "VARIŞ LİMANI", alias = "entry_port")]
    pub entry_port: Option<String>,
}

impl RawTradeRow {
    /// True when every cell is missing or whitespace, as with trailing rows
    /// left behind by spreadsheet exports.
    pub fn is_blank(&self) -> bool {
        [
            &self.origin_country,
            &self.seller_company,
            &self.hs_code,
            &self.product_description,
            &self.quantity_kg,
            &self.date,
            &self.unit_price,
            &self.buyer_company,
            &self.destination_country,
            &self.exit_port,
            &self.entry_port,
        ]
        .iter()
        .all(|cell| cell.as_deref().is_none_or(|s| s.trim().is_empty()))
    }

    /// Coerce into a validated transaction. Never fails: bad numbers become 0,
    /// bad dates become `None`, blank text becomes `None`. Company ids are left
    /// unset; [`crate::domain::directory::Directory`] or a store assigns them.
    pub fn into_transaction(self) -> TradeTransaction {
        let quantity_kg = parse_amount(self.quantity_kg.as_deref());
        let unit_price = parse_amount(self.unit_price.as_deref());

        TradeTransaction {
            origin_country: clean_text(self.origin_country),
            origin_company: clean_text(self.seller_company),
            seller_id: None,
            destination_country: clean_text(self.destination_country),
            destination_company: clean_text(self.buyer_company),
            buyer_id: None,
            product_description: clean_text(self.product_description),
            product_code: clean_text(self.hs_code),
            quantity_kg,
            unit_price,
            value: trade_value(quantity_kg, unit_price),
            date: self.date.as_deref().and_then(parse_date),
            exit_port: clean_text(self.exit_port),
            entry_port: clean_text(self.entry_port),
        }
    }
}

/// Trimmed text, or `None` when blank.
pub fn clean_text(raw: Option<String>) -> Option<String> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == raw.len() {
        Some(raw)
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a quantity or price cell. Missing, non-numeric, negative and
/// non-finite values are 0. Grouped forms such as `1.234,5` and `1,234.5` are
/// accepted, see [`normalize_separators`].
pub fn parse_amount(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let parsed = trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| normalize_separators(trimmed).parse::<f64>().ok());

    parsed.map(sanitize_amount).unwrap_or(0.0)
}

/// Rewrite `,`/`.` separators into a plain decimal number. With both present
/// the last one is the decimal point. A single comma alone is a decimal point;
/// a repeated separator alone groups thousands.
fn normalize_separators(s: &str) -> String {
    let commas = s.matches(',').count();
    let dots = s.matches('.').count();
    match (s.rfind(','), s.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) if commas == 1 => s.replace(',', "."),
        (Some(_), None) => s.replace(',', ""),
        (None, Some(_)) if dots > 1 => s.replace('.', ""),
        _ => s.to_string(),
    }
}

/// Parse a date cell: `YYYY-MM-DD`, `DD.MM.YYYY`, an ISO date-time (the date
/// part is kept) or a spreadsheet serial day number.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%d.%m.%Y") {
        return Some(d);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    // Timezone-suffixed timestamps: keep the leading date.
    if s.len() > 10 && s.as_bytes().get(10) == Some(&b'T') {
        if let Some(d) = s.get(..10).and_then(|p| NaiveDate::parse_from_str(p, "%Y-%m-%d").ok()) {
            return Some(d);
        }
    }

    from_serial_day(s.parse::<f64>().ok()?)
}

/// Spreadsheet serial dates count days from 1899-12-30.
fn from_serial_day(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL_DAY).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}
