//! Trade transaction representation.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque company identifier. Database primary key, or an id handed out by
/// [`crate::domain::directory::Directory`] for in-memory datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub i64);

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One shipment. Built once at the ingestion boundary and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeTransaction {
    pub origin_country: Option<String>,
    pub origin_company: Option<String>,
    pub seller_id: Option<CompanyId>,
    pub destination_country: Option<String>,
    pub destination_company: Option<String>,
    pub buyer_id: Option<CompanyId>,
    pub product_description: Option<String>,
    pub product_code: Option<String>,
    pub quantity_kg: f64,
    pub unit_price: f64,
    /// quantity_kg * unit_price, rounded to cents
    pub value: f64,
    pub date: Option<NaiveDate>,
    pub exit_port: Option<String>,
    pub entry_port: Option<String>,
}

impl TradeTransaction {
    /// A transaction with only its amounts set; value is derived and rounded.
    pub fn priced(quantity_kg: f64, unit_price: f64) -> Self {
        let quantity_kg = sanitize_amount(quantity_kg);
        let unit_price = sanitize_amount(unit_price);
        Self {
            origin_country: None,
            origin_company: None,
            seller_id: None,
            destination_country: None,
            destination_company: None,
            buyer_id: None,
            product_description: None,
            product_code: None,
            quantity_kg,
            unit_price,
            value: trade_value(quantity_kg, unit_price),
            date: None,
            exit_port: None,
            entry_port: None,
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.date.map(|d| d.year())
    }

    pub fn is_outbound_for(&self, country: &str) -> bool {
        self.origin_country.as_deref() == Some(country)
    }

    pub fn is_inbound_for(&self, country: &str) -> bool {
        self.destination_country.as_deref() == Some(country)
    }
}

/// Amounts are non-negative and finite; anything else counts as zero.
pub fn sanitize_amount(raw: f64) -> f64 {
    if raw.is_finite() && raw > 0.0 { raw } else { 0.0 }
}

/// Per-transaction value rounded to 2 decimal places.
pub fn trade_value(quantity_kg: f64, unit_price: f64) -> f64 {
    round_cents(quantity_kg * unit_price)
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Average unit price, 0 when there is no volume.
pub fn average_price(value: f64, volume: f64) -> f64 {
    if volume > 0.0 { value / volume } else { 0.0 }
}
