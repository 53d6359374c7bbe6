//! Grouping, ranking and series building shared by the country and company
//! statistics.
//!
//! Groups are kept in the order their key was first seen. Rankings use a
//! stable sort on summed value, so equal values keep that first-seen order.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use super::transaction::{TradeTransaction, average_price};

/// Running volume/value sums for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bucket {
    pub volume: f64,
    pub value: f64,
    pub count: usize,
}

impl Bucket {
    pub fn add(&mut self, t: &TradeTransaction) {
        self.volume += t.quantity_kg;
        self.value += t.value;
        self.count += 1;
    }

    pub fn avg_price(&self) -> f64 {
        average_price(self.value, self.volume)
    }
}

/// A counterpart company with its summed trade.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyTotal {
    pub name: String,
    pub volume: f64,
    pub value: f64,
    #[serde(rename = "companyCountry", skip_serializing_if = "Option::is_none")]
    pub home_country: Option<String>,
}

/// A counterpart country with its summed trade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryTotal {
    pub country: String,
    pub volume: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearPoint {
    pub year: i32,
    pub volume: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortCount {
    pub port: String,
    pub count: usize,
}

/// Group transactions by `key`, skipping those without one. Output is in
/// first-seen key order.
pub fn group_by<'a, K, I, F>(transactions: I, key: F) -> Vec<(K, Bucket)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = &'a TradeTransaction>,
    F: Fn(&TradeTransaction) -> Option<K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Bucket)> = Vec::new();

    for t in transactions {
        let Some(k) = key(t) else {
            continue;
        };
        let slot = match index.get(&k) {
            Some(&i) => i,
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, Bucket::default()));
                groups.len() - 1
            }
        };
        groups[slot].1.add(t);
    }

    groups
}

/// Stable descending sort by value, truncated to `top_n`.
pub fn rank<K>(mut groups: Vec<(K, Bucket)>, top_n: usize) -> Vec<(K, Bucket)> {
    groups.sort_by(|a, b| by_value_desc(&a.1, &b.1));
    groups.truncate(top_n);
    groups
}

fn by_value_desc(a: &Bucket, b: &Bucket) -> Ordering {
    b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal)
}

/// Top counterpart companies by value. `home` maps a company name to the
/// country it belongs to, when known.
pub fn top_companies<'a, I, F>(
    transactions: I,
    name: F,
    top_n: usize,
    home: &HashMap<&str, &str>,
) -> Vec<CompanyTotal>
where
    I: IntoIterator<Item = &'a TradeTransaction>,
    F: Fn(&TradeTransaction) -> Option<&str>,
{
    rank(group_by(transactions, |t| name(t).map(str::to_string)), top_n)
        .into_iter()
        .map(|(name, b)| CompanyTotal {
            home_country: home.get(name.as_str()).map(|c| c.to_string()),
            name,
            volume: b.volume,
            value: b.value,
        })
        .collect()
}

/// Top counterpart countries by value.
pub fn top_countries<'a, I, F>(transactions: I, country: F, top_n: usize) -> Vec<CountryTotal>
where
    I: IntoIterator<Item = &'a TradeTransaction>,
    F: Fn(&TradeTransaction) -> Option<&str>,
{
    rank(group_by(transactions, |t| country(t).map(str::to_string)), top_n)
        .into_iter()
        .map(|(country, b)| CountryTotal {
            country,
            volume: b.volume,
            value: b.value,
        })
        .collect()
}

/// One point per distinct year, ascending. Undated transactions are skipped.
pub fn yearly_series<'a, I>(transactions: I) -> Vec<YearPoint>
where
    I: IntoIterator<Item = &'a TradeTransaction>,
{
    let mut years: BTreeMap<i32, Bucket> = BTreeMap::new();
    for t in transactions {
        if let Some(year) = t.year() {
            years.entry(year).or_default().add(t);
        }
    }
    years
        .into_iter()
        .map(|(year, b)| YearPoint {
            year,
            volume: b.volume,
            value: b.value,
        })
        .collect()
}

/// Occurrence count per port, most frequent first, ties in first-seen order.
pub fn port_counts<'a, I, F>(transactions: I, port: F) -> Vec<PortCount>
where
    I: IntoIterator<Item = &'a TradeTransaction>,
    F: Fn(&TradeTransaction) -> Option<&str>,
{
    let mut counts: Vec<PortCount> = group_by(transactions, |t| port(t).map(str::to_string))
        .into_iter()
        .map(|(port, b)| PortCount {
            port,
            count: b.count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Distinct names in first-seen order.
pub fn distinct_names<'a, I, F>(transactions: I, name: F) -> Vec<String>
where
    I: IntoIterator<Item = &'a TradeTransaction>,
    F: Fn(&TradeTransaction) -> Option<&str>,
{
    group_by(transactions, |t| name(t).map(str::to_string))
        .into_iter()
        .map(|(n, _)| n)
        .collect()
}

/// Volume/value sums over every transaction.
pub fn totals<'a, I>(transactions: I) -> Bucket
where
    I: IntoIterator<Item = &'a TradeTransaction>,
{
    let mut total = Bucket::default();
    for t in transactions {
        total.add(t);
    }
    total
}
