//! Per-country trade volumes for map colouring.

use serde::Serialize;
use std::collections::HashMap;

use super::transaction::TradeTransaction;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapCountry {
    pub id: String,
    pub name: String,
    pub export_volume: f64,
    pub import_volume: f64,
    pub total_trade: f64,
    pub export_value: f64,
    pub import_value: f64,
}

impl MapCountry {
    fn new(name: &str) -> Self {
        Self {
            id: name.to_string(),
            name: name.to_string(),
            export_volume: 0.0,
            import_volume: 0.0,
            total_trade: 0.0,
            export_value: 0.0,
            import_value: 0.0,
        }
    }
}

/// Every country named as origin or destination, in first-seen order.
pub fn map_countries(transactions: &[TradeTransaction]) -> Vec<MapCountry> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<MapCountry> = Vec::new();

    for t in transactions {
        if let Some(origin) = t.origin_country.as_deref() {
            let i = slot(&mut index, &mut out, origin);
            out[i].export_volume += t.quantity_kg;
            out[i].export_value += t.value;
        }
        if let Some(dest) = t.destination_country.as_deref() {
            let i = slot(&mut index, &mut out, dest);
            out[i].import_volume += t.quantity_kg;
            out[i].import_value += t.value;
        }
    }

    for c in &mut out {
        c.total_trade = c.export_volume + c.import_volume;
    }
    out
}

fn slot<'a>(index: &mut HashMap<&'a str, usize>, out: &mut Vec<MapCountry>, name: &'a str) -> usize {
    if let Some(&i) = index.get(name) {
        return i;
    }
    out.push(MapCountry::new(name));
    index.insert(name, out.len() - 1);
    out.len() - 1
}

/// Largest `total_trade` across countries, 0 for an empty map.
pub fn max_total_trade(countries: &[MapCountry]) -> f64 {
    countries.iter().map(|c| c.total_trade).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(origin: Option<&str>, dest: Option<&str>, qty: f64, price: f64) -> TradeTransaction {
        let mut t = TradeTransaction::priced(qty, price);
        t.origin_country = origin.map(str::to_string);
        t.destination_country = dest.map(str::to_string);
        t
    }

    #[test]
    fn sums_both_directions() {
        let trades = vec![
            trade(Some("Turkey"), Some("Germany"), 100.0, 2.0),
            trade(Some("Germany"), Some("Turkey"), 10.0, 1.0),
            trade(Some("Brazil"), None, 5.0, 1.0),
        ];
        let map = map_countries(&trades);
        let names: Vec<_> = map.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Turkey", "Germany", "Brazil"]);

        let turkey = &map[0];
        assert_eq!(turkey.export_volume, 100.0);
        assert_eq!(turkey.import_volume, 10.0);
        assert_eq!(turkey.total_trade, 110.0);
        assert_eq!(turkey.export_value, 200.0);
        assert_eq!(turkey.import_value, 10.0);

        assert_eq!(map[2].import_volume, 0.0);
        assert_eq!(max_total_trade(&map), 110.0);
    }

    #[test]
    fn empty_input() {
        assert!(map_countries(&[]).is_empty());
        assert_eq!(max_total_trade(&[]), 0.0);
    }
}
