//! Country name to ISO 3166-1 alpha-3 code.

const KNOWN_CODES: &[(&str, &str)] = &[
    ("Argentina", "ARG"),
    ("Australia", "AUS"),
    ("Brazil", "BRA"),
    ("Canada", "CAN"),
    ("China", "CHN"),
    ("France", "FRA"),
    ("Germany", "DEU"),
    ("India", "IND"),
    ("Italy", "ITA"),
    ("Japan", "JPN"),
    ("Mexico", "MEX"),
    ("Netherlands", "NLD"),
    ("Nigeria", "NGA"),
    ("Russia", "RUS"),
    ("South Korea", "KOR"),
    ("Spain", "ESP"),
    ("Sweden", "SWE"),
    ("Thailand", "THA"),
    ("Turkey", "TUR"),
    ("United Arab Emirates", "ARE"),
    ("United Kingdom", "GBR"),
    ("Uruguay", "URY"),
    ("USA", "USA"),
    ("Vietnam", "VNM"),
];

/// ISO-3 code for a known country, otherwise the first three characters
/// upper-cased.
pub fn country_code(name: &str) -> String {
    KNOWN_CODES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| name.chars().take(3).collect::<String>().to_uppercase())
}
