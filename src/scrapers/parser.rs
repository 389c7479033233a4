use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Whitespace (incl. NBSP / narrow NBSP) and apostrophes used as digit grouping
    static ref PRICE_NOISE: Regex = Regex::new(r"[\s\u{00A0}\u{202F}']").unwrap();

    static ref LISTING_DATE: Regex = Regex::new(r"(\d{1,2}\.\d{1,2}\.\d{4})").unwrap();
}

/// Listing names (Russian and English) → internal symbols
const METAL_NAMES: &[(&str, &str)] = &[
    ("золото", "GOLD"),
    ("серебро", "SILVER"),
    ("платина", "PLATINUM"),
    ("палладий", "PALLADIUM"),
    ("gold", "GOLD"),
    ("silver", "SILVER"),
    ("platinum", "PLATINUM"),
    ("palladium", "PALLADIUM"),
];

/// Column order of the date-per-row layout, after the date column
pub const DATE_ROW_METAL_ORDER: [&str; 4] = ["GOLD", "SILVER", "PLATINUM", "PALLADIUM"];

/// Map a localized metal name to its internal symbol
pub fn lookup_symbol(name: &str) -> Option<&'static str> {
    let name = name.trim().to_lowercase();
    METAL_NAMES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, symbol)| *symbol)
}

/// Parse a localized price such as "7 123,45" or "1,234.50".
///
/// The right-most of `,`/`.` is taken as the decimal separator and the
/// other one as thousands grouping. Non-positive values are rejected.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned = PRICE_NOISE.replace_all(raw, "");
    if cleaned.is_empty() {
        return None;
    }

    let decimal = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma < dot => '.',
        (Some(_), _) => ',',
        _ => '.',
    };
    let grouping = if decimal == ',' { '.' } else { ',' };

    let normalized: String = cleaned
        .chars()
        .filter(|c| *c != grouping)
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    match normalized.parse::<f64>() {
        Ok(price) if price.is_finite() && price > 0.0 => Some(price),
        _ => None,
    }
}

/// Parse a `dd.mm.yyyy` listing date into midnight UTC
pub fn parse_listing_date(raw: &str) -> Option<DateTime<Utc>> {
    let captured = LISTING_DATE.captures(raw.trim())?;
    let date = NaiveDate::parse_from_str(&captured[1], "%d.%m.%Y").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_lookup_symbol() {
        assert_eq!(lookup_symbol("Золото"), Some("GOLD"));
        assert_eq!(lookup_symbol(" ПАЛЛАДИЙ "), Some("PALLADIUM"));
        assert_eq!(lookup_symbol("silver"), Some("SILVER"));
        assert_eq!(lookup_symbol("Родий"), None);
    }

    #[test]
    fn test_parse_price_localized() {
        assert_eq!(parse_price("7\u{a0}123,45"), Some(7123.45));
        assert_eq!(parse_price("7 123,45"), Some(7123.45));
        assert_eq!(parse_price("85,12"), Some(85.12));
        assert_eq!(parse_price("1,234.50"), Some(1234.5));
        assert_eq!(parse_price("1.234,50"), Some(1234.5));
        assert_eq!(parse_price("3000"), Some(3000.0));
    }

    #[test]
    fn test_parse_price_rejects_garbage() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("\u{a0}"), None);
        assert_eq!(parse_price("n/a"), None);
        assert_eq!(parse_price("0,00"), None);
        assert_eq!(parse_price("-5,0"), None);
    }

    #[test]
    fn test_parse_listing_date() {
        assert_eq!(
            parse_listing_date("05.03.2024"),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_listing_date("31.02.2024"), None);
        assert_eq!(parse_listing_date("2024-03-05"), None);
        assert_eq!(parse_listing_date(""), None);
    }
}
