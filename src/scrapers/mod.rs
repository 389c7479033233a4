pub mod mfd;
pub mod parser;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::DEFAULT_PRICE_SOURCE_URL;
use crate::error::MetalsError;

/// One timestamped price for one metal, as read from the listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Internal symbol, e.g. "GOLD"
    pub symbol: String,
    /// Name as printed in the listing
    pub name: String,
    pub price: f64,
    pub unit: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Anything that can produce a fresh batch of observations.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<PriceObservation>, MetalsError>;
}

/// How the price table is found in the page.
#[derive(Debug, Clone, PartialEq)]
pub enum TableLocator {
    /// First `<table>` carrying this CSS class
    ByClass(String),
    /// Zero-based position among all `<table>` elements
    ByIndex(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListingLayout {
    /// `name | price | unit | … | date`, one metal per row
    MetalPerRow,
    /// `date | gold | silver | platinum | palladium`, one date per row
    DatePerRow,
}

/// What to do with a row whose date cell does not parse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimestampPolicy {
    /// Keep the row, stamped with the processing time (`timestamp_fallback_to_now`)
    FallbackToNow,
    SkipRow,
}

/// `#2` selects the third table, anything else is a class name.
impl FromStr for TableLocator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(position) = s.strip_prefix('#') {
            return position
                .parse::<usize>()
                .map(TableLocator::ByIndex)
                .map_err(|_| format!("invalid table index '{}'", s));
        }
        let class = s.trim_start_matches('.');
        if class.is_empty() || class.contains(char::is_whitespace) {
            return Err(format!("invalid table class '{}'", s));
        }
        Ok(TableLocator::ByClass(class.to_string()))
    }
}

impl FromStr for ListingLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metal_per_row" => Ok(ListingLayout::MetalPerRow),
            "date_per_row" => Ok(ListingLayout::DatePerRow),
            other => Err(format!("unknown listing layout '{}'", other)),
        }
    }
}

impl FromStr for TimestampPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fallback_to_now" | "timestamp_fallback_to_now" => Ok(TimestampPolicy::FallbackToNow),
            "skip_row" => Ok(TimestampPolicy::SkipRow),
            other => Err(format!("unknown timestamp policy '{}'", other)),
        }
    }
}

#[derive(Clone)]
pub struct ScraperConfig {
    pub url: String,
    pub table: TableLocator,
    pub layout: ListingLayout,
    pub timestamp_policy: TimestampPolicy,
    pub timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PRICE_SOURCE_URL.to_string(),
            table: TableLocator::ByClass("mfd-table".to_string()),
            layout: ListingLayout::MetalPerRow,
            timestamp_policy: TimestampPolicy::FallbackToNow,
            timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_locator() {
        assert_eq!("#2".parse::<TableLocator>(), Ok(TableLocator::ByIndex(2)));
        assert_eq!("mfd-table".parse::<TableLocator>(), Ok(TableLocator::ByClass("mfd-table".to_string())));
        assert_eq!(".prices".parse::<TableLocator>(), Ok(TableLocator::ByClass("prices".to_string())));
        assert!("#two".parse::<TableLocator>().is_err());
        assert!("two words".parse::<TableLocator>().is_err());
    }

    #[test]
    fn test_parse_layout_and_policy() {
        assert_eq!("DATE_PER_ROW".parse::<ListingLayout>(), Ok(ListingLayout::DatePerRow));
        assert_eq!("metal_per_row".parse::<ListingLayout>(), Ok(ListingLayout::MetalPerRow));
        assert!("rows".parse::<ListingLayout>().is_err());

        assert_eq!("skip_row".parse::<TimestampPolicy>(), Ok(TimestampPolicy::SkipRow));
        assert_eq!("timestamp_fallback_to_now".parse::<TimestampPolicy>(), Ok(TimestampPolicy::FallbackToNow));
        assert!("ignore".parse::<TimestampPolicy>().is_err());
    }
}
