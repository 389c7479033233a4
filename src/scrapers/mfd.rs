//! Central-bank precious metals listing (mfd.ru) scraper.
//!
//! A missing table fails the whole fetch; anything wrong inside a single row
//! only drops that row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use super::parser::{DATE_ROW_METAL_ORDER, lookup_symbol, parse_listing_date, parse_price};
use super::{ListingLayout, PriceObservation, PriceSource, ScraperConfig, TableLocator, TimestampPolicy};
use crate::error::{MetalsError, RowSkipped};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Cells required by the metal-per-row layout (date lives in column 4)
const METAL_ROW_MIN_CELLS: usize = 5;
/// Date column plus one column per metal
const DATE_ROW_MIN_CELLS: usize = 1 + DATE_ROW_METAL_ORDER.len();

lazy_static! {
    static ref TABLE_SELECTOR: Selector = Selector::parse("table").unwrap();
    static ref ROW_SELECTOR: Selector = Selector::parse("tr").unwrap();
    static ref CELL_SELECTOR: Selector = Selector::parse("td").unwrap();
}

/// Result of parsing one listing page
#[derive(Debug, Default)]
pub struct ParsedListing {
    pub observations: Vec<PriceObservation>,
    /// (1-based data row number, reason)
    pub skipped: Vec<(usize, RowSkipped)>,
}

impl ParsedListing {
    /// One-line "row N: reason" digest of the skipped rows, `None` when
    /// nothing was skipped.
    pub fn skipped_summary(&self) -> Option<String> {
        if self.skipped.is_empty() {
            return None;
        }
        let summary = self
            .skipped
            .iter()
            .map(|(row, reason)| format!("row {}: {}", row, reason))
            .collect::<Vec<_>>()
            .join("; ");
        Some(summary)
    }
}

pub struct MfdScraper {
    client: Client,
    config: ScraperConfig,
}

impl MfdScraper {
    pub fn new(config: ScraperConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to build scraper client, using defaults");
                Client::new()
            });

        Self { client, config }
    }

    async fn fetch_page(&self) -> Result<String, MetalsError> {
        let response = self
            .client
            .get(&self.config.url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MetalsError::SourceUnavailable(format!(
                "{} returned HTTP {}",
                self.config.url,
                response.status()
            )));
        }

        // The page is served as UTF-8 regardless of what the headers claim
        let bytes = response.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[async_trait]
impl PriceSource for MfdScraper {
    async fn fetch(&self) -> Result<Vec<PriceObservation>, MetalsError> {
        tracing::info!("Fetching metal prices from {}", self.config.url);

        let html = self.fetch_page().await?;
        let parsed = parse_listing(&html, &self.config, Utc::now())?;

        for (row, reason) in &parsed.skipped {
            tracing::debug!(row, reason = %reason, "Skipped listing row");
        }
        if let Some(summary) = parsed.skipped_summary() {
            tracing::warn!("Skipped {} listing rows: {}", parsed.skipped.len(), summary);
        }
        tracing::info!(
            observations = parsed.observations.len(),
            skipped = parsed.skipped.len(),
            "Parsed metal price listing"
        );

        Ok(parsed.observations)
    }
}

/// Parse a listing document. `now` stamps rows whose date cannot be read
/// when the policy is [`TimestampPolicy::FallbackToNow`].
pub fn parse_listing(
    html: &str,
    config: &ScraperConfig,
    now: DateTime<Utc>,
) -> Result<ParsedListing, MetalsError> {
    let document = Html::parse_document(html);
    let table = locate_table(&document, &config.table)?;

    let mut parsed = ParsedListing::default();

    // First row is the header
    for (index, row) in table.select(&ROW_SELECTOR).enumerate().skip(1) {
        let cells: Vec<String> = row.select(&CELL_SELECTOR).map(cell_text).collect();

        match config.layout {
            ListingLayout::MetalPerRow => {
                match parse_metal_row(&cells, config.timestamp_policy, now) {
                    Ok(observation) => parsed.observations.push(observation),
                    Err(reason) => parsed.skipped.push((index, reason)),
                }
            }
            ListingLayout::DatePerRow => {
                let (observations, skipped) = parse_date_row(&cells, config.timestamp_policy, now);
                parsed.observations.extend(observations);
                parsed
                    .skipped
                    .extend(skipped.into_iter().map(|reason| (index, reason)));
            }
        }
    }

    Ok(parsed)
}

fn locate_table<'a>(document: &'a Html, locator: &TableLocator) -> Result<ElementRef<'a>, MetalsError> {
    match locator {
        TableLocator::ByClass(class) => {
            let selector = Selector::parse(&format!("table.{}", class)).map_err(|e| {
                MetalsError::ParseFailure(format!("invalid table class '{}': {:?}", class, e))
            })?;
            document.select(&selector).next().ok_or_else(|| {
                MetalsError::ParseFailure(format!("table with class '{}' not found", class))
            })
        }
        TableLocator::ByIndex(position) => {
            document.select(&TABLE_SELECTOR).nth(*position).ok_or_else(|| {
                MetalsError::ParseFailure(format!("table #{} not found", position))
            })
        }
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve_timestamp(
    raw: &str,
    policy: TimestampPolicy,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, RowSkipped> {
    match (parse_listing_date(raw), policy) {
        (Some(timestamp), _) => Ok(timestamp),
        (None, TimestampPolicy::FallbackToNow) => Ok(now),
        (None, TimestampPolicy::SkipRow) => Err(RowSkipped::InvalidDate(raw.to_string())),
    }
}

/// `name | price | unit | … | date`
fn parse_metal_row(
    cells: &[String],
    policy: TimestampPolicy,
    now: DateTime<Utc>,
) -> Result<PriceObservation, RowSkipped> {
    if cells.len() < METAL_ROW_MIN_CELLS {
        return Err(RowSkipped::TooFewColumns {
            found: cells.len(),
            expected: METAL_ROW_MIN_CELLS,
        });
    }

    let name = &cells[0];
    let symbol = lookup_symbol(name).ok_or_else(|| RowSkipped::UnknownMetal(name.clone()))?;
    let price = parse_price(&cells[1]).ok_or_else(|| RowSkipped::InvalidPrice(cells[1].clone()))?;
    let unit = Some(cells[2].clone()).filter(|u| !u.is_empty());
    let timestamp = resolve_timestamp(&cells[4], policy, now)?;

    Ok(PriceObservation {
        symbol: symbol.to_string(),
        name: name.clone(),
        price,
        unit,
        timestamp,
    })
}

/// `date | gold | silver | platinum | palladium`; a bad price cell drops
/// only that metal, a bad date drops the whole row under `SkipRow`.
fn parse_date_row(
    cells: &[String],
    policy: TimestampPolicy,
    now: DateTime<Utc>,
) -> (Vec<PriceObservation>, Vec<RowSkipped>) {
    if cells.len() < DATE_ROW_MIN_CELLS {
        let reason = RowSkipped::TooFewColumns {
            found: cells.len(),
            expected: DATE_ROW_MIN_CELLS,
        };
        return (Vec::new(), vec![reason]);
    }

    let timestamp = match resolve_timestamp(&cells[0], policy, now) {
        Ok(timestamp) => timestamp,
        Err(reason) => return (Vec::new(), vec![reason]),
    };

    let mut observations = Vec::new();
    let mut skipped = Vec::new();

    for (symbol, raw_price) in DATE_ROW_METAL_ORDER.iter().zip(&cells[1..]) {
        match parse_price(raw_price) {
            Some(price) => observations.push(PriceObservation {
                symbol: symbol.to_string(),
                name: symbol.to_string(),
                price,
                unit: None,
                timestamp,
            }),
            None => skipped.push(RowSkipped::InvalidPrice(raw_price.clone())),
        }
    }

    (observations, skipped)
}
