//! Trend / volatility / sentiment over a rolling price window.
//!
//! The statistics are pure functions over an ascending price series;
//! [`AnalysisService`] loads the window from the store and records every run
//! as a new `metal_analyses` row.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entities::{metal_analyses, metal_prices, metals, prelude::*};
use crate::error::MetalsError;

/// Analysis window length
pub const ANALYSIS_WINDOW_DAYS: i64 = 30;

/// Percent change beyond which a trend is up/down
const TREND_THRESHOLD_PCT: f64 = 1.0;
/// Stdev of period returns: above HIGH is high, above MEDIUM is medium
const VOLATILITY_HIGH: f64 = 0.02;
const VOLATILITY_MEDIUM: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Unchanged => "unchanged",
        }
    }
}

impl Volatility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Volatility::Low => "low",
            Volatility::Medium => "medium",
            Volatility::High => "high",
        }
    }
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceStats {
    pub trend: Trend,
    pub volatility: Volatility,
    pub sentiment: Sentiment,
    pub change_pct: f64,
    pub volatility_value: f64,
}

/// Result of one analysis run, as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub metal: String,
    pub trend: Trend,
    pub volatility: Volatility,
    pub sentiment: Sentiment,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

/// Percent change from `first` to `last`; a zero base counts as no change
pub fn change_pct(first: f64, last: f64) -> f64 {
    if first == 0.0 {
        return 0.0;
    }
    (last - first) / first * 100.0
}

pub fn classify_trend(change_pct: f64) -> Trend {
    if change_pct > TREND_THRESHOLD_PCT {
        Trend::Up
    } else if change_pct < -TREND_THRESHOLD_PCT {
        Trend::Down
    } else {
        Trend::Unchanged
    }
}

/// Fractional period-over-period returns, dropping steps from a zero price
pub fn period_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .filter(|r| r.is_finite())
        .collect()
}

/// Sample standard deviation (n - 1); 0 for fewer than two values
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

pub fn classify_volatility(value: f64) -> Volatility {
    if value > VOLATILITY_HIGH {
        Volatility::High
    } else if value > VOLATILITY_MEDIUM {
        Volatility::Medium
    } else {
        Volatility::Low
    }
}

/// High volatility always reads as neutral
pub fn derive_sentiment(trend: Trend, volatility: Volatility) -> Sentiment {
    match (trend, volatility) {
        (_, Volatility::High) => Sentiment::Neutral,
        (Trend::Up, _) => Sentiment::Positive,
        (Trend::Down, _) => Sentiment::Negative,
        (Trend::Unchanged, _) => Sentiment::Neutral,
    }
}

/// Statistics for prices ordered by timestamp ascending; `None` when empty.
///
/// A single observation has no returns, so its volatility is 0 (low).
pub fn compute_stats(prices: &[f64]) -> Option<PriceStats> {
    let (first, last) = (*prices.first()?, *prices.last()?);

    let change_pct = change_pct(first, last);
    let trend = classify_trend(change_pct);
    let volatility_value = sample_std_dev(&period_returns(prices));
    let volatility = classify_volatility(volatility_value);

    Some(PriceStats {
        trend,
        volatility,
        sentiment: derive_sentiment(trend, volatility),
        change_pct,
        volatility_value,
    })
}

pub struct AnalysisService {
    db: DatabaseConnection,
}

impl AnalysisService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Analyze the last 30 days for `symbol`. `None` if the metal is unknown
    /// or has no prices in the window.
    pub async fn analyze(&self, symbol: &str) -> Result<Option<AnalysisSnapshot>, MetalsError> {
        self.analyze_at(symbol, Utc::now()).await
    }

    pub async fn analyze_at(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AnalysisSnapshot>, MetalsError> {
        let symbol = symbol.trim().to_uppercase();

        let Some(metal) = Metals::find()
            .filter(metals::Column::Symbol.eq(&symbol))
            .one(&self.db)
            .await?
        else {
            debug!(symbol = %symbol, "Analysis requested for unknown metal");
            return Ok(None);
        };

        let period_end = now;
        let period_start = now - Duration::days(ANALYSIS_WINDOW_DAYS);

        let prices: Vec<f64> = MetalPrices::find()
            .filter(metal_prices::Column::MetalId.eq(metal.id))
            .filter(metal_prices::Column::Timestamp.gte(period_start))
            .filter(metal_prices::Column::Timestamp.lte(period_end))
            .order_by(metal_prices::Column::Timestamp, Order::Asc)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|row| row.price)
            .collect();

        let Some(stats) = compute_stats(&prices) else {
            debug!(symbol = %symbol, "No prices in analysis window");
            return Ok(None);
        };

        metal_analyses::ActiveModel {
            metal_id: Set(metal.id),
            trend: Set(stats.trend.as_str().to_string()),
            volatility: Set(stats.volatility.as_str().to_string()),
            sentiment: Set(stats.sentiment.as_str().to_string()),
            period_start: Set(period_start),
            period_end: Set(period_end),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(
            symbol = %symbol,
            observations = prices.len(),
            change_pct = stats.change_pct,
            volatility = stats.volatility_value,
            "Recorded {} / {} / {} analysis",
            stats.trend.as_str(),
            stats.volatility.as_str(),
            stats.sentiment.as_str()
        );

        Ok(Some(AnalysisSnapshot {
            metal: symbol,
            trend: stats.trend,
            volatility: stats.volatility,
            sentiment: stats.sentiment,
            period_start,
            period_end,
        }))
    }
}
