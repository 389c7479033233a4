use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest known price for one metal. `price` is `None` until the metal has
/// its first observation, so every configured metal is always listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentPrice {
    pub symbol: String,
    pub name: String,
    pub price: Option<f64>,
    pub unit: String,
    /// Currency `price` is expressed in, when the unit names one
    pub currency: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentPricesQuery {
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalPricesQuery {
    pub metal: Option<String>,
    pub date_from: Option<String>, // YYYY-MM-DD or ISO datetime
    pub date_to: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisQuery {
    pub metal: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub status: String,
    pub message: String,
    pub received: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}
