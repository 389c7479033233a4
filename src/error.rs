//! Error types shared across the ingestion and read paths.

use sea_orm::DbErr;
use thiserror::Error;

/// Failure of the FX rate provider.
///
/// Callers on the read path never surface this: a failed conversion degrades
/// to the unconverted price.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("exchange rate API key is not configured or was rejected")]
    ApiKeyMissing,

    #[error("currency pair {base}/{target} is not supported by the rate provider")]
    UnsupportedCurrency { base: String, target: String },

    #[error("network error fetching rate: {0}")]
    NetworkError(String),

    #[error("rate provider error: {0}")]
    ProviderError(String),
}

/// Why a single listing row was dropped. Absorbed by the parser and logged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowSkipped {
    #[error("row has {found} cells, expected at least {expected}")]
    TooFewColumns { found: usize, expected: usize },

    #[error("unrecognized metal name '{0}'")]
    UnknownMetal(String),

    #[error("unparseable price '{0}'")]
    InvalidPrice(String),

    #[error("unparseable date '{0}'")]
    InvalidDate(String),
}

#[derive(Debug, Error)]
pub enum MetalsError {
    /// Network/DNS failure or non-success status reaching an external source
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Structural shape of the source document was not recognized
    #[error("parse failure: {0}")]
    ParseFailure(String),

    #[error("rate unavailable: {0}")]
    RateUnavailable(#[from] RateError),

    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("store failure: {0}")]
    StoreFailure(#[from] DbErr),

    #[error("audit log error: {0}")]
    Audit(String),
}

impl From<reqwest::Error> for MetalsError {
    fn from(e: reqwest::Error) -> Self {
        MetalsError::SourceUnavailable(e.to_string())
    }
}

pub type Result<T, E = MetalsError> = std::result::Result<T, E>;
