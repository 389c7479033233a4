//! FX rate client for exchangerate-api.com style providers.
//!
//! `GET {base_url}/{api_key}/pair/{BASE}/{TARGET}` returns
//! `{"result": "success", "conversion_rate": 0.92}` or
//! `{"result": "error", "error-type": "unsupported-code"}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::RateError;
use crate::services::ttl_cache::TtlCache;

/// Hard limit on a single provider call
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Source of conversion rates: 1 `base` = rate `target`.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn rate(&self, base: &str, target: &str) -> Result<f64, RateError>;
}

#[derive(Debug, Deserialize)]
struct PairResponse {
    result: String,
    conversion_rate: Option<f64>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
}

#[derive(Clone)]
pub struct ExchangeRateService {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    cache: TtlCache<String, f64>,
}

impl ExchangeRateService {
    /// `cache` is owned by the caller; its default TTL is used for every rate.
    pub fn new(api_key: Option<String>, base_url: String, cache: TtlCache<String, f64>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to build rate client, using defaults");
                Client::new()
            });

        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    async fn fetch_rate(&self, base: &str, target: &str) -> Result<f64, RateError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            tracing::error!("EXCHANGE_RATE_API_KEY is not set");
            RateError::ApiKeyMissing
        })?;

        let url = format!("{}/{}/pair/{}/{}", self.base_url, api_key, base, target);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!(base, target, error = %e, "Rate request failed");
                RateError::NetworkError(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RateError::NetworkError(e.to_string()))?;

        // Error payloads come with 4xx statuses too, so decode before checking status
        let data: PairResponse = match serde_json::from_str(&body) {
            Ok(data) => data,
            Err(_) if !status.is_success() => {
                return Err(RateError::ProviderError(format!("HTTP {}", status)));
            }
            Err(e) => {
                return Err(RateError::ProviderError(format!("invalid response body: {}", e)));
            }
        };

        if data.result == "success" {
            let rate = data.conversion_rate.ok_or_else(|| {
                RateError::ProviderError("response is missing 'conversion_rate'".to_string())
            })?;
            tracing::info!("Fetched rate: 1 {} = {} {}", base, rate, target);
            return Ok(rate);
        }

        let error_type = data.error_type.unwrap_or_else(|| "unknown_error".to_string());
        tracing::error!(base, target, error_type = %error_type, "Rate provider returned an error");

        Err(match error_type.as_str() {
            "invalid-key" => RateError::ApiKeyMissing,
            "unsupported-code" => RateError::UnsupportedCurrency {
                base: base.to_string(),
                target: target.to_string(),
            },
            other => RateError::ProviderError(other.to_string()),
        })
    }
}

#[async_trait]
impl RateSource for ExchangeRateService {
    async fn rate(&self, base: &str, target: &str) -> Result<f64, RateError> {
        let base = base.trim().to_uppercase();
        let target = target.trim().to_uppercase();

        if base == target {
            return Ok(1.0);
        }

        let key = format!("{}:{}", base, target);
        let ttl = self.cache.default_ttl();
        self.cache
            .get_or_compute(key, ttl, || self.fetch_rate(&base, &target))
            .await
    }
}
