//! Read side: current and historical prices, cached and optionally
//! converted to another currency.
//!
//! Currency conversion is best effort. When a rate cannot be obtained the
//! price is returned in its quoted currency and the failure is only logged.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::entities::{metal_prices, metals, prelude::*};
use crate::error::MetalsError;
use crate::models::metal::{CurrentPrice, PricePoint};
use crate::services::exchange_rate::RateSource;
use crate::services::ttl_cache::TtlCache;

/// Short-TTL caches for composed reads, owned by the composition root
#[derive(Clone)]
pub struct ReadCaches {
    pub current_prices: TtlCache<String, Vec<CurrentPrice>>,
    pub historical_prices: TtlCache<String, Vec<PricePoint>>,
}

impl ReadCaches {
    pub fn new(ttl: Duration) -> Self {
        Self {
            current_prices: TtlCache::new(ttl),
            historical_prices: TtlCache::new(ttl),
        }
    }
}

#[derive(Clone)]
pub struct MetalService {
    db: DatabaseConnection,
    rates: Arc<dyn RateSource>,
    caches: ReadCaches,
}

impl MetalService {
    pub fn new(db: DatabaseConnection, rates: Arc<dyn RateSource>, caches: ReadCaches) -> Self {
        Self { db, rates, caches }
    }

    /// Latest price of every known metal, in `target_currency` when given.
    ///
    /// Only the store read is cached. Conversion runs on every call so a
    /// degraded answer from an FX outage never outlives the outage.
    pub async fn current_prices(
        &self,
        target_currency: Option<&str>,
    ) -> Result<Vec<CurrentPrice>, MetalsError> {
        let target = target_currency
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty());

        let cache = &self.caches.current_prices;
        let mut prices = cache
            .get_or_compute("current".to_string(), cache.default_ttl(), || {
                self.load_current_prices()
            })
            .await?;

        if let Some(target) = target.as_deref() {
            for entry in prices.iter_mut() {
                if let Some(price) = entry.price {
                    self.convert(entry, price, target).await;
                }
            }
        }

        Ok(prices)
    }

    /// Prices for `symbol` with `from <= timestamp <= to`, oldest first.
    /// An unknown metal yields an empty list.
    pub async fn historical_prices(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, MetalsError> {
        let symbol = symbol.trim().to_uppercase();
        let key = format!("history:{}:{}:{}", symbol, from.to_rfc3339(), to.to_rfc3339());
        let cache = &self.caches.historical_prices;

        cache
            .get_or_compute(key, cache.default_ttl(), || {
                self.load_historical_prices(&symbol, from, to)
            })
            .await
    }

    async fn load_current_prices(&self) -> Result<Vec<CurrentPrice>, MetalsError> {
        let all_metals = Metals::find()
            .order_by(metals::Column::Id, Order::Asc)
            .all(&self.db)
            .await?;

        let mut prices = Vec::with_capacity(all_metals.len());

        for metal in all_metals {
            let latest = MetalPrices::find()
                .filter(metal_prices::Column::MetalId.eq(metal.id))
                .order_by(metal_prices::Column::Timestamp, Order::Desc)
                .one(&self.db)
                .await?;

            prices.push(CurrentPrice {
                symbol: metal.symbol.clone(),
                name: metal.name.clone(),
                price: latest.as_ref().map(|row| row.price),
                unit: metal.unit.clone(),
                currency: metal.base_currency(),
                timestamp: latest.as_ref().map(|row| row.timestamp),
            });
        }

        Ok(prices)
    }

    /// Rewrite `entry` into `target`; leaves it untouched on any failure
    async fn convert(&self, entry: &mut CurrentPrice, price: f64, target: &str) {
        let Some(base) = entry.currency.clone() else {
            debug!(symbol = %entry.symbol, unit = %entry.unit, "Unit has no currency, price left unconverted");
            return;
        };

        if base == target {
            return;
        }

        match self.rates.rate(&base, target).await {
            Ok(rate) => {
                entry.price = Some(price * rate);
                entry.unit = match entry.unit.split_once('/') {
                    Some((_, per)) => format!("{}/{}", target, per),
                    None => target.to_string(),
                };
                entry.currency = Some(target.to_string());
            }
            Err(e) => {
                let e = MetalsError::RateUnavailable(e);
                warn!(
                    symbol = %entry.symbol,
                    base = %base,
                    target,
                    error = %e,
                    "Currency conversion failed, returning unconverted price"
                );
            }
        }
    }

    async fn load_historical_prices(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, MetalsError> {
        let Some(metal) = Metals::find()
            .filter(metals::Column::Symbol.eq(symbol))
            .one(&self.db)
            .await?
        else {
            debug!(symbol, "Historical prices requested for unknown metal");
            return Ok(Vec::new());
        };

        let rows = MetalPrices::find()
            .filter(metal_prices::Column::MetalId.eq(metal.id))
            .filter(metal_prices::Column::Timestamp.gte(from))
            .filter(metal_prices::Column::Timestamp.lte(to))
            .order_by(metal_prices::Column::Timestamp, Order::Asc)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| PricePoint {
                price: row.price,
                timestamp: row.timestamp,
            })
            .collect())
    }
}
