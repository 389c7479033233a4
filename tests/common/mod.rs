#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use metals_backend::error::{MetalsError, RateError};
use metals_backend::scrapers::{PriceObservation, PriceSource};
use metals_backend::services::exchange_rate::RateSource;
use metals_backend::services::seed::seed_metals;
use parking_lot::Mutex;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Set up a migrated, seeded in-memory database.
/// A single pooled connection keeps every query on the same memory database.
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    seed_metals(&db)
        .await
        .map_err(|e| DbErr::Custom(e.to_string()))?;

    Ok(db)
}

pub fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn observation(symbol: &str, price: f64, timestamp: DateTime<Utc>) -> PriceObservation {
    PriceObservation {
        symbol: symbol.to_string(),
        name: symbol.to_string(),
        price,
        unit: Some("RUB/g".to_string()),
        timestamp,
    }
}

/// Fixed-rate source that counts lookups
pub struct StaticRates {
    pub rate: f64,
    pub calls: AtomicUsize,
}

impl StaticRates {
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateSource for StaticRates {
    async fn rate(&self, _base: &str, _target: &str) -> Result<f64, RateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rate)
    }
}

/// Rate source that always fails
pub struct FailingRates;

#[async_trait]
impl RateSource for FailingRates {
    async fn rate(&self, _base: &str, _target: &str) -> Result<f64, RateError> {
        Err(RateError::NetworkError("connection refused".to_string()))
    }
}

/// Rate source that can be taken down and brought back
pub struct SwitchableRates {
    pub rate: f64,
    pub available: AtomicBool,
}

impl SwitchableRates {
    pub fn new(rate: f64, available: bool) -> Self {
        Self {
            rate,
            available: AtomicBool::new(available),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

#[async_trait]
impl RateSource for SwitchableRates {
    async fn rate(&self, _base: &str, _target: &str) -> Result<f64, RateError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(self.rate)
        } else {
            Err(RateError::ProviderError("quota-reached".to_string()))
        }
    }
}

/// Price source that replays scripted results, then returns empty batches
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Vec<PriceObservation>, MetalsError>>>,
    pub calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Vec<PriceObservation>, MetalsError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    async fn fetch(&self) -> Result<Vec<PriceObservation>, MetalsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}
