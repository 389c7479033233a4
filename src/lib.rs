// src/lib.rs

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use services::{analysis::AnalysisService, ingestion::PriceIngestion, metal_service::MetalService};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub metal_service: MetalService,
    pub analysis: Arc<AnalysisService>,
    pub ingestion: Arc<PriceIngestion>,
}

pub mod entities {
    pub mod prelude;
    pub mod metals;
    pub mod metal_prices;
    pub mod metal_analyses;
}

pub mod services {
    pub mod ttl_cache;
    pub mod exchange_rate;
    pub mod analysis;
    pub mod audit_log;
    pub mod reconciler;
    pub mod ingestion;
    pub mod metal_service;
    pub mod seed;
}

pub mod config;
pub mod error;
pub mod scrapers;
pub mod jobs;
pub mod models;
pub mod handlers;
