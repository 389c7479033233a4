use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metals_backend::{
    config::AppConfig,
    handlers::build_router,
    jobs::price_updater::PriceUpdater,
    scrapers::mfd::MfdScraper,
    services::{
        analysis::AnalysisService,
        audit_log::AuditLog,
        exchange_rate::ExchangeRateService,
        ingestion::PriceIngestion,
        metal_service::{MetalService, ReadCaches},
        reconciler::PriceReconciler,
        seed::seed_metals,
        ttl_cache::TtlCache,
    },
    AppState,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,metals_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    seed_metals(&db).await.expect("Failed to seed metals");

    if config.exchange_rate_api_key.is_none() {
        tracing::warn!("EXCHANGE_RATE_API_KEY not set, prices will not be converted");
    }

    let rates = Arc::new(ExchangeRateService::new(
        config.exchange_rate_api_key.clone(),
        config.exchange_rate_base_url.clone(),
        TtlCache::new(config.rate_cache_ttl),
    ));
    let metal_service = MetalService::new(db.clone(), rates, ReadCaches::new(config.price_cache_ttl));

    let scraper = Arc::new(MfdScraper::new(config.scraper_config()));
    let audit = Arc::new(AuditLog::new(config.audit_log_path.clone()));
    let ingestion = Arc::new(PriceIngestion::new(
        scraper,
        PriceReconciler::new(db.clone(), audit),
    ));

    let updater = PriceUpdater::new(ingestion.clone(), config.price_update_interval);
    if config.price_updater_enabled {
        updater.start();
    } else {
        tracing::info!("Price updater disabled");
    }

    let state = AppState {
        db: db.clone(),
        metal_service,
        analysis: Arc::new(AnalysisService::new(db)),
        ingestion,
    };

    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind address");

    match listener.local_addr() {
        Ok(addr) => tracing::info!("Server listening on {}", addr),
        Err(_) => tracing::info!("Server listening on {}", config.bind_addr),
    }

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    updater.stop().await;
    tracing::info!("Shutdown complete");
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await;
}

/// Resolves once `signal` fires. A signal that cannot be installed never
/// resolves, so the server keeps running until the process is killed.
async fn wait_for_signal<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
