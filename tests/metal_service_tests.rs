mod common;

use common::{observation, setup_test_db, ts, FailingRates, StaticRates, SwitchableRates};
use metals_backend::services::audit_log::AuditLog;
use metals_backend::services::metal_service::{MetalService, ReadCaches};
use metals_backend::services::reconciler::PriceReconciler;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

async fn insert_prices(db: &DatabaseConnection, batch: &[metals_backend::scrapers::PriceObservation]) {
    let dir = tempfile::tempdir().unwrap();
    let reconciler = PriceReconciler::new(db.clone(), Arc::new(AuditLog::new(dir.path().join("audit.json"))));
    reconciler.reconcile(batch).await.unwrap();
}

#[tokio::test]
async fn test_current_prices_lists_every_metal() {
    let db = setup_test_db().await.unwrap();
    insert_prices(
        &db,
        &[
            observation("GOLD", 6400.0, ts(2024, 3, 1)),
            observation("GOLD", 6500.0, ts(2024, 3, 2)),
        ],
    )
    .await;

    let service = MetalService::new(db, Arc::new(StaticRates::new(1.0)), ReadCaches::new(Duration::from_secs(60)));
    let prices = service.current_prices(None).await.unwrap();

    let symbols: Vec<&str> = prices.iter().map(|p| p.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["GOLD", "SILVER", "PLATINUM", "PALLADIUM"]);

    assert_eq!(prices[0].price, Some(6500.0));
    assert_eq!(prices[0].timestamp, Some(ts(2024, 3, 2)));
    assert_eq!(prices[0].currency.as_deref(), Some("RUB"));

    // No observation yet
    assert_eq!(prices[1].price, None);
    assert_eq!(prices[1].timestamp, None);
}

#[tokio::test]
async fn test_current_prices_converted() {
    let db = setup_test_db().await.unwrap();
    insert_prices(&db, &[observation("GOLD", 6500.0, ts(2024, 3, 1))]).await;

    let rates = Arc::new(StaticRates::new(0.01));
    let service = MetalService::new(db, rates.clone(), ReadCaches::new(Duration::from_secs(60)));
    let prices = service.current_prices(Some("usd")).await.unwrap();

    let gold = &prices[0];
    assert!((gold.price.unwrap() - 65.0).abs() < 1e-9);
    assert_eq!(gold.unit, "USD/g");
    assert_eq!(gold.currency.as_deref(), Some("USD"));

    // Metals without a price need no rate
    assert_eq!(rates.calls(), 1);
    assert_eq!(prices[1].unit, "RUB/g");
}

#[tokio::test]
async fn test_same_currency_needs_no_rate() {
    let db = setup_test_db().await.unwrap();
    insert_prices(&db, &[observation("GOLD", 6500.0, ts(2024, 3, 1))]).await;

    let rates = Arc::new(StaticRates::new(2.0));
    let service = MetalService::new(db, rates.clone(), ReadCaches::new(Duration::from_secs(60)));
    let prices = service.current_prices(Some("RUB")).await.unwrap();

    assert_eq!(prices[0].price, Some(6500.0));
    assert_eq!(rates.calls(), 0);
}

#[tokio::test]
async fn test_conversion_failure_returns_original_price() {
    let db = setup_test_db().await.unwrap();
    insert_prices(&db, &[observation("GOLD", 6500.0, ts(2024, 3, 1))]).await;

    let service = MetalService::new(db, Arc::new(FailingRates), ReadCaches::new(Duration::from_secs(60)));
    let prices = service.current_prices(Some("EUR")).await.unwrap();

    assert_eq!(prices[0].price, Some(6500.0));
    assert_eq!(prices[0].unit, "RUB/g");
    assert_eq!(prices[0].currency.as_deref(), Some("RUB"));
}

#[tokio::test]
async fn test_current_prices_cached_until_ttl() {
    let db = setup_test_db().await.unwrap();
    insert_prices(&db, &[observation("GOLD", 6500.0, ts(2024, 3, 1))]).await;

    let service = MetalService::new(
        db.clone(),
        Arc::new(StaticRates::new(0.01)),
        ReadCaches::new(Duration::from_millis(400)),
    );

    let before = service.current_prices(None).await.unwrap();

    // Newer data stays invisible while the cached read is fresh
    insert_prices(&db, &[observation("GOLD", 7000.0, ts(2024, 3, 2))]).await;
    let cached = service.current_prices(None).await.unwrap();
    assert_eq!(cached, before);
    assert_eq!(cached[0].price, Some(6500.0));

    // Conversion reuses the cached read
    let converted = service.current_prices(Some("USD")).await.unwrap();
    assert!((converted[0].price.unwrap() - 65.0).abs() < 1e-9);

    tokio::time::sleep(Duration::from_millis(600)).await;

    let fresh = service.current_prices(Some("USD")).await.unwrap();
    assert!((fresh[0].price.unwrap() - 70.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_conversion_recovers_within_cache_ttl() {
    let db = setup_test_db().await.unwrap();
    insert_prices(&db, &[observation("GOLD", 6500.0, ts(2024, 3, 1))]).await;

    let rates = Arc::new(SwitchableRates::new(0.01, false));
    let service = MetalService::new(db, rates.clone(), ReadCaches::new(Duration::from_secs(300)));

    let degraded = service.current_prices(Some("USD")).await.unwrap();
    assert_eq!(degraded[0].price, Some(6500.0));
    assert_eq!(degraded[0].currency.as_deref(), Some("RUB"));

    rates.set_available(true);

    let recovered = service.current_prices(Some("USD")).await.unwrap();
    assert!((recovered[0].price.unwrap() - 65.0).abs() < 1e-9);
    assert_eq!(recovered[0].currency.as_deref(), Some("USD"));
    assert_eq!(recovered[0].unit, "USD/g");
}

#[tokio::test]
async fn test_historical_prices_inclusive_and_ordered() {
    let db = setup_test_db().await.unwrap();
    insert_prices(
        &db,
        &[
            observation("GOLD", 6300.0, ts(2024, 3, 5)),
            observation("GOLD", 6100.0, ts(2024, 3, 1)),
            observation("GOLD", 6200.0, ts(2024, 3, 3)),
            observation("GOLD", 6000.0, ts(2024, 2, 28)),
            observation("SILVER", 75.0, ts(2024, 3, 3)),
        ],
    )
    .await;

    let service = MetalService::new(db, Arc::new(StaticRates::new(1.0)), ReadCaches::new(Duration::from_secs(60)));
    let history = service
        .historical_prices("gold", ts(2024, 3, 1), ts(2024, 3, 5))
        .await
        .unwrap();

    let prices: Vec<f64> = history.iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![6100.0, 6200.0, 6300.0]);
    assert!(history.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}

#[tokio::test]
async fn test_historical_prices_unknown_metal_is_empty() {
    let db = setup_test_db().await.unwrap();
    let service = MetalService::new(db, Arc::new(StaticRates::new(1.0)), ReadCaches::new(Duration::from_secs(60)));

    let history = service
        .historical_prices("RHODIUM", ts(2024, 1, 1), ts(2024, 12, 31))
        .await
        .unwrap();
    assert!(history.is_empty());
}
