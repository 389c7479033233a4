pub mod metals;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(metals::health))
        .route("/api/metals/current", get(metals::get_current_prices))
        .route("/api/metals/history", get(metals::get_historical_prices))
        .route("/api/metals/analysis", get(metals::get_metal_analysis))
        .route("/api/metals/update", post(metals::update_metal_prices))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
