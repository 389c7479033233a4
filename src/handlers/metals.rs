use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{
    error::MetalsError,
    models::metal::{
        AnalysisQuery, ApiResponse, CurrentPrice, CurrentPricesQuery, ErrorResponse,
        HealthResponse, HistoricalPricesQuery, PricePoint, UpdateResponse,
    },
    services::analysis::AnalysisSnapshot,
    AppState,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

fn internal_error(e: MetalsError) -> ApiError {
    let status = match e {
        MetalsError::SourceUnavailable(_) | MetalsError::ParseFailure(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::error!(error = %e, "Request failed");
    error_response(status, e.to_string())
}

/// Handler for GET /api/health
/// Reports unhealthy when the store does not answer a ping
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    if let Err(e) = state.db.ping().await {
        tracing::error!(error = %e, "Health check failed to reach database");
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Database unavailable",
        ));
    }

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        message: "API is running".to_string(),
    }))
}

/// Handler for GET /api/metals/current?currency=EUR
pub async fn get_current_prices(
    State(state): State<AppState>,
    Query(query): Query<CurrentPricesQuery>,
) -> Result<Json<ApiResponse<Vec<CurrentPrice>>>, ApiError> {
    let prices = state
        .metal_service
        .current_prices(query.currency.as_deref())
        .await
        .map_err(internal_error)?;

    Ok(Json(ApiResponse::success(prices)))
}

/// Handler for GET /api/metals/history?metal=GOLD&date_from=2024-01-01&date_to=2024-01-31
pub async fn get_historical_prices(
    State(state): State<AppState>,
    Query(query): Query<HistoricalPricesQuery>,
) -> Result<Json<ApiResponse<Vec<PricePoint>>>, ApiError> {
    let (Some(metal), Some(date_from), Some(date_to)) = (
        query.metal.filter(|m| !m.trim().is_empty()),
        query.date_from,
        query.date_to,
    ) else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Missing required parameters: metal, date_from, date_to",
        ));
    };

    let (Some(from), Some(to)) = (
        parse_query_datetime(&date_from, false),
        parse_query_datetime(&date_to, true),
    ) else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Invalid date format. Use ISO format (YYYY-MM-DD)",
        ));
    };

    let prices = state
        .metal_service
        .historical_prices(&metal, from, to)
        .await
        .map_err(internal_error)?;

    Ok(Json(ApiResponse::success(prices)))
}

/// Handler for GET /api/metals/analysis?metal=GOLD
pub async fn get_metal_analysis(
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<ApiResponse<AnalysisSnapshot>>, ApiError> {
    let Some(metal) = query.metal.filter(|m| !m.trim().is_empty()) else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Missing required parameter: metal",
        ));
    };

    match state.analysis.analyze(&metal).await.map_err(internal_error)? {
        Some(snapshot) => Ok(Json(ApiResponse::success(snapshot))),
        None => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("No data available for metal: {}", metal.trim().to_uppercase()),
        )),
    }
}

/// Handler for POST /api/metals/update
/// Runs one ingestion cycle immediately
pub async fn update_metal_prices(
    State(state): State<AppState>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let stats = state.ingestion.run_cycle().await.map_err(internal_error)?;

    Ok(Json(UpdateResponse {
        status: "success".to_string(),
        message: format!("Merged {} metal prices", stats.merged()),
        received: stats.received,
        inserted: stats.inserted,
        updated: stats.updated,
        skipped: stats.skipped,
    }))
}

/// Accepts RFC 3339, a naive ISO datetime (UTC) or a bare date. A bare
/// date means start of day, or end of day when `end_of_day` is set.
fn parse_query_datetime(raw: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let naive = if end_of_day {
        date.and_hms_nano_opt(23, 59, 59, 999_999_999)?
    } else {
        date.and_hms_opt(0, 0, 0)?
    };
    Some(naive.and_utc())
}
