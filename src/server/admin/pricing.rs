use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::SavePricesRequest;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::parse_price;
use crate::types::PassType;

pub async fn list_prices(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let prices = state
        .store
        .list_prices()
        .api_err("Failed to list prices")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(prices)))
}

/// Replaces the whole pricing table. Every field must parse before any row
/// is written; one bad price rejects the entire submission.
pub async fn save_prices(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SavePricesRequest>,
) -> impl IntoResponse {
    let mut parsed = Vec::with_capacity(PassType::ALL.len());
    let mut problems = Vec::new();

    for pass in PassType::ALL {
        match parse_price(pass, req.field(pass)) {
            Ok(price) => parsed.push((pass, price)),
            Err(problem) => problems.push(problem),
        }
    }

    if !problems.is_empty() {
        return Err(ApiError::bad_request(problems.join("; ")));
    }

    state
        .store
        .update_prices(&parsed)
        .map_err(ApiError::from_store)?;

    let prices = state
        .store
        .list_prices()
        .api_err("Failed to list prices")?;

    state.price_feed.publish(prices.clone());

    Ok::<_, ApiError>(Json(ApiResponse::success(prices)))
}

pub async fn reset_prices(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let defaults: Vec<(PassType, f64)> = PassType::ALL
        .iter()
        .map(|pass| (*pass, pass.default_price()))
        .collect();

    state
        .store
        .update_prices(&defaults)
        .map_err(ApiError::from_store)?;

    let prices = state
        .store
        .list_prices()
        .api_err("Failed to list prices")?;

    state.price_feed.publish(prices.clone());

    Ok::<_, ApiError>(Json(ApiResponse::success(prices)))
}
