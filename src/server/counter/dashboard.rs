use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Serialize;

use crate::auth::RequireEmployee;
use crate::server::AppState;
use crate::server::dto::DashboardParams;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::validate_month;
use crate::types::{PassTypeSales, SalesSummary};

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub summary: SalesSummary,
    pub pass_types: Vec<PassTypeSales>,
}

/// The counter home screen: the employee's own totals, optionally narrowed
/// to one calendar month.
pub async fn dashboard(
    auth: RequireEmployee,
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> impl IntoResponse {
    if let Some(month) = &params.month {
        validate_month(month)?;
    }

    let summary = state
        .store
        .sales_summary(Some(&auth.employee.id), params.month.as_deref())
        .api_err("Failed to compute summary")?;

    let pass_types = state
        .store
        .pass_type_breakdown(Some(&auth.employee.id))
        .api_err("Failed to compute breakdown")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(DashboardResponse {
        summary,
        pass_types,
    })))
}

pub async fn list_prices(
    _auth: RequireEmployee,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let prices = state
        .store
        .list_prices()
        .api_err("Failed to list prices")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(prices)))
}
