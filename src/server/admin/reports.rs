use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::ReportParams;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_month;

pub async fn sales_summary(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportParams>,
) -> impl IntoResponse {
    if let Some(month) = &params.month {
        validate_month(month)?;
    }

    if let Some(employee_id) = &params.employee_id {
        state
            .store
            .get_employee(employee_id)
            .api_err("Failed to get employee")?
            .or_not_found("Employee not found")?;
    }

    let summary = state
        .store
        .sales_summary(params.employee_id.as_deref(), params.month.as_deref())
        .api_err("Failed to compute summary")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(summary)))
}

pub async fn pass_type_breakdown(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportParams>,
) -> impl IntoResponse {
    if let Some(employee_id) = &params.employee_id {
        state
            .store
            .get_employee(employee_id)
            .api_err("Failed to get employee")?
            .or_not_found("Employee not found")?;
    }

    let breakdown = state
        .store
        .pass_type_breakdown(params.employee_id.as_deref())
        .api_err("Failed to compute breakdown")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(breakdown)))
}
