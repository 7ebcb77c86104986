use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::auth::RequireEmployee;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::types::PassType;

pub async fn list_availability(
    auth: RequireEmployee,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let mut availability = Vec::with_capacity(PassType::ALL.len());
    for pass in PassType::ALL {
        availability.push(
            state
                .store
                .availability_for(&auth.employee.id, pass)
                .api_err("Failed to compute availability")?,
        );
    }

    Ok::<_, ApiError>(Json(ApiResponse::success(availability)))
}

pub async fn get_availability(
    auth: RequireEmployee,
    State(state): State<Arc<AppState>>,
    Path(pass_type): Path<String>,
) -> impl IntoResponse {
    let pass: PassType = pass_type
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Unknown pass type: {pass_type}")))?;

    let availability = state
        .store
        .availability_for(&auth.employee.id, pass)
        .api_err("Failed to compute availability")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(availability)))
}
