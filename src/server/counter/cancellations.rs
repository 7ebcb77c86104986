use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireEmployee;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_email, validate_person_name, validate_reasons};
use crate::tickets::is_valid_ticket_id;
use crate::types::CancellationRequest;

pub async fn create_cancellation(
    _auth: RequireEmployee,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CancellationRequest>,
) -> impl IntoResponse {
    if !is_valid_ticket_id(&req.ticket_id) {
        return Err(ApiError::bad_request("Ticket ID is malformed"));
    }
    validate_person_name(&req.name)?;
    validate_email(&req.email)?;
    validate_reasons(&req.reasons)?;

    let cancellation = state
        .store
        .create_cancellation(&req)
        .map_err(ApiError::from_store)?;

    state.notifier.cancellation_received(&cancellation);

    Ok((StatusCode::CREATED, Json(ApiResponse::success(cancellation))))
}

/// Withdraws a request that has not been reviewed yet.
pub async fn delete_cancellation(
    auth: RequireEmployee,
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> impl IntoResponse {
    state
        .store
        .get_sale(&ticket_id)
        .api_err("Failed to get sale")?
        .filter(|s| s.employee_id.as_deref() == Some(auth.employee.id.as_str()))
        .or_not_found("Ticket not found")?;

    let cancellation = state
        .store
        .get_cancellation(&ticket_id)
        .api_err("Failed to get cancellation")?
        .or_not_found("No cancellation on file for this ticket")?;

    if cancellation.status.is_terminal() {
        return Err(ApiError::conflict(
            "Cancellation is already resolved and cannot be withdrawn",
        ));
    }

    state
        .store
        .delete_cancellation(&ticket_id)
        .api_err("Failed to delete cancellation")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn get_cancellation(
    auth: RequireEmployee,
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> impl IntoResponse {
    // Scoped to the employee's own tickets
    state
        .store
        .get_sale(&ticket_id)
        .api_err("Failed to get sale")?
        .filter(|s| s.employee_id.as_deref() == Some(auth.employee.id.as_str()))
        .or_not_found("Ticket not found")?;

    let cancellation = state
        .store
        .get_cancellation(&ticket_id)
        .api_err("Failed to get cancellation")?
        .or_not_found("No cancellation on file for this ticket")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(cancellation)))
}
