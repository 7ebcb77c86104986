use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{PaginationParams, UpdateCancellationStatusRequest};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};

pub async fn list_cancellations(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let cancellations = state
        .store
        .list_cancellations(cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list cancellations")?;

    let (cancellations, next_cursor, has_more) = paginate(
        cancellations,
        DEFAULT_PAGE_SIZE as usize,
        |c| c.ticket_id.clone(),
    );

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        cancellations,
        next_cursor,
        has_more,
    )))
}

pub async fn get_cancellation(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> impl IntoResponse {
    let cancellation = state
        .store
        .get_cancellation(&ticket_id)
        .api_err("Failed to get cancellation")?
        .or_not_found("No cancellation on file for this ticket")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(cancellation)))
}

/// Removes a request from the queue without judging it, e.g. when a guest
/// withdraws it. Resolved requests stay on file for the reports.
pub async fn delete_cancellation(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> impl IntoResponse {
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

    Ok::<_, ApiError>(axum::http::StatusCode::NO_CONTENT)
}

pub async fn set_cancellation_status(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
    Json(req): Json<UpdateCancellationStatusRequest>,
) -> impl IntoResponse {
    let cancellation = state
        .store
        .set_cancellation_status(&ticket_id, req.status)
        .map_err(ApiError::from_store)?;

    state.notifier.cancellation_resolved(&cancellation);

    Ok::<_, ApiError>(Json(ApiResponse::success(cancellation)))
}
