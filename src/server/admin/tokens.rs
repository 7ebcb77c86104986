use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{PaginationParams, TokenResponse};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};
use crate::types::Token;

pub async fn list_tokens(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let tokens = state
        .store
        .list_tokens(cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list tokens")?;

    let (tokens, next_cursor, has_more) =
        paginate(tokens, DEFAULT_PAGE_SIZE as usize, |t| t.id.clone());

    let responses: Vec<TokenResponse> = tokens.into_iter().map(token_to_response).collect();

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        responses,
        next_cursor,
        has_more,
    )))
}

pub async fn get_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let token = state
        .store
        .get_token_by_id(&id)
        .api_err("Failed to get token")?
        .or_not_found("Token not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(token_to_response(token))))
}

pub async fn delete_token(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let token = state
        .store
        .get_token_by_id(&id)
        .api_err("Failed to get token")?
        .or_not_found("Token not found")?;

    if token.id == admin.0.id {
        return Err(ApiError::bad_request("Cannot delete current token"));
    }

    state
        .store
        .delete_token(&token.id)
        .api_err("Failed to delete token")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub fn token_to_response(token: Token) -> TokenResponse {
    TokenResponse {
        id: token.id,
        is_admin: token.is_admin,
        employee_id: token.employee_id,
        created_at: token.created_at,
        expires_at: token.expires_at,
        last_used_at: token.last_used_at,
    }
}
