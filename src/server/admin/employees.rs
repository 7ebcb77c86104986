use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::auth::{RequireAdmin, TokenGenerator};
use crate::server::AppState;
use crate::server::dto::{
    CreateEmployeeRequest, CreateEmployeeTokenRequest, CreateTokenResponse, PaginationParams,
    TokenResponse, UpdateEmployeeRequest,
};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};
use crate::server::validation::validate_username;
use crate::types::{Employee, Token};

use super::tokens::token_to_response;

const EMPLOYEE_ID_PREFIX: char = 'E';
const EMPLOYEE_ID_DIGITS: usize = 5;
const MAX_ID_RETRIES: u32 = 3;

/// Produces an ID like `E48213`.
fn generate_employee_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..EMPLOYEE_ID_DIGITS)
        .map(|_| char::from(b'0' + rng.gen_range(0..10)))
        .collect();
    format!("{EMPLOYEE_ID_PREFIX}{suffix}")
}

pub async fn create_employee(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateEmployeeRequest>,
) -> impl IntoResponse {
    validate_username(&req.username).map_err(ApiError::bad_request)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("Employee name cannot be empty"));
    }
    req.allocations.validate().map_err(ApiError::bad_request)?;

    for _ in 0..MAX_ID_RETRIES {
        let employee = Employee {
            id: generate_employee_id(),
            name: req.name.trim().to_string(),
            username: req.username.clone(),
            allocations: req.allocations,
            created_at: Utc::now(),
        };

        match state.store.create_employee(&employee) {
            Ok(()) => return Ok((StatusCode::CREATED, Json(ApiResponse::success(employee)))),
            // AlreadyExists covers both unique columns. A taken username is
            // a client error and no amount of retrying fixes it, so look it
            // up to tell the two apart before retrying with a fresh ID.
            Err(crate::error::Error::AlreadyExists) => {
                let taken = state
                    .store
                    .get_employee_by_username(&req.username)
                    .api_err("Failed to check username")?;
                if taken.is_some() {
                    return Err(ApiError::conflict("Username is already taken"));
                }
            }
            Err(_) => return Err(ApiError::internal("Failed to create employee")),
        }
    }

    Err(ApiError::internal("Failed to create employee after retries"))
}

pub async fn list_employees(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let employees = state
        .store
        .list_employees(cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list employees")?;

    let (employees, next_cursor, has_more) =
        paginate(employees, DEFAULT_PAGE_SIZE as usize, |e| e.id.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        employees,
        next_cursor,
        has_more,
    )))
}

pub async fn get_employee(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let employee = state
        .store
        .get_employee(&id)
        .api_err("Failed to get employee")?
        .or_not_found("Employee not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(employee)))
}

pub async fn update_employee(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEmployeeRequest>,
) -> impl IntoResponse {
    let mut employee = state
        .store
        .get_employee(&id)
        .api_err("Failed to get employee")?
        .or_not_found("Employee not found")?;

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("Employee name cannot be empty"));
        }
        employee.name = name.trim().to_string();
    }

    if let Some(username) = req.username {
        validate_username(&username).map_err(ApiError::bad_request)?;
        if username != employee.username {
            let taken = state
                .store
                .get_employee_by_username(&username)
                .api_err("Failed to check username")?;
            if taken.is_some() {
                return Err(ApiError::conflict("Username is already taken"));
            }
            employee.username = username;
        }
    }

    if let Some(allocations) = req.allocations {
        allocations.validate().map_err(ApiError::bad_request)?;
        // Lowering an allocation below what is already sold is allowed; it
        // just means no further sales of that type until raised again.
        employee.allocations = allocations;
    }

    state
        .store
        .update_employee(&employee)
        .api_err("Failed to update employee")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(employee)))
}

pub async fn delete_employee(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let employee = state
        .store
        .get_employee(&id)
        .api_err("Failed to get employee")?
        .or_not_found("Employee not found")?;

    state
        .store
        .delete_employee(&employee.id)
        .api_err("Failed to delete employee")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_employee_tokens(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let employee = state
        .store
        .get_employee(&id)
        .api_err("Failed to get employee")?
        .or_not_found("Employee not found")?;

    let tokens = state
        .store
        .list_employee_tokens(&employee.id)
        .api_err("Failed to list employee tokens")?;

    let responses: Vec<TokenResponse> = tokens.into_iter().map(token_to_response).collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(responses)))
}

pub async fn create_employee_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateEmployeeTokenRequest>,
) -> impl IntoResponse {
    let employee = state
        .store
        .get_employee(&id)
        .api_err("Failed to get employee")?
        .or_not_found("Employee not found")?;

    if let Some(seconds) = req.expires_in_seconds {
        if seconds < 0 {
            return Err(ApiError::bad_request(
                "expires_in_seconds cannot be negative",
            ));
        }
    }

    let expires_at = req
        .expires_in_seconds
        .map(|s| Utc::now() + Duration::seconds(s));

    let generator = TokenGenerator::new();

    const MAX_RETRIES: u32 = 3;
    for _ in 0..MAX_RETRIES {
        let (raw_token, lookup, hash) = generator
            .generate()
            .api_err("Failed to generate token")?;

        let now = Utc::now();
        let token = Token {
            id: Uuid::new_v4().to_string(),
            token_hash: hash,
            token_lookup: lookup,
            is_admin: false,
            employee_id: Some(employee.id.clone()),
            created_at: now,
            expires_at,
            last_used_at: None,
        };

        match state.store.create_token(&token) {
            Ok(()) => {
                return Ok((
                    StatusCode::CREATED,
                    Json(ApiResponse::success(CreateTokenResponse {
                        token: raw_token,
                        metadata: token_to_response(token),
                    })),
                ));
            }
            Err(crate::error::Error::TokenLookupCollision) => continue,
            Err(_) => return Err(ApiError::internal("Failed to create token")),
        }
    }

    Err(ApiError::internal("Failed to create token after retries"))
}
