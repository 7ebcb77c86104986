use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{ListSalesParams, UpdateSaleRequest};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};
use crate::server::validation::{validate_email, validate_person_name, validate_quantity};

pub async fn list_sales(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListSalesParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let sales = state
        .store
        .list_sales(params.employee_id.as_deref(), cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list sales")?;

    let (sales, next_cursor, has_more) =
        paginate(sales, DEFAULT_PAGE_SIZE as usize, |s| s.ticket_id.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(sales, next_cursor, has_more)))
}

pub async fn get_sale(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> impl IntoResponse {
    let sale = state
        .store
        .get_sale(&ticket_id)
        .api_err("Failed to get sale")?
        .or_not_found("Ticket not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(sale)))
}

pub async fn update_sale(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
    Json(req): Json<UpdateSaleRequest>,
) -> impl IntoResponse {
    let mut sale = state
        .store
        .get_sale(&ticket_id)
        .api_err("Failed to get sale")?
        .or_not_found("Ticket not found")?;

    if state
        .store
        .get_cancellation(&ticket_id)
        .api_err("Failed to check cancellations")?
        .is_some()
    {
        return Err(ApiError::conflict(
            "Ticket has a cancellation on file and cannot be edited",
        ));
    }

    if let Some(name) = req.name {
        validate_person_name(&name)?;
        sale.name = name.trim().to_string();
    }
    if let Some(email) = req.email {
        validate_email(&email)?;
        sale.email = email.trim().to_string();
    }
    if let Some(quantity) = req.quantity {
        validate_quantity(quantity)?;
        sale.quantity = quantity;
    }
    if let Some(booked_date) = req.booked_date {
        sale.booked_date = booked_date;
    }
    if let Some(pass_type) = req.pass_type {
        sale.pass_type = pass_type;
    }

    // Amount always tracks the current price; clients never set it.
    let price = state
        .store
        .get_price(sale.pass_type)
        .api_err("Failed to look up price")?;
    sale.amount = price * sale.quantity as f64;

    state
        .store
        .update_sale(&sale)
        .map_err(ApiError::from_store)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(sale)))
}

pub async fn delete_sale(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_sale(&ticket_id, None)
        .api_err("Failed to delete sale")?;

    if !deleted {
        return Err(ApiError::not_found("Ticket not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
