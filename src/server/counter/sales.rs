use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::auth::RequireEmployee;
use crate::server::AppState;
use crate::server::dto::{CreateSaleRequest, PaginationParams, UpdateSaleRequest};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};
use crate::server::validation::{validate_email, validate_person_name, validate_quantity};
use crate::tickets::generate_ticket_id;
use crate::types::Sale;

const MAX_TICKET_ID_RETRIES: u32 = 3;

pub async fn create_sale(
    auth: RequireEmployee,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSaleRequest>,
) -> impl IntoResponse {
    validate_person_name(&req.name)?;
    validate_email(&req.email)?;
    validate_quantity(req.quantity)?;

    let price = state
        .store
        .get_price(req.pass_type)
        .api_err("Failed to look up price")?;

    for _ in 0..MAX_TICKET_ID_RETRIES {
        let sale = Sale {
            ticket_id: generate_ticket_id(),
            name: req.name.trim().to_string(),
            email: req.email.trim().to_string(),
            quantity: req.quantity,
            amount: price * req.quantity as f64,
            booked_date: req.booked_date,
            purchased_date: Utc::now().date_naive(),
            pass_type: req.pass_type,
            employee_id: Some(auth.employee.id.clone()),
        };

        match state.store.create_sale(&sale) {
            Ok(()) => {
                state.notifier.ticket_receipt(&sale);
                return Ok((StatusCode::CREATED, Json(ApiResponse::success(sale))));
            }
            Err(crate::error::Error::TicketIdCollision) => continue,
            Err(e) => return Err(ApiError::from_store(e)),
        }
    }

    Err(ApiError::internal("Failed to create sale after retries"))
}

pub async fn list_sales(
    auth: RequireEmployee,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let sales = state
        .store
        .list_sales(Some(&auth.employee.id), cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list sales")?;

    let (sales, next_cursor, has_more) =
        paginate(sales, DEFAULT_PAGE_SIZE as usize, |s| s.ticket_id.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(sales, next_cursor, has_more)))
}

pub async fn get_sale(
    auth: RequireEmployee,
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> impl IntoResponse {
    let sale = state
        .store
        .get_sale(&ticket_id)
        .api_err("Failed to get sale")?
        // Other employees' tickets are invisible, not forbidden
        .filter(|s| s.employee_id.as_deref() == Some(auth.employee.id.as_str()))
        .or_not_found("Ticket not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(sale)))
}

pub async fn update_sale(
    auth: RequireEmployee,
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
    Json(req): Json<UpdateSaleRequest>,
) -> impl IntoResponse {
    let mut sale = state
        .store
        .get_sale(&ticket_id)
        .api_err("Failed to get sale")?
        .filter(|s| s.employee_id.as_deref() == Some(auth.employee.id.as_str()))
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
    auth: RequireEmployee,
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_sale(&ticket_id, Some(&auth.employee.id))
        .api_err("Failed to delete sale")?;

    if !deleted {
        return Err(ApiError::not_found("Ticket not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
