mod cancellations;
mod employees;
mod pricing;
mod reports;
mod sales;
mod tokens;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // Employee routes
        .route("/employees", post(employees::create_employee))
        .route("/employees", get(employees::list_employees))
        .route("/employees/{id}", get(employees::get_employee))
        .route("/employees/{id}", patch(employees::update_employee))
        .route("/employees/{id}", delete(employees::delete_employee))
        .route(
            "/employees/{id}/tokens",
            get(employees::list_employee_tokens),
        )
        .route(
            "/employees/{id}/tokens",
            post(employees::create_employee_token),
        )
        // Token routes
        .route("/tokens", get(tokens::list_tokens))
        .route("/tokens/{id}", get(tokens::get_token))
        .route("/tokens/{id}", delete(tokens::delete_token))
        // Sales oversight
        .route("/sales", get(sales::list_sales))
        .route("/sales/{ticket_id}", get(sales::get_sale))
        .route("/sales/{ticket_id}", patch(sales::update_sale))
        .route("/sales/{ticket_id}", delete(sales::delete_sale))
        // Cancellation review
        .route("/cancellations", get(cancellations::list_cancellations))
        .route(
            "/cancellations/{ticket_id}",
            get(cancellations::get_cancellation),
        )
        .route(
            "/cancellations/{ticket_id}",
            delete(cancellations::delete_cancellation),
        )
        .route(
            "/cancellations/{ticket_id}/status",
            patch(cancellations::set_cancellation_status),
        )
        // Pricing
        .route("/prices", get(pricing::list_prices))
        .route("/prices", put(pricing::save_prices))
        .route("/prices/reset", post(pricing::reset_prices))
        // Reports
        .route("/reports/summary", get(reports::sales_summary))
        .route("/reports/pass-types", get(reports::pass_type_breakdown))
}
