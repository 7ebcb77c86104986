mod availability;
mod cancellations;
mod dashboard;
mod sales;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::server::AppState;

pub fn counter_router() -> Router<Arc<AppState>> {
    Router::new()
        // Availability
        .route("/availability", get(availability::list_availability))
        .route(
            "/availability/{pass_type}",
            get(availability::get_availability),
        )
        // Sales
        .route("/sales", post(sales::create_sale))
        .route("/sales", get(sales::list_sales))
        .route("/sales/{ticket_id}", get(sales::get_sale))
        .route("/sales/{ticket_id}", patch(sales::update_sale))
        .route("/sales/{ticket_id}", delete(sales::delete_sale))
        // Cancellations
        .route("/cancellations", post(cancellations::create_cancellation))
        .route(
            "/cancellations/{ticket_id}",
            get(cancellations::get_cancellation),
        )
        .route(
            "/cancellations/{ticket_id}",
            delete(cancellations::delete_cancellation),
        )
        // Dashboard and prices
        .route("/dashboard", get(dashboard::dashboard))
        .route("/prices", get(dashboard::list_prices))
}
