mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Every check-then-write sequence (sale creation, cancellation creation,
/// status transitions, price saves) is atomic inside the store, so callers
/// never observe partial writes.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Employee operations
    fn create_employee(&self, employee: &Employee) -> Result<()>;
    fn get_employee(&self, id: &str) -> Result<Option<Employee>>;
    fn get_employee_by_username(&self, username: &str) -> Result<Option<Employee>>;
    fn list_employees(&self, cursor: &str, limit: i32) -> Result<Vec<Employee>>;
    fn update_employee(&self, employee: &Employee) -> Result<()>;
    fn delete_employee(&self, id: &str) -> Result<bool>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn list_tokens(&self, cursor: &str, limit: i32) -> Result<Vec<Token>>;
    fn list_employee_tokens(&self, employee_id: &str) -> Result<Vec<Token>>;
    fn delete_token(&self, id: &str) -> Result<bool>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;
    fn has_admin_token(&self) -> Result<bool>;

    // Sales ledger
    /// Inserts a sale after re-checking availability inside one transaction.
    /// Fails with `InsufficientAvailability` (carrying the remaining count)
    /// when quantity exceeds the effective ceiling, and `TicketIdCollision`
    /// on a primary-key conflict so callers can regenerate and retry.
    fn create_sale(&self, sale: &Sale) -> Result<()>;
    fn get_sale(&self, ticket_id: &str) -> Result<Option<Sale>>;
    fn list_sales(&self, employee_id: Option<&str>, cursor: &str, limit: i32)
    -> Result<Vec<Sale>>;
    fn update_sale(&self, sale: &Sale) -> Result<()>;
    fn delete_sale(&self, ticket_id: &str, employee_id: Option<&str>) -> Result<bool>;

    // Availability accounting
    fn allocation_for(&self, employee_id: &str, pass: PassType) -> Result<i64>;
    fn sold_by_employee(&self, employee_id: &str, pass: PassType) -> Result<i64>;
    fn sold_park_wide(&self, pass: PassType) -> Result<i64>;
    fn availability_for(&self, employee_id: &str, pass: PassType) -> Result<Availability>;

    // Cancellation workflow
    /// Creates a Pending cancellation after validating, atomically: the sale
    /// exists, no cancellation already references it, and the duplicated
    /// fields match the sale exactly. Dates are copied from the sale row.
    fn create_cancellation(&self, request: &CancellationRequest) -> Result<Cancellation>;
    fn get_cancellation(&self, ticket_id: &str) -> Result<Option<Cancellation>>;
    fn list_cancellations(&self, cursor: &str, limit: i32) -> Result<Vec<Cancellation>>;
    /// Applies `Pending -> {Approved, Rejected}`. Any other transition fails:
    /// terminal states are final and nothing returns to Pending.
    fn set_cancellation_status(
        &self,
        ticket_id: &str,
        status: CancellationStatus,
    ) -> Result<Cancellation>;
    fn delete_cancellation(&self, ticket_id: &str) -> Result<bool>;

    // Pricing table
    fn list_prices(&self) -> Result<Vec<PassPrice>>;
    fn get_price(&self, pass: PassType) -> Result<f64>;
    /// Overwrites all submitted prices in a single transaction.
    fn update_prices(&self, prices: &[(PassType, f64)]) -> Result<()>;

    // Report aggregates. `month` is "YYYY-MM" on purchased_date; None = all time.
    fn sales_summary(&self, employee_id: Option<&str>, month: Option<&str>)
    -> Result<SalesSummary>;
    fn pass_type_breakdown(&self, employee_id: Option<&str>) -> Result<Vec<PassTypeSales>>;
}
