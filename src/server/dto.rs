use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{CancellationStatus, PassAllocations, PassType};

#[derive(Debug, Deserialize)]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub allocations: PassAllocations,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmployeeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub allocations: Option<PassAllocations>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateEmployeeTokenRequest {
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub id: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CreateTokenResponse {
    pub token: String,
    pub metadata: TokenResponse,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListSalesParams {
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Booking details captured at the counter. The amount is not part of the
/// request; it is derived from the pricing table at save time.
#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub name: String,
    pub email: String,
    pub quantity: i64,
    pub booked_date: NaiveDate,
    pub pass_type: PassType,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSaleRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub booked_date: Option<NaiveDate>,
    #[serde(default)]
    pub pass_type: Option<PassType>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCancellationStatusRequest {
    pub status: CancellationStatus,
}

/// All six prices submitted together as raw strings. Display formatting
/// (commas, stray spaces) is tolerated and stripped before parsing.
#[derive(Debug, Deserialize)]
pub struct SavePricesRequest {
    pub express: String,
    pub junior: String,
    pub regular: String,
    pub student: String,
    pub senior_citizen: String,
    pub pwd: String,
}

impl SavePricesRequest {
    #[must_use]
    pub fn field(&self, pass: PassType) -> &str {
        match pass {
            PassType::Express => &self.express,
            PassType::Junior => &self.junior,
            PassType::Regular => &self.regular,
            PassType::Student => &self.student,
            PassType::SeniorCitizen => &self.senior_citizen,
            PassType::Pwd => &self.pwd,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    #[serde(default)]
    pub employee_id: Option<String>,
    /// Calendar month in `YYYY-MM` form; absent means all time.
    #[serde(default)]
    pub month: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    #[serde(default)]
    pub month: Option<String>,
}
