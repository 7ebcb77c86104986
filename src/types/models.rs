use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::PassType;
use crate::error::Error;

/// Maximum sellable quantity per pass type, set by the admin. A missing or
/// zero counter means the employee cannot sell that type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassAllocations {
    pub express: i64,
    pub junior: i64,
    pub regular: i64,
    pub student: i64,
    pub senior_citizen: i64,
    pub pwd: i64,
}

impl PassAllocations {
    #[must_use]
    pub fn get(&self, pass: PassType) -> i64 {
        match pass {
            PassType::Express => self.express,
            PassType::Junior => self.junior,
            PassType::Regular => self.regular,
            PassType::Student => self.student,
            PassType::SeniorCitizen => self.senior_citizen,
            PassType::Pwd => self.pwd,
        }
    }

    pub fn set(&mut self, pass: PassType, quantity: i64) {
        match pass {
            PassType::Express => self.express = quantity,
            PassType::Junior => self.junior = quantity,
            PassType::Regular => self.regular = quantity,
            PassType::Student => self.student = quantity,
            PassType::SeniorCitizen => self.senior_citizen = quantity,
            PassType::Pwd => self.pwd = quantity,
        }
    }

    /// Every counter must be non-negative.
    pub fn validate(&self) -> Result<(), String> {
        for pass in PassType::ALL {
            if self.get(pass) < 0 {
                return Err(format!("allocation for {pass} cannot be negative"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub username: String,
    pub allocations: PassAllocations,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// One row of the sales ledger. The ticket ID is immutable once written;
/// `employee_id` goes NULL when the selling employee is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub ticket_id: String,
    pub name: String,
    pub email: String,
    pub quantity: i64,
    pub amount: f64,
    pub booked_date: NaiveDate,
    pub purchased_date: NaiveDate,
    pub pass_type: PassType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancellationStatus {
    Pending,
    Approved,
    Rejected,
}

impl CancellationStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CancellationStatus::Pending => "Pending",
            CancellationStatus::Approved => "Approved",
            CancellationStatus::Rejected => "Rejected",
        }
    }

    /// Approved and Rejected are terminal; nothing transitions back.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CancellationStatus::Pending)
    }
}

impl std::fmt::Display for CancellationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CancellationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(CancellationStatus::Pending),
            "Approved" => Ok(CancellationStatus::Approved),
            "Rejected" => Ok(CancellationStatus::Rejected),
            other => Err(Error::BadRequest(format!("unknown status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cancellation {
    pub id: i64,
    pub ticket_id: String,
    pub name: String,
    pub email: String,
    pub reasons: String,
    pub quantity: i64,
    pub amount: f64,
    pub booked_date: NaiveDate,
    pub purchased_date: NaiveDate,
    pub pass_type: PassType,
    pub status: CancellationStatus,
}

/// Fields submitted when requesting a cancellation. The duplicated fields
/// (name, email, quantity, amount, pass type) must exactly match the
/// referenced sale; the dates are copied from the sale row by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationRequest {
    pub ticket_id: String,
    pub name: String,
    pub email: String,
    pub reasons: String,
    pub quantity: i64,
    pub amount: f64,
    pub pass_type: PassType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassPrice {
    pub pass_type: PassType,
    pub price: f64,
}

/// Remaining sellable quantity for one (employee, pass type) pair.
///
/// `available` is the effective ceiling: the lower of the employee's
/// unsold allocation and the park-wide remainder. Approved cancellations are
/// not added back here; they only net out of report aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub pass_type: PassType,
    pub allocation: i64,
    pub sold: i64,
    pub park_wide_remaining: i64,
    pub available: i64,
}

/// Aggregate view used by the dashboards: gross figures from the sales
/// ledger minus the portion attributable to Approved cancellations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesSummary {
    pub gross_amount: f64,
    pub refunded_amount: f64,
    pub net_amount: f64,
    pub gross_tickets: i64,
    pub refunded_tickets: i64,
    pub net_tickets: i64,
    pub pending_cancellations: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassTypeSales {
    pub pass_type: PassType,
    pub tickets_sold: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocations_get_set() {
        let mut alloc = PassAllocations::default();
        alloc.set(PassType::Regular, 10);
        alloc.set(PassType::Pwd, 3);
        assert_eq!(alloc.get(PassType::Regular), 10);
        assert_eq!(alloc.get(PassType::Pwd), 3);
        assert_eq!(alloc.get(PassType::Express), 0);
    }

    #[test]
    fn test_negative_allocation_rejected() {
        let alloc = PassAllocations {
            junior: -1,
            ..Default::default()
        };
        assert!(alloc.validate().is_err());
    }

    #[test]
    fn test_status_terminality() {
        assert!(!CancellationStatus::Pending.is_terminal());
        assert!(CancellationStatus::Approved.is_terminal());
        assert!(CancellationStatus::Rejected.is_terminal());
    }
}
