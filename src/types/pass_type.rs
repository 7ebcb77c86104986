use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Park-wide ceiling on tickets sold per pass type, across all employees.
/// Not configurable; the park stocks 1000 of each.
pub const PARK_WIDE_CAP: i64 = 1000;

/// The six fixed ticket categories. Each has exactly one price row and one
/// per-employee allocation counter. The serialized form is the human name
/// ("Express Pass", ...) used in both SQL and JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassType {
    #[serde(rename = "Express Pass")]
    Express,
    #[serde(rename = "Junior Pass")]
    Junior,
    #[serde(rename = "Regular Pass")]
    Regular,
    #[serde(rename = "Student Pass")]
    Student,
    #[serde(rename = "Senior Citizen Pass")]
    SeniorCitizen,
    #[serde(rename = "PWD Pass")]
    Pwd,
}

impl PassType {
    pub const ALL: [PassType; 6] = [
        PassType::Express,
        PassType::Junior,
        PassType::Regular,
        PassType::Student,
        PassType::SeniorCitizen,
        PassType::Pwd,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PassType::Express => "Express Pass",
            PassType::Junior => "Junior Pass",
            PassType::Regular => "Regular Pass",
            PassType::Student => "Student Pass",
            PassType::SeniorCitizen => "Senior Citizen Pass",
            PassType::Pwd => "PWD Pass",
        }
    }

    /// Seeded price for this pass type, restored by the pricing reset.
    #[must_use]
    pub fn default_price(&self) -> f64 {
        match self {
            PassType::Express => 2300.00,
            PassType::Junior => 900.00,
            PassType::Regular => 1300.00,
            PassType::Student => 1300.00,
            PassType::SeniorCitizen => 900.00,
            PassType::Pwd => 900.00,
        }
    }
}

impl fmt::Display for PassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PassType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Express Pass" => Ok(PassType::Express),
            "Junior Pass" => Ok(PassType::Junior),
            "Regular Pass" => Ok(PassType::Regular),
            "Student Pass" => Ok(PassType::Student),
            "Senior Citizen Pass" => Ok(PassType::SeniorCitizen),
            "PWD Pass" => Ok(PassType::Pwd),
            other => Err(Error::UnknownPassType(other.to_string())),
        }
    }
}
