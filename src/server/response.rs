use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::error::{Error, Result as StoreResult};

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Paginated response for list endpoints
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T: Serialize> PaginatedResponse<T> {
    #[must_use]
    pub fn new(data: Vec<T>, next_cursor: Option<String>, has_more: bool) -> Self {
        Self {
            data,
            next_cursor,
            has_more,
        }
    }
}

/// API error that converts to a proper HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    /// Maps domain errors onto HTTP statuses. The availability and
    /// cancellation errors carry user-facing detail, so their display
    /// strings go straight into the body.
    #[must_use]
    pub fn from_store(err: Error) -> Self {
        match err {
            Error::InsufficientAvailability { .. }
            | Error::AlreadyExists
            | Error::DuplicateCancellation
            | Error::CancellationResolved => Self::conflict(err.to_string()),
            Error::NotFound | Error::TicketNotFound => Self::not_found(err.to_string()),
            Error::CancellationMismatch(_)
            | Error::UnknownPassType(_)
            | Error::BadRequest(_) => Self::bad_request(err.to_string()),
            other => {
                tracing::error!("store error: {other}");
                Self::internal("Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "data": null, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Helper to paginate a slice and determine if there are more results
pub fn paginate<T, F>(items: Vec<T>, limit: usize, get_cursor: F) -> (Vec<T>, Option<String>, bool)
where
    F: Fn(&T) -> String,
{
    let has_more = items.len() > limit;
    let items: Vec<T> = items.into_iter().take(limit).collect();
    let next_cursor = if has_more {
        items.last().map(&get_cursor)
    } else {
        None
    };
    (items, next_cursor, has_more)
}

pub const DEFAULT_PAGE_SIZE: i32 = 50;

/// Extension trait for converting store results to API errors with a custom message.
pub trait StoreResultExt<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|_| ApiError::internal(message))
    }
}

/// Extension for Option types from store operations.
pub trait StoreOptionExt<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreOptionExt<T> for Option<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PassType;

    #[test]
    fn test_paginate_with_more_results() {
        let items = vec![1, 2, 3, 4];
        let (page, cursor, has_more) = paginate(items, 3, |i| i.to_string());
        assert_eq!(page, vec![1, 2, 3]);
        assert_eq!(cursor.as_deref(), Some("3"));
        assert!(has_more);
    }

    #[test]
    fn test_paginate_last_page() {
        let items = vec![1, 2];
        let (page, cursor, has_more) = paginate(items, 3, |i| i.to_string());
        assert_eq!(page, vec![1, 2]);
        assert!(cursor.is_none());
        assert!(!has_more);
    }

    #[test]
    fn test_insufficient_availability_maps_to_conflict() {
        let err = ApiError::from_store(Error::InsufficientAvailability {
            pass_type: PassType::Regular,
            available: 6,
        });
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert!(err.message.contains("6"));
    }

    #[test]
    fn test_mismatch_maps_to_bad_request() {
        let err = ApiError::from_store(Error::CancellationMismatch("email".to_string()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_api_err_replaces_store_error() {
        let failed: StoreResult<()> = Err(Error::BadRequest("detail".to_string()));
        let err = failed.api_err("Failed to list sales").unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Failed to list sales");

        let ok: StoreResult<i32> = Ok(7);
        assert_eq!(ok.api_err("unused").unwrap(), 7);
    }

    #[test]
    fn test_or_not_found_on_missing_row() {
        let missing: Option<i32> = None;
        let err = missing.or_not_found("Ticket not found").unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Ticket not found");

        assert_eq!(Some(3).or_not_found("unused").unwrap(), 3);
    }
}
