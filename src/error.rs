use thiserror::Error;

use crate::types::PassType;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("token lookup collision")]
    TokenLookupCollision,

    #[error("ticket id collision")]
    TicketIdCollision,

    #[error("not enough {pass_type} tickets available: only {available} more can be sold")]
    InsufficientAvailability { pass_type: PassType, available: i64 },

    #[error("ticket not found")]
    TicketNotFound,

    #[error("a cancellation for this ticket already exists")]
    DuplicateCancellation,

    #[error("cancellation details do not match the original purchase: {0}")]
    CancellationMismatch(String),

    #[error("cancellation is already resolved")]
    CancellationResolved,

    #[error("unknown pass type: {0}")]
    UnknownPassType(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid token format")]
    InvalidTokenFormat,

    #[error("bad request: {0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, Error>;
