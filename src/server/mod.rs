mod admin;
mod counter;
pub mod dto;
pub mod response;
mod router;
pub mod validation;

pub use admin::admin_router;
pub use counter::counter_router;
pub use router::{AppState, create_router};
