mod helpers;
mod middleware;
mod token;

pub use middleware::{RequireAdmin, RequireEmployee};
pub use token::{TokenGenerator, parse_token};
