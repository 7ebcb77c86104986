mod models;
mod pass_type;

pub use models::*;
pub use pass_type::{PARK_WIDE_CAP, PassType};
