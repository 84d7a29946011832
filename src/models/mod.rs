//! Data models for the employee agreement backend.
//!
//! Field names follow the camelCase JSON the HTTP clients exchange.

mod agreement;
mod listing;
mod timestamp;

pub use agreement::*;
pub use listing::*;
pub use timestamp::*;
