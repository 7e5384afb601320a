//! HTTP surface for wallet activity and historical balance queries: two
//! POST operations over a shared chain client and name cache.
pub mod api;
pub mod error;
mod serve;

pub use error::{Result, ServerError as Error};
pub use serve::*;
