//! Engine for wallet activity and historical balance queries against an
//! Ethereum JSON-RPC node: locate blocks by timestamp, scan height ranges
//! for transactions touching an address, and resolve display names
//! through a process-wide reverse-lookup cache.
pub mod chain;
pub mod ens;
pub mod error;
pub mod locator;
pub mod scanner;
pub mod units;

pub use error::{CoreError as Error, Result};
