//! Error types for the exchange and yield vault adapters

use odra::prelude::*;

#[odra::odra_error]
pub enum AdapterError {
    /// Caller is not the adapter admin
    NotAdmin = 400,
    /// No rate configured for the token pair
    UnsupportedPair = 401,
    /// Swap output below the caller's minimum
    SlippageExceeded = 402,
    /// Rate must be positive
    InvalidRate = 403,
    /// Zero amount not allowed
    ZeroAmount = 404,
}
