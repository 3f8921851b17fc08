//! Errors shared by the token and arithmetic layers
use odra::prelude::*;

/// Arithmetic failures raised by the fixed-point helpers
#[odra::odra_error]
pub enum MathError {
    /// Result does not fit in 256 bits
    Overflow = 80,

    /// Subtraction went below zero
    Underflow = 81,

    /// Division by zero
    DivisionByZero = 82,
}

/// Errors raised by the CEP-18 token implementations
#[odra::odra_error]
pub enum TokenError {
    /// Insufficient allowance for transfer
    InsufficientAllowance = 100,

    /// Insufficient balance for operation
    InsufficientBalance = 101,

    /// Caller may not mint
    NotMinter = 102,
}
