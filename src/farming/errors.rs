//! Error types for the rewards distributor

use odra::prelude::*;

#[odra::odra_error]
pub enum RewardsError {
    /// Caller is not the distributor admin
    Unauthorized = 300,
    /// Unknown pool id
    PoolNotFound = 301,
    /// A pool for this token already exists
    PoolAlreadyExists = 302,
    /// Token is not a share token of a registered node
    NotANodeToken = 303,
    /// The reward token cannot be staked for itself
    SelfReferentialPool = 304,
    /// Withdrawal larger than the caller's deposit
    InsufficientDeposit = 305,
    /// Contract paused
    ContractPaused = 306,
}
