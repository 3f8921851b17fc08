//! Events for the rewards distributor

use odra::prelude::*;
use odra::casper_types::U256;

/// Event emitted when node shares are deposited into a pool
#[odra::event]
pub struct Deposit {
    pub user: Address,
    pub pool_id: u32,
    pub amount: U256,
    pub timestamp: u64,
}

/// Event emitted when node shares are withdrawn from a pool
#[odra::event]
pub struct Withdraw {
    pub user: Address,
    pub pool_id: u32,
    pub amount: U256,
    pub timestamp: u64,
}

/// Event emitted when shares are pulled out without rewards
#[odra::event]
pub struct EmergencyWithdraw {
    pub user: Address,
    pub pool_id: u32,
    pub amount: U256,
    pub timestamp: u64,
}

/// Event emitted when rewards are paid out
#[odra::event]
pub struct RewardPaid {
    pub user: Address,
    pub pool_id: u32,
    pub reward_amount: U256,
    pub timestamp: u64,
}

/// Event emitted when a new pool is created
#[odra::event]
pub struct PoolAdded {
    pub pool_id: u32,
    pub staked_token: Address,
    pub weight: u64,
    pub created_by: Address,
}

/// Event emitted when a pool weight changes
#[odra::event]
pub struct PoolWeightSet {
    pub pool_id: u32,
    pub old_weight: u64,
    pub new_weight: u64,
    pub updated_by: Address,
}

/// Event emitted when the global emission rate changes
#[odra::event]
pub struct RewardRateUpdated {
    pub old_rate: U256,
    pub new_rate: U256,
    pub updated_by: Address,
}
