//! Incentive farming - stake node shares to earn the reward token
//!
//! Emission is split across pools by weight and across depositors of a pool
//! by their share of the pool.

pub mod rewards_distributor;
pub mod errors;
pub mod events;

pub use rewards_distributor::{PoolInfo, RewardsDistributor, UserInfo};
pub use errors::RewardsError;
pub use events::*;
