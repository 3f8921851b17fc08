//! Events for the exchange and yield vault adapters

use odra::prelude::*;
use odra::casper_types::U256;

/// Event emitted when a fixed swap rate is configured
#[odra::event]
pub struct RateSet {
    pub token_in: Address,
    pub token_out: Address,
    pub rate: U256,
}

/// Event emitted on every swap
#[odra::event]
pub struct Swapped {
    pub sender: Address,
    pub token_in: Address,
    pub amount_in: U256,
    pub token_out: Address,
    pub amount_out: U256,
    pub recipient: Address,
}

/// Event emitted when a holder parks tokens in the vault
#[odra::event]
pub struct VaultDeposited {
    pub holder: Address,
    pub token: Address,
    pub amount: U256,
}

/// Event emitted when a holder pulls tokens out of the vault
#[odra::event]
pub struct VaultWithdrawn {
    pub holder: Address,
    pub token: Address,
    pub amount: U256,
}

/// Event emitted when yield is credited to a position
#[odra::event]
pub struct YieldAccrued {
    pub holder: Address,
    pub token: Address,
    pub amount: U256,
}
