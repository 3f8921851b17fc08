//! Events for the node registry

use odra::prelude::*;
use odra::casper_types::U256;

/// Event emitted when a node is bound to an operator
#[odra::event]
pub struct NodeCreated {
    pub node: Address,
    pub operator: Address,
    pub base_asset: Address,
    pub bond_amount: U256,
    pub node_count: u32,
}

/// Event emitted when a base asset is allowed or disallowed
#[odra::event]
pub struct TokenWhitelisted {
    pub token: Address,
    pub allowed: bool,
}

#[odra::event]
pub struct AdminTransferred {
    pub previous_admin: Address,
    pub new_admin: Address,
}
