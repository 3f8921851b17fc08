//! Events for lending nodes

use odra::prelude::*;
use odra::casper_types::U256;

/// Event emitted when the registry binds the node to its operator
#[odra::event]
pub struct NodeBound {
    pub operator: Address,
    pub base_asset: Address,
    pub bond_token: Address,
    pub bond_amount: U256,
    pub timestamp: u64,
}

/// Event emitted when base asset is deposited
#[odra::event]
pub struct Deposited {
    pub account: Address,
    pub amount: U256,
    pub shares: U256,
    pub timestamp: u64,
}

/// Event emitted when shares are redeemed
#[odra::event]
pub struct Withdrawn {
    pub account: Address,
    pub amount: U256,
    pub shares: U256,
    pub timestamp: u64,
}

/// Event emitted when bond is staked
#[odra::event]
pub struct BondStaked {
    pub account: Address,
    pub amount: U256,
    pub staking_shares: U256,
    pub timestamp: u64,
}

/// Event emitted when bond enters the unbonding pool
#[odra::event]
pub struct UnstakeInitiated {
    pub account: Address,
    pub amount: U256,
    pub unbonding_shares: U256,
    pub available_at: u64,
}

/// Event emitted when unbonded bond is claimed
#[odra::event]
pub struct BondUnstaked {
    pub account: Address,
    pub amount: U256,
    pub timestamp: u64,
}

#[odra::event]
pub struct LoanRequested {
    pub loan_id: u64,
    pub borrower: Address,
    pub principal: U256,
    pub collateral_token: Option<Address>,
    pub collateral_amount: U256,
    pub timestamp: u64,
}

#[odra::event]
pub struct LoanApproved {
    pub loan_id: u64,
    pub borrower: Address,
    pub principal: U256,
    pub treasury_fee: U256,
    pub agent_fee: U256,
    pub disbursed: U256,
    pub next_due_date: u64,
}

/// Event emitted when a pending request is rejected or withdrawn
#[odra::event]
pub struct LoanCancelled {
    pub loan_id: u64,
    pub borrower: Address,
    pub collateral_returned: U256,
    pub timestamp: u64,
}

#[odra::event]
pub struct LoanPaymentMade {
    pub loan_id: u64,
    pub payer: Address,
    pub principal_paid: U256,
    pub interest_paid: U256,
    pub fee_withheld: U256,
    pub remaining_payments: u32,
    pub timestamp: u64,
}

#[odra::event]
pub struct LoanRepaid {
    pub loan_id: u64,
    pub borrower: Address,
    pub timestamp: u64,
}

/// Event emitted when an overdue loan is written off
#[odra::event]
pub struct LoanSlashed {
    pub loan_id: u64,
    pub written_off: U256,
    pub collateral_proceeds: U256,
    pub loss: U256,
    pub bond_slashed: U256,
    pub timestamp: u64,
}

/// Event emitted when a slash empties a bond pool and its shares are retired
#[odra::event]
pub struct BondPoolWipedOut {
    pub unbonding: bool,
    pub retired_shares: U256,
    pub epoch: u32,
    pub timestamp: u64,
}

#[odra::event]
pub struct SlashedBondSold {
    pub bond_amount: U256,
    pub proceeds: U256,
    pub timestamp: u64,
}

#[odra::event]
pub struct FeesCollected {
    pub operator_amount: U256,
    pub staker_amount: U256,
    pub bond_bought: U256,
    pub timestamp: u64,
}

#[odra::event]
pub struct CollateralYieldCollected {
    pub token: Address,
    pub yield_amount: U256,
    pub base_amount: U256,
    pub timestamp: u64,
}
