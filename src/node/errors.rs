//! Error types for lending nodes
//!
//! Codes are grouped by kind: authorization 1-9, lifecycle and state 10-39,
//! insufficient funds 40-59, slippage 60-69, cooldown and timing 70-79.

use odra::prelude::*;

#[odra::odra_error]
pub enum NodeError {
    /// Caller is not the node operator
    NotOperator = 1,
    /// Caller is not the registry that owns the node
    NotRegistry = 2,
    /// Caller is not the borrower of the loan
    NotBorrower = 3,

    /// Node has not been bound to an operator yet
    NodeNotBound = 10,
    /// Node was already bound
    AlreadyBound = 11,
    /// No bond is staked in the node
    InactiveNode = 12,
    /// Loan is not in the pending queue
    NoSuchPendingLoan = 13,
    /// Loan is no longer pending
    LoanNotPending = 14,
    /// Loan is not current
    LoanNotCurrent = 15,
    /// Loan was already written off
    AlreadyDefaulted = 16,
    /// Loan is not past its due date
    NotOverdue = 17,
    /// Unknown loan id
    LoanNotFound = 18,
    /// Loan terms are malformed
    InvalidLoanTerms = 19,
    /// Zero amount not allowed
    ZeroAmount = 20,
    /// Amount too small to mint a single share
    ZeroShares = 21,
    /// Shares exist but back no assets
    PoolInsolvent = 22,
    /// No slashed bond to sell
    NothingToSell = 23,
    /// No fees or yield to collect
    NoFeesToCollect = 24,
    /// Node has no yield vault configured
    NoYieldVault = 25,
    /// Caller has nothing unbonding
    NothingToUnstake = 26,
    /// Reentrancy guard
    Locked = 27,
    /// Operator bond must stay at the requirement while loans are outstanding
    OperatorBondLocked = 28,

    /// Not enough unlent base asset
    InsufficientLiquidity = 40,
    /// Caller holds fewer shares than requested
    InsufficientShares = 41,
    /// Caller's bonded balance is too small
    InsufficientBond = 42,
    /// Yield vault refused the collateral
    CollateralDepositFailed = 43,

    /// Disbursement or swap below the caller's minimum
    SlippageExceeded = 60,

    /// Unbonding cooldown still running
    CooldownNotElapsed = 70,
}
