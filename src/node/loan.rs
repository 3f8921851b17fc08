//! Loan records and repayment schedule

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::MathError;
use crate::math::{LoanMath, SafeMath};

/// Lifecycle of a loan. Transitions only move forward:
/// Pending -> Current -> Repaid | Defaulted, or Pending -> Cancelled.
#[odra::odra_type]
pub enum LoanStatus {
    Pending = 0,
    Current = 1,
    Repaid = 2,
    Defaulted = 3,
    /// Request rejected by the operator or withdrawn by the borrower
    Cancelled = 4,
}

#[odra::odra_type]
pub struct Loan {
    pub id: u64,
    pub borrower: Address,
    /// Receives the agent fee on approval
    pub agent: Address,
    pub principal: U256,
    pub outstanding_principal: U256,
    /// Milliseconds between installments
    pub payment_interval: u64,
    pub num_payments: u32,
    pub remaining_payments: u32,
    /// Annual rate in basis points
    pub interest_rate_bps: u32,
    pub interest_only: bool,
    /// Level installment, fixed on approval
    pub payment_amount: U256,
    pub collateral_token: Option<Address>,
    pub collateral_amount: U256,
    /// Collateral is parked in the yield vault rather than held by the node
    pub collateral_in_vault: bool,
    pub requested_at: u64,
    pub next_due_date: u64,
    pub status: LoanStatus,
    pub message: String,
}

/// Split of a single payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Installment {
    pub principal: U256,
    pub interest: U256,
}

impl Installment {
    pub fn total(&self) -> Result<U256, MathError> {
        SafeMath::add(self.principal, self.interest)
    }
}

impl Loan {
    pub fn is_current(&self) -> bool {
        self.status == LoanStatus::Current
    }

    pub fn has_collateral(&self) -> bool {
        self.collateral_token.is_some() && !self.collateral_amount.is_zero()
    }

    /// Interest on the outstanding principal for one interval
    pub fn period_interest(&self) -> Result<U256, MathError> {
        LoanMath::period_interest(
            self.outstanding_principal,
            self.interest_rate_bps,
            self.payment_interval,
        )
    }

    /// Level installment for a fresh loan with these terms
    pub fn scheduled_payment(&self) -> Result<U256, MathError> {
        if self.interest_only {
            return LoanMath::period_interest(self.principal, self.interest_rate_bps, self.payment_interval);
        }
        LoanMath::level_payment(
            self.principal,
            self.interest_rate_bps,
            self.payment_interval,
            self.num_payments,
        )
    }

    /// Amounts due on the next installment.
    ///
    /// The last installment always settles the remaining principal exactly.
    pub fn next_installment(&self) -> Result<Installment, MathError> {
        let interest = self.period_interest()?;
        let principal = if self.remaining_payments <= 1 {
            self.outstanding_principal
        } else if self.interest_only {
            U256::zero()
        } else {
            self.payment_amount
                .saturating_sub(interest)
                .min(self.outstanding_principal)
        };
        Ok(Installment { principal, interest })
    }

    /// Full principal plus one interval of interest
    pub fn early_settlement(&self) -> Result<Installment, MathError> {
        Ok(Installment {
            principal: self.outstanding_principal,
            interest: self.period_interest()?,
        })
    }
}
