//! Token exchange capability and a fixed-rate reference implementation
//!
//! Nodes swap collateral, slashed bond and fee income through `Exchange`.
//! `FixedRateExchange` quotes admin-set prices and pays out of its own
//! inventory, so swaps are fully deterministic.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use super::errors::AdapterError;
use super::events::{RateSet, Swapped};
use crate::math::{SafeMath, WAD};
use crate::token::Cep18TokenContractRef;

/// Swap capability required by lending nodes
#[odra::external_contract]
pub trait Exchange {
    /// Sell `amount_in` of `token_in` (pre-approved by the caller) for at least
    /// `min_amount_out` of `token_out`, delivered to `recipient`
    fn swap(
        &mut self,
        token_in: Address,
        amount_in: U256,
        token_out: Address,
        min_amount_out: U256,
        recipient: Address,
    ) -> U256;
}

/// Exchange quoting fixed prices (1e18-scaled `token_out` per `token_in`)
#[odra::module]
pub struct FixedRateExchange {
    /// Admin address
    admin: Var<Address>,
    /// (token_in, token_out) -> price scaled by 1e18
    rates: Mapping<(Address, Address), U256>,
}

#[odra::module]
impl FixedRateExchange {
    pub fn init(&mut self) {
        let caller = self.env().caller();
        self.admin.set(caller);
    }

    /// Set the price of `token_in` in `token_out` (admin only)
    pub fn set_rate(&mut self, token_in: Address, token_out: Address, rate: U256) {
        self.only_admin();
        if rate.is_zero() {
            self.env().revert(AdapterError::InvalidRate);
        }
        self.rates.set(&(token_in, token_out), rate);

        self.env().emit_event(RateSet { token_in, token_out, rate });
    }

    pub fn rate(&self, token_in: Address, token_out: Address) -> U256 {
        self.rates.get(&(token_in, token_out)).unwrap_or_default()
    }

    /// Output amount for `amount_in` at the configured price
    pub fn quote(&self, token_in: Address, amount_in: U256, token_out: Address) -> U256 {
        let rate = self.rate(token_in, token_out);
        if rate.is_zero() {
            self.env().revert(AdapterError::UnsupportedPair);
        }
        SafeMath::mul_div(amount_in, rate, U256::from(WAD))
            .unwrap_or_else(|e| self.env().revert(e))
    }

    pub fn swap(
        &mut self,
        token_in: Address,
        amount_in: U256,
        token_out: Address,
        min_amount_out: U256,
        recipient: Address,
    ) -> U256 {
        if amount_in.is_zero() {
            self.env().revert(AdapterError::ZeroAmount);
        }
        let amount_out = self.quote(token_in, amount_in, token_out);
        if amount_out < min_amount_out {
            self.env().revert(AdapterError::SlippageExceeded);
        }

        let sender = self.env().caller();
        let this = self.env().self_address();
        Cep18TokenContractRef::new(self.env(), token_in).transfer_from(sender, this, amount_in);
        Cep18TokenContractRef::new(self.env(), token_out).transfer(recipient, amount_out);

        self.env().emit_event(Swapped {
            sender,
            token_in,
            amount_in,
            token_out,
            amount_out,
            recipient,
        });
        amount_out
    }

    fn only_admin(&self) {
        let admin = self.admin.get_or_revert_with(AdapterError::NotAdmin);
        if self.env().caller() != admin {
            self.env().revert(AdapterError::NotAdmin);
        }
    }
}
