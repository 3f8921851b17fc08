//! Deployable CEP-18 asset token
//! Used for base assets, the bond token, collateral and incentive tokens in local deployments and tests
use odra::prelude::*;
use odra::casper_types::U256;
use crate::events::{Transfer, Approval};
use crate::errors::TokenError;

/// Mintable fungible token; only the deployer may mint
#[odra::module]
pub struct AssetToken {
    name: Var<String>,
    symbol: Var<String>,
    decimals: Var<u8>,
    total_supply: Var<U256>,
    balances: Mapping<Address, U256>,
    allowances: Mapping<(Address, Address), U256>,
    minter: Var<Address>,
}

#[odra::module]
impl AssetToken {
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.name.set(name);
        self.symbol.set(symbol);
        self.decimals.set(decimals);
        self.total_supply.set(U256::zero());
        let deployer = self.env().caller();
        self.minter.set(deployer);
    }

    pub fn name(&self) -> String { self.name.get_or_default() }
    pub fn symbol(&self) -> String { self.symbol.get_or_default() }
    pub fn decimals(&self) -> u8 { self.decimals.get_or_default() }
    pub fn total_supply(&self) -> U256 { self.total_supply.get_or_default() }
    pub fn balance_of(&self, owner: Address) -> U256 { self.balances.get(&owner).unwrap_or_default() }
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 { self.allowances.get(&(owner, spender)).unwrap_or_default() }

    pub fn transfer(&mut self, to: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        self.transfer_internal(caller, to, amount);
        true
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        self.approve_internal(caller, spender, amount);
        true
    }

    pub fn transfer_from(&mut self, from: Address, to: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        let current_allowance = self.allowance(from, caller);
        if current_allowance < amount { self.env().revert(TokenError::InsufficientAllowance); }
        self.approve_internal(from, caller, current_allowance - amount);
        self.transfer_internal(from, to, amount);
        true
    }

    /// Mint new tokens; restricted to the minter
    pub fn mint(&mut self, to: Address, amount: U256) {
        if self.env().caller() != self.minter() {
            self.env().revert(TokenError::NotMinter);
        }
        let current_supply = self.total_supply();
        self.total_supply.set(current_supply + amount);
        let current_balance = self.balance_of(to);
        self.balances.set(&to, current_balance + amount);
        self.env().emit_event(Transfer { from: self.env().self_address(), to, value: amount });
    }

    /// Burn the caller's tokens
    pub fn burn(&mut self, amount: U256) {
        let from = self.env().caller();
        let current_balance = self.balance_of(from);
        if current_balance < amount { self.env().revert(TokenError::InsufficientBalance); }
        self.balances.set(&from, current_balance - amount);
        let current_supply = self.total_supply();
        self.total_supply.set(current_supply - amount);
        self.env().emit_event(Transfer { from, to: self.env().self_address(), value: amount });
    }

    pub fn minter(&self) -> Address {
        self.minter.get_or_revert_with(TokenError::NotMinter)
    }

    fn transfer_internal(&mut self, from: Address, to: Address, amount: U256) {
        let from_balance = self.balance_of(from);
        if from_balance < amount { self.env().revert(TokenError::InsufficientBalance); }
        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances.set(&to, to_balance + amount);
        self.env().emit_event(Transfer { from, to, value: amount });
    }

    fn approve_internal(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.set(&(owner, spender), amount);
        self.env().emit_event(Approval { owner, spender, value: amount });
    }
}
