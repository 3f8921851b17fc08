//! CEP-18 share ledger embedded in lending nodes
//! Node shares are ordinary fungible tokens so they can be moved and staked elsewhere
use odra::prelude::*;
use odra::casper_types::U256;
use crate::events::{Transfer, Approval};
use crate::errors::TokenError;

/// Share token implementing the CEP-18 surface; supply is controlled by the owning module
#[odra::module]
pub struct ShareToken {
    /// Token name
    name: Var<String>,
    /// Token symbol
    symbol: Var<String>,
    /// Token decimals, mirrors the underlying asset
    decimals: Var<u8>,
    /// Total shares outstanding
    total_supply: Var<U256>,
    /// Balance mapping: owner -> shares
    balances: Mapping<Address, U256>,
    /// Allowance mapping: (owner, spender) -> amount
    allowances: Mapping<(Address, Address), U256>,
}

#[odra::module]
impl ShareToken {
    /// Initialize token metadata
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.name.set(name);
        self.symbol.set(symbol);
        self.decimals.set(decimals);
        self.total_supply.set(U256::zero());
    }

    pub fn name(&self) -> String {
        self.name.get_or_default()
    }

    pub fn symbol(&self) -> String {
        self.symbol.get_or_default()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get_or_default()
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply.get_or_default()
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(&owner).unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or_default()
    }

    /// Transfer shares to another address
    pub fn transfer(&mut self, to: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        self.move_balance(caller, to, amount);
        true
    }

    /// Approve a spender to move the caller's shares
    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        self.set_allowance(caller, spender, amount);
        true
    }

    /// Transfer shares on behalf of `from` (requires approval)
    pub fn transfer_from(&mut self, from: Address, to: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        let current_allowance = self.allowance(from, caller);
        if current_allowance < amount {
            self.env().revert(TokenError::InsufficientAllowance);
        }
        self.set_allowance(from, caller, current_allowance - amount);
        self.move_balance(from, to, amount);
        true
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: U256) {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            self.env().revert(TokenError::InsufficientBalance);
        }
        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances.set(&to, to_balance + amount);

        self.env().emit_event(Transfer { from, to, value: amount });
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.set(&(owner, spender), amount);
        self.env().emit_event(Approval { owner, spender, value: amount });
    }
}

// Supply changes are reachable only from the module that embeds the ledger.
impl ShareToken {
    pub fn mint(&mut self, to: Address, amount: U256) {
        let supply = self.total_supply();
        self.total_supply.set(supply + amount);
        let balance = self.balance_of(to);
        self.balances.set(&to, balance + amount);

        self.env().emit_event(Transfer {
            from: self.env().self_address(),
            to,
            value: amount,
        });
    }

    pub fn burn(&mut self, from: Address, amount: U256) {
        let balance = self.balance_of(from);
        if balance < amount {
            self.env().revert(TokenError::InsufficientBalance);
        }
        self.balances.set(&from, balance - amount);
        let supply = self.total_supply();
        self.total_supply.set(supply - amount);

        self.env().emit_event(Transfer {
            from,
            to: self.env().self_address(),
            value: amount,
        });
    }
}

/// External token interface for interacting with CEP-18 tokens
#[odra::external_contract]
pub trait Cep18Token {
    /// Get the balance of an address
    fn balance_of(&self, owner: Address) -> U256;

    /// Transfer tokens
    fn transfer(&mut self, to: Address, amount: U256) -> bool;

    /// Transfer tokens from another address
    fn transfer_from(&mut self, from: Address, to: Address, amount: U256) -> bool;

    /// Approve a spender
    fn approve(&mut self, spender: Address, amount: U256) -> bool;

    /// Get allowance
    fn allowance(&self, owner: Address, spender: Address) -> U256;

    /// Get total supply
    fn total_supply(&self) -> U256;

    /// Get token decimals
    fn decimals(&self) -> u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use odra::host::{Deployer, HostEnv};

    fn setup() -> (HostEnv, ShareTokenHostRef) {
        let env = odra_test::env();
        let init_args = ShareTokenInitArgs {
            name: String::from("Node Share"),
            symbol: String::from("NSHARE"),
            decimals: 6,
        };
        let token = ShareToken::deploy(&env, init_args);
        (env, token)
    }

    #[test]
    fn test_init() {
        let (_, token) = setup();
        assert_eq!(token.name(), "Node Share");
        assert_eq!(token.symbol(), "NSHARE");
        assert_eq!(token.decimals(), 6);
        assert_eq!(token.total_supply(), U256::zero());
    }

    #[test]
    fn test_transfer_without_balance_fails() {
        let (env, mut token) = setup();
        let holder = env.get_account(1);

        assert_eq!(
            token.try_transfer(holder, U256::from(1)),
            Err(TokenError::InsufficientBalance.into())
        );
    }

    #[test]
    fn test_transfer_from_requires_allowance() {
        let (env, mut token) = setup();
        let owner = env.get_account(0);
        let spender = env.get_account(1);

        env.set_caller(spender);
        assert_eq!(
            token.try_transfer_from(owner, spender, U256::from(1)),
            Err(TokenError::InsufficientAllowance.into())
        );

        env.set_caller(owner);
        token.approve(spender, U256::from(10));
        assert_eq!(token.allowance(owner, spender), U256::from(10));
    }
}
