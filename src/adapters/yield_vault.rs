//! Yield source capability for parked collateral

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use super::errors::AdapterError;
use super::events::{VaultDeposited, VaultWithdrawn, YieldAccrued};
use crate::token::Cep18TokenContractRef;

/// Yield source required by lending nodes holding collateral
#[odra::external_contract]
pub trait YieldVault {
    /// Park `amount` of `token` (pre-approved by the caller); `false` means the token was refused
    fn deposit(&mut self, token: Address, amount: U256) -> bool;

    /// Withdraw up to `amount` of `token`, returning what was actually paid
    fn withdraw(&mut self, token: Address, amount: U256) -> U256;

    /// Current position of `holder` in `token`, principal plus yield
    fn balance_of(&self, token: Address, holder: Address) -> U256;
}

/// Per-holder token positions with admin-credited yield
#[odra::module]
pub struct SimpleYieldVault {
    /// Admin address
    admin: Var<Address>,
    /// Tokens the vault accepts
    supported: Mapping<Address, bool>,
    /// (token, holder) -> position
    positions: Mapping<(Address, Address), U256>,
}

#[odra::module]
impl SimpleYieldVault {
    pub fn init(&mut self) {
        let caller = self.env().caller();
        self.admin.set(caller);
    }

    /// Allow or refuse deposits of `token` (admin only)
    pub fn set_supported(&mut self, token: Address, supported: bool) {
        self.only_admin();
        self.supported.set(&token, supported);
    }

    pub fn is_supported(&self, token: Address) -> bool {
        self.supported.get(&token).unwrap_or_default()
    }

    pub fn deposit(&mut self, token: Address, amount: U256) -> bool {
        if !self.is_supported(token) || amount.is_zero() {
            return false;
        }
        let holder = self.env().caller();
        let this = self.env().self_address();
        Cep18TokenContractRef::new(self.env(), token).transfer_from(holder, this, amount);

        let position = self.balance_of(token, holder);
        self.positions.set(&(token, holder), position + amount);

        self.env().emit_event(VaultDeposited { holder, token, amount });
        true
    }

    pub fn withdraw(&mut self, token: Address, amount: U256) -> U256 {
        let holder = self.env().caller();
        let position = self.balance_of(token, holder);
        let paid = amount.min(position);
        if paid.is_zero() {
            return paid;
        }
        self.positions.set(&(token, holder), position - paid);
        Cep18TokenContractRef::new(self.env(), token).transfer(holder, paid);

        self.env().emit_event(VaultWithdrawn { holder, token, amount: paid });
        paid
    }

    pub fn balance_of(&self, token: Address, holder: Address) -> U256 {
        self.positions.get(&(token, holder)).unwrap_or_default()
    }

    /// Fund `amount` of yield from the admin's balance into `holder`'s position
    pub fn accrue_yield(&mut self, token: Address, holder: Address, amount: U256) {
        self.only_admin();
        if amount.is_zero() {
            self.env().revert(AdapterError::ZeroAmount);
        }
        let admin = self.env().caller();
        let this = self.env().self_address();
        Cep18TokenContractRef::new(self.env(), token).transfer_from(admin, this, amount);

        let position = self.balance_of(token, holder);
        self.positions.set(&(token, holder), position + amount);

        self.env().emit_event(YieldAccrued { holder, token, amount });
    }

    fn only_admin(&self) {
        let admin = self.admin.get_or_revert_with(AdapterError::NotAdmin);
        if self.env().caller() != admin {
            self.env().revert(AdapterError::NotAdmin);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::{AssetToken, AssetTokenInitArgs};
    use odra::host::{Deployer, HostRef, NoArgs};

    #[test]
    fn test_refuses_unsupported_token() {
        let env = odra_test::env();
        let mut vault = SimpleYieldVault::deploy(&env, NoArgs);
        let token = AssetToken::deploy(
            &env,
            AssetTokenInitArgs { name: String::from("Gold"), symbol: String::from("GLD"), decimals: 18 },
        );

        assert!(!vault.deposit(token.address().clone(), U256::from(10)));
        assert_eq!(vault.balance_of(token.address().clone(), env.get_account(0)), U256::zero());
    }

    #[test]
    fn test_deposit_yield_and_withdraw() {
        let env = odra_test::env();
        let admin = env.get_account(0);
        let holder = env.get_account(1);
        let mut vault = SimpleYieldVault::deploy(&env, NoArgs);
        let mut token = AssetToken::deploy(
            &env,
            AssetTokenInitArgs { name: String::from("Gold"), symbol: String::from("GLD"), decimals: 18 },
        );
        let token_address = token.address().clone();
        let vault_address = vault.address().clone();

        vault.set_supported(token_address, true);
        token.mint(holder, U256::from(100));
        token.mint(admin, U256::from(5));

        env.set_caller(holder);
        token.approve(vault_address, U256::from(100));
        assert!(vault.deposit(token_address, U256::from(100)));

        env.set_caller(admin);
        token.approve(vault_address, U256::from(5));
        vault.accrue_yield(token_address, holder, U256::from(5));
        assert_eq!(vault.balance_of(token_address, holder), U256::from(105));

        // Asking for more than the position pays the position
        env.set_caller(holder);
        let paid = vault.withdraw(token_address, U256::from(1_000));
        assert_eq!(paid, U256::from(105));
        assert_eq!(token.balance_of(holder), U256::from(105));
        assert_eq!(vault.balance_of(token_address, holder), U256::zero());
    }
}
