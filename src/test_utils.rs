//! Deployment fixture shared by contract tests
use odra::casper_types::U256;
use odra::host::{Deployer, HostEnv, HostRef, NoArgs};
use odra::prelude::*;
use crate::adapters::exchange::{FixedRateExchange, FixedRateExchangeHostRef};
use crate::adapters::yield_vault::{SimpleYieldVault, SimpleYieldVaultHostRef};
use crate::constants::{DEFAULT_BOND_REQUIREMENT, YEAR_MS};
use crate::math::WAD;
use crate::node::lending_node::{LendingNode, LendingNodeHostRef, LendingNodeInitArgs};
use crate::registry::node_registry::{Registry, RegistryHostRef, RegistryInitArgs};
use crate::tokens::{AssetToken, AssetTokenHostRef, AssetTokenInitArgs};

pub const MONTH_MS: u64 = YEAR_MS / 12;
pub const RATE_BPS: u32 = 1_000;
pub const NUM_PAYMENTS: u32 = 12;

/// `n` whole tokens at 18 decimals
pub fn tokens(n: u64) -> U256 {
    U256::from(n) * U256::from(WAD)
}

/// `n` thousandths of a token
pub fn milli(n: u64) -> U256 {
    U256::from(n) * U256::from(WAD / 1_000)
}

pub fn bond_requirement() -> U256 {
    U256::from(DEFAULT_BOND_REQUIREMENT)
}

pub fn deploy_token(env: &HostEnv, symbol: &str) -> AssetTokenHostRef {
    AssetToken::deploy(
        env,
        AssetTokenInitArgs {
            name: String::from(symbol),
            symbol: String::from(symbol),
            decimals: 18,
        },
    )
}

/// A registry, one bound node and the tokens and adapters around them.
///
/// Account 0 deploys everything and mints; account 1 operates the node.
pub struct Protocol {
    pub env: HostEnv,
    pub admin: Address,
    pub operator: Address,
    pub depositor: Address,
    pub borrower: Address,
    pub staker: Address,
    pub agent: Address,
    pub treasury: Address,
    pub bond: AssetTokenHostRef,
    pub usd: AssetTokenHostRef,
    pub gold: AssetTokenHostRef,
    pub exchange: FixedRateExchangeHostRef,
    pub vault: SimpleYieldVaultHostRef,
    pub registry: RegistryHostRef,
    pub node: LendingNodeHostRef,
}

impl Protocol {
    pub fn deploy() -> Self {
        Self::deploy_with(false, 0)
    }

    pub fn deploy_with(collateral_locked: bool, grace_period: u64) -> Self {
        let env = odra_test::env();
        let admin = env.get_account(0);
        let operator = env.get_account(1);
        let treasury = env.get_account(9);

        let mut bond = deploy_token(&env, "BOND");
        let mut usd = deploy_token(&env, "USD");
        let mut gold = deploy_token(&env, "GOLD");
        let mut exchange = FixedRateExchange::deploy(&env, NoArgs);
        let mut vault = SimpleYieldVault::deploy(&env, NoArgs);

        let bond_address = bond.address().clone();
        let usd_address = usd.address().clone();
        let gold_address = gold.address().clone();
        let exchange_address = exchange.address().clone();

        vault.set_supported(gold_address, true);
        // 1 BOND = 0.001 USD, 1 GOLD = 1 USD
        exchange.set_rate(bond_address, usd_address, U256::from(WAD / 1_000));
        exchange.set_rate(usd_address, bond_address, U256::from(WAD * 1_000));
        exchange.set_rate(gold_address, usd_address, U256::from(WAD));
        bond.mint(exchange_address, tokens(1_000_000_000));
        usd.mint(exchange_address, tokens(1_000_000_000));
        gold.mint(admin, tokens(1_000));

        let mut registry = Registry::deploy(
            &env,
            RegistryInitArgs {
                bond_token: bond_address,
                bond_requirement: bond_requirement(),
                exchange: exchange_address,
                yield_vault: Some(vault.address().clone()),
                treasury,
            },
        );
        registry.whitelist_token(usd_address, true);

        let node = LendingNode::deploy(
            &env,
            LendingNodeInitArgs { registry: registry.address().clone() },
        );
        bond.mint(operator, bond_requirement());
        env.set_caller(operator);
        bond.approve(registry.address().clone(), bond_requirement());
        registry.create_node(node.address().clone(), usd_address, collateral_locked, grace_period);
        env.set_caller(admin);

        Self {
            admin,
            operator,
            depositor: env.get_account(2),
            borrower: env.get_account(3),
            staker: env.get_account(4),
            agent: env.get_account(8),
            treasury,
            env,
            bond,
            usd,
            gold,
            exchange,
            vault,
            registry,
            node,
        }
    }

    /// Deploy and register another node for `operator` on the same base asset
    pub fn add_node(&mut self, operator: Address) -> LendingNodeHostRef {
        let registry = self.registry.address().clone();
        let node = LendingNode::deploy(&self.env, LendingNodeInitArgs { registry });
        self.mint_bond(operator, bond_requirement());
        self.env.set_caller(operator);
        self.bond.approve(registry, bond_requirement());
        self.registry
            .create_node(node.address().clone(), self.usd.address().clone(), false, 0);
        self.env.set_caller(self.admin);
        node
    }

    pub fn node_address(&self) -> Address {
        self.node.address().clone()
    }

    pub fn mint_usd(&mut self, to: Address, amount: U256) {
        self.env.set_caller(self.admin);
        self.usd.mint(to, amount);
    }

    pub fn mint_bond(&mut self, to: Address, amount: U256) {
        self.env.set_caller(self.admin);
        self.bond.mint(to, amount);
    }

    pub fn mint_gold(&mut self, to: Address, amount: U256) {
        self.env.set_caller(self.admin);
        self.gold.mint(to, amount);
    }

    /// Fund `account` and deposit `amount` of base asset
    pub fn deposit(&mut self, account: Address, amount: U256) -> U256 {
        self.mint_usd(account, amount);
        let node = self.node_address();
        self.env.set_caller(account);
        self.usd.approve(node, amount);
        let shares = self.node.deposit(amount);
        self.env.set_caller(self.admin);
        shares
    }

    /// Fund `account` and stake `amount` of bond
    pub fn stake(&mut self, account: Address, amount: U256) -> U256 {
        self.mint_bond(account, amount);
        let node = self.node_address();
        self.env.set_caller(account);
        self.bond.approve(node, amount);
        let shares = self.node.stake(amount);
        self.env.set_caller(self.admin);
        shares
    }

    /// Request a 12-payment monthly loan at 10% APR from the borrower
    pub fn request_loan(
        &mut self,
        principal: U256,
        interest_only: bool,
        collateral: Option<U256>,
    ) -> u64 {
        let borrower = self.borrower;
        let node = self.node_address();
        let collateral_token = collateral.map(|_| self.gold.address().clone());
        if let Some(amount) = collateral {
            self.mint_gold(borrower, amount);
            self.env.set_caller(borrower);
            self.gold.approve(node, amount);
        }
        self.env.set_caller(borrower);
        let loan_id = self.node.request_loan(
            principal,
            MONTH_MS,
            NUM_PAYMENTS,
            RATE_BPS,
            interest_only,
            collateral_token,
            collateral.unwrap_or_default(),
            self.agent,
            String::from("Test"),
        );
        self.env.set_caller(self.admin);
        loan_id
    }

    pub fn approve_loan(&mut self, loan_id: u64) {
        self.env.set_caller(self.operator);
        self.node.approve_loan(loan_id, U256::zero());
        self.env.set_caller(self.admin);
    }

    /// Fund the borrower with exactly the next installment and pay it
    pub fn pay(&mut self, loan_id: u64) -> U256 {
        let amount = self.node.next_payment(loan_id);
        let borrower = self.borrower;
        let node = self.node_address();
        self.mint_usd(borrower, amount);
        self.env.set_caller(borrower);
        self.usd.approve(node, amount);
        let paid = self.node.make_loan_payment(loan_id);
        self.env.set_caller(self.admin);
        paid
    }

    /// Step past the loan's current due date
    pub fn skip_past_due(&self, loan_id: u64) {
        let due = self.node.next_due_date(loan_id);
        let now = self.env.block_time();
        if due >= now {
            self.env.advance_block_time(due - now + 1);
        }
    }
}
