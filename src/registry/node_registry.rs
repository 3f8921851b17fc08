//! Registry contract for lending nodes
//!
//! The Registry is responsible for:
//! - Binding operator-deployed nodes to their operator and base asset
//! - Locking the operator bond into each new node
//! - Enforcing one node per operator
//! - Keeping the allow-list of base assets
use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use super::errors::RegistryError;
use super::events::{AdminTransferred, NodeCreated, TokenWhitelisted};
use crate::node::LendingNodeContractRef;
use crate::token::Cep18TokenContractRef;

/// Registry contract
#[odra::module]
pub struct Registry {
    /// Admin address
    admin: Var<Address>,
    /// Token operators bond into their node
    bond_token: Var<Address>,
    /// Bond locked per node on creation
    bond_requirement: Var<U256>,
    /// Exchange handed to every node
    exchange: Var<Address>,
    /// Optional yield vault handed to every node
    yield_vault: Var<Option<Address>>,
    /// Treasury fee recipient handed to every node
    treasury: Var<Address>,
    /// Allowed base assets
    whitelist: Mapping<Address, bool>,
    /// Operator -> node
    nodes_by_operator: Mapping<Address, Address>,
    /// Node -> operator
    operators_by_node: Mapping<Address, Address>,
    /// Node list (index -> address)
    all_nodes: Mapping<u32, Address>,
    /// Total number of nodes
    node_count: Var<u32>,
}

#[odra::module]
impl Registry {
    /// Initialize the registry; the caller becomes admin
    pub fn init(
        &mut self,
        bond_token: Address,
        bond_requirement: U256,
        exchange: Address,
        yield_vault: Option<Address>,
        treasury: Address,
    ) {
        let caller = self.env().caller();
        self.admin.set(caller);
        self.bond_token.set(bond_token);
        self.bond_requirement.set(bond_requirement);
        self.exchange.set(exchange);
        self.yield_vault.set(yield_vault);
        self.treasury.set(treasury);
        self.node_count.set(0);
    }

    /// Bind `node` to the caller as its operator.
    ///
    /// `node` must be a freshly deployed, unbound `LendingNode` whose registry
    /// is this contract. The caller must have approved `bond_requirement` of
    /// the bond token to the registry.
    pub fn create_node(
        &mut self,
        node: Address,
        base_asset: Address,
        is_collateral_option_locked: bool,
        grace_period: u64,
    ) -> Address {
        if !self.is_whitelisted(base_asset) {
            self.env().revert(RegistryError::AssetNotWhitelisted);
        }
        let operator = self.env().caller();
        if self.nodes_by_operator.get(&operator).is_some() {
            self.env().revert(RegistryError::OperatorAlreadyHasNode);
        }
        if self.operators_by_node.get(&node).is_some() {
            self.env().revert(RegistryError::NodeAlreadyRegistered);
        }

        let bond_token = self.bond_token();
        let bond_amount = self.bond_requirement();
        if !bond_amount.is_zero() {
            Cep18TokenContractRef::new(self.env(), bond_token)
                .transfer_from(operator, node, bond_amount);
        }

        LendingNodeContractRef::new(self.env(), node).bind(
            operator,
            base_asset,
            bond_token,
            self.exchange.get_or_revert_with(RegistryError::NotAdmin),
            self.yield_vault.get_or_default(),
            self.treasury.get_or_revert_with(RegistryError::NotAdmin),
            is_collateral_option_locked,
            grace_period,
            bond_amount,
        );

        self.nodes_by_operator.set(&operator, node);
        self.operators_by_node.set(&node, operator);
        let index = self.node_count();
        self.all_nodes.set(&index, node);
        self.node_count.set(index + 1);

        self.env().emit_event(NodeCreated {
            node,
            operator,
            base_asset,
            bond_amount,
            node_count: index + 1,
        });
        node
    }

    /// Allow or disallow a base asset (admin only)
    pub fn whitelist_token(&mut self, token: Address, allowed: bool) {
        self.only_admin();
        self.whitelist.set(&token, allowed);
        self.env().emit_event(TokenWhitelisted { token, allowed });
    }

    /// Hand the admin role to another account (admin only)
    pub fn transfer_admin(&mut self, new_admin: Address) {
        self.only_admin();
        let previous_admin = self.admin();
        self.admin.set(new_admin);
        self.env().emit_event(AdminTransferred { previous_admin, new_admin });
    }

    // ========================================
    // Views
    // ========================================

    /// Node operated by `operator`, if any
    pub fn get_node(&self, operator: Address) -> Option<Address> {
        self.nodes_by_operator.get(&operator)
    }

    pub fn operator_of(&self, node: Address) -> Option<Address> {
        self.operators_by_node.get(&node)
    }

    pub fn is_node(&self, address: Address) -> bool {
        self.operators_by_node.get(&address).is_some()
    }

    pub fn is_whitelisted(&self, token: Address) -> bool {
        self.whitelist.get(&token).unwrap_or_default()
    }

    pub fn node_count(&self) -> u32 {
        self.node_count.get_or_default()
    }

    pub fn node_at(&self, index: u32) -> Address {
        self.all_nodes
            .get(&index)
            .unwrap_or_revert_with(&self.env(), RegistryError::NodeIndexOutOfRange)
    }

    pub fn admin(&self) -> Address {
        self.admin.get_or_revert_with(RegistryError::NotAdmin)
    }

    pub fn bond_token(&self) -> Address {
        self.bond_token.get_or_revert_with(RegistryError::NotAdmin)
    }

    pub fn bond_requirement(&self) -> U256 {
        self.bond_requirement.get_or_default()
    }

    fn only_admin(&self) {
        if self.env().caller() != self.admin() {
            self.env().revert(RegistryError::NotAdmin);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FixedRateExchange;
    use crate::node::lending_node::{LendingNode, LendingNodeHostRef, LendingNodeInitArgs};
    use crate::node::NodeError;
    use crate::tokens::{AssetToken, AssetTokenHostRef, AssetTokenInitArgs};
    use odra::host::{Deployer, HostEnv, HostRef, NoArgs};

    struct Setup {
        env: HostEnv,
        registry: RegistryHostRef,
        bond: AssetTokenHostRef,
        usd: AssetTokenHostRef,
    }

    fn bond_amount() -> U256 {
        U256::from(2_000_000u64) * U256::from(1_000_000_000_000_000_000u128)
    }

    fn setup() -> Setup {
        let env = odra_test::env();
        let token = |symbol: &str, decimals: u8| {
            AssetToken::deploy(
                &env,
                AssetTokenInitArgs {
                    name: String::from(symbol),
                    symbol: String::from(symbol),
                    decimals,
                },
            )
        };
        let bond = token("BOND", 18);
        let usd = token("USD", 6);
        let exchange = FixedRateExchange::deploy(&env, NoArgs);
        let registry = Registry::deploy(
            &env,
            RegistryInitArgs {
                bond_token: bond.address().clone(),
                bond_requirement: bond_amount(),
                exchange: exchange.address().clone(),
                yield_vault: None,
                treasury: env.get_account(9),
            },
        );
        Setup { env, registry, bond, usd }
    }

    fn deploy_node(s: &Setup) -> LendingNodeHostRef {
        LendingNode::deploy(
            &s.env,
            LendingNodeInitArgs { registry: s.registry.address().clone() },
        )
    }

    fn fund_operator(s: &mut Setup, operator: Address) {
        s.env.set_caller(s.env.get_account(0));
        s.bond.mint(operator, bond_amount());
        s.env.set_caller(operator);
        s.bond.approve(s.registry.address().clone(), bond_amount());
    }

    #[test]
    fn test_create_node_binds_operator_and_bond() {
        let mut s = setup();
        let operator = s.env.get_account(1);
        s.registry.whitelist_token(s.usd.address().clone(), true);
        let node = deploy_node(&s);
        let node_address = node.address().clone();
        fund_operator(&mut s, operator);

        s.registry.create_node(node_address, s.usd.address().clone(), false, 0);

        assert_eq!(s.registry.get_node(operator), Some(node_address));
        assert_eq!(s.registry.operator_of(node_address), Some(operator));
        assert!(s.registry.is_node(node_address));
        assert_eq!(s.registry.node_count(), 1);
        assert_eq!(s.registry.node_at(0), node_address);
        assert_eq!(node.operator(), operator);
        assert_eq!(node.base_asset(), s.usd.address().clone());
        assert_eq!(node.bond_balance(operator), bond_amount());
        assert_eq!(node.decimals(), 6);
        assert!(node.is_active());
        assert_eq!(s.bond.balance_of(node_address), bond_amount());
    }

    #[test]
    fn test_create_node_requires_whitelisted_asset() {
        let mut s = setup();
        let operator = s.env.get_account(1);
        let node = deploy_node(&s);
        fund_operator(&mut s, operator);

        assert_eq!(
            s.registry.try_create_node(node.address().clone(), s.usd.address().clone(), false, 0),
            Err(RegistryError::AssetNotWhitelisted.into())
        );
        assert_eq!(s.registry.get_node(operator), None);
    }

    #[test]
    fn test_one_node_per_operator() {
        let mut s = setup();
        let operator = s.env.get_account(1);
        s.registry.whitelist_token(s.usd.address().clone(), true);
        let first = deploy_node(&s);
        let second = deploy_node(&s);
        fund_operator(&mut s, operator);
        s.registry.create_node(first.address().clone(), s.usd.address().clone(), false, 0);

        fund_operator(&mut s, operator);
        assert_eq!(
            s.registry.try_create_node(second.address().clone(), s.usd.address().clone(), false, 0),
            Err(RegistryError::OperatorAlreadyHasNode.into())
        );

        let other = s.env.get_account(2);
        fund_operator(&mut s, other);
        assert_eq!(
            s.registry.try_create_node(first.address().clone(), s.usd.address().clone(), false, 0),
            Err(RegistryError::NodeAlreadyRegistered.into())
        );
    }

    #[test]
    fn test_node_rejects_foreign_binding() {
        let s = setup();
        let mut node = deploy_node(&s);
        let stranger = s.env.get_account(3);

        s.env.set_caller(stranger);
        assert_eq!(
            node.try_bind(
                stranger,
                s.usd.address().clone(),
                s.bond.address().clone(),
                stranger,
                None,
                stranger,
                false,
                0,
                U256::zero(),
            ),
            Err(NodeError::NotRegistry.into())
        );
        assert_eq!(node.try_deposit(U256::one()), Err(NodeError::NodeNotBound.into()));
    }

    #[test]
    fn test_only_admin_whitelists() {
        let mut s = setup();
        s.env.set_caller(s.env.get_account(4));
        assert_eq!(
            s.registry.try_whitelist_token(s.usd.address().clone(), true),
            Err(RegistryError::NotAdmin.into())
        );

        s.env.set_caller(s.env.get_account(0));
        s.registry.whitelist_token(s.usd.address().clone(), true);
        assert!(s.registry.is_whitelisted(s.usd.address().clone()));
        s.registry.whitelist_token(s.usd.address().clone(), false);
        assert!(!s.registry.is_whitelisted(s.usd.address().clone()));
    }

    #[test]
    fn test_get_node_for_unknown_operator_is_none() {
        let s = setup();
        assert_eq!(s.registry.get_node(s.env.get_account(7)), None);
        assert!(!s.registry.is_node(s.env.get_account(7)));
    }
}
