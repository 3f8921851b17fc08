//! CLI tool for deploying and operating bonded lending contracts.

use bonded_lending::adapters::{FixedRateExchange, SimpleYieldVault};
use bonded_lending::constants::DEFAULT_BOND_REQUIREMENT;
use bonded_lending::farming::RewardsDistributor;
use bonded_lending::node::LendingNode;
use bonded_lending::registry::Registry;
use bonded_lending::tokens::AssetToken;
use odra::casper_types::U256;
use odra::host::{Deployer, HostEnv};
use odra::prelude::{Address, Addressable};
use odra::schema::casper_contract_schema::NamedCLType;
use odra_cli::{
    deploy::DeployScript,
    scenario::{Args, Error, Scenario, ScenarioMetadata},
    CommandArg, ContractProvider, DeployedContractsContainer, DeployerExt,
    OdraCli,
};

/// Reward emission for a fresh distributor, in bond token units per second
const DEFAULT_REWARD_PER_SECOND: u128 = 1_000_000_000_000_000_000;

/// Deploys the bond token and the reference exchange and yield vault.
pub struct InfrastructureDeployScript;

impl DeployScript for InfrastructureDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        use bonded_lending::tokens::AssetTokenInitArgs;

        let _bond = AssetToken::load_or_deploy(
            &env,
            AssetTokenInitArgs {
                name: String::from("Node Bond"),
                symbol: String::from("BOND"),
                decimals: 18,
            },
            container,
            300_000_000_000
        )?;
        let _exchange = FixedRateExchange::load_or_deploy(
            &env,
            odra::host::NoArgs,
            container,
            300_000_000_000
        )?;
        let _vault = SimpleYieldVault::load_or_deploy(
            &env,
            odra::host::NoArgs,
            container,
            300_000_000_000
        )?;

        Ok(())
    }
}

/// Deploys the Registry and the RewardsDistributor.
/// Requires the infrastructure to be deployed first.
pub struct ProtocolDeployScript;

impl DeployScript for ProtocolDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        use bonded_lending::farming::rewards_distributor::RewardsDistributorInitArgs;
        use bonded_lending::registry::node_registry::RegistryInitArgs;

        let bond = container.contract_ref::<AssetToken>(env)?.address().clone();
        let exchange = container.contract_ref::<FixedRateExchange>(env)?.address().clone();
        let vault = container.contract_ref::<SimpleYieldVault>(env)?.address().clone();
        let caller = env.caller();

        let registry = Registry::load_or_deploy(
            &env,
            RegistryInitArgs {
                bond_token: bond,
                bond_requirement: U256::from(DEFAULT_BOND_REQUIREMENT),
                exchange,
                yield_vault: Some(vault),
                treasury: caller,
            },
            container,
            500_000_000_000
        )?;

        let _rewards = RewardsDistributor::load_or_deploy(
            &env,
            RewardsDistributorInitArgs {
                registry: registry.address().clone(),
                reward_token: bond,
                reward_per_second: U256::from(DEFAULT_REWARD_PER_SECOND),
                start_time: 0,
            },
            container,
            400_000_000_000
        )?;

        Ok(())
    }
}

/// Deploys everything in order.
pub struct FullDeployScript;

impl DeployScript for FullDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        InfrastructureDeployScript.deploy(env, container)?;
        ProtocolDeployScript.deploy(env, container)?;
        Ok(())
    }
}

/// Scenario to allow a base asset for new nodes.
pub struct WhitelistTokenScenario;

impl Scenario for WhitelistTokenScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![
            CommandArg::new(
                "token",
                "Address of the base asset",
                NamedCLType::Key,
            ),
        ]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        args: Args
    ) -> Result<(), Error> {
        let mut registry = container.contract_ref::<Registry>(env)?;
        let token = args.get_single::<Address>("token")?;

        env.set_gas(50_000_000_000);
        registry.try_whitelist_token(token, true)?;

        println!("Token whitelisted");
        Ok(())
    }
}

impl ScenarioMetadata for WhitelistTokenScenario {
    const NAME: &'static str = "whitelist-token";
    const DESCRIPTION: &'static str = "Allows a token to be used as a node base asset";
}

/// Scenario to deploy a node for the caller and bind it through the registry.
pub struct CreateNodeScenario;

impl Scenario for CreateNodeScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![
            CommandArg::new(
                "base_asset",
                "Address of the whitelisted base asset",
                NamedCLType::Key,
            ),
            CommandArg::new(
                "collateral_locked",
                "Keep collateral in the node instead of the yield vault",
                NamedCLType::Bool,
            ),
            CommandArg::new(
                "grace_period",
                "Milliseconds after a due date before a loan can be slashed",
                NamedCLType::U64,
            ),
        ]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        args: Args
    ) -> Result<(), Error> {
        use bonded_lending::node::lending_node::LendingNodeInitArgs;

        let mut registry = container.contract_ref::<Registry>(env)?;
        let mut bond = container.contract_ref::<AssetToken>(env)?;
        let base_asset = args.get_single::<Address>("base_asset")?;
        let collateral_locked = args.get_single::<bool>("collateral_locked")?;
        let grace_period = args.get_single::<u64>("grace_period")?;
        let registry_address = registry.address().clone();

        env.set_gas(500_000_000_000);
        let node = LendingNode::deploy(env, LendingNodeInitArgs { registry: registry_address });
        let node_address = node.address().clone();

        env.set_gas(50_000_000_000);
        bond.try_approve(registry_address, registry.bond_requirement())?;

        env.set_gas(300_000_000_000);
        registry.try_create_node(node_address, base_asset, collateral_locked, grace_period)?;

        println!("Node created at {:?}", node_address);
        Ok(())
    }
}

impl ScenarioMetadata for CreateNodeScenario {
    const NAME: &'static str = "create-node";
    const DESCRIPTION: &'static str = "Deploys a lending node for the caller and binds it in the registry";
}

/// Scenario to open a rewards pool for a node's shares.
pub struct AddPoolScenario;

impl Scenario for AddPoolScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![
            CommandArg::new(
                "node",
                "Address of a registered node",
                NamedCLType::Key,
            ),
            CommandArg::new(
                "weight",
                "Share of the emission given to the pool",
                NamedCLType::U64,
            ),
        ]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        args: Args
    ) -> Result<(), Error> {
        let mut rewards = container.contract_ref::<RewardsDistributor>(env)?;
        let node = args.get_single::<Address>("node")?;
        let weight = args.get_single::<u64>("weight")?;

        env.set_gas(100_000_000_000);
        let pool_id = rewards.try_add(node, weight)?;

        println!("Pool {} added", pool_id);
        Ok(())
    }
}

impl ScenarioMetadata for AddPoolScenario {
    const NAME: &'static str = "add-pool";
    const DESCRIPTION: &'static str = "Opens a rewards pool for a node's share token";
}

/// Main function to run the CLI tool.
pub fn main() {
    OdraCli::new()
        .about("CLI tool for bonded lending contracts")
        // Deploy scripts
        .deploy(InfrastructureDeployScript)
        .deploy(ProtocolDeployScript)
        .deploy(FullDeployScript)
        // Contract references
        .contract::<AssetToken>()
        .contract::<FixedRateExchange>()
        .contract::<SimpleYieldVault>()
        .contract::<Registry>()
        .contract::<RewardsDistributor>()
        // Scenarios
        .scenario(WhitelistTokenScenario)
        .scenario(CreateNodeScenario)
        .scenario(AddPoolScenario)
        .build()
        .run();
}
