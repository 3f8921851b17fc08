//! Collaborator capabilities used by lending nodes
//!
//! Nodes only see the `Exchange` and `YieldVault` interfaces. The modules in
//! this directory are deterministic reference implementations with
//! admin-controlled prices and yield, used for local deployments and tests.

pub mod exchange;
pub mod yield_vault;
pub mod errors;
pub mod events;

pub use exchange::{Exchange, ExchangeContractRef, FixedRateExchange};
pub use yield_vault::{SimpleYieldVault, YieldVault, YieldVaultContractRef};
pub use errors::AdapterError;
pub use events::*;
