//! Node registry - binds nodes to operators and gates base assets

pub mod node_registry;
pub mod errors;
pub mod events;

pub use node_registry::{Registry, RegistryContractRef};
pub use errors::RegistryError;
pub use events::*;
