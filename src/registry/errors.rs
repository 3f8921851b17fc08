//! Error types for the node registry

use odra::prelude::*;

#[odra::odra_error]
pub enum RegistryError {
    /// Caller is not the registry admin
    NotAdmin = 200,
    /// Base asset is not on the allow-list
    AssetNotWhitelisted = 201,
    /// Caller already operates a node
    OperatorAlreadyHasNode = 202,
    /// Node contract is already registered
    NodeAlreadyRegistered = 203,
    /// Index past the end of the node list
    NodeIndexOutOfRange = 204,
}
