#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), no_main)]
extern crate alloc;

// Shared building blocks
pub mod constants;
pub mod errors;
pub mod events;
pub mod math;
pub mod token;
pub mod tokens;

// External integrations (exchange, yield vault)
pub mod adapters;

// Lending nodes and their registry
pub mod node;
pub mod registry;

// Reward emissions for node share stakers
pub mod farming;

#[cfg(test)]
pub(crate) mod test_utils;
