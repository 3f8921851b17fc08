//! Binary for building WASM contracts from the lending modules.
#![doc = "Binary for building WASM contracts from odra modules."]

#[allow(unused_imports)]
use bonded_lending;

fn main() {
    // Compilation is driven by odra-build; this entry point only links the crate.
}
