//! Chain client implementations.
//!
//! - **EVM chains**: JSON-RPC over HTTP via the `evm` module

pub mod evm;
