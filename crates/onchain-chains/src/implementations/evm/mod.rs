//! Ethereum Virtual Machine (EVM) compatible chain clients.
//!
//! Available implementations:
//! - `AlloyChainClient`: JSON-RPC over HTTP using alloy's provider

pub mod alloy;
