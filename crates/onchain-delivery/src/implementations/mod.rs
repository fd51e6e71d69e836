//! Transaction delivery implementations.
//!
//! Available implementations:
//! - `rpc`: raw transaction submission and receipt polling over JSON-RPC

pub mod rpc;

pub use rpc::*;
