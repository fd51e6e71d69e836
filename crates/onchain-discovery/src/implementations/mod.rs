//! Approval log source implementations.

pub mod etherscan;
