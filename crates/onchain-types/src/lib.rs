//! Shared types for the on-chain automation workspace.
//!
//! Every crate in the workspace speaks in terms of the types defined here:
//! monetary amounts, tokens, chains, transaction requests, approval records
//! and the error taxonomy. The `ChainClient` and `ApprovalLogSource` traits
//! live here as well so that higher layers can be tested against mocks without
//! depending on a concrete RPC or HTTP implementation.

pub mod account;
pub mod amount;
pub mod chains;
pub mod common;
pub mod contracts;
pub mod delivery;
pub mod discovery;
pub mod errors;
pub mod fees;
pub mod tokens;
pub mod validation;

pub use account::*;
pub use amount::*;
pub use chains::*;
pub use common::*;
pub use delivery::*;
pub use discovery::*;
pub use errors::{OnchainError, Result};
pub use fees::*;
pub use tokens::*;
pub use validation::*;
