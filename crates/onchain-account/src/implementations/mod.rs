//! Account implementations.

pub mod local;
pub mod watch;
