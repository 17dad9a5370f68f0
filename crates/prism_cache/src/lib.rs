//! Memoization of external tool invocations.
//!
//! Commands are described by content: the program, the literal arguments,
//! and the hashes of input files. Equal descriptions produce equal outputs,
//! so a previous run's output file can be copied instead of re-running the
//! tool.

#![warn(missing_docs)]

pub mod command;
pub mod error;

pub use command::{CommandCache, HashedCommand};
pub use error::CacheError;
