//! Shared foundational types for the Prism fuzzing toolkit.
//!
//! This crate provides content hashing, host platform detection, and the
//! small filesystem helpers (atomic writes, parent-directory creation) used
//! by the artifact engine.

#![warn(missing_docs)]

pub mod fsutil;
pub mod hash;
pub mod platform;

pub use hash::ContentHash;
pub use platform::Platform;
