//! Tool binary resolution for the Prism fuzzing toolkit.
//!
//! Shader-compiler fuzzing orchestrates a zoo of external tools (glslang,
//! SPIRV-Tools, SwiftShader, Amber, ...) at pinned versions. This crate
//! maps binary descriptors to filesystem paths: a built-in recipe table
//! covers every version past sessions have used, the artifact store caches
//! downloads, and unknown versions fall back to synthesized GitHub-release
//! recipes.

#![warn(missing_docs)]

pub mod builtin;
pub mod catalog;
pub mod error;
pub mod manager;
pub mod release;

pub use builtin::{built_in_recipes, default_binaries};
pub use catalog::BinaryCatalog;
pub use error::BinaryError;
pub use manager::{BinaryManager, BinaryPathAndInfo};
pub use release::{
    github_release_recipe, latest_default_binaries, latest_version_number, GithubReleaseLister,
    Release, ReleaseLister,
};
