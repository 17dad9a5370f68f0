//! The artifact namespace and recipe-execution engine.
//!
//! An *artifact* is the filesystem-resident result of running a *recipe* at
//! an artifact path (`"//a/b"`), rooted at a `ROOT` marker file. Recipes are
//! executed lazily, exactly once, and safely across concurrent processes via
//! an exclusively created lock-marker file. The only recipe kind today
//! downloads a set of archives and extracts them.

#![warn(missing_docs)]

pub mod error;
pub mod executor;
pub mod fetch;
pub mod log;
pub mod path;
pub mod recipe;
pub mod store;

pub use error::ArtifactError;
pub use executor::{execute_recipe, execute_recipe_if_needed, RecipeMap};
pub use fetch::{Fetch, HttpFetcher};
pub use log::RecipeLog;
pub use path::ArtifactPath;
pub use recipe::{Archive, ArchiveSet, ArtifactData, ArtifactMetadata, Binary, Recipe};
pub use store::ArtifactStore;
