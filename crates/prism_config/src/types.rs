//! Settings types deserialized from `prism.toml`.

use serde::Deserialize;
use std::path::PathBuf;

/// The top-level session settings parsed from `prism.toml`.
///
/// Every field is optional; an empty file (or no file at all) is a valid
/// configuration and yields the built-in defaults.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Tool versions pinned for this session. Each entry overrides the
    /// default version used when a binary of that name is requested.
    #[serde(default)]
    pub binaries: Vec<PinnedBinary>,

    /// Overrides artifact-root discovery with an explicit directory
    /// containing the `ROOT` marker file.
    #[serde(default)]
    pub artifact_root: Option<PathBuf>,
}

/// A pinned tool binary version for a fuzzing session.
#[derive(Debug, Clone, Deserialize)]
pub struct PinnedBinary {
    /// The binary name, e.g. `"spirv-opt"`.
    pub name: String,
    /// The version hash to pin.
    pub version: String,
    /// Extra tags required of the resolved binary (e.g. `"Debug"`).
    #[serde(default)]
    pub tags: Vec<String>,
}
