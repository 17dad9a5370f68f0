//! Shared session setup for subcommands: settings, store, fetcher.

use prism_artifact::{ArtifactStore, HttpFetcher};
use prism_config::Settings;

/// Loads `prism.toml` from the current directory, falling back to defaults
/// when absent.
pub fn load_settings() -> Result<Settings, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    Ok(prism_config::load_settings_or_default(&cwd)?)
}

/// Opens the artifact store: an explicit `artifact_root` setting wins,
/// otherwise the root is discovered by walking upward from the current
/// directory.
pub fn open_store(settings: &Settings) -> Result<ArtifactStore, Box<dyn std::error::Error>> {
    let store = match &settings.artifact_root {
        Some(root) => ArtifactStore::open(root)?,
        None => ArtifactStore::discover()?,
    };
    Ok(store)
}

/// Builds the production HTTP fetcher.
pub fn fetcher() -> Result<HttpFetcher, Box<dyn std::error::Error>> {
    Ok(HttpFetcher::new()?)
}
