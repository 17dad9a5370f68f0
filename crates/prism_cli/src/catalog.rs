//! `prism catalog` — list binary artifacts known to the store.

use crate::session;
use prism_binaries::BinaryCatalog;

/// Runs the `prism catalog` command.
///
/// Lists every binary-providing artifact found under `//binaries`, with the
/// binaries each one declares. Built-in recipes are not listed; only what
/// exists on disk.
pub fn run() -> Result<i32, Box<dyn std::error::Error>> {
    let settings = session::load_settings()?;
    let store = session::open_store(&settings)?;
    let catalog = BinaryCatalog::scan(&store)?;

    if catalog.is_empty() {
        println!("no binary artifacts found");
        return Ok(0);
    }
    for (archive_set, artifact_path) in catalog.iter() {
        let state = if store.metadata_exists(artifact_path) {
            "built"
        } else {
            "recipe only"
        };
        println!("{artifact_path} ({state})");
        for binary in &archive_set.binaries {
            println!(
                "  {} {} [{}]",
                binary.name,
                binary.version,
                binary.tags.join(", ")
            );
        }
    }
    Ok(0)
}
