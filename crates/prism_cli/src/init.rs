//! `prism init` — create an artifact root.

use prism_artifact::ArtifactStore;
use std::path::PathBuf;

/// Runs the `prism init` command.
///
/// Creates the `ROOT` marker file in the given directory (or the current
/// directory), creating the directory itself if needed. Idempotent: an
/// existing root is left untouched.
pub fn run(dir: Option<String>) -> Result<i32, Box<dyn std::error::Error>> {
    let dir = match dir {
        Some(d) => PathBuf::from(d),
        None => std::env::current_dir()?,
    };
    let store = ArtifactStore::init(&dir)?;
    println!("artifact root: {}", store.root().display());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_root_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("work").to_string_lossy().into_owned();
        assert_eq!(run(Some(target.clone())).unwrap(), 0);
        assert!(dir.path().join("work/ROOT").is_file());
        assert_eq!(run(Some(target)).unwrap(), 0);
    }
}
