//! `prism fetch` — resolve a tool binary to a filesystem path.

use crate::session;
use crate::FetchArgs;
use prism_binaries::BinaryManager;
use std::sync::Arc;

/// Runs the `prism fetch` command.
///
/// Resolves the named binary using the session's pinned versions (or the
/// defaults), downloading and extracting the providing artifact if
/// necessary, and prints the resulting path.
pub fn run(args: &FetchArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = session::load_settings()?;
    let store = session::open_store(&settings)?;
    let fetcher = Arc::new(session::fetcher()?);
    let manager = BinaryManager::for_settings(store, &settings, fetcher)?;

    let info = manager.binary_path_by_name(&args.name)?;
    tracing::info!(
        "resolved {} version {} tags {:?}",
        info.binary.name,
        info.binary.version,
        info.binary.tags
    );
    println!("{}", info.path.display());
    Ok(0)
}
