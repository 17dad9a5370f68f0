//! `prism versions` — query the latest published tool versions.

use prism_binaries::{latest_default_binaries, GithubReleaseLister};

/// Runs the `prism versions` command.
///
/// Queries the release listing of each default tool's project and prints
/// the newest complete version, one `name version` pair per line. Useful
/// for updating the pins in `prism.toml`.
pub fn run() -> Result<i32, Box<dyn std::error::Error>> {
    let lister = GithubReleaseLister::new()?;
    let binaries = latest_default_binaries(&lister)?;
    for binary in &binaries {
        println!("{} {}", binary.name, binary.version);
    }
    Ok(0)
}
