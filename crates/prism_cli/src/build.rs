//! `prism build` — execute an artifact's recipe.

use crate::session;
use crate::BuildArgs;
use prism_artifact::execute_recipe;

/// Runs the `prism build` command.
///
/// Builds the named artifact from its on-disk recipe, or from the built-in
/// recipe table when no recipe file exists yet. With `--force`, existing
/// metadata is ignored and the recipe is re-executed.
pub fn run(args: &BuildArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = session::load_settings()?;
    let store = session::open_store(&settings)?;
    let artifact_path = store.normalize(&args.artifact_path)?;
    let built_ins = prism_binaries::built_in_recipes();
    let fetcher = session::fetcher()?;

    execute_recipe(&store, &artifact_path, !args.force, &built_ins, &fetcher)?;
    println!("{}", store.resolve(&artifact_path).display());
    Ok(0)
}
