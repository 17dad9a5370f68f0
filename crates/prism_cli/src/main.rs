//! Prism CLI — artifact and binary management for shader-compiler fuzzing.
//!
//! Provides `prism init` to create an artifact root, `prism build` to
//! execute an artifact's recipe, `prism fetch` to resolve a tool binary to
//! a path, `prism catalog` to list known binary artifacts, and
//! `prism versions` to query the latest published tool versions.

#![warn(missing_docs)]

mod build;
mod catalog;
mod fetch;
mod init;
mod session;
mod versions;

use std::process;

use clap::{Parser, Subcommand};

/// Prism — artifact and binary management for shader-compiler fuzzing.
#[derive(Parser, Debug)]
#[command(name = "prism", version, about = "Prism fuzzing toolkit")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an artifact root (the `ROOT` marker file).
    Init {
        /// Directory to initialize. Defaults to the current directory.
        dir: Option<String>,
    },
    /// Execute the recipe of an artifact.
    Build(BuildArgs),
    /// Resolve a tool binary to a filesystem path, downloading if needed.
    Fetch(FetchArgs),
    /// List the binary artifacts known to this store.
    Catalog,
    /// Print the latest published version of each default tool binary.
    Versions,
}

/// Arguments for the `prism build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// The artifact path to build, e.g. `//binaries/built_in/graphicsfuzz_v1.2.1`.
    pub artifact_path: String,

    /// Re-execute the recipe even if the artifact is already built.
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the `prism fetch` subcommand.
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// The binary name, e.g. `glslangValidator` or `spirv-opt`.
    pub name: String,
}

fn main() {
    let cli = Cli::parse();

    init_tracing(cli.quiet, cli.verbose);

    let result = match cli.command {
        Command::Init { dir } => init::run(dir),
        Command::Build(ref args) => build::run(args),
        Command::Fetch(ref args) => fetch::run(args),
        Command::Catalog => catalog::run(),
        Command::Versions => versions::run(),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` overrides the
/// verbosity flags.
fn init_tracing(quiet: bool, verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
