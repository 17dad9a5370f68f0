//! Concurrency-safe recipe execution.
//!
//! Multiple independent OS processes may share one artifact store on a
//! common filesystem. Coordination is purely filesystem-based: a transient
//! `EXECUTING_LOCK` file created with exclusive semantics is the
//! cross-process mutex, and waiting is a coarse busy-wait (the guarded work
//! is a slow network download, so a 1 s poll is plenty). Any number of
//! racing callers converge to exactly one successful execution.
//!
//! A crash while holding the lock leaves a stale marker behind; pollers log
//! the blocking path once and wait indefinitely. There is deliberately no
//! liveness protocol — operators delete stale markers manually.

use crate::error::ArtifactError;
use crate::fetch::Fetch;
use crate::log::RecipeLog;
use crate::path::ArtifactPath;
use crate::recipe::{ArchiveSet, ArtifactMetadata, Recipe};
use crate::store::ArtifactStore;
use prism_common::fsutil;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Built-in recipes known in memory, written to disk lazily on first use.
pub type RecipeMap = HashMap<ArtifactPath, Recipe>;

/// Fixed polling interval while another process holds the lock.
pub const BUSY_WAIT_INTERVAL: Duration = Duration::from_secs(1);

/// Executes the artifact's recipe unless its metadata already exists.
///
/// This is the fast-path entry point used by binary resolution: if the
/// artifact is ready, nothing is touched.
pub fn execute_recipe_if_needed(
    store: &ArtifactStore,
    artifact_path: &ArtifactPath,
    built_in_recipes: &RecipeMap,
    fetcher: &dyn Fetch,
) -> Result<(), ArtifactError> {
    execute_recipe(store, artifact_path, true, built_in_recipes, fetcher)
}

/// Executes the artifact's recipe under the cross-process lock.
///
/// The algorithm, per attempt:
/// 1. If the lock marker exists, sleep one interval (logging the blocking
///    path once) and retry from the top.
/// 2. If `only_if_missing` and metadata exists, return.
/// 3. If no recipe file exists but a built-in recipe is registered for this
///    path, write it. Racing writers are fine: the rename is atomic and all
///    would write equivalent content.
/// 4. Read the recipe.
/// 5. Create the lock marker exclusively; if another process won the race,
///    go back to 1.
/// 6. Run the recipe body with output captured to `recipe.log`. On failure
///    the metadata is not written, so a retry redoes the work. The lock
///    marker is removed in every case, best-effort.
pub fn execute_recipe(
    store: &ArtifactStore,
    artifact_path: &ArtifactPath,
    only_if_missing: bool,
    built_in_recipes: &RecipeMap,
    fetcher: &dyn Fetch,
) -> Result<(), ArtifactError> {
    let lock_path = store.lock_file_path(artifact_path);
    let mut busy_waiting = false;
    let mut first_wait = true;

    loop {
        if busy_waiting {
            std::thread::sleep(BUSY_WAIT_INTERVAL);
            if first_wait {
                tracing::info!(
                    "waiting for {artifact_path} due to lock file {}",
                    lock_path.display()
                );
                first_wait = false;
            }
        }

        // An existing marker means an active builder; this check is only an
        // optimization, the exclusive create below is the real gate.
        if lock_path.exists() {
            busy_waiting = true;
            continue;
        }

        // Metadata is written atomically once the artifact is ready, so its
        // existence alone is trustworthy.
        if only_if_missing && store.metadata_exists(artifact_path) {
            return Ok(());
        }

        if !store.recipe_exists(artifact_path) {
            if let Some(recipe) = built_in_recipes.get(artifact_path) {
                store.write_recipe(recipe, artifact_path)?;
            }
        }

        let recipe = store.read_recipe(artifact_path)?;

        // Exclusive creation: fails if the file already exists, i.e.
        // another process won the race. The file does not stay open; only
        // its existence matters.
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(mut lock_file) => {
                let _ = lock_file.write_all(b"locked");
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                busy_waiting = true;
                continue;
            }
            Err(e) => return Err(ArtifactError::io(&lock_path, e)),
        }

        // An interrupt between here and the removal below leaves a stale
        // marker. Any alternative either has the same window or risks
        // deleting another process's marker, so the marker stays and the
        // wait log above tells the operator which file to delete.

        let result = run_recipe_body(store, artifact_path, &recipe, fetcher);

        if let Err(e) = std::fs::remove_file(&lock_path) {
            tracing::warn!("failed to delete lock file {}: {e}", lock_path.display());
        }

        return result;
    }
}

fn run_recipe_body(
    store: &ArtifactStore,
    artifact_path: &ArtifactPath,
    recipe: &Recipe,
    fetcher: &dyn Fetch,
) -> Result<(), ArtifactError> {
    let log_path = store.recipe_log_file_path(artifact_path);
    let mut log = match RecipeLog::create(&log_path) {
        Ok(log) => log,
        Err(e) => {
            tracing::warn!("could not open {}: {e}", log_path.display());
            RecipeLog::sink()
        }
    };

    let result = match recipe {
        Recipe::DownloadAndExtractArchiveSet { archive_set } => {
            download_and_extract(store, artifact_path, archive_set, fetcher, &mut log)
        }
    };

    if let Err(e) = &result {
        log.message(&format!("recipe execution failed: {e}"));
    }
    result
}

/// Downloads and extracts every archive in the set, then writes metadata
/// mirroring the declared archive set.
///
/// A failed attempt may leave partially extracted output behind; that is
/// harmless because readiness is defined solely by metadata presence.
fn download_and_extract(
    store: &ArtifactStore,
    artifact_path: &ArtifactPath,
    archive_set: &ArchiveSet,
    fetcher: &dyn Fetch,
    log: &mut RecipeLog,
) -> Result<(), ArtifactError> {
    for archive in &archive_set.archives {
        let missing_field = |field| ArtifactError::MissingField {
            artifact_path: artifact_path.as_str().to_string(),
            field,
        };
        if archive.url.is_empty() {
            return Err(missing_field("url"));
        }
        if archive.output_file.is_empty() {
            return Err(missing_field("output_file"));
        }
        if archive.output_directory.is_empty() {
            return Err(missing_field("output_directory"));
        }

        let file_path = store.inner_file_path(artifact_path, &archive.output_file)?;
        let dir_path = store.inner_file_path(artifact_path, &archive.output_directory)?;

        log.message(&format!(
            "Downloading {} to {}",
            archive.url,
            file_path.display()
        ));
        fetcher.fetch(&archive.url, &file_path)?;

        log.message(&format!(
            "Extracting {} into {}",
            file_path.display(),
            dir_path.display()
        ));
        let lower = archive.output_file.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            extract_zip(&file_path, &dir_path)?;
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            extract_tar_gz(&file_path, &dir_path)?;
        } else {
            return Err(ArtifactError::UnsupportedArchive {
                file: archive.output_file.clone(),
            });
        }
    }

    store.write_metadata(
        &ArtifactMetadata::extracted(archive_set.clone()),
        artifact_path,
    )
}

/// Extracts a zip archive, restoring POSIX execute bits.
///
/// Zip archives routinely lose executable bits on extraction; when an
/// entry's stored attributes say it was authored on a UNIX-like system, its
/// execute bits are re-applied to the extracted file.
fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<(), ArtifactError> {
    let extract_err = |reason: String| ArtifactError::Extract {
        path: archive_path.to_path_buf(),
        reason,
    };

    let file =
        std::fs::File::open(archive_path).map_err(|e| ArtifactError::io(archive_path, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| extract_err(e.to_string()))?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| extract_err(e.to_string()))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(extract_err(format!(
                "entry {:?} escapes the output directory",
                entry.name()
            )));
        };
        let dest = dest_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&dest).map_err(|e| ArtifactError::io(&dest, e))?;
            continue;
        }

        fsutil::create_parent_dirs(&dest).map_err(|e| ArtifactError::io(&dest, e))?;
        let mut out = std::fs::File::create(&dest).map_err(|e| ArtifactError::io(&dest, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| ArtifactError::io(&dest, e))?;
        drop(out);

        // unix_mode() is Some only when the entry was created on a
        // UNIX-like system.
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            apply_exec_bits(&dest, mode).map_err(|e| ArtifactError::io(&dest, e))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn apply_exec_bits(dest: &Path, zip_entry_mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let exec_bits = zip_entry_mode & 0o111;
    if exec_bits == 0 {
        return Ok(());
    }
    let current = std::fs::metadata(dest)?.permissions().mode();
    if current | exec_bits != current {
        std::fs::set_permissions(dest, std::fs::Permissions::from_mode(current | exec_bits))?;
    }
    Ok(())
}

/// Extracts a gzip-compressed tarball. Tar preserves file modes itself.
fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<(), ArtifactError> {
    let file =
        std::fs::File::open(archive_path).map_err(|e| ArtifactError::io(archive_path, e))?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut tar = tar::Archive::new(decoder);
    tar.unpack(dest_dir).map_err(|e| ArtifactError::Extract {
        path: archive_path.to_path_buf(),
        reason: e.to_string(),
    })
}
