//! The on-disk artifact store.
//!
//! Resolves logical artifact paths to OS directories rooted at a discovered
//! `ROOT` marker file, and reads/writes the per-artifact files: the recipe,
//! the metadata, the execution log, and the transient lock marker.

use crate::error::ArtifactError;
use crate::path::{ArtifactPath, ARTIFACT_PATH_PREFIX};
use crate::recipe::{ArtifactMetadata, Recipe, KNOWN_RECIPE_VARIANTS};
use prism_common::fsutil;
use std::path::{Path, PathBuf};

/// Name of the empty marker file defining the namespace root.
pub const ROOT_FILE_NAME: &str = "ROOT";
/// Name of the recipe file within an artifact directory.
pub const RECIPE_FILE_NAME: &str = "recipe.json";
/// Name of the metadata file; its existence means the artifact is ready.
pub const METADATA_FILE_NAME: &str = "artifact.json";
/// Name of the captured log of the last execution attempt.
pub const RECIPE_LOG_FILE_NAME: &str = "recipe.log";
/// Name of the transient, exclusively created lock marker.
pub const EXECUTING_LOCK_FILE_NAME: &str = "EXECUTING_LOCK";

/// Resolves artifact paths against a discovered namespace root and performs
/// all per-artifact file I/O.
///
/// Cloning is cheap; a store is just the resolved root directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Discovers the namespace root by walking upward from the current
    /// directory until a `ROOT` marker file is found.
    pub fn discover() -> Result<Self, ArtifactError> {
        let cwd = std::env::current_dir().map_err(|e| ArtifactError::io("<cwd>", e))?;
        Self::discover_from(&cwd)
    }

    /// Discovers the namespace root by walking upward from `start`.
    ///
    /// Exactly one `ROOT` file is assumed to exist on the search path; the
    /// nearest one wins.
    pub fn discover_from(start: &Path) -> Result<Self, ArtifactError> {
        for dir in start.ancestors() {
            if dir.join(ROOT_FILE_NAME).is_file() {
                return Ok(Self {
                    root: dir.to_path_buf(),
                });
            }
        }
        Err(ArtifactError::MissingRootMarker {
            searched_from: start.to_path_buf(),
        })
    }

    /// Opens a store at an explicit root directory, which must contain the
    /// `ROOT` marker.
    pub fn open(root: &Path) -> Result<Self, ArtifactError> {
        if !root.join(ROOT_FILE_NAME).is_file() {
            return Err(ArtifactError::MissingRootMarker {
                searched_from: root.to_path_buf(),
            });
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Creates the `ROOT` marker in `dir` (creating the directory if
    /// needed) and opens a store there.
    ///
    /// A convenience for session setup, not a correctness requirement:
    /// discovery is the normal way to find the root.
    pub fn init(dir: &Path) -> Result<Self, ArtifactError> {
        std::fs::create_dir_all(dir).map_err(|e| ArtifactError::io(dir, e))?;
        let marker = dir.join(ROOT_FILE_NAME);
        if !marker.is_file() {
            fsutil::write_atomic(&marker, b"").map_err(|e| ArtifactError::io(&marker, e))?;
        }
        Ok(Self {
            root: dir.to_path_buf(),
        })
    }

    /// The OS directory containing the `ROOT` marker.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves an artifact path to its OS directory.
    pub fn resolve(&self, artifact_path: &ArtifactPath) -> PathBuf {
        let mut dir = self.root.clone();
        for segment in artifact_path
            .relative_part()
            .split('/')
            .filter(|s| !s.is_empty())
        {
            dir.push(segment);
        }
        dir
    }

    /// Converts an OS path under the root back to an artifact path.
    pub fn artifact_path_from_os(&self, path: &Path) -> Result<ArtifactPath, ArtifactError> {
        let normalized = fsutil::norm_path(path);
        let relative = normalized.strip_prefix(&self.root).map_err(|_| {
            ArtifactError::InvalidArtifactPath {
                path: path.display().to_string(),
                reason: format!("not under artifact root {}", self.root.display()),
            }
        })?;
        let mut result = String::from(ARTIFACT_PATH_PREFIX);
        let mut first = true;
        for component in relative.components() {
            if !first {
                result.push('/');
            }
            result.push_str(&component.as_os_str().to_string_lossy());
            first = false;
        }
        ArtifactPath::new(result)
    }

    /// Interprets a user-supplied string as an artifact path.
    ///
    /// The canonical `"//"` form is validated directly; anything else is
    /// treated as an OS path (absolute, or relative to the current
    /// directory) and re-expressed root-relative.
    pub fn normalize(&self, path: &str) -> Result<ArtifactPath, ArtifactError> {
        if path.starts_with(ARTIFACT_PATH_PREFIX) {
            return ArtifactPath::new(path);
        }
        let cwd = std::env::current_dir().map_err(|e| ArtifactError::io("<cwd>", e))?;
        self.artifact_path_from_os(&cwd.join(path))
    }

    /// Resolves a file path inside an artifact directory.
    ///
    /// `inner` is a `/`-separated path relative to the artifact directory;
    /// it must not itself be an artifact path.
    pub fn inner_file_path(
        &self,
        artifact_path: &ArtifactPath,
        inner: &str,
    ) -> Result<PathBuf, ArtifactError> {
        if inner.starts_with(ARTIFACT_PATH_PREFIX) {
            return Err(ArtifactError::InvalidArtifactPath {
                path: inner.to_string(),
                reason: "inner file path must be relative, not an artifact path".to_string(),
            });
        }
        let mut path = self.resolve(artifact_path);
        for segment in inner.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        Ok(fsutil::norm_path(&path))
    }

    /// Path of `recipe.json` for an artifact.
    pub fn recipe_file_path(&self, artifact_path: &ArtifactPath) -> PathBuf {
        self.resolve(artifact_path).join(RECIPE_FILE_NAME)
    }

    /// Path of `artifact.json` for an artifact.
    pub fn metadata_file_path(&self, artifact_path: &ArtifactPath) -> PathBuf {
        self.resolve(artifact_path).join(METADATA_FILE_NAME)
    }

    /// Path of `recipe.log` for an artifact.
    pub fn recipe_log_file_path(&self, artifact_path: &ArtifactPath) -> PathBuf {
        self.resolve(artifact_path).join(RECIPE_LOG_FILE_NAME)
    }

    /// Path of the `EXECUTING_LOCK` marker for an artifact.
    pub fn lock_file_path(&self, artifact_path: &ArtifactPath) -> PathBuf {
        self.resolve(artifact_path).join(EXECUTING_LOCK_FILE_NAME)
    }

    /// Returns `true` if the artifact's recipe file exists.
    pub fn recipe_exists(&self, artifact_path: &ArtifactPath) -> bool {
        self.recipe_file_path(artifact_path).is_file()
    }

    /// Returns `true` if the artifact's metadata file exists, i.e. the
    /// artifact is ready for use.
    pub fn metadata_exists(&self, artifact_path: &ArtifactPath) -> bool {
        self.metadata_file_path(artifact_path).is_file()
    }

    /// Reads and parses an artifact's recipe.
    ///
    /// A JSON object whose variant key is unrecognized reports
    /// `RecipeTypeUnimplemented` rather than a generic parse error.
    pub fn read_recipe(&self, artifact_path: &ArtifactPath) -> Result<Recipe, ArtifactError> {
        let path = self.recipe_file_path(artifact_path);
        let text = std::fs::read_to_string(&path).map_err(|e| ArtifactError::io(&path, e))?;
        match serde_json::from_str::<Recipe>(&text) {
            Ok(recipe) => Ok(recipe),
            Err(e) => {
                if let Some(variant) = unknown_variant_key(&text) {
                    return Err(ArtifactError::RecipeTypeUnimplemented {
                        artifact_path: artifact_path.as_str().to_string(),
                        variant,
                    });
                }
                Err(ArtifactError::Parse {
                    path,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Writes an artifact's recipe atomically (write-temp-then-rename).
    ///
    /// Races among multiple writers are tolerated: the final rename is
    /// atomic, so whichever writer wins leaves valid content.
    pub fn write_recipe(
        &self,
        recipe: &Recipe,
        artifact_path: &ArtifactPath,
    ) -> Result<(), ArtifactError> {
        let path = self.recipe_file_path(artifact_path);
        let text = serde_json::to_string_pretty(recipe).map_err(|e| ArtifactError::Parse {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        fsutil::write_atomic(&path, text.as_bytes()).map_err(|e| ArtifactError::io(&path, e))
    }

    /// Reads and parses an artifact's metadata.
    pub fn read_metadata(
        &self,
        artifact_path: &ArtifactPath,
    ) -> Result<ArtifactMetadata, ArtifactError> {
        let path = self.metadata_file_path(artifact_path);
        let text = std::fs::read_to_string(&path).map_err(|e| ArtifactError::io(&path, e))?;
        serde_json::from_str(&text).map_err(|e| ArtifactError::Parse {
            path,
            reason: e.to_string(),
        })
    }

    /// Writes an artifact's metadata atomically.
    ///
    /// No reader ever observes a partially written document; once visible,
    /// the artifact is ready.
    pub fn write_metadata(
        &self,
        metadata: &ArtifactMetadata,
        artifact_path: &ArtifactPath,
    ) -> Result<(), ArtifactError> {
        let path = self.metadata_file_path(artifact_path);
        let text = serde_json::to_string_pretty(metadata).map_err(|e| ArtifactError::Parse {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        fsutil::write_atomic(&path, text.as_bytes()).map_err(|e| ArtifactError::io(&path, e))
    }

    /// Finds every artifact path under `prefix`: directories containing a
    /// `recipe.json` or `artifact.json`, deduplicated and sorted.
    pub fn find_artifacts(
        &self,
        prefix: &ArtifactPath,
    ) -> Result<Vec<ArtifactPath>, ArtifactError> {
        let dir = self.resolve(prefix);
        let mut found = std::collections::BTreeSet::new();
        if dir.is_dir() {
            self.scan_dir(&dir, &mut found)?;
        }
        Ok(found.into_iter().collect())
    }

    fn scan_dir(
        &self,
        dir: &Path,
        found: &mut std::collections::BTreeSet<ArtifactPath>,
    ) -> Result<(), ArtifactError> {
        let entries = std::fs::read_dir(dir).map_err(|e| ArtifactError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| ArtifactError::io(dir, e))?;
            let path = entry.path();
            if path.is_dir() {
                self.scan_dir(&path, found)?;
            } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name == RECIPE_FILE_NAME || name == METADATA_FILE_NAME {
                    found.insert(self.artifact_path_from_os(dir)?);
                }
            }
        }
        Ok(())
    }
}

/// If `text` is a JSON object with a single key that is not a known recipe
/// variant, returns that key.
fn unknown_variant_key(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let obj = value.as_object()?;
    let key = obj.keys().next()?;
    if KNOWN_RECIPE_VARIANTS.contains(&key.as_str()) {
        None
    } else {
        Some(key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{Archive, ArchiveSet};

    fn make_store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::init(dir.path()).unwrap();
        (dir, store)
    }

    fn sample_recipe() -> Recipe {
        Recipe::DownloadAndExtractArchiveSet {
            archive_set: ArchiveSet {
                archives: vec![Archive {
                    url: "https://example/a.zip".to_string(),
                    output_file: "a.zip".to_string(),
                    output_directory: "a".to_string(),
                }],
                binaries: vec![],
            },
        }
    }

    #[test]
    fn init_creates_root_marker() {
        let (dir, store) = make_store();
        assert!(dir.path().join(ROOT_FILE_NAME).is_file());
        assert_eq!(store.root(), dir.path());
    }

    #[test]
    fn discover_walks_upward() {
        let (dir, _store) = make_store();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        let store = ArtifactStore::discover_from(&nested).unwrap();
        assert_eq!(store.root(), dir.path());
    }

    #[test]
    fn discover_fails_without_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactStore::discover_from(dir.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::MissingRootMarker { .. }));
    }

    #[test]
    fn open_requires_marker() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ArtifactStore::open(dir.path()).is_err());
        ArtifactStore::init(dir.path()).unwrap();
        assert!(ArtifactStore::open(dir.path()).is_ok());
    }

    #[test]
    fn resolve_joins_segments() {
        let (dir, store) = make_store();
        let p = ArtifactPath::new("//binaries/built_in/glslang_v1").unwrap();
        assert_eq!(
            store.resolve(&p),
            dir.path().join("binaries").join("built_in").join("glslang_v1")
        );
    }

    #[test]
    fn os_path_round_trip() {
        let (_dir, store) = make_store();
        let p = ArtifactPath::new("//binaries/x").unwrap();
        let os = store.resolve(&p);
        assert_eq!(store.artifact_path_from_os(&os).unwrap(), p);
    }

    #[test]
    fn artifact_path_from_os_outside_root_fails() {
        let (_dir, store) = make_store();
        let other = tempfile::tempdir().unwrap();
        assert!(store.artifact_path_from_os(other.path()).is_err());
    }

    #[test]
    fn normalize_accepts_canonical_and_os_forms() {
        let (dir, store) = make_store();
        let canonical = store.normalize("//binaries/x").unwrap();
        assert_eq!(canonical.as_str(), "//binaries/x");

        // An absolute OS path under the root maps back to an artifact path.
        let os_form = dir.path().join("binaries").join("x");
        let from_os = store.normalize(&os_form.to_string_lossy()).unwrap();
        assert_eq!(from_os, canonical);

        assert!(store.normalize("//bad//segment").is_err());
    }

    #[test]
    fn inner_file_path_rejects_artifact_paths() {
        let (_dir, store) = make_store();
        let p = ArtifactPath::new("//a").unwrap();
        assert!(store.inner_file_path(&p, "//bad").is_err());
        assert!(store.inner_file_path(&p, "glslang/bin/glslangValidator").is_ok());
    }

    #[test]
    fn recipe_round_trip_through_disk() {
        let (_dir, store) = make_store();
        let p = ArtifactPath::new("//binaries/test").unwrap();
        let recipe = sample_recipe();
        store.write_recipe(&recipe, &p).unwrap();
        assert!(store.recipe_exists(&p));
        let back = store.read_recipe(&p).unwrap();
        assert_eq!(back, recipe);
    }

    #[test]
    fn metadata_round_trip_through_disk() {
        let (_dir, store) = make_store();
        let p = ArtifactPath::new("//binaries/test").unwrap();
        let metadata = ArtifactMetadata::extracted(ArchiveSet::default());
        assert!(!store.metadata_exists(&p));
        store.write_metadata(&metadata, &p).unwrap();
        assert!(store.metadata_exists(&p));
        assert_eq!(store.read_metadata(&p).unwrap(), metadata);
    }

    #[test]
    fn unknown_recipe_variant_reported() {
        let (_dir, store) = make_store();
        let p = ArtifactPath::new("//binaries/test").unwrap();
        let path = store.recipe_file_path(&p);
        prism_common::fsutil::write_atomic(
            &path,
            br#"{"compileFromSource": {"repo": "x"}}"#,
        )
        .unwrap();
        let err = store.read_recipe(&p).unwrap_err();
        match err {
            ArtifactError::RecipeTypeUnimplemented { variant, .. } => {
                assert_eq!(variant, "compileFromSource");
            }
            other => panic!("expected RecipeTypeUnimplemented, got {other}"),
        }
    }

    #[test]
    fn corrupt_recipe_is_parse_error() {
        let (_dir, store) = make_store();
        let p = ArtifactPath::new("//binaries/test").unwrap();
        prism_common::fsutil::write_atomic(&store.recipe_file_path(&p), b"{not json").unwrap();
        assert!(matches!(
            store.read_recipe(&p).unwrap_err(),
            ArtifactError::Parse { .. }
        ));
    }

    #[test]
    fn find_artifacts_dedupes_and_sorts() {
        let (_dir, store) = make_store();
        let a = ArtifactPath::new("//binaries/b/a1").unwrap();
        let b = ArtifactPath::new("//binaries/a2").unwrap();
        store.write_recipe(&sample_recipe(), &a).unwrap();
        store.write_recipe(&sample_recipe(), &b).unwrap();
        // An artifact with both files should appear once.
        store
            .write_metadata(&ArtifactMetadata::extracted(ArchiveSet::default()), &b)
            .unwrap();

        let prefix = ArtifactPath::new("//binaries").unwrap();
        let found = store.find_artifacts(&prefix).unwrap();
        assert_eq!(found, vec![b, a]);
    }

    #[test]
    fn find_artifacts_on_missing_prefix_is_empty() {
        let (_dir, store) = make_store();
        let prefix = ArtifactPath::new("//nothing").unwrap();
        assert!(store.find_artifacts(&prefix).unwrap().is_empty());
    }
}
