//! The catalog of known binary artifacts.
//!
//! An entry pairs an [`ArchiveSet`] (which declares binaries by name,
//! version, tags and inner path) with the artifact path that provides it.
//! Entries come from scanning the store under `//binaries` and from the
//! in-memory built-in recipe table; the referenced artifacts need not be
//! built yet.

use crate::builtin::BINARY_ARTIFACTS_PREFIX;
use prism_artifact::{ArchiveSet, ArtifactError, ArtifactPath, ArtifactStore, Recipe, RecipeMap};

/// An ordered list of binary-providing archive sets.
///
/// Order matters: resolution scans front to back and takes the first match,
/// so on-disk artifacts (scanned first) win over built-ins, and freshly
/// synthesized fallback recipes are appended at the end.
#[derive(Debug, Default, Clone)]
pub struct BinaryCatalog {
    entries: Vec<(ArchiveSet, ArtifactPath)>,
}

impl BinaryCatalog {
    /// Builds a catalog by scanning the store for binary artifacts.
    ///
    /// Artifacts with metadata contribute their extracted archive set;
    /// artifacts with only a recipe contribute the recipe's declared set.
    /// Other artifact kinds are skipped.
    pub fn scan(store: &ArtifactStore) -> Result<Self, ArtifactError> {
        let prefix = ArtifactPath::from_static(BINARY_ARTIFACTS_PREFIX);
        let mut catalog = Self::default();
        for artifact_path in store.find_artifacts(&prefix)? {
            let archive_set = if store.metadata_exists(&artifact_path) {
                store
                    .read_metadata(&artifact_path)?
                    .archive_set()
                    .cloned()
            } else if store.recipe_exists(&artifact_path) {
                match store.read_recipe(&artifact_path) {
                    Ok(Recipe::DownloadAndExtractArchiveSet { archive_set }) => Some(archive_set),
                    // A recipe kind from a newer build; not usable here,
                    // but not an error either.
                    Err(ArtifactError::RecipeTypeUnimplemented { .. }) => None,
                    Err(e) => return Err(e),
                }
            } else {
                None
            };
            if let Some(archive_set) = archive_set {
                catalog.entries.push((archive_set, artifact_path));
            }
        }
        Ok(catalog)
    }

    /// Appends every built-in recipe's archive set.
    pub fn add_built_ins(&mut self, built_ins: &RecipeMap) {
        // Deterministic order for a HashMap source.
        let mut paths: Vec<&ArtifactPath> = built_ins.keys().collect();
        paths.sort();
        for path in paths {
            let Recipe::DownloadAndExtractArchiveSet { archive_set } = &built_ins[path];
            self.entries.push((archive_set.clone(), path.clone()));
        }
    }

    /// Appends one entry at the lowest priority.
    pub fn push(&mut self, archive_set: ArchiveSet, artifact_path: ArtifactPath) {
        self.entries.push((archive_set, artifact_path));
    }

    /// Iterates entries in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &(ArchiveSet, ArtifactPath)> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_artifact::{Archive, ArtifactMetadata, Binary};

    fn recipe_with_binary(name: &str) -> Recipe {
        Recipe::DownloadAndExtractArchiveSet {
            archive_set: ArchiveSet {
                archives: vec![Archive {
                    url: "https://example/x.zip".to_string(),
                    output_file: "x.zip".to_string(),
                    output_directory: "x".to_string(),
                }],
                binaries: vec![Binary {
                    name: name.to_string(),
                    version: "v".to_string(),
                    tags: vec!["Linux".to_string()],
                    path: format!("x/bin/{name}"),
                }],
            },
        }
    }

    #[test]
    fn scan_prefers_metadata_over_recipe() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::init(dir.path()).unwrap();
        let path = ArtifactPath::new("//binaries/custom/tool_v").unwrap();
        store.write_recipe(&recipe_with_binary("from_recipe"), &path).unwrap();
        let Recipe::DownloadAndExtractArchiveSet { archive_set } =
            recipe_with_binary("from_metadata");
        store
            .write_metadata(&ArtifactMetadata::extracted(archive_set), &path)
            .unwrap();

        let catalog = BinaryCatalog::scan(&store).unwrap();
        assert_eq!(catalog.len(), 1);
        let (set, found_path) = catalog.iter().next().unwrap();
        assert_eq!(found_path, &path);
        assert_eq!(set.binaries[0].name, "from_metadata");
    }

    #[test]
    fn scan_skips_unknown_recipe_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::init(dir.path()).unwrap();
        let path = ArtifactPath::new("//binaries/custom/odd").unwrap();
        prism_common::fsutil::write_atomic(
            &store.recipe_file_path(&path),
            br#"{"compileFromSource": {}}"#,
        )
        .unwrap();
        let catalog = BinaryCatalog::scan(&store).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn scan_ignores_artifacts_outside_binaries() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::init(dir.path()).unwrap();
        let outside = ArtifactPath::new("//results/run1").unwrap();
        store.write_recipe(&recipe_with_binary("t"), &outside).unwrap();
        let catalog = BinaryCatalog::scan(&store).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn built_ins_append_in_sorted_order() {
        let mut catalog = BinaryCatalog::default();
        let mut built_ins = RecipeMap::new();
        built_ins.insert(
            ArtifactPath::new("//binaries/built_in/b").unwrap(),
            recipe_with_binary("b"),
        );
        built_ins.insert(
            ArtifactPath::new("//binaries/built_in/a").unwrap(),
            recipe_with_binary("a"),
        );
        catalog.add_built_ins(&built_ins);
        let paths: Vec<&str> = catalog.iter().map(|(_, p)| p.as_str()).collect();
        assert_eq!(paths, vec!["//binaries/built_in/a", "//binaries/built_in/b"]);
    }
}
