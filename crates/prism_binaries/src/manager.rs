//! Binary resolution.
//!
//! A [`BinaryManager`] turns binary descriptors (name, version, tags) into
//! filesystem paths, downloading release artifacts on demand. Child
//! managers carry per-test or per-device descriptor overrides while sharing
//! the resolved-path memo and the catalog with their parent, so nothing is
//! resolved twice in one session.

use crate::builtin;
use crate::catalog::BinaryCatalog;
use crate::error::BinaryError;
use crate::release;
use prism_artifact::{
    execute_recipe_if_needed, ArtifactStore, Binary, Fetch, Recipe, RecipeMap,
};
use prism_common::Platform;
use prism_config::Settings;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A resolved binary path together with the descriptor it satisfies.
#[derive(Debug, Clone)]
pub struct BinaryPathAndInfo {
    /// Filesystem path of the binary.
    pub path: PathBuf,
    /// The descriptor that was resolved.
    pub binary: Binary,
}

/// State shared between a manager and all of its children.
struct SharedState {
    /// Memo of fully resolved descriptors, keyed by their canonical
    /// serialization.
    resolved_paths: HashMap<String, PathBuf>,
    catalog: BinaryCatalog,
}

/// Resolves binary descriptors to paths, using the artifact store as a
/// cache and GitHub releases as the source of truth.
#[derive(Clone)]
pub struct BinaryManager {
    store: ArtifactStore,
    platform: Platform,
    binary_list: Vec<Binary>,
    shared: Arc<Mutex<SharedState>>,
    built_ins: Arc<RecipeMap>,
    fetcher: Arc<dyn Fetch + Send + Sync>,
}

fn memo_key(binary: &Binary) -> String {
    // Canonical serialization of the descriptor. Tag order is part of the
    // key; callers use stable descriptor values so this never misses in
    // practice, and a miss only costs a catalog scan.
    let mut key = String::new();
    key.push_str(&binary.name);
    key.push('\u{1f}');
    key.push_str(&binary.version);
    for tag in &binary.tags {
        key.push('\u{1f}');
        key.push_str(tag);
    }
    key
}

impl BinaryManager {
    /// Creates a manager over `store` with an explicit binary list and
    /// built-in recipe table.
    pub fn new(
        store: ArtifactStore,
        binary_list: Vec<Binary>,
        platform: Platform,
        built_ins: RecipeMap,
        fetcher: Arc<dyn Fetch + Send + Sync>,
    ) -> Result<Self, BinaryError> {
        let mut catalog = BinaryCatalog::scan(&store)?;
        catalog.add_built_ins(&built_ins);
        Ok(Self {
            store,
            platform,
            binary_list,
            shared: Arc::new(Mutex::new(SharedState {
                resolved_paths: HashMap::new(),
                catalog,
            })),
            built_ins: Arc::new(built_ins),
            fetcher,
        })
    }

    /// Creates the default manager for a session: versions pinned in the
    /// settings override the built-in defaults, and the full built-in
    /// recipe table is available.
    pub fn for_settings(
        store: ArtifactStore,
        settings: &Settings,
        fetcher: Arc<dyn Fetch + Send + Sync>,
    ) -> Result<Self, BinaryError> {
        let binary_list = if settings.binaries.is_empty() {
            builtin::default_binaries()
        } else {
            settings
                .binaries
                .iter()
                .map(|pinned| Binary {
                    name: pinned.name.clone(),
                    version: pinned.version.clone(),
                    tags: pinned.tags.clone(),
                    path: String::new(),
                })
                .collect()
        };
        Self::new(
            store,
            binary_list,
            Platform::host(),
            builtin::built_in_recipes(),
            fetcher,
        )
    }

    /// Creates a child manager whose binary list takes priority over (and
    /// hides same-named entries of) this manager's list.
    ///
    /// The memo, catalog and built-in table are shared with the parent, so
    /// work done through either is visible to both.
    pub fn child_with_priority_list(&self, mut binary_list: Vec<Binary>) -> Self {
        binary_list.extend(self.binary_list.iter().cloned());
        Self {
            store: self.store.clone(),
            platform: self.platform,
            binary_list,
            shared: Arc::clone(&self.shared),
            built_ins: Arc::clone(&self.built_ins),
            fetcher: Arc::clone(&self.fetcher),
        }
    }

    /// Looks up a descriptor by name in this manager's binary list.
    ///
    /// Absence means the caller asked for a tool the session never
    /// declared, so this is an error rather than a fallback.
    pub fn binary_by_name(&self, name: &str) -> Result<Binary, BinaryError> {
        self.binary_list
            .iter()
            .find(|binary| binary.name == name)
            .cloned()
            .ok_or_else(|| BinaryError::BinaryNotFound {
                name: name.to_string(),
            })
    }

    /// Resolves a descriptor by name and returns the path with the
    /// descriptor that produced it.
    pub fn binary_path_by_name(&self, name: &str) -> Result<BinaryPathAndInfo, BinaryError> {
        let binary = self.binary_by_name(name)?;
        let path = self.binary_path(&binary)?;
        Ok(BinaryPathAndInfo { path, binary })
    }

    /// Resolves a descriptor to a filesystem path.
    ///
    /// Tries, in order: the resolved-path memo, the catalog (building the
    /// providing artifact if needed), and finally a synthesized GitHub
    /// release recipe followed by one catalog retry.
    pub fn binary_path(&self, binary: &Binary) -> Result<PathBuf, BinaryError> {
        let key = memo_key(binary);
        let mut shared = self.shared.lock().unwrap();
        if let Some(path) = shared.resolved_paths.get(&key) {
            return Ok(path.clone());
        }

        tracing::info!(
            "finding path of binary {} version {} tags {:?}",
            binary.name,
            binary.version,
            binary.tags
        );

        if let Some(path) = self.resolve_from_catalog(&mut shared, binary, &key)? {
            return Ok(path);
        }

        // Not in any known artifact; synthesize a release recipe, build
        // it, and add it to the catalog.
        let (artifact_path, recipe) = release::github_release_recipe(binary)?;
        let mut recipes = RecipeMap::new();
        recipes.insert(artifact_path.clone(), recipe.clone());
        execute_recipe_if_needed(&self.store, &artifact_path, &recipes, self.fetcher.as_ref())?;
        let Recipe::DownloadAndExtractArchiveSet { archive_set } = recipe;
        shared.catalog.push(archive_set, artifact_path);

        if let Some(path) = self.resolve_from_catalog(&mut shared, binary, &key)? {
            return Ok(path);
        }
        Err(BinaryError::BinaryPathNotFound {
            name: binary.name.clone(),
            version: binary.version.clone(),
            tags: binary.tags.clone(),
        })
    }

    /// Scans the catalog for the first candidate matching the descriptor,
    /// builds its artifact if needed, and memoizes the result.
    ///
    /// The host platform is an implicit required tag: a request without a
    /// platform tag still only matches binaries that run here.
    fn resolve_from_catalog(
        &self,
        shared: &mut SharedState,
        binary: &Binary,
        key: &str,
    ) -> Result<Option<PathBuf>, BinaryError> {
        let mut required_tags = binary.tags.clone();
        let platform_tag = self.platform.tag().to_string();
        if !required_tags.contains(&platform_tag) {
            required_tags.push(platform_tag);
        }

        let mut matched: Option<(String, prism_artifact::ArtifactPath)> = None;
        for (archive_set, artifact_path) in shared.catalog.iter() {
            if let Some(candidate) = archive_set
                .binaries
                .iter()
                .find(|candidate| binary.matches_candidate(candidate, &required_tags))
            {
                matched = Some((candidate.path.clone(), artifact_path.clone()));
                break;
            }
        }

        let Some((inner_path, artifact_path)) = matched else {
            return Ok(None);
        };
        execute_recipe_if_needed(
            &self.store,
            &artifact_path,
            &self.built_ins,
            self.fetcher.as_ref(),
        )?;
        let path = self.store.inner_file_path(&artifact_path, &inner_path)?;
        shared.resolved_paths.insert(key.to_string(), path.clone());
        Ok(Some(path))
    }
}
