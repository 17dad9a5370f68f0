//! Recipe and artifact-metadata wire types.
//!
//! These types are persisted as JSON (`recipe.json`, `artifact.json`) with
//! camelCase field names. Writes omit empty fields and reads tolerate
//! missing ones, so the large literal tables of built-in recipes stay stable
//! across versions. `Recipe` is a sum type over producing strategies; the
//! executor matches on the active variant, making future variants additive.

use serde::{Deserialize, Serialize};

/// A declarative description of how to produce an artifact.
///
/// Serialized with a oneof-style variant key, e.g.
/// `{"downloadAndExtractArchiveSet": {"archiveSet": {...}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Recipe {
    /// Download a set of archives, extract them, and declare the binaries
    /// found inside.
    #[serde(rename_all = "camelCase")]
    DownloadAndExtractArchiveSet {
        /// The archives to fetch and the binaries they provide.
        archive_set: ArchiveSet,
    },
}

/// The variant keys this build understands; used to distinguish an unknown
/// recipe type from plain JSON corruption.
pub(crate) const KNOWN_RECIPE_VARIANTS: &[&str] = &["downloadAndExtractArchiveSet"];

/// A set of archives together with the binaries declared to exist once all
/// of them are extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArchiveSet {
    /// The archives to download and extract, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub archives: Vec<Archive>,

    /// The binaries believed to exist after extraction.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub binaries: Vec<Binary>,
}

/// One downloadable archive and where to put it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Archive {
    /// The URL to download.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,

    /// File name (relative to the artifact directory) the download is
    /// written to.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output_file: String,

    /// Directory (relative to the artifact directory) the archive is
    /// extracted into.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output_directory: String,
}

/// A logical tool binary descriptor.
///
/// Identity for matching is `(name, version)`. Tags (platform, build
/// config, architecture, quirk markers) are matched by subset: a request
/// matches a candidate when every requested tag appears on the candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Binary {
    /// The binary name, e.g. `"spirv-opt"`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// The version hash of the binary.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Free-form labels used for subset matching.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Path of the binary relative to its artifact directory. Empty in
    /// request descriptors; filled in catalog entries.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
}

impl Binary {
    /// Returns `true` if `self` (a request) matches `candidate` from a
    /// catalog: same name and version, and every tag in `required_tags`
    /// present on the candidate.
    pub fn matches_candidate(&self, candidate: &Binary, required_tags: &[String]) -> bool {
        self.name == candidate.name
            && self.version == candidate.version
            && required_tags
                .iter()
                .all(|tag| candidate.tags.iter().any(|t| t == tag))
    }
}

/// The durable, successful result of executing a recipe.
///
/// Written atomically after execution succeeds; its existence is the sole
/// "ready" signal for an artifact, and it is never rewritten or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMetadata {
    /// The produced data, mirroring the recipe's declaration so consumers
    /// never need to re-read the recipe.
    pub data: ArtifactData,
}

/// The kind of data an artifact holds, mirroring the recipe variant that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactData {
    /// An extracted archive set, copied verbatim from the recipe.
    #[serde(rename_all = "camelCase")]
    ExtractedArchiveSet {
        /// The archive set declared by the recipe that was executed.
        archive_set: ArchiveSet,
    },
}

impl ArtifactMetadata {
    /// Builds the metadata that records a successful extraction of
    /// `archive_set`.
    pub fn extracted(archive_set: ArchiveSet) -> Self {
        Self {
            data: ArtifactData::ExtractedArchiveSet { archive_set },
        }
    }

    /// The declared archive set, if this artifact is an extracted archive
    /// set.
    pub fn archive_set(&self) -> Option<&ArchiveSet> {
        match &self.data {
            ArtifactData::ExtractedArchiveSet { archive_set } => Some(archive_set),
        }
    }
}
