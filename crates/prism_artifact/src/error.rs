//! Error types for artifact storage and recipe execution.

use std::path::PathBuf;

/// Errors that can occur while resolving artifact paths, reading or writing
/// the per-artifact files, or executing a recipe.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// No `ROOT` marker file was found above the starting directory.
    ///
    /// Fatal: nothing in the artifact namespace can be resolved without a
    /// root. Callers may create one (see `ArtifactStore::init`) as a
    /// convenience.
    #[error("could not find ROOT marker file above {searched_from}")]
    MissingRootMarker {
        /// The directory the upward search started from.
        searched_from: PathBuf,
    },

    /// An artifact path string is malformed.
    #[error("invalid artifact path {path:?}: {reason}")]
    InvalidArtifactPath {
        /// The offending path string.
        path: String,
        /// Description of the problem.
        reason: String,
    },

    /// An I/O error occurred at a specific path.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A recipe or metadata file could not be parsed as valid JSON.
    #[error("failed to parse {path}: {reason}")]
    Parse {
        /// The JSON file path.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A recipe declares a variant this build does not implement.
    ///
    /// Fatal and never retried: a newer recipe format requires a newer
    /// binary, not another attempt.
    #[error("artifact {artifact_path} has unimplemented recipe type {variant:?}")]
    RecipeTypeUnimplemented {
        /// The artifact whose recipe is unsupported.
        artifact_path: String,
        /// The unrecognized variant key found in the JSON.
        variant: String,
    },

    /// A required archive field is empty.
    #[error("archive field {field} must be filled (artifact {artifact_path})")]
    MissingField {
        /// The artifact being executed.
        artifact_path: String,
        /// Name of the empty field.
        field: &'static str,
    },

    /// A download failed.
    #[error("failed to download {url}: {reason}")]
    Download {
        /// The URL that failed.
        url: String,
        /// Description of the failure.
        reason: String,
    },

    /// An archive has an extension no extractor handles.
    #[error("unsupported archive format: {file}")]
    UnsupportedArchive {
        /// The archive file name.
        file: String,
    },

    /// An archive could not be extracted.
    #[error("failed to extract {path}: {reason}")]
    Extract {
        /// The archive file path.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },
}

impl ArtifactError {
    /// Wraps an I/O error with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArtifactError::Io {
            path: path.into(),
            source,
        }
    }
}
