//! Error type for binary resolution.

use prism_artifact::ArtifactError;
use thiserror::Error;

/// Errors produced while resolving tool binaries to filesystem paths.
#[derive(Debug, Error)]
pub enum BinaryError {
    /// No binary with the requested name exists in the manager's binary
    /// list. This indicates a caller bug, not an environment problem.
    #[error("no binary named {name:?} in the binary list")]
    BinaryNotFound {
        /// The requested binary name.
        name: String,
    },

    /// A binary descriptor could not be resolved to a path, even after the
    /// release fallback.
    #[error("could not find a path for binary {name} version {version} with tags {tags:?}")]
    BinaryPathNotFound {
        /// The requested binary name.
        name: String,
        /// The requested version hash.
        version: String,
        /// The tags that had to be present.
        tags: Vec<String>,
    },

    /// The binary name does not map to any known release project, so no
    /// fallback recipe can be synthesized.
    #[error("binary {name:?} does not map to a known release project")]
    NoProjectForBinary {
        /// The unmapped binary name.
        name: String,
    },

    /// The descriptor's tags carry more than one platform tag.
    #[error("binary {name} has more than one platform tag: {tags:?}")]
    AmbiguousPlatform {
        /// The binary name.
        name: String,
        /// The offending tags.
        tags: Vec<String>,
    },

    /// The descriptor's tags carry no usable build config, or more than
    /// one, where exactly one is required to pick a release asset.
    #[error("binary {name} needs exactly one config tag (Release or Debug), got {tags:?}")]
    AmbiguousConfig {
        /// The binary name.
        name: String,
        /// The offending tags.
        tags: Vec<String>,
    },

    /// The binary is not published for the requested platform.
    #[error("binary {name} is not available on {platform}")]
    PlatformUnsupported {
        /// The binary name.
        name: String,
        /// The requested platform tag.
        platform: String,
    },

    /// A latest-version lookup against the release listing failed.
    #[error("failed to find the latest version of {project}: {reason}")]
    DownloadVersion {
        /// The release project name.
        project: String,
        /// Why the lookup failed.
        reason: String,
    },

    /// An underlying artifact operation failed.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}
