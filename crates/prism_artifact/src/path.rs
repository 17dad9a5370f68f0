//! Logical artifact paths.
//!
//! An artifact path is a root-relative identifier like `"//binaries/built_in/
//! glslang_v1"`. It always uses `/` as the separator, regardless of host OS,
//! and is resolved against the directory containing the `ROOT` marker file.

use crate::error::ArtifactError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The canonical prefix of every artifact path.
pub const ARTIFACT_PATH_PREFIX: &str = "//";

/// A validated, root-relative artifact path (`"//a/b"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactPath(String);

impl ArtifactPath {
    /// Creates an artifact path from its canonical string form.
    ///
    /// The string must start with `"//"`, use only `/` separators, and must
    /// not contain empty, `.` or `..` segments.
    pub fn new(path: impl Into<String>) -> Result<Self, ArtifactError> {
        let path = path.into();
        let Some(rest) = path.strip_prefix(ARTIFACT_PATH_PREFIX) else {
            return Err(ArtifactError::InvalidArtifactPath {
                path,
                reason: "must start with \"//\"".to_string(),
            });
        };
        if rest.is_empty() {
            // "//" alone names the root itself; allowed for scans.
            return Ok(Self(path));
        }
        if rest.contains('\\') {
            return Err(ArtifactError::InvalidArtifactPath {
                path,
                reason: "must use '/' separators".to_string(),
            });
        }
        for segment in rest.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                let reason = format!("bad path segment {segment:?}");
                return Err(ArtifactError::InvalidArtifactPath { path, reason });
            }
        }
        Ok(Self(path))
    }

    /// The canonical string form, starting with `"//"`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after the `"//"` prefix (may be empty for the root).
    pub fn relative_part(&self) -> &str {
        &self.0[ARTIFACT_PATH_PREFIX.len()..]
    }

    /// Creates an artifact path from a string that is known to be valid,
    /// such as a literal in a built-in table.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid artifact path.
    pub fn from_static(path: impl Into<String>) -> Self {
        match Self::new(path) {
            Ok(p) => p,
            Err(e) => panic!("invalid artifact path literal: {e}"),
        }
    }

    /// Returns a child artifact path with `segment` appended.
    pub fn join(&self, segment: &str) -> Result<Self, ArtifactError> {
        if self.relative_part().is_empty() {
            Self::new(format!("//{segment}"))
        } else {
            Self::new(format!("{}/{segment}", self.0))
        }
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ArtifactPath {
    type Error = ArtifactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ArtifactPath> for String {
    fn from(value: ArtifactPath) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_paths() {
        assert!(ArtifactPath::new("//binaries/built_in/glslang_v1").is_ok());
        assert!(ArtifactPath::new("//a").is_ok());
        assert!(ArtifactPath::new("//").is_ok());
    }

    #[test]
    fn missing_prefix_rejected() {
        assert!(ArtifactPath::new("binaries/x").is_err());
        assert!(ArtifactPath::new("/binaries/x").is_err());
    }

    #[test]
    fn bad_segments_rejected() {
        assert!(ArtifactPath::new("//a//b").is_err());
        assert!(ArtifactPath::new("//a/../b").is_err());
        assert!(ArtifactPath::new("//a/./b").is_err());
        assert!(ArtifactPath::new("//a/b/").is_err());
    }

    #[test]
    fn backslash_rejected() {
        assert!(ArtifactPath::new("//a\\b").is_err());
    }

    #[test]
    fn join_appends_segment() {
        let base = ArtifactPath::new("//binaries").unwrap();
        let child = base.join("built_in").unwrap();
        assert_eq!(child.as_str(), "//binaries/built_in");
    }

    #[test]
    fn join_on_root() {
        let root = ArtifactPath::new("//").unwrap();
        assert_eq!(root.join("a").unwrap().as_str(), "//a");
    }

    #[test]
    fn relative_part_strips_prefix() {
        let p = ArtifactPath::new("//a/b").unwrap();
        assert_eq!(p.relative_part(), "a/b");
    }

    #[test]
    fn serde_round_trip() {
        let p = ArtifactPath::new("//a/b").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"//a/b\"");
        let back: ArtifactPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn serde_rejects_invalid() {
        assert!(serde_json::from_str::<ArtifactPath>("\"a/b\"").is_err());
    }
}
