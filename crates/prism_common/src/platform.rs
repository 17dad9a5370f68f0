//! Host platform detection and platform-specific naming.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A platform on which tool binaries run.
///
/// Binary artifacts are tagged with a platform name; resolution implicitly
/// requires the candidate's tags to include the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Linux (x86-64).
    Linux,
    /// Windows (x86-64).
    Windows,
    /// macOS (x86-64).
    Mac,
}

impl Platform {
    /// Returns the platform of the running process.
    ///
    /// Non-Linux UNIX hosts are treated as Linux, since all prebuilt tool
    /// bundles are published for the three platforms listed here.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Linux
        }
    }

    /// The tag string used in binary descriptors, e.g. `"Linux"`.
    pub fn tag(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::Windows => "Windows",
            Platform::Mac => "Mac",
        }
    }

    /// The executable file suffix for this platform (`".exe"` or `""`).
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            _ => "",
        }
    }

    /// Parses a platform from its tag string.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Linux" => Some(Platform::Linux),
            "Windows" => Some(Platform::Windows),
            "Mac" => Some(Platform::Mac),
            _ => None,
        }
    }

    /// All supported platforms, in the order used by release artifact names.
    pub fn all() -> [Platform; 3] {
        [Platform::Linux, Platform::Windows, Platform::Mac]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
