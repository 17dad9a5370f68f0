//! Archive download seam.
//!
//! Recipe execution streams archives to disk through the [`Fetch`] trait so
//! tests can substitute a local fetcher and nothing but the one production
//! implementation ever touches the network.

use crate::error::ArtifactError;
use prism_common::fsutil;
use std::path::Path;

/// Streams the contents of a URL into a destination file.
pub trait Fetch {
    /// Downloads `url` to `dest`, creating parent directories as needed.
    ///
    /// Implementations must stream: archives can be hundreds of MB and must
    /// not be buffered whole in memory. No read timeout is applied; the
    /// download is cancellable only at the process level.
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), ArtifactError>;
}

/// The production fetcher, backed by a blocking HTTP client.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Builds a fetcher with no read timeout and a `prism/<version>` user
    /// agent.
    pub fn new() -> Result<Self, ArtifactError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .user_agent(concat!("prism/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ArtifactError::Download {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), ArtifactError> {
        fsutil::create_parent_dirs(dest).map_err(|e| ArtifactError::io(dest, e))?;
        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ArtifactError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        let mut out = std::fs::File::create(dest).map_err(|e| ArtifactError::io(dest, e))?;
        std::io::copy(&mut response, &mut out).map_err(|e| ArtifactError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
