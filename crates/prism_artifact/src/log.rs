//! Per-execution log capture.
//!
//! Every recipe execution writes its progress to the artifact's
//! `recipe.log`, so a failed or slow build can be diagnosed after the fact
//! without scraping process output. The log object is threaded explicitly
//! through the execution path; there is no global log stream state.

use prism_common::fsutil;
use std::io::Write;
use std::path::Path;

/// A line-oriented log file for one recipe execution attempt.
///
/// Creating the log truncates any previous attempt's log. Write failures
/// are swallowed: log capture must never turn a succeeding build into a
/// failing one.
pub struct RecipeLog {
    writer: Option<std::io::BufWriter<std::fs::File>>,
}

impl RecipeLog {
    /// Creates (or truncates) the log file at `path`.
    pub fn create(path: &Path) -> std::io::Result<Self> {
        fsutil::create_parent_dirs(path)?;
        let file = std::fs::File::create(path)?;
        Ok(Self {
            writer: Some(std::io::BufWriter::new(file)),
        })
    }

    /// A log that discards everything; used where no artifact directory
    /// exists to write into.
    pub fn sink() -> Self {
        Self { writer: None }
    }

    /// Appends one line to the log and mirrors it as a tracing event.
    pub fn message(&mut self, message: &str) {
        tracing::info!(target: "prism::recipe", "{message}");
        if let Some(writer) = &mut self.writer {
            let _ = writeln!(writer, "{message}");
            let _ = writer.flush();
        }
    }
}
