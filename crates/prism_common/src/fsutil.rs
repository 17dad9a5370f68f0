//! Small filesystem helpers shared by the artifact engine.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Creates the parent directory of `path` (and all ancestors) if needed.
pub fn create_parent_dirs(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Per-process counter making temp file names unique among racing writers
/// within one process; the pid disambiguates across processes.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_sibling(path: &Path) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    path.with_file_name(format!(".{file_name}.{}.{n}.tmp", std::process::id()))
}

/// Writes `contents` to `path` atomically.
///
/// The bytes are written to a uniquely named temp file in the same directory
/// and then renamed into place, so no reader ever observes a partially
/// written file. When several processes race to write equivalent content,
/// whichever rename lands last wins and the file is valid throughout.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    create_parent_dirs(path)?;
    let temp = temp_sibling(path);
    std::fs::write(&temp, contents)?;
    match std::fs::rename(&temp, path) {
        Ok(()) => Ok(()),
        Err(e) => {
            // Leave no temp litter behind on failure.
            let _ = std::fs::remove_file(&temp);
            Err(e)
        }
    }
}

/// Normalizes a path without touching the filesystem: removes `.` segments
/// and resolves `..` against preceding normal components.
pub fn norm_path(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = result.pop();
                if !popped {
                    result.push(Component::ParentDir);
                }
            }
            other => result.push(other),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.json");
        write_atomic(&path, b"{}").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"{}");
    }

    #[test]
    fn write_atomic_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"two");
    }

    #[test]
    fn write_atomic_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        write_atomic(&path, b"data").unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1, "only the final file should remain: {names:?}");
    }

    #[test]
    fn norm_path_removes_dot_segments() {
        assert_eq!(
            norm_path(Path::new("a/./b/../c")),
            PathBuf::from("a/c")
        );
    }

    #[test]
    fn norm_path_keeps_leading_parent() {
        assert_eq!(norm_path(Path::new("../x")), PathBuf::from("../x"));
    }
}
