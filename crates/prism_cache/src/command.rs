//! Content-hashed command descriptions and the output cache.
//!
//! Fuzzing runs the same preprocessing commands (e.g. `spirv-opt` over a
//! freshly generated shader) thousands of times, frequently on identical
//! inputs. A [`HashedCommand`] describes an invocation by what determines
//! its output: the program, the literal arguments, and the *contents* of
//! the input files. A [`CommandCache`] maps that description to an output
//! file produced by a previous run, so the command can be skipped entirely.

use crate::error::CacheError;
use prism_common::ContentHash;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A command invocation described for caching.
///
/// Tokens are appended in command-line order; two invocations collide in
/// the cache exactly when their token sequences are equal. Input files
/// contribute their content hash, not their path, so renamed or relocated
/// but identical inputs still hit. The output file contributes only a role
/// marker, since its path does not influence the produced bytes.
#[derive(Debug, Clone, Default)]
pub struct HashedCommand {
    tokens: Vec<String>,
}

impl HashedCommand {
    /// Creates an empty command description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the program. The program is identified by its path: resolved
    /// tool paths embed the version hash, so a different tool build is a
    /// different path.
    pub fn program(&mut self, path: &Path) -> &mut Self {
        self.tokens.push(format!("program:{}", path.display()));
        self
    }

    /// Appends one literal argument.
    pub fn arg(&mut self, arg: &str) -> &mut Self {
        self.tokens.push(format!("arg:{arg}"));
        self
    }

    /// Appends several literal arguments.
    pub fn args<'a>(&mut self, args: impl IntoIterator<Item = &'a str>) -> &mut Self {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    /// Appends an input file, identified by the hash of its contents.
    pub fn input_file(&mut self, path: &Path) -> Result<&mut Self, CacheError> {
        let hash = ContentHash::from_file(path).map_err(|e| CacheError::io(path, e))?;
        self.tokens.push(format!("input:{hash}"));
        Ok(self)
    }

    /// Appends the output file position. Only the role is recorded; the
    /// destination path is irrelevant to what the command produces.
    pub fn output_file(&mut self, _path: &Path) -> &mut Self {
        self.tokens.push("output".to_string());
        self
    }

    /// The cache key for this description.
    pub fn key(&self) -> ContentHash {
        let mut encoded = Vec::new();
        for token in &self.tokens {
            // Length-prefixed so token boundaries cannot be forged by
            // embedded separators.
            encoded.extend_from_slice(&(token.len() as u64).to_le_bytes());
            encoded.extend_from_slice(token.as_bytes());
        }
        ContentHash::from_bytes(&encoded)
    }
}

/// An in-memory map from hashed commands to output files they produced.
///
/// The cache stores paths, not bytes; entries stay valid as long as the
/// recorded output files do. Intended lifetime is one fuzzing session.
#[derive(Debug, Default)]
pub struct CommandCache {
    outputs: HashMap<ContentHash, PathBuf>,
}

impl CommandCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that running `cmd` produced `output_file`.
    pub fn add_output_to_cache(&mut self, cmd: &HashedCommand, output_file: &Path) {
        self.outputs.insert(cmd.key(), output_file.to_path_buf());
    }

    /// If `cmd` has a cached output, copies its bytes to `output_file` and
    /// returns the written path. Returns `None` on a miss; a hit whose
    /// recorded file has since disappeared is an error.
    pub fn write_cached_output_file(
        &self,
        cmd: &HashedCommand,
        output_file: &Path,
    ) -> Result<Option<PathBuf>, CacheError> {
        let Some(cached) = self.outputs.get(&cmd.key()) else {
            return Ok(None);
        };
        tracing::debug!(
            "command cache hit: {} -> {}",
            cached.display(),
            output_file.display()
        );
        prism_common::fsutil::create_parent_dirs(output_file)
            .map_err(|e| CacheError::io(output_file, e))?;
        std::fs::copy(cached, output_file).map_err(|e| CacheError::io(cached.clone(), e))?;
        Ok(Some(output_file.to_path_buf()))
    }

    /// Number of cached outputs.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Returns `true` if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn opt_command(program: &Path, input: &Path, output: &Path) -> HashedCommand {
        let mut cmd = HashedCommand::new();
        cmd.program(program);
        cmd.input_file(input).unwrap();
        cmd.arg("-o");
        cmd.output_file(output);
        cmd
    }

    #[test]
    fn identical_inputs_hit_regardless_of_paths() {
        let dir = tempfile::tempdir().unwrap();
        let program = write(dir.path(), "spirv-opt", b"fake tool");
        let input_a = write(dir.path(), "a.spv", b"shader bytes");
        let input_b = write(dir.path(), "b.spv", b"shader bytes");

        let mut cache = CommandCache::new();
        let out_a = write(dir.path(), "a.out", b"optimized");
        let cmd_a = opt_command(&program, &input_a, &out_a);
        cache.add_output_to_cache(&cmd_a, &out_a);

        // Same contents under a different name, writing somewhere new.
        let out_b = dir.path().join("sub/b.out");
        let cmd_b = opt_command(&program, &input_b, &out_b);
        let hit = cache.write_cached_output_file(&cmd_b, &out_b).unwrap();
        assert_eq!(hit, Some(out_b.clone()));
        assert_eq!(std::fs::read(&out_b).unwrap(), b"optimized");
    }

    #[test]
    fn different_input_contents_miss() {
        let dir = tempfile::tempdir().unwrap();
        let program = write(dir.path(), "spirv-opt", b"fake tool");
        let input_a = write(dir.path(), "a.spv", b"one");
        let input_b = write(dir.path(), "b.spv", b"two");
        let out = dir.path().join("x.out");

        let mut cache = CommandCache::new();
        let cmd_a = opt_command(&program, &input_a, &out);
        cache.add_output_to_cache(&cmd_a, &write(dir.path(), "a.out", b"res"));

        let cmd_b = opt_command(&program, &input_b, &out);
        assert!(cache.write_cached_output_file(&cmd_b, &out).unwrap().is_none());
    }

    #[test]
    fn arguments_participate_in_the_key() {
        let dir = tempfile::tempdir().unwrap();
        let program = write(dir.path(), "spirv-opt", b"fake tool");
        let input = write(dir.path(), "a.spv", b"shader");
        let out = dir.path().join("x.out");

        let mut with_flag = opt_command(&program, &input, &out);
        with_flag.arg("--validate-after-all");
        let without_flag = opt_command(&program, &input, &out);
        assert_ne!(with_flag.key(), without_flag.key());
    }

    #[test]
    fn token_boundaries_are_unambiguous() {
        let mut ab = HashedCommand::new();
        ab.arg("a").arg("b");
        let mut joined = HashedCommand::new();
        joined.arg("ab");
        assert_ne!(ab.key(), joined.key());
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cmd = HashedCommand::new();
        let err = cmd.input_file(&dir.path().join("absent.spv")).unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));
    }
}
