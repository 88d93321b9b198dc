//! Template stores: where the raw content behind a source id comes from.
use crate::constants::TEMPLATE_SUFFIX;
use crate::error::{Error, Result};
use crate::rules::Mode;
use indexmap::IndexMap;
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Trait for looking up template content by source id.
pub trait TemplateStore {
    /// Fetches the raw bytes behind `source_id`.
    ///
    /// # Returns
    /// * `Ok(None)` - The store has no such source
    /// * `Ok(Some(bytes))` - The raw, undecoded content
    fn fetch(&self, source_id: &str, mode: Mode) -> Result<Option<Vec<u8>>>;
}

/// Store backed by a template directory on the local filesystem.
///
/// For interpolated sources a `<source_id>.j2` file takes precedence over
/// `<source_id>`, so templates can be told apart from verbatim assets.
/// Only the interpolation pattern's markers are substituted in either file;
/// block tags such as `{% if %}` are copied through untouched.
#[derive(Debug)]
pub struct DirTemplateStore {
    root: PathBuf,
}

impl DirTemplateStore {
    /// Opens a template directory.
    ///
    /// # Errors
    /// * `Error::TemplateError` if the directory does not exist
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::TemplateError(format!(
                "template directory '{}' does not exist",
                root.display()
            )));
        }
        Ok(Self { root: root.to_path_buf() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, source_id: &str, mode: Mode) -> Vec<PathBuf> {
        let plain = self.root.join(source_id);
        match mode {
            Mode::Interpolate => {
                vec![self.root.join(format!("{source_id}{TEMPLATE_SUFFIX}")), plain]
            }
            Mode::CopyText | Mode::CopyBinary => vec![plain],
        }
    }
}

impl TemplateStore for DirTemplateStore {
    fn fetch(&self, source_id: &str, mode: Mode) -> Result<Option<Vec<u8>>> {
        for candidate in self.candidates(source_id, mode) {
            match fs::read(&candidate) {
                Ok(bytes) => {
                    debug!("Loaded source '{}'", candidate.display());
                    return Ok(Some(bytes));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => return Err(Error::ReadError { path: candidate, source }),
            }
        }
        Ok(None)
    }
}

/// In-memory store, for embedded template sets and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryTemplateStore {
    entries: IndexMap<String, Vec<u8>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<S: Into<String>, B: Into<Vec<u8>>>(mut self, source_id: S, content: B) -> Self {
        self.insert(source_id, content);
        self
    }

    pub fn insert<S: Into<String>, B: Into<Vec<u8>>>(&mut self, source_id: S, content: B) {
        self.entries.insert(source_id.into(), content.into());
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn fetch(&self, source_id: &str, _mode: Mode) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(source_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dir_store_prefers_template_suffix() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("build.gradle"), "plain").unwrap();
        fs::write(temp_dir.path().join("build.gradle.j2"), "template").unwrap();

        let store = DirTemplateStore::new(temp_dir.path()).unwrap();
        let interpolated = store.fetch("build.gradle", Mode::Interpolate).unwrap();
        assert_eq!(interpolated.as_deref(), Some(b"template".as_slice()));

        let copied = store.fetch("build.gradle", Mode::CopyText).unwrap();
        assert_eq!(copied.as_deref(), Some(b"plain".as_slice()));
    }

    #[test]
    fn test_dir_store_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let store = DirTemplateStore::new(temp_dir.path()).unwrap();
        assert!(store.fetch("nope.txt", Mode::Interpolate).unwrap().is_none());
    }

    #[test]
    fn test_dir_store_unreadable_source_names_path() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("build.gradle")).unwrap();
        let store = DirTemplateStore::new(temp_dir.path()).unwrap();

        match store.fetch("build.gradle", Mode::CopyText).unwrap_err() {
            Error::ReadError { path, .. } => {
                assert_eq!(path, temp_dir.path().join("build.gradle"))
            }
            other => panic!("Expected ReadError, got {other:?}"),
        }
    }

    #[test]
    fn test_dir_store_requires_directory() {
        let temp_dir = TempDir::new().unwrap();
        assert!(DirTemplateStore::new(temp_dir.path().join("missing")).is_err());
    }
}
