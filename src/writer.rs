//! Filesystem writes for generated files.
use crate::error::{Error, Result};
use log::{debug, warn};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What to do when a destination already holds different content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Replace the existing file.
    Force,
    /// Keep the existing file and report it.
    Skip,
    /// Abort the run.
    #[default]
    Fail,
}

/// Global write flags chosen by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WritePolicy {
    pub dry_run: bool,
    pub conflict: ConflictPolicy,
}

/// Outcome for one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Create,
    Overwrite,
    /// Existing content already matches.
    Identical,
    /// Existing content differs and was kept.
    Skip,
}

impl fmt::Display for WriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteAction::Create => write!(f, "create"),
            WriteAction::Overwrite => write!(f, "force"),
            WriteAction::Identical => write!(f, "identical"),
            WriteAction::Skip => write!(f, "skip"),
        }
    }
}

/// Writes `content` to `path`, creating missing parent directories first.
///
/// The parent chain is fully created before any byte is written; if that
/// fails, the destination is left untouched.
pub fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    let write_error = |source: io::Error| Error::WriteError { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, content).map_err(write_error)
}

/// Commits generated files under an output root.
#[derive(Debug, Clone)]
pub struct Writer {
    root: PathBuf,
    policy: WritePolicy,
}

impl Writer {
    pub fn new<P: AsRef<Path>>(root: P, policy: WritePolicy) -> Self {
        Self { root: root.as_ref().to_path_buf(), policy }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute destinations are kept, relative ones land under the root.
    pub fn target(&self, dest_path: &Path) -> PathBuf {
        self.root.join(dest_path)
    }

    /// Decides the action for `dest_path` without touching the filesystem.
    ///
    /// # Errors
    /// * `Error::ConflictError` if the content differs and the policy is `Fail`
    pub fn decide(&self, dest_path: &Path, content: &[u8]) -> Result<WriteAction> {
        let target = self.target(dest_path);
        let existing = match fs::read(&target) {
            Ok(existing) => existing,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(WriteAction::Create),
            Err(source) => return Err(Error::WriteError { path: target, source }),
        };
        if existing == content {
            return Ok(WriteAction::Identical);
        }
        match self.policy.conflict {
            ConflictPolicy::Force => Ok(WriteAction::Overwrite),
            ConflictPolicy::Skip => Ok(WriteAction::Skip),
            ConflictPolicy::Fail => Err(Error::ConflictError { path: target }),
        }
    }

    /// Carries out a previously decided action.
    pub fn commit(&self, dest_path: &Path, content: &[u8], action: WriteAction) -> Result<()> {
        let target = self.target(dest_path);
        match action {
            WriteAction::Identical => {
                debug!("Unchanged '{}'", target.display());
                Ok(())
            }
            WriteAction::Skip => {
                warn!("Not overwriting modified file '{}' (use --force)", target.display());
                Ok(())
            }
            WriteAction::Create | WriteAction::Overwrite if self.policy.dry_run => {
                debug!("Dry run: would {} '{}'", action, target.display());
                Ok(())
            }
            WriteAction::Create | WriteAction::Overwrite => {
                debug!("Writing '{}'", target.display());
                write_file(&target, content)
            }
        }
    }

    /// `decide` followed by `commit`.
    pub fn write(&self, dest_path: &Path, content: &[u8]) -> Result<WriteAction> {
        let action = self.decide(dest_path, content)?;
        self.commit(dest_path, content, action)?;
        Ok(action)
    }
}
