//! Error handling for kiln.
//! Defines the error taxonomy of a generation run and the result alias used
//! throughout the crate.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Identifies a single file spec inside a rule table.
///
/// Every configuration error carries one so the rule-table author can find the
/// offending entry without re-running with verbose logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleLocation {
    pub group: String,
    pub block: usize,
    pub source_id: Option<String>,
    pub dest_path: Option<String>,
}

impl RuleLocation {
    /// Location of a whole block, before any file spec is looked at.
    pub fn block<S: Into<String>>(group: S, block: usize) -> Self {
        Self { group: group.into(), block, source_id: None, dest_path: None }
    }

    pub fn with_source<S: Into<String>>(mut self, source_id: S) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    pub fn with_dest<S: Into<String>>(mut self, dest_path: S) -> Self {
        self.dest_path = Some(dest_path.into());
        self
    }
}

impl fmt::Display for RuleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.group, self.block)?;
        if let Some(source_id) = &self.source_id {
            write!(f, " '{source_id}'")?;
        }
        if let Some(dest_path) = &self.dest_path {
            write!(f, " -> '{dest_path}'")?;
        }
        Ok(())
    }
}

/// Main error type for kiln operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Writing a generated file failed.
    #[error("Cannot write '{}': {source}.", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A template source exists but could not be read.
    #[error("Cannot read '{}': {source}.", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A legacy path exists but could not be removed.
    #[error("Cannot remove legacy path '{}': {source}.", path.display())]
    CleanupError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Represents errors in locating the template source
    #[error("Template error: {0}.")]
    TemplateError(String),

    /// The rule table failed structural validation when it was loaded.
    #[error("Rule table error: {0}.")]
    RuleTableError(String),

    /// A block condition could not be evaluated.
    #[error("Condition of {location} failed: {reason}.")]
    ConditionError { location: RuleLocation, reason: String },

    /// A destination path could not be computed.
    #[error("Destination path of {location} is invalid: {reason}.")]
    PathError { location: RuleLocation, reason: String },

    /// Two eligible file specs resolved to the same destination.
    #[error("Destination '{}' of {second} collides with {first}.", path.display())]
    DestinationCollision { path: PathBuf, first: RuleLocation, second: RuleLocation },

    /// The template store has no content for a source id.
    #[error("Template not found for {location}.")]
    TemplateNotFound { location: RuleLocation },

    /// The template store failed while loading the source of a file spec.
    #[error("Cannot load source of {location}: {source}")]
    SourceError {
        location: RuleLocation,
        #[source]
        source: Box<Error>,
    },

    /// An interpolation expression failed to evaluate.
    #[error("Interpolation of {location} failed: {reason}.")]
    InterpolationError { location: RuleLocation, reason: String },

    /// Text mode was requested for content that is not valid UTF-8.
    #[error("Source of {location} is not valid UTF-8 text.")]
    InvalidText { location: RuleLocation },

    /// A required option is not present in the generator context.
    #[error("Context value '{key}' is missing or not a string.")]
    MissingContextValue { key: String },

    /// The generator context could not be loaded or parsed.
    #[error("Context error: {0}.")]
    ContextError(String),

    /// The conflict policy forbids replacing a modified destination.
    #[error("Refusing to overwrite modified file '{}'.", path.display())]
    ConflictError { path: PathBuf },

    #[error("MiniJinja error: {0}.")]
    MinijinjaError(#[from] minijinja::Error),

    #[error("JSON error: {0}.")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}.")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Glob error: {0}.")]
    GlobError(#[from] globset::Error),

    #[error("Regex error: {0}.")]
    RegexError(#[from] regex::Error),
}

/// Convenience type alias for Results with kiln's Error as the error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
