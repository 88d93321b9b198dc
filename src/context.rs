//! Generator context handling.
//! The context is the resolved bag of project options that drives conditional
//! inclusion and path computation. It is loaded once per run, completed with
//! derived fields by [`GeneratorContext::setup`], and only read afterwards.

use crate::constants::{CONTEXT_FILES, CONTEXT_NAMESPACE};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Resolved project options for one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratorContext {
    values: IndexMap<String, serde_json::Value>,
}

impl GeneratorContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from a parsed document.
    ///
    /// `null` yields an empty context. When the document nests its options
    /// under the generator namespace key, that object is used instead.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let value = match value {
            serde_json::Value::Null => return Ok(Self::new()),
            serde_json::Value::Object(mut map) => match map.remove(CONTEXT_NAMESPACE) {
                Some(nested @ serde_json::Value::Object(_)) => nested,
                Some(other) => {
                    map.insert(CONTEXT_NAMESPACE.to_string(), other);
                    serde_json::Value::Object(map)
                }
                None => serde_json::Value::Object(map),
            },
            other => {
                return Err(Error::ContextError(format!(
                    "expected an object of options, found {other}"
                )))
            }
        };
        Ok(serde_json::from_value(value)?)
    }

    /// Builder-style insert.
    pub fn with<K: Into<String>, V: Into<serde_json::Value>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert<K: Into<String>, V: Into<serde_json::Value>>(&mut self, key: K, value: V) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Returns a string option or a `MissingContextValue` error naming the key.
    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.values
            .get(key)
            .and_then(|value| value.as_str())
            .ok_or_else(|| Error::MissingContextValue { key: key.to_string() })
    }

    /// True when `key` holds the string `expected`.
    pub fn is(&self, key: &str, expected: &str) -> bool {
        self.values.get(key).and_then(|value| value.as_str()) == Some(expected)
    }

    /// Truthiness of a boolean flag; absent means false.
    pub fn flag(&self, key: &str) -> bool {
        self.values.get(key).and_then(|value| value.as_bool()).unwrap_or(false)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The context as a JSON object, for the template renderer.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        )
    }

    /// Applies a `KEY=VALUE` override. The value is read as a JSON scalar
    /// when it parses as one, otherwise it is kept as a string.
    pub fn apply_override(&mut self, assignment: &str) -> Result<()> {
        let (key, raw) = assignment.split_once('=').ok_or_else(|| {
            Error::ContextError(format!("override '{assignment}' is not KEY=VALUE"))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::ContextError(format!("override '{assignment}' has no key")));
        }
        let value = match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value) if !value.is_object() && !value.is_array() => value,
            _ => serde_json::Value::String(raw.to_string()),
        };
        debug!("Context override {key} = {value}");
        self.insert(key, value);
        Ok(())
    }

    /// Fills the derived fields computed rules rely on.
    ///
    /// Explicit values are never overwritten.
    pub fn setup(&mut self) {
        if !self.contains_key("packageFolder") {
            if let Some(package_name) = self.get("packageName").and_then(|v| v.as_str()) {
                let folder = package_name.replace('.', "/");
                self.insert("packageFolder", folder);
            }
        }
        if let Some(folder) = self.get("packageFolder").and_then(|v| v.as_str()) {
            let folder = folder.trim_end_matches('/').to_string();
            for key in ["javaDir", "testDir"] {
                if !self.contains_key(key) {
                    self.insert(key, folder.clone());
                }
            }
        }
    }
}

/// Parses context content, trying JSON first and YAML second.
pub fn parse_context(content: &str) -> Result<GeneratorContext> {
    if content.trim().is_empty() {
        return Ok(GeneratorContext::new());
    }
    let value: serde_json::Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::ContextError(format!("invalid context format: {e}")))?,
    };
    GeneratorContext::from_value(value)
}

/// Returns the first known context file present in `dir`.
pub fn find_context_file<P: AsRef<Path>>(dir: P) -> Option<PathBuf> {
    CONTEXT_FILES.iter().map(|file| dir.as_ref().join(file)).find(|path| path.is_file())
}

pub fn load_context_file<P: AsRef<Path>>(path: P) -> Result<GeneratorContext> {
    let path = path.as_ref();
    debug!("Loading context from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::ContextError(format!("cannot read '{}': {e}", path.display()))
    })?;
    parse_context(&content)
}

pub fn load_from_stdin() -> Result<GeneratorContext> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    parse_context(&buffer)
}

/// Resolves the context for a run.
///
/// Stdin wins over an explicit file; without either, the output directory is
/// searched for a persisted context. Finding nothing yields an empty context.
pub fn load_context(
    context_file: Option<&Path>,
    from_stdin: bool,
    output_dir: &Path,
) -> Result<GeneratorContext> {
    if from_stdin {
        return load_from_stdin();
    }
    if let Some(path) = context_file {
        return load_context_file(path);
    }
    match find_context_file(output_dir) {
        Some(path) => load_context_file(path),
        None => {
            debug!("No context file found in {}", output_dir.display());
            Ok(GeneratorContext::new())
        }
    }
}
