//! Source and destination resolution for file specs.

use crate::context::GeneratorContext;
use crate::error::{Error, Result, RuleLocation};
use crate::renderer::TemplateRenderer;
use crate::rules::{DestPath, FileSpec};
use indexmap::IndexMap;
use log::debug;
use std::path::{Path, PathBuf};

/// Validates a path rendered from a declarative template.
///
/// A destination must name a file: it cannot be blank or end with a separator.
pub fn is_rendered_path_valid(path: &str) -> bool {
    !path.trim().is_empty() && !path.ends_with('/')
}

/// Prefixes a relative destination with the block's base path.
/// Absolute destinations are returned unchanged.
pub fn apply_base_path(base_path: Option<&str>, dest_path: &str) -> PathBuf {
    let dest = Path::new(dest_path);
    match base_path {
        Some(base) if !dest.is_absolute() && !base.is_empty() => Path::new(base).join(dest),
        _ => dest.to_path_buf(),
    }
}

/// Resolves a file spec into its source id and destination path.
///
/// A computed rename's output is authoritative: it is neither normalized nor
/// rewritten, only prefixed with the base path when relative.
pub fn resolve(
    spec: &FileSpec,
    base_path: Option<&str>,
    context: &GeneratorContext,
    renderer: &dyn TemplateRenderer,
    location: &RuleLocation,
) -> Result<(String, PathBuf)> {
    let path_error = |reason: String| Error::PathError { location: location.clone(), reason };

    let source_id = spec.source_id().to_string();
    let dest_path = match spec {
        FileSpec::Literal(path) => path.clone(),
        FileSpec::Templated(templated) => match &templated.dest_path {
            None => templated.source_id.clone(),
            Some(DestPath::Fixed(path)) => path.clone(),
            Some(DestPath::Computed(rename)) => {
                rename(context).map_err(|e| path_error(e.to_string()))?
            }
            Some(DestPath::Rendered(template)) => {
                let rendered = renderer
                    .render_strict(template, &context.to_value())
                    .map_err(|e| path_error(format!("cannot render '{template}': {e}")))?;
                if !is_rendered_path_valid(&rendered) {
                    return Err(path_error(format!(
                        "'{template}' rendered to '{rendered}'"
                    )));
                }
                rendered
            }
        },
    };

    if dest_path.trim().is_empty() {
        return Err(path_error("destination is empty".to_string()));
    }

    let dest_path = apply_base_path(base_path, &dest_path);
    debug!("Resolved '{}' -> '{}'", source_id, dest_path.display());
    Ok((source_id, dest_path))
}

/// Tracks resolved destinations of a run and rejects duplicates.
#[derive(Debug, Default)]
pub struct DestinationRegistry {
    seen: IndexMap<PathBuf, RuleLocation>,
}

impl DestinationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a destination, failing if another spec already claimed it.
    ///
    /// Paths are compared component-wise, so `api//build.gradle` and
    /// `api/build.gradle` collide.
    pub fn register(&mut self, dest_path: &Path, location: &RuleLocation) -> Result<()> {
        let key: PathBuf = dest_path.components().collect();
        if let Some(first) = self.seen.get(&key) {
            return Err(Error::DestinationCollision {
                path: key,
                first: first.clone(),
                second: location.clone(),
            });
        }
        self.seen.insert(key, location.clone());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
