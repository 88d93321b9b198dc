//! Content generation for resolved file specs.
//!
//! Each mode has a fixed contract:
//! - `Interpolate` decodes the source as UTF-8 and rewrites only the
//!   substrings matched by the interpolation pattern;
//! - `CopyText` checks the source is UTF-8 and returns it untouched;
//! - `CopyBinary` returns the raw bytes without decoding.

use crate::constants::{DEFAULT_INTERPOLATE_PATTERN, ESCAPED_INTERPOLATE_PATTERN};
use crate::error::{Error, Result, RuleLocation};
use crate::renderer::TemplateRenderer;
use crate::rules::{InterpolatePattern, Mode};
use crate::store::TemplateStore;
use log::debug;
use regex::Regex;

/// Rewrites every match of `pattern` in `text` with the value of its first
/// capture group, evaluated as an expression against `context`.
///
/// Text outside the matches is copied byte for byte. Referencing an option
/// the context does not define is an error rather than an empty string.
pub fn interpolate(
    text: &str,
    pattern: &Regex,
    renderer: &dyn TemplateRenderer,
    context: &serde_json::Value,
    location: &RuleLocation,
) -> Result<String> {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for captures in pattern.captures_iter(text) {
        let Some(whole) = captures.get(0) else { continue };
        let expression = captures.get(1).map(|m| m.as_str().trim()).unwrap_or_default();

        let value = renderer.evaluate(expression, context).map_err(|e| {
            Error::InterpolationError { location: location.clone(), reason: e.to_string() }
        })?;
        if value.is_undefined() {
            return Err(Error::InterpolationError {
                location: location.clone(),
                reason: format!("'{expression}' is undefined"),
            });
        }

        output.push_str(&text[last..whole.start()]);
        output.push_str(&value.to_string());
        last = whole.end();
    }
    output.push_str(&text[last..]);

    Ok(output)
}

/// Produces destination bytes from the template store.
pub struct Materializer<'a> {
    store: &'a dyn TemplateStore,
    renderer: &'a dyn TemplateRenderer,
    default_pattern: Regex,
    escaped_pattern: Regex,
}

impl<'a> Materializer<'a> {
    pub fn new(store: &'a dyn TemplateStore, renderer: &'a dyn TemplateRenderer) -> Result<Self> {
        Ok(Self {
            store,
            renderer,
            default_pattern: Regex::new(DEFAULT_INTERPOLATE_PATTERN)?,
            escaped_pattern: Regex::new(ESCAPED_INTERPOLATE_PATTERN)?,
        })
    }

    fn regex<'p>(&'p self, pattern: &'p InterpolatePattern) -> &'p Regex {
        match pattern {
            InterpolatePattern::Default => &self.default_pattern,
            InterpolatePattern::Escaped => &self.escaped_pattern,
            InterpolatePattern::Custom(regex) => regex,
        }
    }

    /// Loads `source_id` and produces its destination bytes for `mode`.
    ///
    /// # Errors
    /// * `Error::TemplateNotFound` if the store has no such source
    /// * `Error::SourceError` if the store fails to load it
    /// * `Error::InvalidText` if a text mode meets non UTF-8 content
    /// * `Error::InterpolationError` if an expression fails
    pub fn materialize(
        &self,
        source_id: &str,
        mode: Mode,
        pattern: &InterpolatePattern,
        context: &serde_json::Value,
        location: &RuleLocation,
    ) -> Result<Vec<u8>> {
        let bytes = self
            .store
            .fetch(source_id, mode)
            .map_err(|e| Error::SourceError { location: location.clone(), source: Box::new(e) })?
            .ok_or_else(|| Error::TemplateNotFound { location: location.clone() })?;

        debug!("Materializing '{}' ({})", source_id, mode);

        match mode {
            Mode::CopyBinary => Ok(bytes),
            Mode::CopyText => match std::str::from_utf8(&bytes) {
                Ok(_) => Ok(bytes),
                Err(_) => Err(Error::InvalidText { location: location.clone() }),
            },
            Mode::Interpolate => {
                let text = String::from_utf8(bytes)
                    .map_err(|_| Error::InvalidText { location: location.clone() })?;
                let rendered =
                    interpolate(&text, self.regex(pattern), self.renderer, context, location)?;
                Ok(rendered.into_bytes())
            }
        }
    }
}
