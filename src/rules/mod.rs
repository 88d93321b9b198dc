//! Rule table schema.
//!
//! A [`RuleTable`] is an ordered list of named [`RuleGroup`]s, each holding
//! [`RuleBlock`]s. A block carries an optional [`Condition`], an optional base
//! path and the [`FileSpec`]s it contributes when eligible. Tables are built
//! once (either in code, see [`server`], or from a file, see [`loader`]) and are
//! never mutated afterwards.

use crate::constants::{DEFAULT_INTERPOLATE_PATTERN, ESCAPED_INTERPOLATE_PATTERN};
use crate::context::GeneratorContext;
use crate::error::{Error, Result, RuleLocation};
use crate::renderer::TemplateRenderer;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod loader;
pub mod server;

/// Predicate over the generator context.
pub type ConditionFn = fn(&GeneratorContext) -> Result<bool>;

/// Computes a destination path from the generator context.
pub type PathFn = fn(&GeneratorContext) -> Result<String>;

/// Decides whether a block is eligible.
#[derive(Clone)]
pub enum Condition {
    /// A Rust predicate, used by built-in tables.
    Predicate(ConditionFn),
    /// A MiniJinja expression evaluated for truthiness, used by declarative tables.
    Expression(String),
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Expression(expression) => f.debug_tuple("Expression").field(expression).finish(),
        }
    }
}

/// How the bytes of a destination file are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// Substitute expressions matched by the interpolation pattern.
    #[default]
    Interpolate,
    /// Write the source text unchanged.
    CopyText,
    /// Write the source bytes unchanged, without decoding.
    CopyBinary,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Interpolate => write!(f, "interpolate"),
            Mode::CopyText => write!(f, "copy-text"),
            Mode::CopyBinary => write!(f, "copy-binary"),
        }
    }
}

/// Pattern selecting the substrings rewritten by interpolation.
///
/// The pattern's first capture group is the expression to evaluate.
#[derive(Debug, Clone, Default)]
pub enum InterpolatePattern {
    /// `<%= expression %>`
    #[default]
    Default,
    /// `<%: expression %>`, for sources whose own syntax uses `<%=`.
    Escaped,
    Custom(Regex),
}

impl InterpolatePattern {
    /// Compiles a custom pattern, requiring at least one capture group.
    pub fn custom(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        if regex.captures_len() < 2 {
            return Err(Error::RuleTableError(format!(
                "interpolation pattern '{pattern}' has no capture group"
            )));
        }
        Ok(Self::Custom(regex))
    }

    /// Parses the declarative form: `default`, `escaped` or a raw regex.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "default" => Ok(Self::Default),
            "escaped" => Ok(Self::Escaped),
            other => Self::custom(other),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => DEFAULT_INTERPOLATE_PATTERN,
            Self::Escaped => ESCAPED_INTERPOLATE_PATTERN,
            Self::Custom(regex) => regex.as_str(),
        }
    }
}

/// Destination of a structured file spec.
#[derive(Clone)]
pub enum DestPath {
    Fixed(String),
    /// Rust rename function; its output is used verbatim.
    Computed(PathFn),
    /// MiniJinja template rendered against the context.
    Rendered(String),
}

impl std::fmt::Debug for DestPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(path) => f.debug_tuple("Fixed").field(path).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
            Self::Rendered(template) => f.debug_tuple("Rendered").field(template).finish(),
        }
    }
}

/// A structured file spec.
#[derive(Debug, Clone)]
pub struct TemplatedSpec {
    pub source_id: String,
    pub dest_path: Option<DestPath>,
    pub mode: Mode,
    pub pattern: InterpolatePattern,
}

/// One output file of a block.
#[derive(Debug, Clone)]
pub enum FileSpec {
    /// Shorthand: source and destination are the same path, interpolated.
    Literal(String),
    Templated(TemplatedSpec),
}

impl FileSpec {
    pub fn templated<S: Into<String>>(source_id: S) -> Self {
        Self::Templated(TemplatedSpec {
            source_id: source_id.into(),
            dest_path: None,
            mode: Mode::Interpolate,
            pattern: InterpolatePattern::Default,
        })
    }

    pub fn copy_text<S: Into<String>>(source_id: S) -> Self {
        Self::templated(source_id).with_mode(Mode::CopyText)
    }

    pub fn copy_binary<S: Into<String>>(source_id: S) -> Self {
        Self::templated(source_id).with_mode(Mode::CopyBinary)
    }

    pub fn rename_to(self, rename: PathFn) -> Self {
        self.with_dest(DestPath::Computed(rename))
    }

    pub fn with_dest(self, dest_path: DestPath) -> Self {
        let mut spec = self.into_templated();
        spec.dest_path = Some(dest_path);
        Self::Templated(spec)
    }

    pub fn with_mode(self, mode: Mode) -> Self {
        let mut spec = self.into_templated();
        spec.mode = mode;
        Self::Templated(spec)
    }

    pub fn with_pattern(self, pattern: InterpolatePattern) -> Self {
        let mut spec = self.into_templated();
        spec.pattern = pattern;
        Self::Templated(spec)
    }

    pub fn source_id(&self) -> &str {
        match self {
            Self::Literal(path) => path,
            Self::Templated(spec) => &spec.source_id,
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::Literal(_) => Mode::Interpolate,
            Self::Templated(spec) => spec.mode,
        }
    }

    pub fn pattern(&self) -> &InterpolatePattern {
        static DEFAULT: InterpolatePattern = InterpolatePattern::Default;
        match self {
            Self::Literal(_) => &DEFAULT,
            Self::Templated(spec) => &spec.pattern,
        }
    }

    fn into_templated(self) -> TemplatedSpec {
        match self {
            Self::Literal(path) => TemplatedSpec {
                source_id: path,
                dest_path: None,
                mode: Mode::Interpolate,
                pattern: InterpolatePattern::Default,
            },
            Self::Templated(spec) => spec,
        }
    }
}

impl From<&str> for FileSpec {
    fn from(path: &str) -> Self {
        Self::Literal(path.to_string())
    }
}

impl From<String> for FileSpec {
    fn from(path: String) -> Self {
        Self::Literal(path)
    }
}

/// A conditional set of file specs sharing a base path.
#[derive(Debug, Clone, Default)]
pub struct RuleBlock {
    pub condition: Option<Condition>,
    pub base_path: Option<String>,
    pub file_specs: Vec<FileSpec>,
}

impl RuleBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn when(mut self, predicate: ConditionFn) -> Self {
        self.condition = Some(Condition::Predicate(predicate));
        self
    }

    pub fn when_expr<S: Into<String>>(mut self, expression: S) -> Self {
        self.condition = Some(Condition::Expression(expression.into()));
        self
    }

    pub fn base_path<S: Into<String>>(mut self, base_path: S) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn files<I, F>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FileSpec>,
    {
        self.file_specs.extend(specs.into_iter().map(Into::into));
        self
    }
}

/// A named, ordered sequence of blocks.
#[derive(Debug, Clone)]
pub struct RuleGroup {
    pub name: String,
    pub blocks: Vec<RuleBlock>,
}

impl RuleGroup {
    pub fn new<S: Into<String>>(name: S, blocks: Vec<RuleBlock>) -> Self {
        Self { name: name.into(), blocks }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    pub groups: Vec<RuleGroup>,
}

impl RuleTable {
    pub fn new(groups: Vec<RuleGroup>) -> Self {
        Self { groups }
    }

    pub fn group(&self, name: &str) -> Option<&RuleGroup> {
        self.groups.iter().find(|group| group.name == name)
    }

    /// Keeps only the named groups, in table order.
    ///
    /// Naming a group the table does not have is an error.
    pub fn select(self, names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Ok(self);
        }
        if let Some(unknown) = names.iter().find(|name| self.group(name).is_none()) {
            return Err(Error::RuleTableError(format!("unknown rule group '{unknown}'")));
        }
        let groups = self.groups.into_iter().filter(|group| names.contains(&group.name)).collect();
        Ok(Self { groups })
    }

    /// Structural validation performed once at load time.
    ///
    /// Checks that source ids are non-empty and that every declarative
    /// condition and destination template compiles.
    pub fn validate(&self, renderer: &dyn TemplateRenderer) -> Result<()> {
        for group in &self.groups {
            if group.name.trim().is_empty() {
                return Err(Error::RuleTableError("rule group with an empty name".to_string()));
            }
            for (index, block) in group.blocks.iter().enumerate() {
                let location = RuleLocation::block(&group.name, index);
                if let Some(Condition::Expression(expression)) = &block.condition {
                    renderer.check_expression(expression).map_err(|e| {
                        Error::RuleTableError(format!("{location}: invalid condition: {e}"))
                    })?;
                }
                for spec in &block.file_specs {
                    if spec.source_id().trim().is_empty() {
                        return Err(Error::RuleTableError(format!(
                            "{location}: file spec with an empty sourceId"
                        )));
                    }
                    if let FileSpec::Templated(TemplatedSpec {
                        dest_path: Some(DestPath::Rendered(template)),
                        ..
                    }) = spec
                    {
                        renderer.check_template(template).map_err(|e| {
                            let location = location.clone().with_source(spec.source_id());
                            Error::RuleTableError(format!(
                                "{location}: invalid destination template: {e}"
                            ))
                        })?;
                    }
                }
            }
        }
        Ok(())
    }
}
