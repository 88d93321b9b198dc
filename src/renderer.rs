//! Template renderer and expression evaluation for kiln.
//! Conditions, computed destination paths and interpolation expressions are
//! all evaluated through MiniJinja so rule tables share one expression
//! language.
use crate::error::{Error, Result};
use cruet::Inflector;
use minijinja::{Environment, UndefinedBehavior, Value};

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `template` - Template string to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String>;

    /// Renders a template, failing on any reference to an undefined value.
    /// Destination paths go through this so a missing option never turns
    /// into an empty path segment.
    fn render_strict(&self, template: &str, context: &serde_json::Value) -> Result<String>;

    /// Evaluates a single expression such as `buildTool == 'gradle'`.
    fn evaluate(&self, expression: &str, context: &serde_json::Value) -> Result<Value>;

    /// Checks that an expression compiles, without evaluating it.
    fn check_expression(&self, expression: &str) -> Result<()>;

    /// Checks that a template compiles, without rendering it.
    fn check_template(&self, template: &str) -> Result<()>;
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
    /// Same filters, with undefined values as errors
    strict_env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a renderer with the case-conversion filters registered.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_filter("camel_case", |value: String| value.to_camel_case());
        env.add_filter("pascal_case", |value: String| value.to_pascal_case());
        env.add_filter("snake_case", |value: String| value.to_snake_case());
        env.add_filter("kebab_case", |value: String| value.to_kebab_case());
        env.add_filter("screaming_snake_case", |value: String| {
            value.to_screaming_snake_case()
        });
        env.add_filter("title_case", |value: String| value.to_title_case());
        env.add_filter("package_path", |value: String| value.replace('.', "/"));

        let mut strict_env = env.clone();
        strict_env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { env, strict_env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        self.env.render_str(template, context).map_err(Error::MinijinjaError)
    }

    fn render_strict(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        self.strict_env.render_str(template, context).map_err(Error::MinijinjaError)
    }

    fn evaluate(&self, expression: &str, context: &serde_json::Value) -> Result<Value> {
        let expr = self.env.compile_expression(expression).map_err(Error::MinijinjaError)?;
        expr.eval(context).map_err(Error::MinijinjaError)
    }

    fn check_expression(&self, expression: &str) -> Result<()> {
        self.env.compile_expression(expression).map(|_| ()).map_err(Error::MinijinjaError)
    }

    fn check_template(&self, template: &str) -> Result<()> {
        self.env.template_from_str(template).map(|_| ()).map_err(Error::MinijinjaError)
    }
}
