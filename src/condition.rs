//! Block eligibility.

use crate::context::GeneratorContext;
use crate::error::{Error, Result, RuleLocation};
use crate::renderer::TemplateRenderer;
use crate::rules::Condition;

/// Decides whether a block is eligible for the given context.
///
/// An absent condition is always eligible. Evaluation is pure, so calling it
/// twice for the same context yields the same answer. A failing predicate or
/// expression is reported as a `ConditionError` naming the block.
pub fn evaluate(
    condition: Option<&Condition>,
    context: &GeneratorContext,
    renderer: &dyn TemplateRenderer,
    location: &RuleLocation,
) -> Result<bool> {
    let condition_error = |reason: String| Error::ConditionError {
        location: location.clone(),
        reason,
    };

    match condition {
        None => Ok(true),
        Some(Condition::Predicate(predicate)) => {
            predicate(context).map_err(|e| condition_error(e.to_string()))
        }
        Some(Condition::Expression(expression)) => renderer
            .evaluate(expression, &context.to_value())
            .map(|value| value.is_true())
            .map_err(|e| condition_error(e.to_string())),
    }
}
