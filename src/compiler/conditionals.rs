//! Conditional pruning.

use crate::error::{CompileStage, ElementContext, ItsError, Result};
use crate::expression::ExpressionEvaluator;
use crate::template::ContentElement;
use serde_json::{Map, Value};
use tracing::debug;

/// Replace every conditional with the contents of its chosen branch.
///
/// The result holds only text and placeholder elements, in document order.
/// A true condition keeps `content`; a false one keeps `else`, or nothing.
pub(crate) fn prune_conditionals(
    elements: Vec<ContentElement>,
    evaluator: &ExpressionEvaluator<'_>,
    variables: &Map<String, Value>,
) -> Result<Vec<ContentElement>> {
    let mut flattened = Vec::with_capacity(elements.len());

    for (index, element) in elements.into_iter().enumerate() {
        let (id, condition, content, else_content) = match element {
            ContentElement::Conditional {
                id,
                condition,
                content,
                else_content,
            } => (id, condition, content, else_content),
            other => {
                flattened.push(other);
                continue;
            }
        };

        let keep = evaluator
            .evaluate(&condition, variables)
            .map_err(|e| match e {
                ItsError::Expression(inner) => ItsError::Compilation {
                    stage: CompileStage::ConditionalEvaluation,
                    message: inner.to_string(),
                    element: Some(ElementContext {
                        index,
                        id: id.clone(),
                        element_type: "conditional",
                    }),
                },
                other => other,
            })?;
        debug!(condition = %condition, keep, "evaluated conditional");

        let branch = if keep {
            content
        } else {
            else_content.unwrap_or_default()
        };
        flattened.extend(prune_conditionals(branch, evaluator, variables)?);
    }

    Ok(flattened)
}
