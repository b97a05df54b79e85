//! Surrounding steps of a step found through a filtered view.

use reportgen_proto::Step;
use serde::Serialize;

/// A window of the full step sequence around one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepContext<'a> {
    pub steps: &'a [Step],
    /// Position of the requested step within `steps`.
    pub focus: usize,
    /// Position of the first step of the window in the full sequence.
    pub offset: usize,
}

/// Locates `target` in `all_steps` and returns up to `radius` steps on each side.
///
/// Steps are matched on timestamp, ident and content since a filtered view
/// does not carry positions in the full sequence. Returns `None` when the
/// step is not present.
pub fn step_context<'a>(
    all_steps: &'a [Step],
    target: &Step,
    radius: usize,
) -> Option<StepContext<'a>> {
    let position = all_steps.iter().position(|step| {
        step.timestamp == target.timestamp
            && step.ident == target.ident
            && step.content == target.content
    })?;
    let start = position.saturating_sub(radius);
    let end = position.saturating_add(radius).min(all_steps.len() - 1);
    Some(StepContext {
        steps: &all_steps[start..=end],
        focus: position - start,
        offset: start,
    })
}
