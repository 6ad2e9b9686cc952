//! Spans for pipeline evaluation.

use tracing::Span;

/// The span a terminal operation runs in.
pub(crate) fn evaluation_span(terminal: &'static str, mode: &'static str, stages: &[&'static str]) -> Span {
    tracing::debug_span!("evaluate", terminal, mode, stages = ?stages)
}
