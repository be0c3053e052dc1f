//! Invalid nodes surfaced as error values for callers that want them.

use thiserror::Error;

use crate::ast::{InvalidReason, Span};
use crate::syntax::SyntaxTree;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} at {span} ({reason})", .reason.message())]
pub struct Diagnostic {
    pub reason: InvalidReason,
    pub span: Span,
}

/// All invalid nodes of one pattern, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pattern has {} invalid construct(s); first: {}", .0.len(), first(.0))]
pub struct Diagnostics(pub Vec<Diagnostic>);

fn first(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

impl Diagnostics {
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }
}

impl SyntaxTree<'_> {
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.invalid_nodes()
            .filter_map(|node| {
                node.reason.map(|reason| Diagnostic {
                    reason,
                    span: node.span,
                })
            })
            .collect()
    }
}
