pub mod ast;
pub mod chars;
pub mod diagnostic;
pub mod kind;
pub mod parser;
pub mod syntax;

pub use ast::{InvalidReason, Regex, Span};
pub use diagnostic::{Diagnostic, Diagnostics};
pub use kind::NodeKind;
pub use syntax::{SyntaxNode, SyntaxTree};

/// Parse a pattern body (no delimiters, no flags). Never fails: malformed input
/// shows up as `Invalid` units inside the returned tree.
pub fn parse(pattern: &str) -> Regex {
    parser::Parser::new(pattern).parse()
}

/// Parse a pattern body into its span-complete syntax tree.
pub fn parse_tree(pattern: &str) -> SyntaxTree<'_> {
    SyntaxTree::parse(pattern)
}

/// Parse and reject patterns containing any invalid construct.
pub fn check(pattern: &str) -> Result<Regex, Diagnostics> {
    let regex = parse(pattern);
    let diagnostics = SyntaxTree::build(pattern, &regex).diagnostics();
    if diagnostics.is_empty() {
        Ok(regex)
    } else {
        Err(Diagnostics(diagnostics))
    }
}
