//! Uniform concrete syntax tree.
//!
//! Lowers the typed [`Regex`] into [`SyntaxNode`]s whose leaves partition the
//! input: every byte belongs to exactly one leaf, punctuation included. Missing
//! closing delimiters show up as zero-width `invalid` leaves.

use std::fmt;
use std::mem;

use serde::Serialize;

use crate::ast::{
    AssertionKind, Backreference, CharacterClass, ClassAtom, ClassEscape, ClassEscapeKind,
    ClassMember, Disjunction, Escape, EscapeKind, Group, GroupKind, Invalid, InvalidReason,
    Pattern, Quantifier, QuantifierKind, Regex, Span, Unit,
};
use crate::kind::NodeKind;
use crate::parser::Parser;

const RED_ZONE: usize = 64 * 1024;
const STACK_GROWTH: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    #[serde(flatten)]
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InvalidReason>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    fn leaf(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            reason: None,
            children: Vec::new(),
        }
    }

    fn punctuation(start: usize, end: usize) -> Self {
        Self::leaf(NodeKind::Punctuation, Span::new(start, end))
    }

    fn invalid(invalid: &Invalid) -> Self {
        Self {
            kind: NodeKind::Invalid,
            span: invalid.span,
            reason: Some(invalid.reason),
            children: Vec::new(),
        }
    }

    /// Children must be contiguous and cover `span` exactly.
    fn branch(kind: NodeKind, span: Span, children: Vec<SyntaxNode>) -> Self {
        debug_assert!(
            covers(span, &children),
            "{} {span} is not covered by {:?}",
            kind.name(),
            children.iter().map(|c| c.span).collect::<Vec<_>>()
        );
        Self {
            kind,
            span,
            reason: None,
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// A zero-width invalid leaf standing in for a missing delimiter.
    pub fn is_missing(&self) -> bool {
        self.kind == NodeKind::Invalid && self.span.is_empty()
    }
}

/// Deep trees are dropped from a heap stack.
impl Drop for SyntaxNode {
    fn drop(&mut self) {
        if self.children.iter().all(SyntaxNode::is_leaf) {
            return;
        }
        let mut stack = mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

fn covers(span: Span, children: &[SyntaxNode]) -> bool {
    let mut cursor = span.start;
    for child in children {
        if child.span.start != cursor {
            return false;
        }
        cursor = child.span.end;
    }
    cursor == span.end
}

/// A syntax tree borrowing the pattern it was built from.
#[derive(Debug, Clone)]
pub struct SyntaxTree<'a> {
    source: &'a str,
    root: SyntaxNode,
}

impl<'a> SyntaxTree<'a> {
    /// Parse `source` and build its tree.
    pub fn parse(source: &'a str) -> Self {
        let regex = Parser::new(source).parse();
        Self::build(source, &regex)
    }

    /// Build the tree for a pattern already parsed from `source`.
    pub fn build(source: &'a str, regex: &Regex) -> Self {
        debug_assert_eq!(regex.span, Span::new(0, source.len()));
        Self {
            source,
            root: lower_regex(regex),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    pub fn text(&self, node: &SyntaxNode) -> &'a str {
        &self.source[node.span.range()]
    }

    /// Every node, parents before children, in source order.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            stack: vec![&self.root],
        }
    }

    pub fn leaves(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.preorder().filter(|node| node.is_leaf())
    }

    pub fn invalid_nodes(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.preorder().filter(|node| node.kind == NodeKind::Invalid)
    }

    pub fn has_invalid(&self) -> bool {
        self.invalid_nodes().next().is_some()
    }

    /// The input rebuilt from leaf spans; equal to `source()` for every tree.
    pub fn reconstruct(&self) -> String {
        self.leaves().map(|leaf| self.text(leaf)).collect()
    }

    /// The deepest node whose span contains `start..end`.
    pub fn descendant_for_span(&self, start: usize, end: usize) -> &SyntaxNode {
        let target = Span::new(start, end.max(start));
        let mut node = &self.root;
        while let Some(child) = node.children.iter().find(|c| c.span.contains(target)) {
            node = child;
        }
        node
    }

    /// The leaf containing the byte at `offset`.
    pub fn leaf_at(&self, offset: usize) -> Option<&SyntaxNode> {
        let mut node = &self.root;
        while let Some(child) = node
            .children
            .iter()
            .find(|c| c.span.start <= offset && offset < c.span.end)
        {
            node = child;
        }
        (node.is_leaf() && node.span.start <= offset && offset < node.span.end).then_some(node)
    }

    /// Tree-sitter style S-expression of the named nodes.
    ///
    /// Example:
    /// - Pattern: `a+` → `(regex (disjunction (pattern (pattern_character) (one_or_more))))`
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        write_sexp(&self.root, &mut out);
        out
    }
}

fn write_sexp(node: &SyntaxNode, out: &mut String) {
    stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || {
        out.push('(');
        out.push_str(node.kind.name());
        if let Some(reason) = node.reason {
            out.push(' ');
            out.push_str(reason.as_str());
        }
        for child in node.children.iter().filter(|c| c.kind.is_named()) {
            out.push(' ');
            write_sexp(child, out);
        }
        out.push(')');
    })
}

/// Indented outline, one node per line.
impl fmt::Display for SyntaxTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(&self.root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            write!(f, "{:indent$}{} {}", "", node.kind.name(), node.span, indent = depth * 2)?;
            if let Some(reason) = node.reason {
                write!(f, " {reason}")?;
            }
            if node.is_leaf() {
                write!(f, " {:?}", self.text(node))?;
            }
            writeln!(f)?;
            stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
        }
        Ok(())
    }
}

pub struct Preorder<'t> {
    stack: Vec<&'t SyntaxNode>,
}

impl<'t> Iterator for Preorder<'t> {
    type Item = &'t SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

fn lower_regex(regex: &Regex) -> SyntaxNode {
    SyntaxNode::branch(NodeKind::Regex, regex.span, vec![lower_disjunction(&regex.body)])
}

fn lower_disjunction(disjunction: &Disjunction) -> SyntaxNode {
    let mut children = Vec::with_capacity(disjunction.alternatives.len() * 2);
    let mut delimiters = disjunction.delimiters.iter();
    for (index, alternative) in disjunction.alternatives.iter().enumerate() {
        if index > 0 {
            if let Some(&delimiter) = delimiters.next() {
                children.push(SyntaxNode::leaf(NodeKind::DisjunctionDelimiter, delimiter));
            }
        }
        children.push(lower_pattern(alternative));
    }
    SyntaxNode::branch(NodeKind::Disjunction, disjunction.span, children)
}

fn lower_pattern(pattern: &Pattern) -> SyntaxNode {
    let mut children = Vec::with_capacity(pattern.terms.len());
    for term in &pattern.terms {
        children.push(lower_unit(&term.unit));
        if let Some(quantifier) = &term.quantifier {
            children.push(lower_quantifier(quantifier));
        }
    }
    SyntaxNode::branch(NodeKind::Pattern, pattern.span, children)
}

fn lower_quantifier(quantifier: &Quantifier) -> SyntaxNode {
    let operator = quantifier.operator;
    let mut children = Vec::new();
    let kind = match &quantifier.kind {
        QuantifierKind::ZeroOrMore => NodeKind::ZeroOrMore,
        QuantifierKind::OneOrMore => NodeKind::OneOrMore,
        QuantifierKind::Optional => NodeKind::Optional,
        QuantifierKind::Count(count) => {
            children.push(SyntaxNode::punctuation(operator.start, operator.start + 1));
            children.push(SyntaxNode::leaf(NodeKind::CountQuantifierValue, count.min_span));
            if let Some(delimiter) = count.delimiter {
                children.push(SyntaxNode::leaf(NodeKind::CountQuantifierDelimiter, delimiter));
            }
            if let Some(max) = count.max_span {
                children.push(SyntaxNode::leaf(NodeKind::CountQuantifierValue, max));
            }
            children.push(SyntaxNode::punctuation(operator.end - 1, operator.end));
            NodeKind::CountQuantifier
        }
    };
    if children.is_empty() {
        children.push(SyntaxNode::punctuation(operator.start, operator.end));
    }
    if let Some(lazy) = quantifier.lazy {
        children.push(SyntaxNode::leaf(NodeKind::Lazy, lazy));
    }
    SyntaxNode::branch(kind, quantifier.span, children)
}

fn lower_unit(unit: &Unit) -> SyntaxNode {
    match unit {
        Unit::Literal { span, .. } => SyntaxNode::leaf(NodeKind::PatternCharacter, *span),
        Unit::AnyCharacter(span) => SyntaxNode::leaf(NodeKind::AnyCharacter, *span),
        Unit::Assertion { span, kind } => {
            let kind = match kind {
                AssertionKind::Start => NodeKind::StartAssertion,
                AssertionKind::End => NodeKind::EndAssertion,
                AssertionKind::WordBoundary => NodeKind::BoundaryAssertion,
                AssertionKind::NonWordBoundary => NodeKind::NonBoundaryAssertion,
            };
            SyntaxNode::leaf(kind, *span)
        }
        Unit::Escape(escape) => lower_escape(escape),
        Unit::ClassEscape(escape) => lower_class_escape(escape),
        Unit::CharacterClass(class) => lower_class(class),
        Unit::Backreference(backreference) => lower_backreference(backreference),
        Unit::Group(group) => stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || lower_group(group)),
        Unit::Invalid(invalid) => SyntaxNode::invalid(invalid),
    }
}

fn lower_escape(escape: &Escape) -> SyntaxNode {
    let span = escape.span;
    // Every escape prefix (`\c`, `\x`, `\u`, `\u{`) is ASCII.
    let split = |kind: NodeKind, prefix: usize, code: NodeKind, suffix: usize| {
        let mut children = vec![
            SyntaxNode::punctuation(span.start, span.start + prefix),
            SyntaxNode::leaf(code, Span::new(span.start + prefix, span.end - suffix)),
        ];
        if suffix > 0 {
            children.push(SyntaxNode::punctuation(span.end - suffix, span.end));
        }
        SyntaxNode::branch(kind, span, children)
    };
    match escape.kind {
        EscapeKind::Special(_) => SyntaxNode::leaf(NodeKind::SpecialEscape, span),
        EscapeKind::ControlLetter { .. } => split(
            NodeKind::ControlLetterEscape,
            2,
            NodeKind::ControlLetterCode,
            0,
        ),
        EscapeKind::Hexadecimal { .. } => split(
            NodeKind::HexadecimalEscape,
            2,
            NodeKind::HexadecimalCode,
            0,
        ),
        EscapeKind::Unicode { braced: false, .. } => {
            split(NodeKind::UnicodeEscape, 2, NodeKind::UnicodeCode, 0)
        }
        EscapeKind::Unicode { braced: true, .. } => {
            split(NodeKind::UnicodeEscape, 3, NodeKind::UnicodeCode, 1)
        }
        EscapeKind::Null => SyntaxNode::leaf(NodeKind::NullCharacter, span),
        EscapeKind::Identity(_) => SyntaxNode::branch(
            NodeKind::IdentityEscape,
            span,
            vec![
                SyntaxNode::leaf(NodeKind::EscapeOperator, Span::new(span.start, span.start + 1)),
                SyntaxNode::punctuation(span.start + 1, span.end),
            ],
        ),
    }
}

fn lower_class_escape(escape: &ClassEscape) -> SyntaxNode {
    let span = escape.span;
    match &escape.kind {
        ClassEscapeKind::Predefined(_) => SyntaxNode::leaf(NodeKind::CharacterClassEscape, span),
        ClassEscapeKind::Property(property) => {
            let mut children = vec![SyntaxNode::punctuation(span.start, span.start + 3)];
            if let Some(name) = &property.name {
                children.push(SyntaxNode::leaf(NodeKind::UnicodePropertyName, name.span));
            }
            if let Some(operator) = property.operator {
                children.push(SyntaxNode::leaf(NodeKind::UnicodePropertyOperator, operator));
            }
            children.push(SyntaxNode::leaf(
                NodeKind::UnicodePropertyValue,
                property.value.span,
            ));
            children.push(SyntaxNode::punctuation(span.end - 1, span.end));
            SyntaxNode::branch(NodeKind::CharacterClassEscape, span, children)
        }
    }
}

fn lower_class(class: &CharacterClass) -> SyntaxNode {
    let mut children = vec![SyntaxNode::leaf(NodeKind::SetBegin, class.begin)];
    if let Some(negation) = class.negation {
        children.push(SyntaxNode::leaf(NodeKind::SetNegation, negation));
    }
    for member in &class.members {
        children.push(match member {
            ClassMember::Atom(atom) => lower_class_atom(atom),
            ClassMember::Range(range) => SyntaxNode::branch(
                NodeKind::CharacterRange,
                range.span,
                vec![
                    lower_class_atom(&range.low),
                    SyntaxNode::leaf(NodeKind::RangeDelimiter, range.delimiter),
                    lower_class_atom(&range.high),
                ],
            ),
        });
    }
    match (class.end, class.missing_end()) {
        (Some(end), _) => children.push(SyntaxNode::leaf(NodeKind::SetEnd, end)),
        (None, Some(missing)) => children.push(SyntaxNode::invalid(&missing)),
        (None, None) => {}
    }
    SyntaxNode::branch(NodeKind::CharacterClass, class.span, children)
}

fn lower_class_atom(atom: &ClassAtom) -> SyntaxNode {
    match atom {
        ClassAtom::Literal { span, .. } => SyntaxNode::leaf(NodeKind::ClassCharacter, *span),
        ClassAtom::Escape(escape) => lower_escape(escape),
        ClassAtom::ClassEscape(escape) => lower_class_escape(escape),
        ClassAtom::Invalid(invalid) => SyntaxNode::invalid(invalid),
    }
}

fn lower_backreference(backreference: &Backreference) -> SyntaxNode {
    match backreference {
        Backreference::Numeric { span, .. } => {
            SyntaxNode::leaf(NodeKind::BackreferenceEscape, *span)
        }
        Backreference::Named { span, name } => SyntaxNode::branch(
            NodeKind::BackreferenceEscape,
            *span,
            vec![
                SyntaxNode::punctuation(span.start, name.span.start),
                SyntaxNode::leaf(NodeKind::GroupName, name.span),
                SyntaxNode::punctuation(name.span.end, span.end),
            ],
        ),
    }
}

fn lower_group(group: &Group) -> SyntaxNode {
    let identifier = |kind: NodeKind| group.identifier.map(|span| SyntaxNode::leaf(kind, span));
    let (kind, identifier) = match &group.kind {
        GroupKind::Anonymous => (NodeKind::AnonymousCapturingGroup, None),
        GroupKind::NonCapturing => (
            NodeKind::NonCapturingGroup,
            identifier(NodeKind::NonCapturingGroupIdentifier),
        ),
        GroupKind::Named(name) => (
            NodeKind::NamedCapturingGroup,
            group.identifier.map(|span| {
                SyntaxNode::branch(
                    NodeKind::NamedCapturingGroupIdentifier,
                    span,
                    vec![
                        SyntaxNode::punctuation(span.start, name.span.start),
                        SyntaxNode::leaf(NodeKind::GroupName, name.span),
                        SyntaxNode::punctuation(name.span.end, span.end),
                    ],
                )
            }),
        ),
        GroupKind::Lookahead => (
            NodeKind::LookaheadAssertion,
            identifier(NodeKind::LookaheadIdentifier),
        ),
        GroupKind::NegativeLookahead => (
            NodeKind::NegativeLookaheadAssertion,
            identifier(NodeKind::NegativeLookaheadIdentifier),
        ),
        GroupKind::Lookbehind => (
            NodeKind::LookbehindAssertion,
            identifier(NodeKind::LookbehindIdentifier),
        ),
        GroupKind::NegativeLookbehind => (
            NodeKind::NegativeLookbehindAssertion,
            identifier(NodeKind::NegativeLookbehindIdentifier),
        ),
        GroupKind::Malformed(invalid) => {
            (NodeKind::MalformedGroup, Some(SyntaxNode::invalid(invalid)))
        }
    };

    let mut children = vec![SyntaxNode::leaf(NodeKind::GroupBegin, group.begin)];
    children.extend(identifier);
    children.push(lower_disjunction(&group.body));
    match (group.end, group.missing_end()) {
        (Some(end), _) => children.push(SyntaxNode::leaf(NodeKind::GroupEnd, end)),
        (None, Some(missing)) => children.push(SyntaxNode::invalid(&missing)),
        (None, None) => {}
    }
    SyntaxNode::branch(kind, group.span, children)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sexp(pattern: &str) -> String {
        SyntaxTree::parse(pattern).to_sexp()
    }

    #[test]
    fn empty_pattern() {
        assert_eq!(sexp(""), "(regex (disjunction (pattern)))");
    }

    #[test]
    fn lazy_quantifier() {
        assert_eq!(
            sexp("a+?"),
            "(regex (disjunction (pattern (pattern_character) (one_or_more (lazy)))))"
        );
    }

    #[test]
    fn count_quantifier_tokens() {
        assert_eq!(
            sexp("a{2,1}"),
            "(regex (disjunction (pattern (pattern_character) (count_quantifier \
             (count_quantifier_value) (count_quantifier_delimiter) (count_quantifier_value)))))"
        );
    }

    #[test]
    fn named_group() {
        assert_eq!(
            sexp("(?<name>ab)"),
            "(regex (disjunction (pattern (named_capturing_group (group_begin) \
             (named_capturing_group_identifier (group_name)) \
             (disjunction (pattern (pattern_character) (pattern_character))) (group_end)))))"
        );
    }

    #[test]
    fn class_with_range() {
        assert_eq!(
            sexp("[^a-z]"),
            "(regex (disjunction (pattern (character_class (set_begin) (set_negation) \
             (character_range (class_character) (range_delimiter) (class_character)) (set_end)))))"
        );
    }

    #[test]
    fn bad_escape_is_single_invalid() {
        assert_eq!(
            sexp(r"\q"),
            "(regex (disjunction (pattern (invalid bad-escape))))"
        );
    }

    #[test]
    fn unterminated_group_has_missing_marker() {
        let tree = SyntaxTree::parse("(a");
        assert_eq!(
            tree.to_sexp(),
            "(regex (disjunction (pattern (anonymous_capturing_group (group_begin) \
             (disjunction (pattern (pattern_character))) (invalid unterminated-group)))))"
        );
        let missing: Vec<_> = tree.invalid_nodes().collect();
        assert_eq!(missing.len(), 1);
        assert!(missing[0].is_missing());
        assert_eq!(tree.reconstruct(), "(a");
    }

    #[test]
    fn alternation_tokens() {
        let tree = SyntaxTree::parse("a|");
        let delimiters: Vec<_> = tree
            .preorder()
            .filter(|n| n.kind == NodeKind::DisjunctionDelimiter)
            .map(|n| n.span)
            .collect();
        assert_eq!(delimiters, vec![Span::new(1, 2)]);
    }

    #[test]
    fn leaves_partition_input() {
        let pattern = r"^(?<y>\d{4})-(?:[^\]\u{41}-Z]|\p{L}+?)*\k<y>\1$";
        let tree = SyntaxTree::parse(pattern);
        let mut cursor = 0;
        for leaf in tree.leaves() {
            assert_eq!(leaf.span.start, cursor);
            cursor = leaf.span.end;
        }
        assert_eq!(cursor, pattern.len());
        assert!(!tree.has_invalid(), "{tree}");
    }

    #[test]
    fn leaf_lookup() {
        let tree = SyntaxTree::parse(r"a(\x41)");
        let leaf = tree.leaf_at(4).unwrap();
        assert_eq!(leaf.kind, NodeKind::HexadecimalCode);
        assert_eq!(tree.text(leaf), "41");
        assert!(tree.leaf_at(7).is_none());

        let escape = tree.descendant_for_span(2, 6);
        assert_eq!(escape.kind, NodeKind::HexadecimalEscape);
        let group = tree.descendant_for_span(1, 7);
        assert_eq!(group.kind, NodeKind::AnonymousCapturingGroup);
    }

    #[test]
    fn json_shape() {
        let tree = SyntaxTree::parse("a");
        let json = serde_json::to_value(tree.root()).unwrap();
        let leaf = &json["children"][0]["children"][0]["children"][0];
        assert_eq!(leaf["kind"], "pattern_character");
        assert_eq!(leaf["start"], 0);
        assert_eq!(leaf["end"], 1);
        assert!(leaf.get("children").is_none());
    }

    #[test]
    fn outline_lists_leaf_text() {
        let outline = SyntaxTree::parse("a").to_string();
        assert_eq!(
            outline,
            "regex 0..1\n  disjunction 0..1\n    pattern 0..1\n      pattern_character 0..1 \"a\"\n"
        );
    }
}
