use std::fmt;
use std::ops::Range;

use serde::Serialize;

/// Half-open byte range `[start, end)` into the parsed pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "inverted span {start}..{end}");
        Self { start, end }
    }

    /// Zero-width span at `at`.
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Root of a parsed pattern body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regex {
    pub span: Span,
    pub body: Disjunction,
}

/// Alternatives separated by `|`. Always holds at least one (possibly empty) pattern,
/// and exactly one more pattern than delimiters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Disjunction {
    pub span: Span,
    pub alternatives: Vec<Pattern>,
    pub delimiters: Vec<Span>,
}

/// One alternative: a sequence of optionally quantified units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub span: Span,
    pub terms: Vec<Term>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub span: Span,
    pub unit: Unit,
    pub quantifier: Option<Quantifier>,
}

impl Term {
    pub fn new(unit: Unit, quantifier: Option<Quantifier>) -> Self {
        let span = match &quantifier {
            Some(q) => unit.span().to(q.span),
            None => unit.span(),
        };
        Self {
            span,
            unit,
            quantifier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    Literal { span: Span, value: char },
    AnyCharacter(Span),
    Assertion { span: Span, kind: AssertionKind },
    Escape(Escape),
    ClassEscape(ClassEscape),
    CharacterClass(CharacterClass),
    Backreference(Backreference),
    Group(Box<Group>),
    Invalid(Invalid),
}

impl Unit {
    pub fn span(&self) -> Span {
        match self {
            Unit::Literal { span, .. } => *span,
            Unit::AnyCharacter(span) => *span,
            Unit::Assertion { span, .. } => *span,
            Unit::Escape(e) => e.span,
            Unit::ClassEscape(e) => e.span,
            Unit::CharacterClass(c) => c.span,
            Unit::Backreference(b) => b.span(),
            Unit::Group(g) => g.span,
            Unit::Invalid(i) => i.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionKind {
    Start,
    End,
    WordBoundary,
    NonWordBoundary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantifier {
    pub span: Span,
    pub kind: QuantifierKind,
    /// The `*`, `+`, `?` or `{...}` part, without the lazy marker.
    pub operator: Span,
    pub lazy: Option<Span>,
}

impl Quantifier {
    pub fn is_lazy(&self) -> bool {
        self.lazy.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantifierKind {
    ZeroOrMore,
    OneOrMore,
    Optional,
    Count(Count),
}

/// `{min}`, `{min,}` or `{min,max}`. `max < min` is kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Count {
    pub min: u32,
    pub max: Option<u32>,
    pub min_span: Span,
    pub delimiter: Option<Span>,
    pub max_span: Option<Span>,
}

impl Count {
    /// True when both bounds are present and out of order, e.g. `{2,1}`.
    pub fn is_reversed(&self) -> bool {
        self.max.is_some_and(|max| max < self.min)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub span: Span,
    pub kind: GroupKind,
    /// `(`
    pub begin: Span,
    /// `?:`, `?=`, `?<name>` and friends. `None` for anonymous groups.
    pub identifier: Option<Span>,
    pub body: Disjunction,
    /// `)`, absent when the input ended first.
    pub end: Option<Span>,
}

impl Group {
    pub fn is_terminated(&self) -> bool {
        self.end.is_some()
    }

    /// Zero-width marker standing in for a missing `)`.
    pub fn missing_end(&self) -> Option<Invalid> {
        match self.end {
            Some(_) => None,
            None => Some(Invalid::new(
                Span::empty(self.span.end),
                InvalidReason::UnterminatedGroup,
            )),
        }
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.kind, GroupKind::Anonymous | GroupKind::Named(_))
    }
}

/// Nested groups are dropped from a heap stack so deep nesting cannot overflow.
impl Drop for Group {
    fn drop(&mut self) {
        use std::mem;

        let mut stack = vec![mem::take(&mut self.body)];
        while let Some(body) = stack.pop() {
            for pattern in body.alternatives {
                for term in pattern.terms {
                    if let Unit::Group(mut group) = term.unit {
                        stack.push(mem::take(&mut group.body));
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKind {
    Anonymous,
    NonCapturing,
    Named(GroupName),
    Lookahead,
    NegativeLookahead,
    Lookbehind,
    NegativeLookbehind,
    /// `(?` followed by something that is not a known group prefix.
    Malformed(Invalid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupName {
    /// The name with `\u` escapes resolved.
    pub name: String,
    /// The name as written, without the angle brackets.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterClass {
    pub span: Span,
    pub begin: Span,
    pub negation: Option<Span>,
    pub members: Vec<ClassMember>,
    pub end: Option<Span>,
}

impl CharacterClass {
    pub fn negated(&self) -> bool {
        self.negation.is_some()
    }

    pub fn is_terminated(&self) -> bool {
        self.end.is_some()
    }

    pub fn missing_end(&self) -> Option<Invalid> {
        match self.end {
            Some(_) => None,
            None => Some(Invalid::new(
                Span::empty(self.span.end),
                InvalidReason::UnterminatedClass,
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassMember {
    Atom(ClassAtom),
    Range(ClassRange),
}

impl ClassMember {
    pub fn span(&self) -> Span {
        match self {
            ClassMember::Atom(atom) => atom.span(),
            ClassMember::Range(range) => range.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRange {
    pub span: Span,
    pub low: ClassAtom,
    pub delimiter: Span,
    pub high: ClassAtom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassAtom {
    Literal { span: Span, value: char },
    Escape(Escape),
    ClassEscape(ClassEscape),
    Invalid(Invalid),
}

impl ClassAtom {
    pub fn span(&self) -> Span {
        match self {
            ClassAtom::Literal { span, .. } => *span,
            ClassAtom::Escape(e) => e.span,
            ClassAtom::ClassEscape(e) => e.span,
            ClassAtom::Invalid(i) => i.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escape {
    pub span: Span,
    pub kind: EscapeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscapeKind {
    /// `\f \n \r \t \v`, and `\b` inside a class.
    Special(char),
    /// `\cX`; `code` is the letter modulo 32.
    ControlLetter { letter: char, code: u32 },
    Hexadecimal { code: u32 },
    Unicode { codepoint: u32, braced: bool },
    Null,
    Identity(char),
}

impl Escape {
    /// The character this escape stands for, if it is a valid scalar value.
    pub fn value(&self) -> Option<char> {
        match self.kind {
            EscapeKind::Special(letter) => match letter {
                'f' => Some('\u{0C}'),
                'n' => Some('\n'),
                'r' => Some('\r'),
                't' => Some('\t'),
                'v' => Some('\u{0B}'),
                'b' => Some('\u{08}'),
                _ => None,
            },
            EscapeKind::ControlLetter { code, .. } => char::from_u32(code),
            EscapeKind::Hexadecimal { code } => char::from_u32(code),
            EscapeKind::Unicode { codepoint, .. } => char::from_u32(codepoint),
            EscapeKind::Null => Some('\0'),
            EscapeKind::Identity(c) => Some(c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEscape {
    pub span: Span,
    pub kind: ClassEscapeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassEscapeKind {
    /// `\d \D \s \S \w \W`
    Predefined(char),
    /// `\p{...}` / `\P{...}`
    Property(UnicodeProperty),
}

/// Shape of `\p{value}` or `\p{name=value}`. Names are not checked against Unicode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnicodeProperty {
    pub negated: bool,
    pub name: Option<PropertyToken>,
    pub operator: Option<Span>,
    pub value: PropertyToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyToken {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backreference {
    Numeric { span: Span, index: usize },
    Named { span: Span, name: GroupName },
}

impl Backreference {
    pub fn span(&self) -> Span {
        match self {
            Backreference::Numeric { span, .. } => *span,
            Backreference::Named { span, .. } => *span,
        }
    }
}

/// A span the parser could not make sense of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalid {
    pub span: Span,
    pub reason: InvalidReason,
}

impl Invalid {
    pub fn new(span: Span, reason: InvalidReason) -> Self {
        Self { span, reason }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidReason {
    UnterminatedGroup,
    UnterminatedClass,
    BadQuantifier,
    StackedQuantifier,
    BadEscape,
    BadGroupName,
    BadBackreference,
    UnknownConstruct,
}

impl InvalidReason {
    /// Stable tag used in tree dumps.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::UnterminatedGroup => "unterminated-group",
            InvalidReason::UnterminatedClass => "unterminated-class",
            InvalidReason::BadQuantifier => "bad-quantifier",
            InvalidReason::StackedQuantifier => "stacked-quantifier",
            InvalidReason::BadEscape => "bad-escape",
            InvalidReason::BadGroupName => "bad-group-name",
            InvalidReason::BadBackreference => "bad-backreference",
            InvalidReason::UnknownConstruct => "unknown-construct",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            InvalidReason::UnterminatedGroup => "group is missing its closing `)`",
            InvalidReason::UnterminatedClass => "character class is missing its closing `]`",
            InvalidReason::BadQuantifier => "quantifier has nothing to repeat or is malformed",
            InvalidReason::StackedQuantifier => "quantifier follows another quantifier",
            InvalidReason::BadEscape => "invalid escape sequence",
            InvalidReason::BadGroupName => "invalid group name",
            InvalidReason::BadBackreference => "invalid backreference",
            InvalidReason::UnknownConstruct => "unexpected character",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
