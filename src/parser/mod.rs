use log::debug;

use crate::ast::{
    AssertionKind, Count, Disjunction, Group, GroupKind, Invalid, InvalidReason, Pattern,
    Quantifier, QuantifierKind, Regex, Span, Term, Unit,
};
use crate::chars::{is_pattern_char, is_syntax_char};

mod class;
mod escape;
mod name;

/// Stack kept free before descending into a group body.
const RED_ZONE: usize = 64 * 1024;
/// Stack added when the red zone is hit.
const STACK_GROWTH: usize = 2 * 1024 * 1024;

/// Group prefixes after `(`, longest first so `?<=` wins over `?<name>`.
const GROUP_PREFIXES: [(&str, GroupKind); 5] = [
    ("?<=", GroupKind::Lookbehind),
    ("?<!", GroupKind::NegativeLookbehind),
    ("?:", GroupKind::NonCapturing),
    ("?=", GroupKind::Lookahead),
    ("?!", GroupKind::NegativeLookahead),
];

/// Fault-tolerant parser for a regular expression body.
///
/// The `Parser` struct holds the pattern and the current byte offset. Every
/// production consumes at least one character or stops, so parsing always
/// terminates and always covers the whole input.
#[derive(Clone)]
pub struct Parser<'a> {
    pub pattern: &'a str,
    pub pos: usize,
}

/// Outcome of looking ahead at a `{`.
enum CountScan {
    /// A well formed `{m}`, `{m,}` or `{m,n}` ending at the given offset.
    Valid(Count, usize),
    /// Digits and commas that do not form a count, ending at the given offset.
    Malformed(usize),
    /// A `{` that does not start anything count-like.
    NotCount,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given pattern.
    pub fn new(pattern: &'a str) -> Self {
        Self { pattern, pos: 0 }
    }

    /// Peek at the next character in the pattern without advancing.
    fn peek(&self) -> Option<char> {
        self.pattern[self.pos..].chars().next()
    }

    /// Peek `n` characters past the next one.
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.pattern[self.pos..].chars().nth(n)
    }

    /// Advance the parser by one character and return it.
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Consume `expected` if it is next and return its span.
    fn eat(&mut self, expected: char) -> Option<Span> {
        if self.peek() == Some(expected) {
            let start = self.pos;
            self.advance();
            Some(Span::new(start, self.pos))
        } else {
            None
        }
    }

    fn eat_str(&mut self, expected: &str) -> bool {
        if self.pattern[self.pos..].starts_with(expected) {
            self.pos += expected.len();
            true
        } else {
            false
        }
    }

    /// Byte offset where the run of ASCII characters matching `pred` starting at `at` ends,
    /// reading at most `limit` of them.
    fn ascii_run_end(&self, at: usize, limit: usize, pred: impl Fn(u8) -> bool) -> usize {
        let bytes = self.pattern.as_bytes();
        let mut end = at;
        while end - at < limit && end < bytes.len() && pred(bytes[end]) {
            end += 1;
        }
        end
    }

    /// Offset just past the next `closer` when no syntax character comes first.
    /// A backslash does not count when `escapes` is set.
    fn closer_end(&self, closer: char, escapes: bool) -> Option<usize> {
        for (offset, c) in self.pattern[self.pos..].char_indices() {
            if c == closer {
                return Some(self.pos + offset + c.len_utf8());
            }
            if is_syntax_char(c) && !(escapes && c == '\\') {
                return None;
            }
        }
        None
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.pos)
    }

    /// Record an invalid span ending at the cursor.
    fn invalid(&self, start: usize, reason: InvalidReason) -> Invalid {
        let span = self.span_from(start);
        debug!("invalid {reason} at {span}: {:?}", &self.pattern[span.range()]);
        Invalid::new(span, reason)
    }

    /// Entry point: parse the whole pattern.
    ///
    /// Example:
    /// - Pattern: `a|b` → Disjunction([Pattern[Literal('a')], Pattern[Literal('b')]])
    pub fn parse(mut self) -> Regex {
        let body = self.parse_disjunction(false);
        debug_assert_eq!(self.pos, self.pattern.len());
        Regex {
            span: Span::new(0, self.pattern.len()),
            body,
        }
    }

    /// Parse alternation (`|`). Inside a group this stops at the closing `)`.
    ///
    /// Example:
    /// - Pattern: `a||b` → three alternatives, the middle one empty
    fn parse_disjunction(&mut self, in_group: bool) -> Disjunction {
        let start = self.pos;
        let mut alternatives = vec![self.parse_pattern(in_group)];
        let mut delimiters = Vec::new();
        while let Some(delimiter) = self.eat('|') {
            delimiters.push(delimiter);
            alternatives.push(self.parse_pattern(in_group));
        }
        Disjunction {
            span: self.span_from(start),
            alternatives,
            delimiters,
        }
    }

    /// Parse a sequence of units, each with an optional quantifier.
    ///
    /// Example:
    /// - Pattern: `ab*` → Pattern[Literal('a'), Literal('b') + ZeroOrMore]
    /// - Pattern: `a**` → Pattern[Literal('a') + ZeroOrMore, Invalid(stacked-quantifier)]
    fn parse_pattern(&mut self, in_group: bool) -> Pattern {
        let start = self.pos;
        let mut terms: Vec<Term> = Vec::new();
        while let Some(ch) = self.peek() {
            if ch == '|' || (ch == ')' && in_group) {
                break;
            }
            if let Some(stray) = self.parse_stray_quantifier(!terms.is_empty()) {
                terms.push(Term::new(Unit::Invalid(stray), None));
                continue;
            }
            let unit = self.parse_unit(ch);
            let quantifier = self.parse_quantifier();
            terms.push(Term::new(unit, quantifier));
        }
        Pattern {
            span: self.span_from(start),
            terms,
        }
    }

    /// Parse a quantifier directly after a unit.
    ///
    /// Example:
    /// - Pattern: `+?`    → OneOrMore, lazy
    /// - Pattern: `{2,5}` → Count { min: 2, max: Some(5) }
    /// - Pattern: `{x`    → None, the `{` is left for the unit parser
    fn parse_quantifier(&mut self) -> Option<Quantifier> {
        let start = self.pos;
        let kind = match self.peek()? {
            '*' => QuantifierKind::ZeroOrMore,
            '+' => QuantifierKind::OneOrMore,
            '?' => QuantifierKind::Optional,
            '{' => match self.scan_count() {
                CountScan::Valid(count, end) => {
                    self.pos = end;
                    let operator = self.span_from(start);
                    let lazy = self.eat('?');
                    return Some(Quantifier {
                        span: self.span_from(start),
                        kind: QuantifierKind::Count(count),
                        operator,
                        lazy,
                    });
                }
                _ => return None,
            },
            _ => return None,
        };
        self.advance();
        let operator = self.span_from(start);
        let lazy = self.eat('?');
        Some(Quantifier {
            span: self.span_from(start),
            kind,
            operator,
            lazy,
        })
    }

    /// Quantifier syntax where a unit is expected: nothing precedes it, or the previous
    /// unit is already quantified. The whole quantifier becomes one invalid node.
    fn parse_stray_quantifier(&mut self, follows_term: bool) -> Option<Invalid> {
        let start = self.pos;
        let misplaced = if follows_term {
            InvalidReason::StackedQuantifier
        } else {
            InvalidReason::BadQuantifier
        };
        let reason = match self.peek()? {
            '*' | '+' | '?' => {
                self.advance();
                self.eat('?');
                misplaced
            }
            '{' => match self.scan_count() {
                CountScan::Valid(_, end) => {
                    self.pos = end;
                    self.eat('?');
                    misplaced
                }
                CountScan::Malformed(end) => {
                    self.pos = end;
                    InvalidReason::BadQuantifier
                }
                CountScan::NotCount => {
                    self.advance();
                    InvalidReason::UnknownConstruct
                }
            },
            _ => return None,
        };
        Some(self.invalid(start, reason))
    }

    /// Look ahead from a `{` without consuming anything.
    fn scan_count(&self) -> CountScan {
        let bytes = self.pattern.as_bytes();
        let open = self.pos;
        let min_start = open + 1;
        let min_end = self.ascii_run_end(min_start, usize::MAX, |b| b.is_ascii_digit());
        let mut cursor = min_end;
        let mut delimiter = None;
        let mut max_span = None;
        if bytes.get(cursor) == Some(&b',') {
            delimiter = Some(Span::new(cursor, cursor + 1));
            cursor += 1;
            let max_end = self.ascii_run_end(cursor, usize::MAX, |b| b.is_ascii_digit());
            if max_end > cursor {
                max_span = Some(Span::new(cursor, max_end));
            }
            cursor = max_end;
        }
        if min_end > min_start && bytes.get(cursor) == Some(&b'}') {
            let min_span = Span::new(min_start, min_end);
            let count = Count {
                min: saturate_u32(parse_decimal(&self.pattern[min_span.range()])),
                max: max_span.map(|s| saturate_u32(parse_decimal(&self.pattern[s.range()]))),
                min_span,
                delimiter,
                max_span,
            };
            return CountScan::Valid(count, cursor + 1);
        }

        let run_end = self.ascii_run_end(min_start, usize::MAX, |b| {
            b.is_ascii_digit() || b == b','
        });
        let end = if bytes.get(run_end) == Some(&b'}') {
            run_end + 1
        } else {
            run_end
        };
        if end > min_start {
            CountScan::Malformed(end)
        } else {
            CountScan::NotCount
        }
    }

    /// Parse a single unit starting with `ch`.
    ///
    /// Examples:
    /// - Pattern: `(abc)` → Group
    /// - Pattern: `[abc]` → CharacterClass
    /// - Pattern: `\d`    → ClassEscape
    /// - Pattern: `\1`    → Backreference
    /// - Pattern: `.`     → AnyCharacter
    /// - Pattern: `^`     → Assertion(Start)
    /// - Pattern: `a`     → Literal('a')
    /// - Pattern: `]`     → Invalid(unknown-construct)
    fn parse_unit(&mut self, ch: char) -> Unit {
        let start = self.pos;
        match ch {
            '^' | '$' => {
                self.advance();
                let kind = if ch == '^' {
                    AssertionKind::Start
                } else {
                    AssertionKind::End
                };
                Unit::Assertion {
                    span: self.span_from(start),
                    kind,
                }
            }
            '\\' => self.parse_atom_escape(),
            '(' => Unit::Group(Box::new(self.parse_group())),
            '[' => Unit::CharacterClass(self.parse_class()),
            '.' => {
                self.advance();
                Unit::AnyCharacter(self.span_from(start))
            }
            c if is_pattern_char(c) => {
                self.advance();
                Unit::Literal {
                    span: self.span_from(start),
                    value: c,
                }
            }
            _ => {
                self.advance();
                Unit::Invalid(self.invalid(start, InvalidReason::UnknownConstruct))
            }
        }
    }

    /// Parse a group: `(`, an optional identifier, a nested disjunction and `)`.
    ///
    /// A group cut off by the end of input keeps its body and has no `end`.
    ///
    /// Examples:
    /// - Pattern: `(?:a)`     → Group { kind: NonCapturing, .. }
    /// - Pattern: `(?<n>a)`   → Group { kind: Named("n"), .. }
    /// - Pattern: `(?<=a)`    → Group { kind: Lookbehind, .. }
    /// - Pattern: `(a`        → Group { kind: Anonymous, end: None, .. }
    fn parse_group(&mut self) -> Group {
        let start = self.pos;
        self.advance();
        let begin = self.span_from(start);

        let identifier_start = self.pos;
        let kind = if self.peek() == Some('?') {
            self.parse_group_identifier()
        } else {
            GroupKind::Anonymous
        };
        let identifier = (self.pos > identifier_start).then(|| self.span_from(identifier_start));

        let body = stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || self.parse_disjunction(true));
        let end = self.eat(')');
        if end.is_none() {
            debug!("unterminated group opened at {begin}");
        }
        Group {
            span: self.span_from(start),
            kind,
            begin,
            identifier,
            body,
            end,
        }
    }

    /// Parse what follows `(?`.
    fn parse_group_identifier(&mut self) -> GroupKind {
        let start = self.pos;
        for (prefix, kind) in GROUP_PREFIXES.iter() {
            if self.eat_str(prefix) {
                return kind.clone();
            }
        }
        if self.eat_str("?<") {
            if let Some(name) = self.parse_group_name() {
                self.eat('>');
                return GroupKind::Named(name);
            }
            self.skip_name_region();
            return GroupKind::Malformed(self.invalid(start, InvalidReason::BadGroupName));
        }
        self.advance();
        GroupKind::Malformed(self.invalid(start, InvalidReason::UnknownConstruct))
    }
}

/// Decimal digits to a number, saturating instead of overflowing.
fn parse_decimal(digits: &str) -> usize {
    digits.bytes().fold(0usize, |acc, b| {
        acc.saturating_mul(10).saturating_add(usize::from(b - b'0'))
    })
}

fn saturate_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(pattern: &str) -> Regex {
        Parser::new(pattern).parse()
    }

    fn only_pattern(regex: &Regex) -> &Pattern {
        assert_eq!(regex.body.alternatives.len(), 1);
        &regex.body.alternatives[0]
    }

    #[test]
    fn empty_input_is_one_empty_pattern() {
        let regex = parse("");
        assert_eq!(regex.span, Span::new(0, 0));
        assert!(only_pattern(&regex).terms.is_empty());
    }

    #[test]
    fn empty_alternatives_are_kept() {
        let regex = parse("|a|");
        let lens: Vec<_> = regex
            .body
            .alternatives
            .iter()
            .map(|p| p.terms.len())
            .collect();
        assert_eq!(lens, vec![0, 1, 0]);
        assert_eq!(regex.body.delimiters, vec![Span::new(0, 1), Span::new(2, 3)]);
    }

    #[test]
    fn lazy_one_or_more() {
        let regex = parse("a+?");
        let term = &only_pattern(&regex).terms[0];
        let q = term.quantifier.as_ref().unwrap();
        assert_eq!(q.kind, QuantifierKind::OneOrMore);
        assert!(q.is_lazy());
        assert_eq!(q.operator, Span::new(1, 2));
        assert_eq!(term.span, Span::new(0, 3));
    }

    #[test]
    fn reversed_count_is_accepted() {
        let regex = parse("a{2,1}");
        let q = only_pattern(&regex).terms[0].quantifier.clone().unwrap();
        match q.kind {
            QuantifierKind::Count(count) => {
                assert_eq!((count.min, count.max), (2, Some(1)));
                assert!(count.is_reversed());
            }
            other => panic!("expected count, got {other:?}"),
        }
    }

    #[test]
    fn open_ended_count() {
        let regex = parse("a{3,}");
        match &only_pattern(&regex).terms[0].quantifier.as_ref().unwrap().kind {
            QuantifierKind::Count(count) => {
                assert_eq!((count.min, count.max), (3, None));
                assert!(count.delimiter.is_some());
            }
            other => panic!("expected count, got {other:?}"),
        }
    }

    #[test]
    fn huge_count_saturates() {
        let regex = parse("a{99999999999}");
        match &only_pattern(&regex).terms[0].quantifier.as_ref().unwrap().kind {
            QuantifierKind::Count(count) => assert_eq!(count.min, u32::MAX),
            other => panic!("expected count, got {other:?}"),
        }
    }

    #[test]
    fn stacked_quantifier_is_invalid() {
        let regex = parse("a**");
        let terms = &only_pattern(&regex).terms;
        assert_eq!(terms.len(), 2);
        assert!(terms[0].quantifier.is_some());
        assert_eq!(
            terms[1].unit,
            Unit::Invalid(Invalid::new(Span::new(2, 3), InvalidReason::StackedQuantifier))
        );
    }

    #[test]
    fn leading_quantifier_is_invalid() {
        let regex = parse("+a");
        let terms = &only_pattern(&regex).terms;
        assert_eq!(
            terms[0].unit,
            Unit::Invalid(Invalid::new(Span::new(0, 1), InvalidReason::BadQuantifier))
        );
    }

    #[test]
    fn malformed_count_after_unit() {
        let regex = parse("a{,2}b");
        let terms = &only_pattern(&regex).terms;
        assert_eq!(terms.len(), 3);
        assert!(terms[0].quantifier.is_none());
        assert_eq!(
            terms[1].unit,
            Unit::Invalid(Invalid::new(Span::new(1, 5), InvalidReason::BadQuantifier))
        );
    }

    #[test]
    fn lone_brace_is_unknown() {
        let regex = parse("a{b");
        let terms = &only_pattern(&regex).terms;
        assert_eq!(
            terms[1].unit,
            Unit::Invalid(Invalid::new(Span::new(1, 2), InvalidReason::UnknownConstruct))
        );
        assert!(matches!(terms[2].unit, Unit::Literal { value: 'b', .. }));
    }

    #[test]
    fn stray_close_paren_at_top_level() {
        let regex = parse("a)b");
        let terms = &only_pattern(&regex).terms;
        assert_eq!(terms.len(), 3);
        assert_eq!(
            terms[1].unit,
            Unit::Invalid(Invalid::new(Span::new(1, 2), InvalidReason::UnknownConstruct))
        );
    }

    #[test]
    fn group_quantifier_attaches_to_group() {
        let regex = parse("(a)+");
        let term = &only_pattern(&regex).terms[0];
        assert!(matches!(term.unit, Unit::Group(_)));
        assert_eq!(term.quantifier.as_ref().unwrap().span, Span::new(3, 4));
    }

    #[test]
    fn unterminated_group_keeps_body() {
        let regex = parse("(a");
        let Unit::Group(group) = &only_pattern(&regex).terms[0].unit else {
            panic!("expected group");
        };
        assert_eq!(group.kind, GroupKind::Anonymous);
        assert!(!group.is_terminated());
        assert_eq!(group.span, Span::new(0, 2));
        assert_eq!(group.body.alternatives[0].terms.len(), 1);
        assert_eq!(
            group.missing_end(),
            Some(Invalid::new(Span::empty(2), InvalidReason::UnterminatedGroup))
        );
    }

    #[test]
    fn lookaround_kinds() {
        for (pattern, kind) in [
            ("(?=a)", GroupKind::Lookahead),
            ("(?!a)", GroupKind::NegativeLookahead),
            ("(?<=a)", GroupKind::Lookbehind),
            ("(?<!a)", GroupKind::NegativeLookbehind),
            ("(?:a)", GroupKind::NonCapturing),
        ] {
            let regex = parse(pattern);
            let Unit::Group(group) = &only_pattern(&regex).terms[0].unit else {
                panic!("expected group for {pattern}");
            };
            assert_eq!(group.kind, kind, "{pattern}");
            assert!(group.is_terminated());
        }
    }

    #[test]
    fn named_group() {
        let regex = parse("(?<name>ab)");
        let Unit::Group(group) = &only_pattern(&regex).terms[0].unit else {
            panic!("expected group");
        };
        let GroupKind::Named(name) = &group.kind else {
            panic!("expected named group");
        };
        assert_eq!(name.name, "name");
        assert_eq!(name.span, Span::new(3, 7));
        assert_eq!(group.identifier, Some(Span::new(1, 8)));
        assert_eq!(group.body.alternatives[0].terms.len(), 2);
    }

    #[test]
    fn bad_group_name_keeps_group() {
        let regex = parse("(?<a-b>c)");
        let Unit::Group(group) = &only_pattern(&regex).terms[0].unit else {
            panic!("expected group");
        };
        assert_eq!(
            group.kind,
            GroupKind::Malformed(Invalid::new(Span::new(1, 7), InvalidReason::BadGroupName))
        );
        assert!(group.is_terminated());
    }

    #[test]
    fn unclosed_group_name_keeps_body() {
        let regex = parse("(?<a b.*$x+)");
        let Unit::Group(group) = &only_pattern(&regex).terms[0].unit else {
            panic!("expected group");
        };
        assert_eq!(
            group.kind,
            GroupKind::Malformed(Invalid::new(Span::new(1, 4), InvalidReason::BadGroupName))
        );
        assert!(group.is_terminated());
        let body = &group.body.alternatives[0].terms;
        assert_eq!(body.len(), 5);
        assert!(matches!(body[1].unit, Unit::Literal { value: 'b', .. }));
        assert!(matches!(body[2].unit, Unit::AnyCharacter(_)));
        assert!(matches!(body[4].unit, Unit::Literal { value: 'x', .. }));
        assert_eq!(
            body[4].quantifier.as_ref().map(|q| q.kind.clone()),
            Some(QuantifierKind::OneOrMore)
        );
    }

    #[test]
    fn unknown_group_prefix() {
        let regex = parse("(?i)");
        let Unit::Group(group) = &only_pattern(&regex).terms[0].unit else {
            panic!("expected group");
        };
        assert_eq!(
            group.kind,
            GroupKind::Malformed(Invalid::new(Span::new(1, 2), InvalidReason::UnknownConstruct))
        );
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let pattern = "(".repeat(50_000);
        let regex = parse(&pattern);
        assert_eq!(regex.span.end, 50_000);
    }
}
