use log::debug;

use crate::ast::{CharacterClass, ClassAtom, ClassMember, ClassRange};

use super::escape::Escaped;
use super::Parser;

impl<'a> Parser<'a> {
    /// Parse a character class, e.g. `[abc]`, `[^a-z]` or `[\d-]`.
    ///
    /// A `-` only delimits a range when an atom precedes it and something other
    /// than `]` follows it; otherwise it is a literal member. A class cut off by
    /// the end of input keeps its members and has no `end`.
    ///
    /// Examples:
    /// - Pattern: `[a-z]`  → CharacterClass { members: [Range('a', 'z')] }
    /// - Pattern: `[^-a]`  → CharacterClass { negated, members: ['-', 'a'] }
    /// - Pattern: `[a-]`   → CharacterClass { members: ['a', '-'] }
    pub(super) fn parse_class(&mut self) -> CharacterClass {
        let start = self.pos;
        self.advance();
        let begin = self.span_from(start);
        let negation = self.eat('^');

        let mut members = Vec::new();
        while let Some(ch) = self.peek() {
            if ch == ']' {
                break;
            }
            let low = self.parse_class_atom(ch);
            let forms_range =
                self.peek() == Some('-') && self.peek_nth(1).is_some_and(|c| c != ']');
            let delimiter = if forms_range { self.eat('-') } else { None };
            match (delimiter, self.peek()) {
                (Some(delimiter), Some(next)) => {
                    let high = self.parse_class_atom(next);
                    members.push(ClassMember::Range(ClassRange {
                        span: low.span().to(high.span()),
                        low,
                        delimiter,
                        high,
                    }));
                }
                _ => members.push(ClassMember::Atom(low)),
            }
        }

        let end = self.eat(']');
        if end.is_none() {
            debug!("unterminated class opened at {begin}");
        }
        CharacterClass {
            span: self.span_from(start),
            begin,
            negation,
            members,
            end,
        }
    }

    /// Parse one class atom starting with `ch`.
    fn parse_class_atom(&mut self, ch: char) -> ClassAtom {
        if ch == '\\' {
            return match self.parse_escape_body(true) {
                Escaped::Character(escape) => ClassAtom::Escape(escape),
                Escaped::Class(escape) => ClassAtom::ClassEscape(escape),
                Escaped::Invalid(invalid) => ClassAtom::Invalid(invalid),
            };
        }
        let start = self.pos;
        self.advance();
        ClassAtom::Literal {
            span: self.span_from(start),
            value: ch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        ClassEscapeKind, EscapeKind, Invalid, InvalidReason, Regex, Span, Unit,
    };

    fn class(pattern: &str) -> CharacterClass {
        let regex: Regex = Parser::new(pattern).parse();
        let terms = &regex.body.alternatives[0].terms;
        assert_eq!(terms.len(), 1, "{pattern}: {terms:?}");
        match &terms[0].unit {
            Unit::CharacterClass(class) => class.clone(),
            other => panic!("{pattern}: expected class, got {other:?}"),
        }
    }

    fn literal(members: &[ClassMember], index: usize) -> char {
        match &members[index] {
            ClassMember::Atom(ClassAtom::Literal { value, .. }) => *value,
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn simple_range() {
        let class = class("[a-z]");
        assert!(!class.negated());
        assert_eq!(class.members.len(), 1);
        let ClassMember::Range(range) = &class.members[0] else {
            panic!("expected range");
        };
        assert_eq!(range.span, Span::new(1, 4));
        assert_eq!(range.delimiter, Span::new(2, 3));
        assert!(matches!(range.low, ClassAtom::Literal { value: 'a', .. }));
        assert!(matches!(range.high, ClassAtom::Literal { value: 'z', .. }));
    }

    #[test]
    fn dash_at_edges_is_literal() {
        let leading = class("[^-a]");
        assert!(leading.negated());
        assert_eq!(literal(&leading.members, 0), '-');
        assert_eq!(literal(&leading.members, 1), 'a');

        let trailing = class("[a-]");
        assert_eq!(trailing.members.len(), 2);
        assert_eq!(literal(&trailing.members, 1), '-');
    }

    #[test]
    fn dash_after_range_is_literal() {
        let class = class("[a-b-c]");
        assert_eq!(class.members.len(), 3);
        assert!(matches!(class.members[0], ClassMember::Range(_)));
        assert_eq!(literal(&class.members, 1), '-');
        assert_eq!(literal(&class.members, 2), 'c');
    }

    #[test]
    fn escapes_inside_class() {
        let class = class(r"[\b\-\d\]]");
        let kinds: Vec<_> = class
            .members
            .iter()
            .map(|m| match m {
                ClassMember::Atom(ClassAtom::Escape(e)) => format!("{:?}", e.kind),
                ClassMember::Atom(ClassAtom::ClassEscape(e)) => format!("{:?}", e.kind),
                other => panic!("unexpected member {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                format!("{:?}", EscapeKind::Special('b')),
                format!("{:?}", EscapeKind::Identity('-')),
                format!("{:?}", ClassEscapeKind::Predefined('d')),
                format!("{:?}", EscapeKind::Identity(']')),
            ]
        );
    }

    #[test]
    fn backreference_inside_class_is_bad_escape() {
        let class = class(r"[\1]");
        assert_eq!(
            class.members[0],
            ClassMember::Atom(ClassAtom::Invalid(Invalid::new(
                Span::new(1, 3),
                InvalidReason::BadEscape
            )))
        );
    }

    #[test]
    fn syntax_characters_are_literal_inside_class() {
        let class = class("[(|)*]");
        assert_eq!(class.members.len(), 4);
        assert!(class.is_terminated());
    }

    #[test]
    fn unterminated_class_keeps_members() {
        let class = class("[ab");
        assert!(!class.is_terminated());
        assert_eq!(class.members.len(), 2);
        assert_eq!(class.span, Span::new(0, 3));
        assert_eq!(
            class.missing_end(),
            Some(Invalid::new(Span::empty(3), InvalidReason::UnterminatedClass))
        );
    }

    #[test]
    fn range_to_dash_before_end_of_input() {
        let class = class("[a-");
        assert_eq!(class.members.len(), 2);
        assert!(!class.is_terminated());
    }
}
