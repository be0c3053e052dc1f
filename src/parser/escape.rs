use crate::ast::{
    AssertionKind, Backreference, ClassEscape, ClassEscapeKind, Escape, EscapeKind, Invalid,
    InvalidReason, PropertyToken, Span, Unit, UnicodeProperty,
};
use crate::chars::{
    is_class_escape, is_class_identity_escape, is_control_letter, is_decimal_digit, is_hex_digit,
    is_identity_escape, is_property_char, is_special_escape, is_word_boundary_marker,
};

use super::{parse_decimal, Parser};

/// Highest Unicode scalar value accepted by `\u{...}`.
const MAX_CODEPOINT: u32 = 0x10FFFF;

/// What a backslash sequence turned out to be, once assertions and
/// backreferences are ruled out.
pub(super) enum Escaped {
    Character(Escape),
    Class(ClassEscape),
    Invalid(Invalid),
}

impl<'a> Parser<'a> {
    /// Parse a backslash sequence in pattern position.
    ///
    /// Resolution order: `\b \B` > backreference > class escape > character escape.
    ///
    /// Examples:
    /// - Pattern: `\b`      → Assertion(WordBoundary)
    /// - Pattern: `\12`     → Backreference::Numeric(12)
    /// - Pattern: `\k<n>`   → Backreference::Named("n")
    /// - Pattern: `\w`      → ClassEscape
    /// - Pattern: `\x41`    → Escape::Hexadecimal(0x41)
    /// - Pattern: `\q`      → Invalid(bad-escape)
    pub(super) fn parse_atom_escape(&mut self) -> Unit {
        let start = self.pos;
        match self.peek_nth(1) {
            Some(c) if is_word_boundary_marker(c) => {
                self.pos += 2;
                let kind = if c == 'b' {
                    AssertionKind::WordBoundary
                } else {
                    AssertionKind::NonWordBoundary
                };
                Unit::Assertion {
                    span: self.span_from(start),
                    kind,
                }
            }
            Some('1'..='9') => {
                self.advance();
                let end = self.ascii_run_end(self.pos, usize::MAX, |b| b.is_ascii_digit());
                let index = parse_decimal(&self.pattern[self.pos..end]);
                self.pos = end;
                Unit::Backreference(Backreference::Numeric {
                    span: self.span_from(start),
                    index,
                })
            }
            Some('k') => self.parse_named_backreference(),
            _ => match self.parse_escape_body(false) {
                Escaped::Character(escape) => Unit::Escape(escape),
                Escaped::Class(escape) => Unit::ClassEscape(escape),
                Escaped::Invalid(invalid) => Unit::Invalid(invalid),
            },
        }
    }

    /// `\k<name>`. Anything short of a well formed name and `>` makes the whole
    /// construct invalid.
    fn parse_named_backreference(&mut self) -> Unit {
        let start = self.pos;
        self.pos += 2;
        if self.eat('<').is_none() {
            return Unit::Invalid(self.invalid(start, InvalidReason::BadBackreference));
        }
        if let Some(name) = self.parse_group_name() {
            self.eat('>');
            return Unit::Backreference(Backreference::Named {
                span: self.span_from(start),
                name,
            });
        }
        self.skip_name_region();
        Unit::Invalid(self.invalid(start, InvalidReason::BadBackreference))
    }

    /// Parse a character or class escape. The cursor is on the backslash.
    ///
    /// Resolution order: special > control letter > hexadecimal > unicode > null >
    /// class escape > identity > invalid. Inside a class `\b` is a backspace and
    /// `\-` an identity escape.
    pub(super) fn parse_escape_body(&mut self, in_class: bool) -> Escaped {
        let start = self.pos;
        self.advance();
        let Some(c) = self.peek() else {
            return Escaped::Invalid(self.invalid(start, InvalidReason::BadEscape));
        };
        match c {
            c if is_special_escape(c) || (in_class && c == 'b') => {
                self.advance();
                self.character(start, EscapeKind::Special(c))
            }
            'c' => {
                self.advance();
                match self.peek() {
                    Some(letter) if is_control_letter(letter) => {
                        self.advance();
                        let code = u32::from(letter) % 32;
                        self.character(start, EscapeKind::ControlLetter { letter, code })
                    }
                    _ => Escaped::Invalid(self.invalid(start, InvalidReason::BadEscape)),
                }
            }
            'x' => {
                self.advance();
                let end = self.ascii_run_end(self.pos, 2, |b| is_hex_digit(char::from(b)));
                let complete = end - self.pos == 2;
                let code = parse_hex(&self.pattern[self.pos..end]);
                self.pos = end;
                if complete {
                    self.character(start, EscapeKind::Hexadecimal { code })
                } else {
                    Escaped::Invalid(self.invalid(start, InvalidReason::BadEscape))
                }
            }
            'u' => match self.parse_unicode_escape() {
                Some(kind) => self.character(start, kind),
                None => Escaped::Invalid(self.invalid(start, InvalidReason::BadEscape)),
            },
            '0' => {
                self.advance();
                if self.peek().is_some_and(is_decimal_digit) {
                    self.pos = self.ascii_run_end(self.pos, usize::MAX, |b| b.is_ascii_digit());
                    Escaped::Invalid(self.invalid(start, InvalidReason::BadEscape))
                } else {
                    self.character(start, EscapeKind::Null)
                }
            }
            c if is_class_escape(c) => {
                self.advance();
                Escaped::Class(ClassEscape {
                    span: self.span_from(start),
                    kind: ClassEscapeKind::Predefined(c),
                })
            }
            'p' | 'P' => self.parse_property_escape(start, c == 'P'),
            c if is_identity_escape(c) || (in_class && is_class_identity_escape(c)) => {
                self.advance();
                self.character(start, EscapeKind::Identity(c))
            }
            _ => {
                self.advance();
                Escaped::Invalid(self.invalid(start, InvalidReason::BadEscape))
            }
        }
    }

    fn character(&self, start: usize, kind: EscapeKind) -> Escaped {
        Escaped::Character(Escape {
            span: self.span_from(start),
            kind,
        })
    }

    /// `\uHHHH` or `\u{H...}` with the cursor on the `u`. On failure the cursor is
    /// left after the hex digits (and a closing brace, if any) that were read.
    pub(super) fn parse_unicode_escape(&mut self) -> Option<EscapeKind> {
        self.advance();
        if self.eat('{').is_some() {
            let digits_start = self.pos;
            let digits_end = self.ascii_run_end(digits_start, usize::MAX, |b| is_hex_digit(char::from(b)));
            let codepoint = parse_hex(&self.pattern[digits_start..digits_end]);
            self.pos = digits_end;
            let closed = self.eat('}').is_some();
            if closed && digits_end > digits_start && codepoint <= MAX_CODEPOINT {
                return Some(EscapeKind::Unicode {
                    codepoint,
                    braced: true,
                });
            }
            return None;
        }
        let end = self.ascii_run_end(self.pos, 4, |b| is_hex_digit(char::from(b)));
        let complete = end - self.pos == 4;
        let codepoint = parse_hex(&self.pattern[self.pos..end]);
        self.pos = end;
        complete.then_some(EscapeKind::Unicode {
            codepoint,
            braced: false,
        })
    }

    /// `\p{value}` or `\p{name=value}`; only the shape is checked.
    fn parse_property_escape(&mut self, start: usize, negated: bool) -> Escaped {
        self.advance();
        if self.eat('{').is_none() {
            return Escaped::Invalid(self.invalid(start, InvalidReason::BadEscape));
        }
        let first = self.property_token();
        let operator = match first {
            Some(_) => self.eat('='),
            None => None,
        };
        let property = match (first, operator) {
            (Some(name), Some(operator)) => {
                self.property_token().map(|value| UnicodeProperty {
                    negated,
                    name: Some(name),
                    operator: Some(operator),
                    value,
                })
            }
            (Some(value), None) => Some(UnicodeProperty {
                negated,
                name: None,
                operator: None,
                value,
            }),
            (None, _) => None,
        };
        match property {
            Some(property) if self.eat('}').is_some() => Escaped::Class(ClassEscape {
                span: self.span_from(start),
                kind: ClassEscapeKind::Property(property),
            }),
            _ => {
                match self.closer_end('}', false) {
                    Some(end) => self.pos = end,
                    None => {
                        while self.peek().is_some_and(|c| is_property_char(c) || c == '=') {
                            self.advance();
                        }
                    }
                }
                Escaped::Invalid(self.invalid(start, InvalidReason::BadEscape))
            }
        }
    }

    fn property_token(&mut self) -> Option<PropertyToken> {
        let start = self.pos;
        let end = self.ascii_run_end(start, usize::MAX, |b| is_property_char(char::from(b)));
        if end == start {
            return None;
        }
        self.pos = end;
        Some(PropertyToken {
            text: self.pattern[start..end].to_string(),
            span: Span::new(start, end),
        })
    }
}

/// Hex digits to a number, saturating instead of overflowing.
fn parse_hex(digits: &str) -> u32 {
    digits.chars().fold(0u32, |acc, c| {
        acc.saturating_mul(16)
            .saturating_add(c.to_digit(16).unwrap_or(0))
    })
}
