use crate::ast::{EscapeKind, GroupName, Span};
use crate::chars::{is_group_name_continue, is_group_name_start};

use super::Parser;

const LEAD_SURROGATES: std::ops::RangeInclusive<u32> = 0xD800..=0xDBFF;
const TRAIL_SURROGATES: std::ops::RangeInclusive<u32> = 0xDC00..=0xDFFF;

impl<'a> Parser<'a> {
    /// Parse a group name up to, but not including, its closing `>`.
    ///
    /// Returns `None` without moving the cursor when the name is empty, contains a
    /// character outside the name set, or is not followed by `>`.
    ///
    /// Examples:
    /// - Pattern: `year>`      → Some("year")
    /// - Pattern: `\u0061b>`   → Some("ab")
    /// - Pattern: `a-b>`       → None
    pub(super) fn parse_group_name(&mut self) -> Option<GroupName> {
        let mut probe = self.clone();
        let start = probe.pos;
        let mut name = String::new();
        loop {
            let c = probe.peek()?;
            if c == '>' {
                break;
            }
            let decoded = if c == '\\' {
                probe.name_escape()?
            } else {
                let allowed = if name.is_empty() {
                    is_group_name_start(c)
                } else {
                    is_group_name_continue(c)
                };
                if !allowed {
                    return None;
                }
                probe.advance();
                c
            };
            name.push(decoded);
        }
        if name.is_empty() {
            return None;
        }
        let span = Span::new(start, probe.pos);
        *self = probe;
        Some(GroupName { name, span })
    }

    /// `\uHHHH` or `\u{...}` inside a name. A lead surrogate followed by an escaped
    /// trail surrogate decodes to one character; a lone surrogate becomes U+FFFD.
    fn name_escape(&mut self) -> Option<char> {
        self.advance();
        if self.peek() != Some('u') {
            return None;
        }
        let codepoint = self.name_codepoint()?;
        if LEAD_SURROGATES.contains(&codepoint) && self.pattern[self.pos..].starts_with("\\u") {
            let mut trail = self.clone();
            trail.advance();
            if let Some(low) = trail.name_codepoint().filter(|c| TRAIL_SURROGATES.contains(c)) {
                *self = trail;
                let combined = 0x10000 + ((codepoint - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(combined);
            }
        }
        Some(char::from_u32(codepoint).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn name_codepoint(&mut self) -> Option<u32> {
        match self.parse_unicode_escape()? {
            EscapeKind::Unicode { codepoint, .. } => Some(codepoint),
            _ => None,
        }
    }

    /// Skip the rest of a malformed name. The skip runs through `>` when it comes
    /// before any syntax character; otherwise it stops after the run of name
    /// characters so whatever follows is parsed normally.
    pub(super) fn skip_name_region(&mut self) {
        if let Some(end) = self.closer_end('>', true) {
            self.pos = end;
            return;
        }
        while self.peek().is_some_and(is_group_name_continue) {
            self.advance();
        }
    }
}
