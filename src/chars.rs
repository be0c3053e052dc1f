//! Character predicates shared by the parser.
//!
//! All sets are fixed at compile time.

/// Characters with a meaning of their own outside a character class.
pub const SYNTAX_CHARS: &[char] = &[
    '^', '$', '\\', '.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|',
];

/// Letters after a backslash that produce a single control character.
pub const SPECIAL_ESCAPES: &[char] = &['f', 'n', 'r', 't', 'v'];

/// Letters after a backslash that denote a predefined set.
pub const CLASS_ESCAPES: &[char] = &['d', 'D', 's', 'S', 'w', 'W'];

pub fn is_syntax_char(c: char) -> bool {
    SYNTAX_CHARS.contains(&c)
}

/// A character that stands for itself in pattern position.
pub fn is_pattern_char(c: char) -> bool {
    !is_syntax_char(c)
}

pub fn is_special_escape(c: char) -> bool {
    SPECIAL_ESCAPES.contains(&c)
}

pub fn is_class_escape(c: char) -> bool {
    CLASS_ESCAPES.contains(&c)
}

/// Characters that may follow a backslash as an identity escape in pattern position.
pub fn is_identity_escape(c: char) -> bool {
    is_syntax_char(c) || c == '/'
}

/// Inside a class the range delimiter may be escaped too.
pub fn is_class_identity_escape(c: char) -> bool {
    is_identity_escape(c) || c == '-'
}

pub fn is_decimal_digit(c: char) -> bool {
    c.is_ascii_digit()
}

pub fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

pub fn is_control_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// `\p{...}` names and values.
pub fn is_property_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn is_group_name_start(c: char) -> bool {
    c.is_alphabetic() || c.is_ascii_digit() || c == '_' || c == '$'
}

pub fn is_group_name_continue(c: char) -> bool {
    is_group_name_start(c) || c == '\u{200C}' || c == '\u{200D}'
}

/// Assertion letters after a backslash: `\b` and `\B`.
pub fn is_word_boundary_marker(c: char) -> bool {
    c == 'b' || c == 'B'
}
