//! Stable names and ids for every node the syntax tree can contain.
//!
//! Ids follow declaration order. New kinds are appended, never inserted.

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum NodeKind {
    Regex,
    Disjunction,
    Pattern,
    DisjunctionDelimiter,

    PatternCharacter,
    AnyCharacter,
    StartAssertion,
    EndAssertion,
    BoundaryAssertion,
    NonBoundaryAssertion,

    ZeroOrMore,
    OneOrMore,
    Optional,
    CountQuantifier,
    CountQuantifierValue,
    CountQuantifierDelimiter,
    Lazy,

    AnonymousCapturingGroup,
    NonCapturingGroup,
    NamedCapturingGroup,
    LookaheadAssertion,
    NegativeLookaheadAssertion,
    LookbehindAssertion,
    NegativeLookbehindAssertion,
    MalformedGroup,
    GroupBegin,
    GroupEnd,
    NonCapturingGroupIdentifier,
    NamedCapturingGroupIdentifier,
    LookaheadIdentifier,
    NegativeLookaheadIdentifier,
    LookbehindIdentifier,
    NegativeLookbehindIdentifier,
    GroupName,

    CharacterClass,
    SetBegin,
    SetEnd,
    SetNegation,
    ClassCharacter,
    CharacterRange,
    RangeDelimiter,

    SpecialEscape,
    ControlLetterEscape,
    ControlLetterCode,
    HexadecimalEscape,
    HexadecimalCode,
    UnicodeEscape,
    UnicodeCode,
    NullCharacter,
    IdentityEscape,
    EscapeOperator,
    CharacterClassEscape,
    UnicodePropertyName,
    UnicodePropertyOperator,
    UnicodePropertyValue,
    BackreferenceEscape,

    /// Anonymous fixed tokens such as `{`, `\k<` or `?<`.
    Punctuation,
    Invalid,
}

impl NodeKind {
    pub const ALL: &'static [NodeKind] = &[
        NodeKind::Regex,
        NodeKind::Disjunction,
        NodeKind::Pattern,
        NodeKind::DisjunctionDelimiter,
        NodeKind::PatternCharacter,
        NodeKind::AnyCharacter,
        NodeKind::StartAssertion,
        NodeKind::EndAssertion,
        NodeKind::BoundaryAssertion,
        NodeKind::NonBoundaryAssertion,
        NodeKind::ZeroOrMore,
        NodeKind::OneOrMore,
        NodeKind::Optional,
        NodeKind::CountQuantifier,
        NodeKind::CountQuantifierValue,
        NodeKind::CountQuantifierDelimiter,
        NodeKind::Lazy,
        NodeKind::AnonymousCapturingGroup,
        NodeKind::NonCapturingGroup,
        NodeKind::NamedCapturingGroup,
        NodeKind::LookaheadAssertion,
        NodeKind::NegativeLookaheadAssertion,
        NodeKind::LookbehindAssertion,
        NodeKind::NegativeLookbehindAssertion,
        NodeKind::MalformedGroup,
        NodeKind::GroupBegin,
        NodeKind::GroupEnd,
        NodeKind::NonCapturingGroupIdentifier,
        NodeKind::NamedCapturingGroupIdentifier,
        NodeKind::LookaheadIdentifier,
        NodeKind::NegativeLookaheadIdentifier,
        NodeKind::LookbehindIdentifier,
        NodeKind::NegativeLookbehindIdentifier,
        NodeKind::GroupName,
        NodeKind::CharacterClass,
        NodeKind::SetBegin,
        NodeKind::SetEnd,
        NodeKind::SetNegation,
        NodeKind::ClassCharacter,
        NodeKind::CharacterRange,
        NodeKind::RangeDelimiter,
        NodeKind::SpecialEscape,
        NodeKind::ControlLetterEscape,
        NodeKind::ControlLetterCode,
        NodeKind::HexadecimalEscape,
        NodeKind::HexadecimalCode,
        NodeKind::UnicodeEscape,
        NodeKind::UnicodeCode,
        NodeKind::NullCharacter,
        NodeKind::IdentityEscape,
        NodeKind::EscapeOperator,
        NodeKind::CharacterClassEscape,
        NodeKind::UnicodePropertyName,
        NodeKind::UnicodePropertyOperator,
        NodeKind::UnicodePropertyValue,
        NodeKind::BackreferenceEscape,
        NodeKind::Punctuation,
        NodeKind::Invalid,
    ];

    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn from_id(id: u16) -> Option<NodeKind> {
        Self::ALL.get(usize::from(id)).copied()
    }

    pub fn from_name(name: &str) -> Option<NodeKind> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Regex => "regex",
            NodeKind::Disjunction => "disjunction",
            NodeKind::Pattern => "pattern",
            NodeKind::DisjunctionDelimiter => "disjunction_delimiter",
            NodeKind::PatternCharacter => "pattern_character",
            NodeKind::AnyCharacter => "any_character",
            NodeKind::StartAssertion => "start_assertion",
            NodeKind::EndAssertion => "end_assertion",
            NodeKind::BoundaryAssertion => "boundary_assertion",
            NodeKind::NonBoundaryAssertion => "non_boundary_assertion",
            NodeKind::ZeroOrMore => "zero_or_more",
            NodeKind::OneOrMore => "one_or_more",
            NodeKind::Optional => "optional",
            NodeKind::CountQuantifier => "count_quantifier",
            NodeKind::CountQuantifierValue => "count_quantifier_value",
            NodeKind::CountQuantifierDelimiter => "count_quantifier_delimiter",
            NodeKind::Lazy => "lazy",
            NodeKind::AnonymousCapturingGroup => "anonymous_capturing_group",
            NodeKind::NonCapturingGroup => "non_capturing_group",
            NodeKind::NamedCapturingGroup => "named_capturing_group",
            NodeKind::LookaheadAssertion => "lookahead_assertion",
            NodeKind::NegativeLookaheadAssertion => "negative_lookahead_assertion",
            NodeKind::LookbehindAssertion => "lookbehind_assertion",
            NodeKind::NegativeLookbehindAssertion => "negative_lookbehind_assertion",
            NodeKind::MalformedGroup => "malformed_group",
            NodeKind::GroupBegin => "group_begin",
            NodeKind::GroupEnd => "group_end",
            NodeKind::NonCapturingGroupIdentifier => "non_capturing_group_identifier",
            NodeKind::NamedCapturingGroupIdentifier => "named_capturing_group_identifier",
            NodeKind::LookaheadIdentifier => "lookahead_identifier",
            NodeKind::NegativeLookaheadIdentifier => "negative_lookahead_identifier",
            NodeKind::LookbehindIdentifier => "lookbehind_identifier",
            NodeKind::NegativeLookbehindIdentifier => "negative_lookbehind_identifier",
            NodeKind::GroupName => "group_name",
            NodeKind::CharacterClass => "character_class",
            NodeKind::SetBegin => "set_begin",
            NodeKind::SetEnd => "set_end",
            NodeKind::SetNegation => "set_negation",
            NodeKind::ClassCharacter => "class_character",
            NodeKind::CharacterRange => "character_range",
            NodeKind::RangeDelimiter => "range_delimiter",
            NodeKind::SpecialEscape => "special_escape",
            NodeKind::ControlLetterEscape => "control_letter_escape",
            NodeKind::ControlLetterCode => "control_letter_code",
            NodeKind::HexadecimalEscape => "hexadecimal_escape",
            NodeKind::HexadecimalCode => "hexadecimal_code",
            NodeKind::UnicodeEscape => "unicode_escape",
            NodeKind::UnicodeCode => "unicode_code",
            NodeKind::NullCharacter => "null_character",
            NodeKind::IdentityEscape => "identity_escape",
            NodeKind::EscapeOperator => "escape_operator",
            NodeKind::CharacterClassEscape => "character_class_escape",
            NodeKind::UnicodePropertyName => "unicode_property_name",
            NodeKind::UnicodePropertyOperator => "unicode_property_operator",
            NodeKind::UnicodePropertyValue => "unicode_property_value",
            NodeKind::BackreferenceEscape => "backreference_escape",
            NodeKind::Punctuation => "punctuation",
            NodeKind::Invalid => "invalid",
        }
    }

    /// Anonymous tokens are left out of S-expressions.
    pub fn is_named(self) -> bool {
        self != NodeKind::Punctuation
    }

    pub fn is_group(self) -> bool {
        matches!(
            self,
            NodeKind::AnonymousCapturingGroup
                | NodeKind::NonCapturingGroup
                | NodeKind::NamedCapturingGroup
                | NodeKind::LookaheadAssertion
                | NodeKind::NegativeLookaheadAssertion
                | NodeKind::LookbehindAssertion
                | NodeKind::NegativeLookbehindAssertion
                | NodeKind::MalformedGroup
        )
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
