use regex_cst::ast::{
    Backreference, ClassAtom, ClassMember, GroupKind, Invalid, InvalidReason, QuantifierKind,
    Span, Unit,
};
use regex_cst::{check, parse, parse_tree, NodeKind};

fn units(pattern: &str) -> Vec<Unit> {
    let regex = parse(pattern);
    assert_eq!(regex.body.alternatives.len(), 1, "{pattern}");
    regex.body.alternatives[0]
        .terms
        .iter()
        .map(|t| t.unit.clone())
        .collect()
}

#[test]
fn lazy_plus_on_literal() {
    let regex = parse("a+?");
    let term = &regex.body.alternatives[0].terms[0];
    assert!(matches!(term.unit, Unit::Literal { value: 'a', .. }));
    let quantifier = term.quantifier.as_ref().unwrap();
    assert_eq!(quantifier.kind, QuantifierKind::OneOrMore);
    assert!(quantifier.is_lazy());
}

#[test]
fn named_group_with_body() {
    let regex = parse("(?<name>ab)");
    let Unit::Group(group) = &regex.body.alternatives[0].terms[0].unit else {
        panic!("expected group");
    };
    let GroupKind::Named(name) = &group.kind else {
        panic!("expected named group");
    };
    assert_eq!(name.name, "name");
    let body = &group.body.alternatives[0].terms;
    assert!(matches!(body[0].unit, Unit::Literal { value: 'a', .. }));
    assert!(matches!(body[1].unit, Unit::Literal { value: 'b', .. }));
}

#[test]
fn class_range() {
    let units = units("[a-z]");
    let [Unit::CharacterClass(class)] = &units[..] else {
        panic!("expected a single class");
    };
    assert!(!class.negated());
    let [ClassMember::Range(range)] = &class.members[..] else {
        panic!("expected a single range");
    };
    assert!(matches!(range.low, ClassAtom::Literal { value: 'a', .. }));
    assert!(matches!(range.high, ClassAtom::Literal { value: 'z', .. }));
}

#[test]
fn unknown_escape_is_one_invalid_node() {
    assert_eq!(
        units(r"\q"),
        vec![Unit::Invalid(Invalid::new(Span::new(0, 2), InvalidReason::BadEscape))]
    );
}

#[test]
fn unterminated_group_consumes_everything() {
    let tree = parse_tree("(a");
    assert_eq!(tree.reconstruct(), "(a");
    let units = units("(a");
    let [Unit::Group(group)] = &units[..] else {
        panic!("expected group");
    };
    assert_eq!(group.kind, GroupKind::Anonymous);
    assert!(!group.is_terminated());
    assert_eq!(group.body.alternatives[0].terms.len(), 1);
}

#[test]
fn reversed_count_is_not_an_error() {
    let regex = check("a{2,1}").expect("reversed bounds are syntactically fine");
    let quantifier = regex.body.alternatives[0].terms[0].quantifier.clone().unwrap();
    let QuantifierKind::Count(count) = quantifier.kind else {
        panic!("expected count");
    };
    assert_eq!(count.min, 2);
    assert_eq!(count.max, Some(1));
}

#[test]
fn check_reports_every_invalid_construct() {
    let err = check(r"[a|\k<1-2>)**").unwrap_err();
    let reasons: Vec<_> = err.iter().map(|d| d.reason).collect();
    // Inside a class `\k` is just an unknown escape and the class runs to the end.
    assert_eq!(
        reasons,
        vec![InvalidReason::BadEscape, InvalidReason::UnterminatedClass]
    );

    let err = check(r"a|\k<1-2>)**").unwrap_err();
    let reasons: Vec<_> = err.iter().map(|d| d.reason).collect();
    assert_eq!(
        reasons,
        vec![
            InvalidReason::BadBackreference,
            InvalidReason::UnknownConstruct,
            InvalidReason::StackedQuantifier,
        ]
    );
}

#[test]
fn quantifier_applies_to_whole_group() {
    let tree = parse_tree("(a)+");
    let pattern = &tree.root().children[0].children[0];
    let kinds: Vec<_> = pattern.children.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![NodeKind::AnonymousCapturingGroup, NodeKind::OneOrMore]
    );
}

#[test]
fn quantifier_never_leaves_its_group() {
    // `+` right after `(` has nothing inside the group to repeat.
    let tree = parse_tree("a(+)");
    assert_eq!(
        tree.to_sexp(),
        "(regex (disjunction (pattern (pattern_character) (anonymous_capturing_group \
         (group_begin) (disjunction (pattern (invalid bad-quantifier))) (group_end)))))"
    );
}

#[test]
fn only_syntax_characters() {
    for pattern in ["", ")", "]", "}", "{", "|", "||", "*", "?*+", "(((", ")))", "[[[", "\\", "^$"] {
        let tree = parse_tree(pattern);
        assert_eq!(tree.reconstruct(), pattern);
    }
}

#[test]
fn backreferences_are_not_resolved() {
    let units = units(r"\9\k<missing>");
    assert!(matches!(
        units[0],
        Unit::Backreference(Backreference::Numeric { index: 9, .. })
    ));
    assert!(matches!(units[1], Unit::Backreference(Backreference::Named { .. })));
}

#[test]
fn recovery_resumes_after_invalid() {
    let tree = parse_tree(r"\xZ(?<1 x>y)[b");
    let reasons: Vec<_> = tree.diagnostics().into_iter().map(|d| d.reason).collect();
    assert_eq!(
        reasons,
        vec![
            InvalidReason::BadEscape,
            InvalidReason::BadGroupName,
            InvalidReason::UnterminatedClass,
        ]
    );
    assert_eq!(
        tree.to_sexp(),
        "(regex (disjunction (pattern (invalid bad-escape) (pattern_character) \
         (malformed_group (group_begin) (invalid bad-group-name) \
         (disjunction (pattern (pattern_character))) (group_end)) \
         (character_class (set_begin) (class_character) (invalid unterminated-class)))))"
    );
}

#[test]
fn lookarounds_nest() {
    let tree = parse_tree("(?=a(?<!b(?:c)))");
    assert!(!tree.has_invalid());
    let groups: Vec<_> = tree
        .preorder()
        .filter(|n| n.kind.is_group())
        .map(|n| n.kind)
        .collect();
    assert_eq!(
        groups,
        vec![
            NodeKind::LookaheadAssertion,
            NodeKind::NegativeLookbehindAssertion,
            NodeKind::NonCapturingGroup,
        ]
    );
}

#[test]
fn missing_closer_leaves_the_rest_parsed() {
    for (pattern, reason, broken) in [
        (r"\p{L .*$x+", InvalidReason::BadEscape, r"\p{L"),
        (r"\k<a b.*$x+", InvalidReason::BadBackreference, r"\k<a"),
        (r"(?<a b.*$x+", InvalidReason::BadGroupName, "?<a"),
    ] {
        let tree = parse_tree(pattern);
        let found: Vec<_> = tree
            .diagnostics()
            .into_iter()
            .filter(|d| d.reason != InvalidReason::UnterminatedGroup)
            .map(|d| (d.reason, &pattern[d.span.range()]))
            .collect();
        assert_eq!(found, vec![(reason, broken)], "{pattern}");
        let kinds: Vec<_> = tree.preorder().map(|n| n.kind).collect();
        assert!(kinds.contains(&NodeKind::ZeroOrMore), "{pattern}");
        assert!(kinds.contains(&NodeKind::EndAssertion), "{pattern}");
        assert!(kinds.contains(&NodeKind::OneOrMore), "{pattern}");
    }
}
