//! Parse errors, equivalence and the flat query types.

use gerrit_filter::{
    AccountQuery, ChangeQuery, ComplexQuery, Expr, FilterError, GroupQuery, IsType, Node, Operator,
    ParseError, ParseOptions, ProjectQuery, ProjectState, StatusType, Term, TermKind, TermValue,
};

fn parse_error(input: &str) -> ParseError {
    match ChangeQuery::parse(input) {
        Err(FilterError::Parse(err)) => err,
        other => panic!("expected a parse error for {input:?}, got {other:?}"),
    }
}

// ============================================================================
// Parse errors
// ============================================================================

#[test]
fn dangling_operators() {
    assert_eq!(parse_error("AND").message, "'AND' has no left operand");
    assert_eq!(parse_error("OR is:open").message, "'OR' has no left operand");
    assert_eq!(parse_error("AND status:open").position, 0);

    let err = parse_error("is:open AND");
    assert_eq!(err.message, "'AND' has no right operand");
    assert_eq!(err.position, 8);
}

#[test]
fn unknown_values_and_keys() {
    assert_eq!(parse_error("status:open2").message, "unknown status 'open2'");
    assert_eq!(parse_error("is:everything").message, "unknown is: value 'everything'");
    assert_eq!(parse_error("has:cake").message, "unknown has: value 'cake'");
    assert_eq!(parse_error("nope:1").message, "unknown change predicate 'nope'");
}

#[test]
fn unbalanced_and_unterminated() {
    assert_eq!(parse_error("(is:open").message, "unclosed '('");
    assert_eq!(parse_error("is:open))").message, "unbalanced ')'");
    assert_eq!(parse_error("()").message, "empty parentheses");
    assert_eq!(parse_error("topic:\"x").message, "unterminated quoted string");
}

#[test]
fn error_display_names_input_and_offset() {
    let err = ChangeQuery::parse("is:open OR").unwrap_err();
    assert_eq!(
        err.to_string(),
        "'OR' has no right operand (at byte 8 of \"is:open OR\")"
    );
}

#[test]
fn lenient_mode_keeps_unknown_predicates() {
    let options = ParseOptions::lenient();
    let query = ChangeQuery::parse_with("is:open plugin-owner:bob -(x:\"y z\")", &options).unwrap();
    assert_eq!(query.to_string(), "is:open plugin-owner:bob -(x:\"y z\")");

    // Known keys are still validated.
    assert!(ChangeQuery::parse_with("status:nope", &options).is_err());
}

#[test]
fn depth_limit_is_configurable() {
    let nested = "((((is:open))))";
    assert!(ChangeQuery::parse(nested).is_ok());
    let options = ParseOptions::default().with_max_depth(3);
    assert!(ChangeQuery::parse_with(nested, &options).is_err());
}

#[test]
fn nesting_beyond_max_depth_is_rejected() {
    let mut query = ChangeQuery::new().is(IsType::Open);
    for _ in 0..10 {
        query = ChangeQuery::new().owner_self().and(query).unwrap();
    }
    let text = query.to_string();
    assert_eq!(ChangeQuery::parse(&text).unwrap(), query);

    let err = ChangeQuery::parse_with(&text, &ParseOptions::default().with_max_depth(5))
        .unwrap_err();
    assert!(err.to_string().contains("query nests deeper than 5 levels"));
}

#[test]
fn parse_options_deserialize_with_defaults() {
    let options: ParseOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options, ParseOptions::default());

    let options: ParseOptions = serde_json::from_str(r#"{"max_depth": 4}"#).unwrap();
    assert!(options.strict);
    assert_eq!(options.max_depth, 4);
}

// ============================================================================
// Equivalence
// ============================================================================

#[test]
fn operator_spelling_does_not_change_meaning() {
    let spellings = [
        "is:open owner:self",
        "is:open AND owner:self",
        "is:open AND (owner:self)",
        "(is:open) owner:self",
        "(is:open owner:self)",
    ];
    let first = ChangeQuery::parse(spellings[0]).unwrap();
    for text in &spellings[1..] {
        let other = ChangeQuery::parse(text).unwrap();
        assert!(first.is_equivalent(&other), "{text}");
    }
}

#[test]
fn not_and_minus_are_equivalent() {
    let minus = ChangeQuery::parse("-is:wip").unwrap();
    let not = ChangeQuery::parse("NOT is:wip").unwrap();
    let double = ChangeQuery::parse("--is:wip").unwrap();
    assert_eq!(minus, not);
    assert!(double.is_equivalent(&ChangeQuery::parse("is:wip").unwrap()));
}

#[test]
fn or_splits_conjunctions() {
    let query = ChangeQuery::parse("a b OR c d").unwrap();
    assert_eq!(query.to_expr().to_string(), "(or (and a b) (and c d))");

    let grouped = ChangeQuery::parse("a (b OR c) d").unwrap();
    assert_eq!(grouped.to_expr().to_string(), "(and a (or b c) d)");
    assert!(!query.is_equivalent(&grouped));
}

#[test]
fn expr_serializes_to_json() {
    let query = ChangeQuery::parse("is:open -(owner:self OR is:wip)").unwrap();
    let json = serde_json::to_value(query.to_expr()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "and": [
                {"term": "is:open"},
                {"not": {"or": [{"term": "owner:self"}, {"term": "is:wip"}]}}
            ]
        })
    );
}

#[test]
fn empty_query_matches_everything() {
    assert!(ChangeQuery::new().to_expr().matches_everything());
    assert_eq!(ChangeQuery::new().to_expr(), Expr::And(vec![]));
}

// ============================================================================
// Composition
// ============================================================================

#[test]
fn empty_operands_fail_for_every_operator() {
    let full = || ChangeQuery::new().status(StatusType::Open);
    let empty = ChangeQuery::new;

    for (left, right) in [(empty(), full()), (full(), empty()), (empty(), empty())] {
        assert_eq!(
            left.clone().and(right.clone()).unwrap_err(),
            FilterError::EmptyOperand { operator: Operator::And }
        );
        assert_eq!(
            left.clone().or(right.clone()).unwrap_err(),
            FilterError::EmptyOperand { operator: Operator::Or }
        );
        assert_eq!(
            left.negate(right).unwrap_err(),
            FilterError::EmptyOperand { operator: Operator::Negate }
        );
    }
}

#[test]
fn nodes_are_exposed_in_order() {
    let query = ChangeQuery::parse("a AND (b) OR (c) -(d) (e)").unwrap();
    let kinds: Vec<&str> = query
        .as_complex()
        .nodes()
        .iter()
        .map(|node| match node {
            Node::Term(_) => "term",
            Node::And(_) => "and",
            Node::Or(_) => "or",
            Node::Not(_) => "not",
            Node::Group(_) => "group",
        })
        .collect();
    assert_eq!(kinds, ["term", "and", "or", "not", "group"]);
}

#[test]
fn change_query_converts_into_complex() {
    let query = ChangeQuery::new().owner_self();
    let complex: ComplexQuery = query.clone().into();
    assert_eq!(complex, query.into_complex());
}

#[test]
fn term_kinds() {
    let query = ChangeQuery::parse("owner:self topic:\"x\" free").unwrap();
    let terms: Vec<&Term> = query
        .as_complex()
        .nodes()
        .iter()
        .filter_map(|node| match node {
            Node::Term(term) => Some(term),
            _ => None,
        })
        .collect();
    assert!(matches!(
        terms[0].kind(),
        TermKind::Field { value: TermValue::Keyword(_), .. }
    ));
    assert!(matches!(
        terms[1].kind(),
        TermKind::Field { value: TermValue::Quoted(_), .. }
    ));
    assert_eq!(terms[2].kind(), &TermKind::Text("free".into()));
}

// ============================================================================
// Flat queries
// ============================================================================

#[test]
fn active_toggle_never_keeps_both() {
    let query = AccountQuery::new().active(false).active(true);
    let text = query.to_string();
    assert!(text.contains("is:active"));
    assert!(!text.contains("is:inactive"));
    assert_eq!(query.as_simple().len(), 1);
}

#[test]
fn flat_queries_round_trip() {
    let account = AccountQuery::new().name("Jane").username("jd").active(true);
    assert_eq!(AccountQuery::parse(&account.to_string()).unwrap(), account);

    let group = GroupQuery::new().member("jd").visible_to_all(false).simple("ops");
    assert_eq!(group.to_string().parse::<GroupQuery>().unwrap(), group);

    let project = ProjectQuery::new().prefix("infra/").state(ProjectState::Active);
    assert_eq!(project.to_string().parse::<ProjectQuery>().unwrap(), project);
}

#[test]
fn flat_queries_reject_boolean_operators() {
    assert!(AccountQuery::parse("name:a OR email:b").is_err());
    assert!(GroupQuery::parse("(name:a)").is_err());
    assert!(ProjectQuery::parse("name:a AND parent:b").is_err());
}

#[test]
fn flat_queries_accept_empty_input() {
    assert!(AccountQuery::parse("").unwrap().is_empty());
    assert!(GroupQuery::parse(" ").unwrap().is_empty());
    assert!(ProjectQuery::parse("").unwrap().is_empty());
}
