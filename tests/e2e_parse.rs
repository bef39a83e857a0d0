//! End-to-end tests for the Kappa text grammars.
//!
//! Canonical forms, containment tables, identifier-aware ordering, cross-kind
//! comparison and parse → canonical → parse round trips.

use kappa_rs::{
    parse_expression, Agent, Bond, Complex, Counter, Error, KappaEntity, KappaExpression, Port,
    Site, Token,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn port(s: &str) -> Port {
    s.parse().unwrap_or_else(|e| panic!("{s}: {e}"))
}

fn agent(s: &str) -> Agent {
    s.parse().unwrap_or_else(|e| panic!("{s}: {e}"))
}

// ============================================================================
// 1. Canonical forms
// ============================================================================

#[test]
fn test_wildcard_defaults_inserted() {
    assert_eq!(agent("A(b[1])").to_string(), "A(b[1]{#})");
    assert_eq!(port("a").to_string(), "a[#]{#}");
    assert_eq!(port("a{p}").to_string(), "a[#]{p}");
}

#[test]
fn test_site_order_does_not_matter() {
    let a = agent("A(z[.], a{p}[1] m{=2})");
    let b = agent("A(m{=2} a[1]{p}, z[.])");
    assert_eq!(a, b);
    assert_eq!(a.to_string(), "A(a[1]{p} m{=2} z[.]{#})");
}

#[test]
fn test_complex_agent_order_does_not_matter() {
    let a: Complex = "B(x[1]), A(x[1] y[2]), C(y[2])".parse().unwrap();
    let b: Complex = "C(y[2]) A(y[2] x[1]) B(x[1])".parse().unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_string(), "A(x[1]{#} y[2]{#}), B(x[1]{#}), C(y[2]{#})");
}

#[test]
fn test_transitions_and_markers() {
    assert_eq!(port("a[./1]{u/p}").to_string(), "a[./1]{u/p}");
    assert_eq!(agent("A(x[.])+").to_string(), "A(x[.]{#})+");
    assert_eq!(agent("x3:A()-").to_string(), "x3:A()-");
    let counter: Counter = "c{=2/+=1}".parse().unwrap();
    assert_eq!(counter.to_string(), "c{=2/+=1}");
}

// ============================================================================
// 2. Containment
// ============================================================================

#[test]
fn test_bond_containment_table() {
    // (host, query, expected)
    let table = [
        ("a[.]", "a[#]", true),
        ("a[_]", "a[#]", true),
        ("a[3]", "a[#]", true),
        ("a[#]", "a[#]", true),
        ("a[.]", "a[_]", false),
        ("a[_]", "a[_]", true),
        ("a[3]", "a[_]", true),
        ("a[x.B]", "a[_]", true),
        ("a[#]", "a[_]", false),
        ("a[.]", "a[.]", true),
        ("a[_]", "a[.]", false),
        ("a[3]", "a[.]", false),
        ("a[#]", "a[.]", false),
        ("a[.]", "a[3]", false),
        ("a[_]", "a[3]", false),
        ("a[3]", "a[3]", true),
        ("a[4]", "a[3]", false),
        ("a[x.B]", "a[x.B]", true),
        ("a[y.B]", "a[x.B]", false),
    ];
    for (host, query, expected) in table {
        assert_eq!(
            port(host).contains(&port(query)).unwrap(),
            expected,
            "{host} ⊇ {query}"
        );
    }
}

#[test]
fn test_internal_containment_table() {
    let table = [
        ("a{p}", "a{#}", true),
        ("a{#}", "a{#}", true),
        ("a{p}", "a{p}", true),
        ("a{u}", "a{p}", false),
        ("a{#}", "a{p}", false),
    ];
    for (host, query, expected) in table {
        assert_eq!(port(host).contains(&port(query)).unwrap(), expected, "{host} ⊇ {query}");
    }
}

#[test]
fn test_transition_containment_is_undefined() {
    assert!(matches!(
        port("a[.]").contains(&port("a[./1]")),
        Err(Error::UndefinedSatisfaction(_))
    ));
    assert!(matches!(
        port("a{u/p}").contains(&port("a")),
        Err(Error::UndefinedSatisfaction(_))
    ));
}

#[test]
fn test_agent_containment_by_site_name() {
    let host = agent("A(x[1]{p} y[.] z{=3})");
    assert!(host.contains(&agent("A(y[.] x{p})")).unwrap());
    assert!(host.contains(&agent("A()")).unwrap());
    assert!(!host.contains(&agent("A(w)")).unwrap());
    assert!(!host.contains(&agent("B()")).unwrap());
}

// ============================================================================
// 3. Ordering and identity
// ============================================================================

#[test]
fn test_numeric_identifier_order() {
    let mut agents = vec![agent("x10:A()"), agent("x9:A()"), agent("A()"), agent("x100:A()")];
    agents.sort();
    let texts: Vec<String> = agents.iter().map(ToString::to_string).collect();
    assert_eq!(texts, vec!["A()", "x9:A()", "x10:A()", "x100:A()"]);
}

#[test]
fn test_identifier_ignored_by_type_equality() {
    let a = agent("x1:A(s[.])");
    let b = agent("x2:A(s[.])");
    assert_ne!(a, b);
    assert!(a.same_type(&b));
}

#[test]
fn test_cross_kind_comparison_fails() {
    let site_port: Site = "a[.]".parse().unwrap();
    let site_counter: Site = "a{=1}".parse().unwrap();
    assert!(matches!(
        site_port.contains(&site_counter),
        Err(Error::EqualityError { .. })
    ));

    let bond = parse_expression("A.a..b.B").unwrap();
    let token = parse_expression("1 atp").unwrap();
    assert!(matches!(bond.try_eq(&token), Err(Error::EqualityError { .. })));
}

#[test]
fn test_dispatcher_returns_tagged_variants() {
    assert!(matches!(parse_expression("x[1]").unwrap(), KappaEntity::Port(_)));
    assert!(matches!(parse_expression("n{>=2}").unwrap(), KappaEntity::Counter(_)));
    assert!(matches!(parse_expression("x1:A()").unwrap(), KappaEntity::Agent(_)));
    assert!(matches!(parse_expression("A(), B()").unwrap(), KappaEntity::Complex(_)));
    assert!(matches!(parse_expression("B.s2..s1.A").unwrap(), KappaEntity::Bond(_)));
    assert!(matches!(parse_expression("0.5 glc").unwrap(), KappaEntity::Token(_)));
}

#[test]
fn test_serde_uses_canonical_text() {
    let a = agent("A(y[.], x[1]{p})");
    let json = serde_json::to_string(&a).unwrap();
    assert_eq!(json, "\"A(x[1]{p} y[.]{#})\"");
    let back: Agent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, a);
    assert!(serde_json::from_str::<Agent>("\"A(x[\"").is_err());
}

#[test]
fn test_malformed_input_never_builds() {
    assert!(matches!("A(x[1]".parse::<Agent>(), Err(Error::AgentParseError { .. })));
    assert!(matches!("A(x x)".parse::<Agent>(), Err(Error::AgentParseError { .. })));
    assert!(matches!("A(x[1])".parse::<Complex>(), Err(Error::ComplexParseError { .. })));
    assert!(matches!("A.x.B".parse::<Bond>(), Err(Error::BondParseError { .. })));
    assert!(matches!("x".parse::<Token>(), Err(Error::TokenParseError { .. })));
}

// ============================================================================
// 4. Round-trip properties
// ============================================================================

fn bond_text() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(".".to_string())),
        Just(Some("#".to_string())),
        Just(Some("_".to_string())),
        (0u64..50).prop_map(|n| Some(n.to_string())),
        Just(Some("s.B".to_string())),
    ]
}

fn internal_text() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("#".to_string())),
        Just(Some("p".to_string())),
        Just(Some("u".to_string())),
    ]
}

fn port_text(name: &'static str) -> impl Strategy<Value = String> {
    (bond_text(), internal_text(), any::<bool>()).prop_map(move |(bond, internal, swap)| {
        let bond = bond.map(|b| format!("[{b}]")).unwrap_or_default();
        let internal = internal.map(|i| format!("{{{i}}}")).unwrap_or_default();
        if swap {
            format!("{name}{internal}{bond}")
        } else {
            format!("{name}{bond}{internal}")
        }
    })
}

fn signature() -> impl Strategy<Value = Vec<String>> {
    (
        proptest::option::of(port_text("a")),
        proptest::option::of(port_text("b")),
        proptest::option::of(port_text("k")),
        proptest::option::of((0u64..5).prop_map(|n| format!("c{{>={n}}}"))),
    )
        .prop_map(|(a, b, k, c)| [a, b, k, c].into_iter().flatten().collect::<Vec<_>>())
        .prop_shuffle()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn port_round_trips(text in port_text("site")) {
        let parsed = port(&text);
        let again = port(parsed.canonical_string());
        prop_assert_eq!(&again, &parsed);
        prop_assert_eq!(again.canonical_string(), parsed.canonical_string());
    }

    #[test]
    fn agent_round_trips_in_any_site_order(
        sites in signature(),
        id in proptest::option::of(0u64..1000),
    ) {
        let prefix = id.map(|n| format!("x{n}:")).unwrap_or_default();
        let forward = agent(&format!("{prefix}A({})", sites.join(" ")));
        let mut reversed_sites = sites.clone();
        reversed_sites.reverse();
        let backward = agent(&format!("{prefix}A({})", reversed_sites.join(", ")));

        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(agent(forward.canonical_string()), forward);
    }

    #[test]
    fn identifiers_order_numerically(a in 0u64..10_000, b in 0u64..10_000) {
        let left = agent(&format!("x{a}:A()"));
        let right = agent(&format!("x{b}:A()"));
        prop_assert_eq!(left.cmp(&right), a.cmp(&b));
    }

    #[test]
    fn bond_orientation_is_irrelevant(
        a in "[A-Z][a-z]{0,3}", s1 in "[a-z]{1,3}",
        b in "[A-Z][a-z]{0,3}", s2 in "[a-z]{1,3}",
    ) {
        let forward: Bond = format!("{a}.{s1}..{s2}.{b}").parse().unwrap();
        let backward: Bond = format!("{b}.{s2}..{s1}.{a}").parse().unwrap();
        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(forward.reverse(), backward);
    }
}
