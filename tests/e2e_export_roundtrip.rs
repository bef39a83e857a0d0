//! Export round-trip test: parse a snapshot → write it back → parse again.
//!
//! Tests the KaSim file path:
//!   Snapshot A → write_snapshot() → snapshot text → Snapshot::parse() == A

use std::collections::BTreeMap;

use kappa_rs::{snapshot_to_string, write_snapshot, Complex, Snapshot};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const KASIM_OUTPUT: &str = r#"// Snapshot [Event: 9001]
// "uuid" : "e7a0"
%def: "T0" "33.25"

%init: 17 /*2 agents*/ Kin(cat[1]{on}), Sub(s[1]{u} t[.])
%init: 5 /*1 agents*/ Sub(t[.] s[.]{p})
%init: 2 /*3 agents*/ x3:Bob(h[1] t[2]), x1:Bob(h[2] t[3]), x2:Bob(h[3] t[1])
%init: 2.5e-3 camp
"#;

#[test]
fn test_roundtrip_preserves_snapshot() {
    let original = Snapshot::parse(KASIM_OUTPUT).unwrap();
    let text = snapshot_to_string(&original).unwrap();
    let reparsed = Snapshot::parse(&text).unwrap();
    assert_eq!(reparsed, original);
}

#[test]
fn test_dump_is_canonical() {
    let original = Snapshot::parse(KASIM_OUTPUT).unwrap();
    let text = snapshot_to_string(&original).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "// Snapshot [Event: 9001]");
    assert_eq!(lines[1], "// \"uuid\" : \"e7a0\"");
    assert_eq!(lines[2], "%def: \"T0\" \"33.25\"");
    assert!(lines.contains(&"%init: 5 /*1 agents*/ Sub(s[.]{p} t[.]{#})"));
    assert!(lines.contains(&"%init: 0.0025 camp"));
    assert!(lines
        .iter()
        .any(|l| l.starts_with("%init: 2 /*3 agents*/ x1:Bob(")));

    // Writing the reparsed snapshot gives the same bytes.
    let again = snapshot_to_string(&Snapshot::parse(&text).unwrap()).unwrap();
    assert_eq!(again, text);
}

#[test]
fn test_write_to_any_writer() {
    let original = Snapshot::parse(KASIM_OUTPUT).unwrap();
    let mut out: Vec<u8> = Vec::new();
    write_snapshot(&original, &mut out).unwrap();
    assert!(!out.is_empty());
    assert_eq!(String::from_utf8(out).unwrap(), snapshot_to_string(&original).unwrap());
}

#[test]
fn test_projection_survives_roundtrip() {
    let original = Snapshot::parse(KASIM_OUTPUT).unwrap();
    let reparsed = Snapshot::parse(&snapshot_to_string(&original).unwrap()).unwrap();
    let a = original.to_graph().unwrap();
    let b = reparsed.to_graph().unwrap();
    assert_eq!(a.node_count(), b.node_count());
    assert_eq!(a.edge_count(), b.edge_count());
    assert_eq!(a.node_count() as u64, original.total_mass());
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 48, .. ProptestConfig::default() })]

    #[test]
    fn generated_snapshots_roundtrip(
        event in 0u64..1_000_000,
        time in 0.0f64..1e6,
        dimers in 0u64..500,
        monomers in 1u64..500,
        tokens in prop::collection::btree_map("[a-z]{1,6}", -1e3f64..1e3, 0..4),
    ) {
        let mut complexes = BTreeMap::new();
        complexes.insert("A(x[.]{u})".parse::<Complex>().unwrap(), monomers);
        if dimers > 0 {
            complexes.insert("A(x[1]{p}), A(x[1]{p})".parse::<Complex>().unwrap(), dimers);
        }
        let snapshot = Snapshot::from_parts(event, None, time, complexes, tokens);

        let reparsed = Snapshot::parse(&snapshot_to_string(&snapshot).unwrap()).unwrap();
        prop_assert_eq!(reparsed.total_mass(), monomers + 2 * dimers);
        prop_assert_eq!(reparsed, snapshot);
    }
}
