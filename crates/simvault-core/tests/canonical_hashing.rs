use std::collections::BTreeMap;

use serde_json::{json, Value};
use simvault_core::{derive_run_id, to_canonical_json_bytes, CanonValue, RunSpec, DEFAULT_ID_LEN};

fn mapping(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

fn base_env() -> BTreeMap<String, Value> {
    mapping(&[
        ("platform", json!("linux-x86_64")),
        ("package_version", json!("0.1.0")),
    ])
}

#[test]
fn key_order_does_not_change_the_id() {
    let forward = mapping(&[("alpha", json!(1)), ("beta", json!([1, 2, 3]))]);
    let reversed = mapping(&[("beta", json!([1, 2, 3])), ("alpha", json!(1))]);
    let env = base_env();
    let a = derive_run_id(&RunSpec::new(&forward, 7, None, &env), DEFAULT_ID_LEN).unwrap();
    let b = derive_run_id(&RunSpec::new(&reversed, 7, None, &env), DEFAULT_ID_LEN).unwrap();
    assert_eq!(a, b);
}

#[test]
fn nested_objects_canonicalize_recursively() {
    let a = mapping(&[("cfg", json!({"x": 1, "y": {"b": 2, "a": 3}}))]);
    let b = mapping(&[("cfg", json!({"y": {"a": 3, "b": 2}, "x": 1}))]);
    let env = base_env();
    let id_a = derive_run_id(&RunSpec::new(&a, 0, None, &env), DEFAULT_ID_LEN).unwrap();
    let id_b = derive_run_id(&RunSpec::new(&b, 0, None, &env), DEFAULT_ID_LEN).unwrap();
    assert_eq!(id_a, id_b);
}

#[test]
fn every_field_is_id_sensitive() {
    let params = mapping(&[("steps", json!(5))]);
    let env = base_env();
    let base = derive_run_id(
        &RunSpec::new(&params, 3, Some("abc123"), &env),
        DEFAULT_ID_LEN,
    )
    .unwrap();

    let other_params = mapping(&[("steps", json!(7))]);
    let changed_param = derive_run_id(
        &RunSpec::new(&other_params, 3, Some("abc123"), &env),
        DEFAULT_ID_LEN,
    )
    .unwrap();
    assert_ne!(base, changed_param);

    let changed_seed = derive_run_id(
        &RunSpec::new(&params, 4, Some("abc123"), &env),
        DEFAULT_ID_LEN,
    )
    .unwrap();
    assert_ne!(base, changed_seed);

    let changed_version = derive_run_id(
        &RunSpec::new(&params, 3, Some("def456"), &env),
        DEFAULT_ID_LEN,
    )
    .unwrap();
    assert_ne!(base, changed_version);

    let mut other_env = env.clone();
    other_env.insert("platform".to_string(), json!("darwin-aarch64"));
    let changed_env = derive_run_id(
        &RunSpec::new(&params, 3, Some("abc123"), &other_env),
        DEFAULT_ID_LEN,
    )
    .unwrap();
    assert_ne!(base, changed_env);
}

#[test]
fn absent_code_version_differs_from_any_commit() {
    let params = mapping(&[("steps", json!(5))]);
    let env = base_env();
    let with_none = derive_run_id(&RunSpec::new(&params, 3, None, &env), DEFAULT_ID_LEN).unwrap();
    let with_commit = derive_run_id(
        &RunSpec::new(&params, 3, Some("abc123"), &env),
        DEFAULT_ID_LEN,
    )
    .unwrap();
    assert_ne!(with_none, with_commit);
}

#[test]
fn canonical_bytes_are_compact_and_sorted() {
    let value = CanonValue::from(json!({"z": [1, null, true], "a": {"k": 0.5}}));
    let bytes = to_canonical_json_bytes(&value).unwrap();
    assert_eq!(bytes, br#"{"a":{"k":0.5},"z":[1,null,true]}"#.to_vec());
}

#[test]
fn repeated_derivation_is_stable() {
    let params = mapping(&[("grid", json!([[1, 2], [3, 4]])), ("rate", json!(0.25))]);
    let env = base_env();
    let spec = RunSpec::new(&params, 11, Some("abc123"), &env);
    let first = derive_run_id(&spec, DEFAULT_ID_LEN).unwrap();
    for _ in 0..8 {
        assert_eq!(derive_run_id(&spec, DEFAULT_ID_LEN).unwrap(), first);
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z]{0,8}".prop_map(Value::from),
        ]
    }

    proptest! {
        #[test]
        fn insertion_order_never_affects_bytes(
            entries in proptest::collection::vec(("[a-z]{1,6}", scalar()), 0..8)
        ) {
            let forward: BTreeMap<String, Value> =
                entries.iter().cloned().collect();
            let reversed: BTreeMap<String, Value> =
                entries.iter().rev().cloned().collect();
            let env = BTreeMap::new();
            let a = to_canonical_json_bytes(&RunSpec::new(&forward, 0, None, &env)).unwrap();
            let b = to_canonical_json_bytes(&RunSpec::new(&reversed, 0, None, &env)).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
