//! Document diff: compute the patch turning one document into another.
//!
//! Objects are compared member by member. A member that disappears under one
//! key and reappears unchanged under a new key becomes a `move`. Arrays keep
//! their common prefix and suffix untouched, diff the overlapping middle
//! element by element, then insert or remove the remainder. Any other
//! difference becomes a `replace`. Output depends only on the two inputs.

use chained_types::Document;
use serde_json::{Map, Value};

use crate::operation::{Patch, PatchOperation};
use crate::pointer::Pointer;

/// Compute a patch `p` such that `apply(&p, old) == Ok(new.clone())`.
pub fn diff(old: &Document, new: &Document) -> Patch {
    let mut ops = Vec::new();
    diff_values(&mut ops, &Pointer::root(), old, new);
    Patch::from(ops)
}

fn diff_values(ops: &mut Vec<PatchOperation>, path: &Pointer, old: &Value, new: &Value) {
    if old == new {
        return;
    }
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => diff_objects(ops, path, a, b),
        (Value::Array(a), Value::Array(b)) => diff_arrays(ops, path, a, b),
        _ => ops.push(PatchOperation::Replace {
            path: path.clone(),
            value: new.clone(),
        }),
    }
}

fn diff_objects(
    ops: &mut Vec<PatchOperation>,
    path: &Pointer,
    old: &Map<String, Value>,
    new: &Map<String, Value>,
) {
    let mut added: Vec<(&String, &Value)> =
        new.iter().filter(|(k, _)| !old.contains_key(*k)).collect();

    for (key, old_val) in old {
        match new.get(key) {
            Some(new_val) => diff_values(ops, &path.child(key.as_str()), old_val, new_val),
            None => {
                let target = added.iter().position(|(_, v)| *v == old_val);
                match target {
                    Some(pos) => {
                        let (new_key, _) = added.remove(pos);
                        ops.push(PatchOperation::Move {
                            from: path.child(key.as_str()),
                            path: path.child(new_key.as_str()),
                        });
                    }
                    None => ops.push(PatchOperation::Remove {
                        path: path.child(key.as_str()),
                    }),
                }
            }
        }
    }

    for (key, value) in added {
        ops.push(PatchOperation::Add {
            path: path.child(key.as_str()),
            value: value.clone(),
        });
    }
}

fn diff_arrays(ops: &mut Vec<PatchOperation>, path: &Pointer, old: &[Value], new: &[Value]) {
    let shorter = old.len().min(new.len());
    let prefix = old
        .iter()
        .zip(new)
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old
        .iter()
        .rev()
        .zip(new.iter().rev())
        .take(shorter - prefix)
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];
    let overlap = old_mid.len().min(new_mid.len());

    for (offset, (a, b)) in old_mid.iter().zip(new_mid).enumerate() {
        diff_values(ops, &path.index(prefix + offset), a, b);
    }

    for (offset, value) in new_mid.iter().enumerate().skip(overlap) {
        ops.push(PatchOperation::Add {
            path: path.index(prefix + offset),
            value: value.clone(),
        });
    }

    for _ in overlap..old_mid.len() {
        ops.push(PatchOperation::Remove {
            path: path.index(prefix + overlap),
        });
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::apply::apply;

    fn roundtrip(old: Value, new: Value) -> Patch {
        let patch = diff(&old, &new);
        assert_eq!(apply(&patch, &old).unwrap(), new, "patch: {patch:?}");
        patch
    }

    #[test]
    fn identical_documents_no_ops() {
        let doc = json!({"a": [1, {"b": null}]});
        assert!(diff(&doc, &doc).is_empty());
    }

    #[test]
    fn empty_to_single_key_is_one_add() {
        let patch = roundtrip(json!({}), json!({"a": 1}));
        assert_eq!(
            patch.operations(),
            [PatchOperation::Add {
                path: Pointer::parse("/a").unwrap(),
                value: json!(1)
            }]
        );
    }

    #[test]
    fn removed_key_is_remove() {
        let patch = roundtrip(json!({"a": 1, "b": 2}), json!({"a": 1}));
        assert_eq!(patch.len(), 1);
        assert_eq!(patch.count("remove"), 1);
    }

    #[test]
    fn changed_scalar_is_replace() {
        let patch = roundtrip(json!({"a": {"b": 1}}), json!({"a": {"b": "one"}}));
        assert_eq!(
            patch.operations(),
            [PatchOperation::Replace {
                path: Pointer::parse("/a/b").unwrap(),
                value: json!("one")
            }]
        );
    }

    #[test]
    fn renamed_key_is_move() {
        let patch = roundtrip(
            json!({"old": {"big": [1, 2, 3]}}),
            json!({"new": {"big": [1, 2, 3]}}),
        );
        assert_eq!(
            patch.operations(),
            [PatchOperation::Move {
                from: Pointer::parse("/old").unwrap(),
                path: Pointer::parse("/new").unwrap()
            }]
        );
    }

    #[test]
    fn type_change_at_root_is_replace() {
        let patch = roundtrip(json!({"a": 1}), json!([1]));
        assert_eq!(patch.operations()[0].path(), &Pointer::root());
    }

    #[test]
    fn array_append_and_truncate() {
        let patch = roundtrip(json!([1, 2]), json!([1, 2, 3, 4]));
        assert_eq!(patch.count("add"), 2);
        let patch = roundtrip(json!([1, 2, 3, 4]), json!([1]));
        assert_eq!(patch.count("remove"), 3);
    }

    #[test]
    fn array_insert_at_front_is_single_add() {
        let patch = roundtrip(json!([2, 3, 4]), json!([1, 2, 3, 4]));
        assert_eq!(
            patch.operations(),
            [PatchOperation::Add {
                path: Pointer::parse("/0").unwrap(),
                value: json!(1)
            }]
        );
    }

    #[test]
    fn array_delete_in_middle_is_single_remove() {
        let patch = roundtrip(json!(["a", "b", "c"]), json!(["a", "c"]));
        assert_eq!(
            patch.operations(),
            [PatchOperation::Remove {
                path: Pointer::parse("/1").unwrap()
            }]
        );
    }

    #[test]
    fn repeated_elements_roundtrip() {
        roundtrip(json!([1, 1, 1]), json!([1, 1]));
        roundtrip(json!([1, 2, 1]), json!([1, 1, 2, 1]));
        roundtrip(json!([]), json!([0, 0]));
    }

    #[test]
    fn keys_needing_escapes() {
        roundtrip(json!({"a/b": 1, "~": 2}), json!({"a/b": 3, "": 4}));
    }

    #[test]
    fn diff_is_deterministic() {
        let a = json!({"x": [1, 2, {"y": 3}], "z": "q"});
        let b = json!({"x": [2, {"y": 4}], "w": "q"});
        assert_eq!(diff(&a, &b), diff(&a, &b));
    }

    #[test]
    fn nested_snapshot_update() {
        roundtrip(
            json!({"zai": 922350, "mf3": {"mt1": {"energies": [1.0, 2.0], "xs": [5.5, 6.5]}}}),
            json!({"zai": 922350, "mf3": {"mt1": {"energies": [1.0, 2.0, 3.0], "xs": [5.5, 7.0, 8.0]}}}),
        );
    }

    fn arb_document() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            (-5i64..5).prop_map(Value::from),
            prop::num::f64::NORMAL.prop_map(Value::from),
            "[a-c~/]{0,3}".prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 48, 5, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                prop::collection::btree_map("[a-d~/]{0,2}", inner, 0..5)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn apply_diff_reproduces_target(old in arb_document(), new in arb_document()) {
            let patch = diff(&old, &new);
            prop_assert_eq!(apply(&patch, &old).unwrap(), new);
        }

        #[test]
        fn persisted_patch_text_reproduces_target(old in arb_document(), new in arb_document()) {
            let text = serde_json::to_string(&diff(&old, &new)).unwrap();
            let patch: Patch = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(apply(&patch, &old).unwrap(), new);
        }

        #[test]
        fn diff_of_self_is_empty(doc in arb_document()) {
            prop_assert!(diff(&doc, &doc).is_empty());
        }
    }
}
