// Integration tests for the graph serializer

use framegraph::memory::value::{Scalar, Value};
use framegraph::serializer::records::{Payload, Records};
use framegraph::snapshot::FrameEntry;
use framegraph::{serialize, SerializeError, Serializer, SerializerOptions};

fn scalar_of(records: &Records, id: u32) -> Option<Scalar> {
    match &records.value(id)?.payload {
        Payload::Scalar(value) => value.as_scalar(),
        _ => None,
    }
}

#[test]
fn test_shared_list_scenario() {
    let xs = Value::list(vec![Value::int(1), Value::int(2)]);
    let snapshot = vec![FrameEntry::new("f").bind("x", xs.clone()).bind("y", xs)];

    let records = serialize(&snapshot).expect("Serialization failed");

    let f = records.frame("f").expect("Frame record missing");
    assert_eq!(f.variables, vec![("x".to_string(), 1), ("y".to_string(), 1)]);

    let list = records.value(1).expect("List record missing");
    assert_eq!(list.type_name, "list");
    assert!(list.is_container());
    match &list.payload {
        Payload::Sequence(ids) => assert_eq!(ids, &vec![2, 3]),
        other => panic!("Expected sequence payload, got {:?}", other),
    }
    assert_eq!(scalar_of(&records, 2), Some(Scalar::Int(1)));
    assert_eq!(scalar_of(&records, 3), Some(Scalar::Int(2)));
    assert_eq!(records.values().count(), 3);
}

#[test]
fn test_frames_precede_values_and_children_precede_parents() {
    let inner = Value::list(vec![Value::int(5)]);
    let outer = Value::list(vec![inner]);
    let snapshot = vec![
        FrameEntry::new("g").bind("o", outer),
        FrameEntry::new("__main__").bind("n", Value::int(9)),
    ];

    let records = serialize(&snapshot).expect("Serialization failed");
    let slice = records.as_slice();

    assert!(slice[0].is_frame());
    assert!(slice[1].is_frame());
    assert!(slice[2..].iter().all(|r| !r.is_frame()));

    // outer = 1, inner = 2, 5 = 3; completion order is 3, 2, 1, then n = 4
    let order: Vec<u32> = records.values().map(|v| v.id).collect();
    assert_eq!(order, vec![3, 2, 1, 4]);

    let names: Vec<&str> = records.frames().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["g", "__main__"]);
}

#[test]
fn test_equal_but_distinct_objects_get_distinct_ids() {
    let a = Value::dict(vec![(Value::str("k"), Value::int(1))]);
    let b = Value::dict(vec![(Value::str("k"), Value::int(1))]);
    let snapshot = vec![FrameEntry::new("f").bind("a", a).bind("b", b)];

    let records = serialize(&snapshot).expect("Serialization failed");
    let f = records.frame("f").unwrap();
    assert_ne!(f.variable("a"), f.variable("b"));
    assert_eq!(records.values().count(), 6);
}

#[test]
fn test_shared_reference_across_frames() {
    let shared = Value::set(vec![Value::str("x")]);
    let snapshot = vec![
        FrameEntry::new("inner").bind("s", shared.clone()),
        FrameEntry::new("outer").bind("t", shared),
    ];

    let records = serialize(&snapshot).expect("Serialization failed");
    let s = records.frame("inner").and_then(|f| f.variable("s"));
    let t = records.frame("outer").and_then(|f| f.variable("t"));
    assert_eq!(s, t);

    let set_records = records
        .values()
        .filter(|v| matches!(v.payload, Payload::Set(_)))
        .count();
    assert_eq!(set_records, 1);
}

#[test]
fn test_self_referencing_list_terminates() {
    let l = Value::list(vec![Value::int(0)]);
    l.push(l.clone()).unwrap();
    let snapshot = vec![FrameEntry::new("f").bind("l", l.clone())];

    let records = serialize(&snapshot).expect("Serialization failed");
    let id = records.frame("f").and_then(|f| f.variable("l")).unwrap();
    match &records.value(id).unwrap().payload {
        Payload::Sequence(ids) => assert_eq!(ids, &vec![2, id]),
        other => panic!("Expected sequence payload, got {:?}", other),
    }
    assert_eq!(records.values().count(), 2);

    l.clear();
}

#[test]
fn test_self_referencing_mapping() {
    let m = Value::dict(vec![]);
    m.insert(Value::str("self"), m.clone()).unwrap();
    let snapshot = vec![FrameEntry::new("f").bind("m", m.clone())];

    let records = serialize(&snapshot).expect("Serialization failed");
    let m_id = records.frame("f").and_then(|f| f.variable("m")).unwrap();
    let record = records.value(m_id).unwrap();
    assert_eq!(record.type_name, "dict");

    let pairs = match &record.payload {
        Payload::Mapping(pairs) => pairs.clone(),
        other => panic!("Expected mapping payload, got {:?}", other),
    };
    assert_eq!(pairs.len(), 1);
    let (key_id, value_id) = pairs[0];
    assert_eq!(scalar_of(&records, key_id), Some(Scalar::Str("self".into())));
    assert_eq!(value_id, m_id);

    let dict_records = records.values().filter(|v| v.type_name == "dict").count();
    assert_eq!(dict_records, 1);

    m.clear();
}

#[test]
fn test_indirect_cycle() {
    let a = Value::list(vec![]);
    let b = Value::list(vec![a.clone()]);
    a.push(b.clone()).unwrap();
    let snapshot = vec![FrameEntry::new("f").bind("a", a.clone())];

    let records = serialize(&snapshot).expect("Serialization failed");
    assert_eq!(records.values().count(), 2);
    match &records.value(2).unwrap().payload {
        Payload::Sequence(ids) => assert_eq!(ids, &vec![1]),
        other => panic!("Expected sequence payload, got {:?}", other),
    }
    assert!(records.dangling_ids().is_empty());

    a.clear();
}

#[test]
fn test_mapping_keys_are_serialized_as_values() {
    let key = Value::tuple(vec![Value::int(1), Value::int(2)]);
    let m = Value::dict(vec![
        (key.clone(), Value::str("a")),
        (Value::str("k"), key.clone()),
    ]);
    let snapshot = vec![FrameEntry::new("f").bind("m", m)];

    let records = serialize(&snapshot).expect("Serialization failed");
    // m = 1, key = 2, its items 3 and 4, "a" = 5, "k" = 6
    match &records.value(1).unwrap().payload {
        Payload::Mapping(pairs) => assert_eq!(pairs, &vec![(2, 5), (6, 2)]),
        other => panic!("Expected mapping payload, got {:?}", other),
    }
    let tuple_records = records.values().filter(|v| v.type_name == "tuple").count();
    assert_eq!(tuple_records, 1);
}

#[test]
fn test_equal_container_keys_get_distinct_ids() {
    let m = Value::dict(vec![
        (Value::tuple(vec![]), Value::int(1)),
        (Value::tuple(vec![]), Value::int(2)),
    ]);
    let snapshot = vec![FrameEntry::new("f").bind("m", m)];

    let records = serialize(&snapshot).expect("Serialization failed");
    let pairs = match &records.value(1).unwrap().payload {
        Payload::Mapping(pairs) => pairs.clone(),
        other => panic!("Expected mapping payload, got {:?}", other),
    };
    assert_eq!(pairs.len(), 2);
    assert_ne!(pairs[0].0, pairs[1].0);

    let tuple_ids: Vec<u32> = records
        .values()
        .filter(|v| v.type_name == "tuple")
        .map(|v| v.id)
        .collect();
    assert_eq!(tuple_ids.len(), 2);
    assert!(tuple_ids.contains(&pairs[0].0));
    assert!(tuple_ids.contains(&pairs[1].0));
}

#[test]
fn test_rebinding_a_frame_variable_replaces_it() {
    let first = Value::int(1);
    let snapshot = vec![FrameEntry::new("f")
        .bind("x", first)
        .bind("y", Value::int(3))
        .bind("x", Value::int(2))];
    assert_eq!(snapshot[0].len(), 2);

    let records = serialize(&snapshot).expect("Serialization failed");
    let f = records.frame("f").unwrap();
    assert_eq!(f.variables, vec![("x".to_string(), 1), ("y".to_string(), 2)]);
    assert_eq!(scalar_of(&records, 1), Some(Scalar::Int(2)));
    assert_eq!(records.values().count(), 2);
    assert!(records.dangling_ids().is_empty());
}

#[test]
fn test_binding_order_is_preserved() {
    let snapshot = vec![FrameEntry::new("f")
        .bind("z", Value::int(1))
        .bind("a", Value::int(2))
        .bind("m", Value::int(3))];

    let records = serialize(&snapshot).expect("Serialization failed");
    let names: Vec<&str> = records
        .frame("f")
        .unwrap()
        .variables
        .iter()
        .map(|(n, _)| n.as_str())
        .collect();
    assert_eq!(names, vec!["z", "a", "m"]);
}

#[test]
fn test_set_payload_follows_insertion_order() {
    let s = Value::set(vec![Value::str("b"), Value::str("a")]);
    s.add(Value::str("c")).unwrap();
    let snapshot = vec![FrameEntry::new("f").bind("s", s)];

    let records = serialize(&snapshot).expect("Serialization failed");
    match &records.value(1).unwrap().payload {
        Payload::Set(ids) => {
            let items: Vec<Option<Scalar>> =
                ids.iter().map(|&id| scalar_of(&records, id)).collect();
            assert_eq!(
                items,
                vec![
                    Some(Scalar::Str("b".into())),
                    Some(Scalar::Str("a".into())),
                    Some(Scalar::Str("c".into())),
                ]
            );
        }
        other => panic!("Expected set payload, got {:?}", other),
    }
}

#[test]
fn test_non_data_values_are_not_refiltered() {
    let snapshot = vec![FrameEntry::new("f")
        .bind("helper", Value::function("helper"))
        .bind("conn", Value::opaque("Connection", "<Connection 0x1>"))];

    let records = serialize(&snapshot).expect("Serialization failed");
    assert_eq!(records.frame("f").unwrap().variables.len(), 2);
    let types: Vec<&str> = records.values().map(|v| v.type_name.as_str()).collect();
    assert_eq!(types, vec!["function", "Connection"]);
    assert!(records.values().all(|v| !v.is_container()));
}

#[test]
fn test_no_dangling_ids_in_mixed_graph() {
    let shared = Value::list(vec![Value::float(1.5), Value::none()]);
    let d = Value::dict(vec![
        (Value::str("shared"), shared.clone()),
        (Value::int(3), Value::frozenset(vec![Value::bool(true)])),
    ]);
    let snapshot = vec![
        FrameEntry::new("f").bind("d", d).bind("s", shared.clone()),
        FrameEntry::new("__main__").bind("t", Value::tuple(vec![shared])),
    ];

    let records = serialize(&snapshot).expect("Serialization failed");
    assert!(records.dangling_ids().is_empty());

    let mut ids: Vec<u32> = records.values().map(|v| v.id).collect();
    ids.sort_unstable();
    let expected: Vec<u32> = (1..=ids.len() as u32).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_empty_snapshot_and_empty_frames() {
    let records = serialize(&[]).expect("Serialization failed");
    assert!(records.is_empty());

    let records = serialize(&[FrameEntry::new("__main__")]).expect("Serialization failed");
    assert_eq!(records.len(), 1);
    assert!(records.frame("__main__").unwrap().variables.is_empty());
}

#[test]
fn test_runs_are_independent() {
    let xs = Value::list(vec![Value::int(1)]);
    let snapshot = vec![FrameEntry::new("f").bind("xs", xs)];

    let first = serialize(&snapshot).expect("Serialization failed");
    let second = serialize(&snapshot).expect("Serialization failed");
    assert_eq!(first.frame("f").unwrap().variable("xs"), Some(1));
    assert_eq!(second.frame("f").unwrap().variable("xs"), Some(1));
    assert_eq!(first.len(), second.len());
}

#[test]
fn test_deep_nesting_does_not_overflow() {
    let mut v = Value::int(0);
    for _ in 0..200_000 {
        v = Value::list(vec![v]);
    }
    let snapshot = vec![FrameEntry::new("f").bind("deep", v.clone())];

    let records = serialize(&snapshot).expect("Serialization failed");
    assert_eq!(records.values().count(), 200_001);

    // Unwind iteratively so dropping the chain does not recurse either
    let mut current = v;
    loop {
        let next = match &*current.data() {
            framegraph::memory::value::Data::Sequence(items) => items.first().cloned(),
            _ => None,
        };
        current.clear();
        match next {
            Some(n) => current = n,
            None => break,
        }
    }
}

#[test]
fn test_depth_limit() {
    let v = Value::list(vec![Value::list(vec![Value::int(1)])]);
    let snapshot = vec![FrameEntry::new("f").bind("v", v)];

    let shallow = Serializer::new(SerializerOptions::default().with_max_depth(1));
    let err = shallow.serialize(&snapshot).unwrap_err();
    assert_eq!(err, SerializeError::DepthLimitExceeded { limit: 1 });
    assert_eq!(
        err.to_string(),
        "container nesting exceeds the depth limit of 1"
    );

    let enough = Serializer::new(SerializerOptions::default().with_max_depth(2));
    let records = enough.serialize(&snapshot).expect("Serialization failed");
    assert_eq!(records.values().count(), 3);
}
