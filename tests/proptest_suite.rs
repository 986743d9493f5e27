//! Property-based tests for portable_errors
//!
//! These tests use proptest to generate random inputs and verify invariants hold.

use portable_errors::{
    deserialize_error_json, serialize_error, DeserializeOptions, ErrorSerializer, ObjectNode,
    SerializeOptions, Thrown, CIRCULAR_MARKER,
};
use proptest::prelude::*;
use serde_json::Value;

// ============================================================================
// GENERATORS
// ============================================================================

/// Arbitrary acyclic thrown values. Object keys deliberately avoid the
/// canonical property names so depth accounting stays uniform.
fn arb_thrown() -> impl Strategy<Value = Thrown> {
    let leaf = prop_oneof![
        Just(Thrown::Null),
        any::<bool>().prop_map(Thrown::from),
        any::<i64>().prop_map(Thrown::from),
        "[a-z0-9 ]{0,12}".prop_map(Thrown::from),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(|bytes| Thrown::buffer(bytes)),
        "[a-z]{0,8}".prop_map(|name| Thrown::function(name)),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Thrown::array),
            prop::collection::vec(("k[a-z]{0,6}", inner), 0..6).prop_map(|props| {
                let node = ObjectNode::plain();
                for (key, value) in props {
                    node.insert(key, value);
                }
                Thrown::Object(node)
            }),
        ]
    })
}

/// Arbitrary JSON payloads for the deserialization entry point.
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "\\PC{0,16}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn value_depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.iter().map(value_depth).max().unwrap_or(0),
        Value::Object(map) => 1 + map.values().map(value_depth).max().unwrap_or(0),
        _ => 0,
    }
}

// ============================================================================
// SERIALIZATION TOTALITY
// ============================================================================

proptest! {
    /// Serialization never panics and always yields encodable JSON
    #[test]
    fn serialization_is_total(value in arb_thrown()) {
        let payload = serialize_error(&value, SerializeOptions::default());
        prop_assert!(serde_json::to_string(&payload).is_ok());
    }

    /// Serialization is deterministic for a fixed input
    #[test]
    fn serialization_is_deterministic(value in arb_thrown()) {
        let first = serialize_error(&value, SerializeOptions::default());
        let second = serialize_error(&value, SerializeOptions::default());
        prop_assert_eq!(first, second);
    }

    /// Unicode in messages survives exactly
    #[test]
    fn unicode_messages_are_preserved(message in "\\PC{0,64}") {
        let error = Thrown::error("Error", &message);
        let payload = serialize_error(&error, SerializeOptions::default());
        prop_assert_eq!(payload["message"].as_str(), Some(message.as_str()));
    }
}

// ============================================================================
// DEPTH BOUNDS
// ============================================================================

proptest! {
    /// Output nesting never exceeds the depth limit
    #[test]
    fn depth_limit_bounds_output_nesting(
        value in arb_thrown(),
        max_depth in 0usize..5,
    ) {
        let payload = serialize_error(
            &value,
            SerializeOptions::default().with_max_depth(max_depth),
        );
        // The root container itself sits at depth zero, so a limit of N
        // allows at most N+1 nested container levels in the output.
        prop_assert!(value_depth(&payload) <= max_depth + 1);
    }

    /// Tightening the limit never grows the output
    #[test]
    fn tighter_limits_never_add_data(value in arb_thrown(), max_depth in 0usize..4) {
        let tight = serialize_error(
            &value,
            SerializeOptions::default().with_max_depth(max_depth),
        );
        let loose = serialize_error(
            &value,
            SerializeOptions::default().with_max_depth(max_depth + 1),
        );
        let tight_len = serde_json::to_string(&tight).unwrap().len();
        let loose_len = serde_json::to_string(&loose).unwrap().len();
        prop_assert!(tight_len <= loose_len);
    }
}

// ============================================================================
// CYCLES
// ============================================================================

proptest! {
    /// Injected self-references always terminate and leave a marker
    #[test]
    fn injected_cycles_terminate(key in "c[a-z]{0,6}") {
        let node = ObjectNode::plain();
        node.insert("payload", Thrown::from(1));
        node.insert(key, Thrown::Object(node.clone()));

        let payload = serialize_error(&Thrown::Object(node), SerializeOptions::default());
        let encoded = serde_json::to_string(&payload).unwrap();
        prop_assert!(encoded.contains(CIRCULAR_MARKER));
    }

    /// Mutual cycles of arbitrary chain length terminate
    #[test]
    fn mutual_cycles_terminate(chain_len in 1usize..8) {
        let nodes: Vec<_> = (0..chain_len).map(|_| ObjectNode::plain()).collect();
        for (i, node) in nodes.iter().enumerate() {
            let next = &nodes[(i + 1) % chain_len];
            node.insert("next", Thrown::Object(next.clone()));
        }

        let payload = serialize_error(
            &Thrown::Object(nodes[0].clone()),
            SerializeOptions::default(),
        );
        let encoded = serde_json::to_string(&payload).unwrap();
        prop_assert!(encoded.contains(CIRCULAR_MARKER));
    }
}

// ============================================================================
// DESERIALIZATION TOTALITY
// ============================================================================

proptest! {
    /// Deserialization never panics on arbitrary JSON and always yields a
    /// displayable error
    #[test]
    fn deserialization_is_total(payload in arb_json()) {
        let error = deserialize_error_json(payload, DeserializeOptions::default());
        prop_assert!(!error.name().is_empty());
        let _ = error.to_string();
    }

    /// Round trips preserve name and message for well-formed errors
    #[test]
    fn round_trip_preserves_identity(
        name in prop::sample::select(vec![
            "Error", "TypeError", "RangeError", "SyntaxError", "URIError",
        ]),
        message in "\\PC{0,32}",
    ) {
        let error = Thrown::error(name, &message);
        let payload = serialize_error(&error, SerializeOptions::default());
        let rebuilt = deserialize_error_json(payload, DeserializeOptions::default());

        prop_assert_eq!(rebuilt.name(), name);
        prop_assert_eq!(rebuilt.message(), message);
    }

    /// Custom properties survive the round trip
    #[test]
    fn round_trip_preserves_custom_properties(
        key in "x[a-z]{1,6}",
        value in -1000i64..1000,
    ) {
        let error = Thrown::error("Error", "carrier");
        error.as_object().unwrap().insert(&key, Thrown::from(value));

        let payload = serialize_error(&error, SerializeOptions::default());
        let rebuilt = deserialize_error_json(payload, DeserializeOptions::default());

        let carried = rebuilt.property(&key).expect("property should survive");
        prop_assert_eq!(carried.to_json_value(), serde_json::json!(value));
    }
}

// ============================================================================
// CONCURRENT PROPERTIES
// ============================================================================

proptest! {
    /// A shared serializer handles concurrent calls without coordination
    #[test]
    fn concurrent_serialization(
        thread_count in 1usize..6,
        errors_per_thread in 1usize..20,
    ) {
        let serializer = ErrorSerializer::new();

        std::thread::scope(|scope| {
            for t in 0..thread_count {
                let serializer = &serializer;
                scope.spawn(move || {
                    for i in 0..errors_per_thread {
                        let error = Thrown::error("Error", &format!("thread {t} error {i}"));
                        let payload =
                            serializer.serialize(&error, SerializeOptions::default());
                        assert_eq!(payload["message"], format!("thread {t} error {i}"));
                    }
                });
            }
        });
    }
}
