use portable_errors::{
    DeserializeOptions, ErrorRegistry, ErrorSerializer, ObjectNode, SerializeOptions, Thrown,
};

fn main() {
    println!("--- Custom Registry Example ---\n");

    // Extend the builtin table during setup. A plain name registration is
    // enough when the type carries no defaults; a full constructor can
    // pre-populate whatever the type guarantees.
    let mut registry = ErrorRegistry::builtin();
    registry.register_name("ReplicationLagError");
    registry.register(
        "TimeoutError",
        Box::new(|| {
            let node = ObjectNode::error("TimeoutError");
            node.define("code", Thrown::from("ETIMEDOUT"), true);
            node
        }),
    );

    let serializer = ErrorSerializer::with_registry(registry);

    // Payloads recorded elsewhere come back as the registered types.
    for payload in [
        serde_json::json!({"name": "ReplicationLagError", "message": "replica 12s behind"}),
        serde_json::json!({"name": "TimeoutError", "message": "gave up after 30s"}),
        serde_json::json!({"name": "NeverHeardOfItError", "message": "unknown type"}),
    ] {
        let error = serializer.deserialize_json(payload, DeserializeOptions::default());
        println!(
            "{:<22} -> name={:<22} code={:?}",
            error.message(),
            error.name(),
            error.code().map(|c| c.to_display_string()),
        );
    }

    // The registry travels with the serializer, so the round trip is
    // symmetric without any global state.
    let error = Thrown::error("ReplicationLagError", "replica 40s behind");
    let payload = serializer.serialize(&error, SerializeOptions::default());
    let rebuilt = serializer.deserialize_json(payload, DeserializeOptions::default());
    println!("\nround trip: {rebuilt}");
}
