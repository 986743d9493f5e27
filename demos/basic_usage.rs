use portable_errors::{
    deserialize_error_json, serialize_error, DeserializeOptions, SerializeOptions, Thrown,
};
use std::error::Error as StdError;

fn main() {
    println!("--- Basic Usage Example ---\n");

    // 1. Build an error the way a handler would see it: a typed failure
    //    with a few custom properties and an underlying cause.
    let cause = Thrown::error("RangeError", "offset 4096 past end of segment");
    let error = Thrown::error("TypeError", "segment lookup failed");
    if let Some(node) = error.as_object() {
        node.insert("segment", Thrown::from("users-2024-11"));
        node.insert("attempt", Thrown::from(3));
        node.insert_hidden("cause", cause);
    }

    // 2. Serialize it into a JSON-safe payload.
    let payload = serialize_error(&error, SerializeOptions::default());
    println!("1. Serialized payload:");
    println!("{}\n", serde_json::to_string_pretty(&payload).unwrap());

    // 3. Rebuild a live error on the receiving side. The recorded subtype
    //    comes back, and the cause chain surfaces through source().
    let rebuilt = deserialize_error_json(payload, DeserializeOptions::default());
    println!("2. Rebuilt error:");
    println!("   display: {rebuilt}");
    println!("   name:    {}", rebuilt.name());
    if let Some(source) = rebuilt.source() {
        println!("   source:  {source}");
    }

    // 4. Values that are not errors are wrapped, never rejected.
    let wrapped = portable_errors::deserialize_error(
        &Thrown::from("something threw a bare string"),
        DeserializeOptions::default(),
    );
    println!("\n3. Wrapped non-error:");
    println!("   display:      {wrapped}");
    println!("   is_non_error: {}", wrapped.is_non_error());
}
