#![no_main]

use libfuzzer_sys::fuzz_target;
use portable_errors::{serialize_error, SerializeOptions, Thrown};

// Serialization must be total: any JSON value lifted into the thrown-value
// model serializes without panicking, and the result encodes cleanly.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(json) = serde_json::from_str::<serde_json::Value>(text) else {
        return;
    };

    let value = Thrown::from_json(json);
    let payload = serialize_error(&value, SerializeOptions::default());
    let _ = serde_json::to_string(&payload);

    // Depth-limited pass over the same input.
    let _ = serialize_error(&value, SerializeOptions::default().with_max_depth(3));
});
