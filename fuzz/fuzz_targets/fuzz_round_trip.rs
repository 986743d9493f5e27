#![no_main]

use libfuzzer_sys::fuzz_target;
use portable_errors::{
    deserialize_error_json, serialize_error, DeserializeOptions, SerializeOptions, Thrown,
};

// Round-trip stability: serializing whatever deserialization produced must
// also succeed, and a second round trip preserves name and message.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(json) = serde_json::from_str::<serde_json::Value>(text) else {
        return;
    };

    let error = deserialize_error_json(json, DeserializeOptions::default());
    let payload = serialize_error(&error.thrown(), SerializeOptions::default());
    let again = deserialize_error_json(payload, DeserializeOptions::default());

    assert_eq!(error.name(), again.name());
    assert_eq!(error.message(), again.message());
});
