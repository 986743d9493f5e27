#![no_main]

use libfuzzer_sys::fuzz_target;
use portable_errors::{deserialize_error_json, DeserializeOptions};

// Deserialization must be total: any JSON payload produces a displayable
// error, never a panic.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(json) = serde_json::from_str::<serde_json::Value>(text) else {
        return;
    };

    let error = deserialize_error_json(json, DeserializeOptions::default());
    let _ = error.name();
    let _ = error.to_string();
    let _ = format!("{error:?}");
});
