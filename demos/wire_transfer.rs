use portable_errors::{
    deserialize_error_json, serialize_error, DeserializeOptions, SerializeOptions, Thrown,
};
use std::error::Error as StdError;
use std::fmt;

// A native Rust error chain, the kind a service would actually produce.
#[derive(Debug)]
struct ConfigError {
    source: std::io::Error,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failed to load service configuration")
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

fn main() {
    println!("--- Wire Transfer Example ---\n");

    let native = ConfigError {
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml not found"),
    };

    // Bridge the native error into the thrown-value model, then serialize.
    // The source() chain becomes a nested cause chain in the payload.
    let value = Thrown::from_std_error(&native);
    let payload = serialize_error(&value, SerializeOptions::default());

    // This is what crosses the process boundary.
    let wire = serde_json::to_string(&payload).unwrap();
    println!("on the wire: {wire}\n");

    // The receiving side rebuilds a live error with the chain intact.
    let received: serde_json::Value = serde_json::from_str(&wire).unwrap();
    let rebuilt = deserialize_error_json(received, DeserializeOptions::default());

    println!("rebuilt: {rebuilt}");
    let mut source = rebuilt.source();
    while let Some(error) = source {
        println!("  caused by: {error}");
        source = error.source();
    }
}
