//! # Portable Errors
//!
//! Faithful conversion of error values to JSON-safe data and back.
//!
//! ## Design Philosophy
//!
//! 1. **Fidelity over purity**: custom properties, nested causes, and the
//!    error's type identity all survive the round trip
//! 2. **Hostile inputs are normal inputs**: thrown strings, functions,
//!    plain objects, cyclic graphs, and hidden properties are handled, not
//!    rejected
//! 3. **The entry points never fail**: everything that can go wrong is
//!    absorbed into placeholder output
//! 4. **One algorithm, two directions**: serialization and deserialization
//!    share the same recursive flattening walk
//! 5. **No shared mutable state**: cycle detection and hook reentrancy
//!    tracking are per-call, so concurrent use needs no coordination
//!
//! ## What survives, and how
//!
//! - Cycles are truncated with the literal string `"[Circular]"`
//! - Byte buffers become `"[object Buffer]"`, stream-like values become
//!   `"[object Stream]"`
//! - Functions are dropped from objects and a thrown function serializes
//!   to `"[Function: name]"`
//! - `name`, `message`, `stack`, `code`, and `cause` are always installed
//!   last, so they win over arbitrary same-named properties
//! - A serialized `cause` chain is rebuilt as live errors of the recorded
//!   subtypes, visible through `std::error::Error::source`
//!
//! ## Quick Start
//!
//! ```rust
//! use portable_errors::{deserialize_error_json, serialize_error, SerializeOptions, Thrown};
//!
//! let error = Thrown::error("TypeError", "expected a string");
//! if let Some(node) = error.as_object() {
//!     node.insert("locale", Thrown::from("en-US"));
//! }
//!
//! let payload = serialize_error(&error, SerializeOptions::default());
//! assert_eq!(payload["name"], "TypeError");
//! assert_eq!(payload["message"], "expected a string");
//! assert_eq!(payload["locale"], "en-US");
//!
//! // ...ship the payload anywhere JSON goes, then rebuild it:
//! let rebuilt = deserialize_error_json(payload, Default::default());
//! assert_eq!(rebuilt.name(), "TypeError");
//! assert_eq!(rebuilt.to_string(), "TypeError: expected a string");
//! ```
//!
//! ## Custom error types
//!
//! ```rust
//! use portable_errors::{DeserializeOptions, ErrorRegistry, ErrorSerializer, Thrown};
//!
//! let mut registry = ErrorRegistry::builtin();
//! registry.register_name("QuotaExceededError");
//!
//! let serializer = ErrorSerializer::with_registry(registry);
//! let payload = Thrown::from_json(serde_json::json!({
//!     "name": "QuotaExceededError",
//!     "message": "limit reached",
//! }));
//! let error = serializer.deserialize(&payload, DeserializeOptions::default());
//! assert_eq!(error.name(), "QuotaExceededError");
//! ```
//!
//! ## Depth limits
//!
//! ```rust
//! use portable_errors::{serialize_error, SerializeOptions, Thrown};
//!
//! let error = Thrown::error("Error", "deep");
//! if let Some(node) = error.as_object() {
//!     let two = Thrown::object();
//!     two.as_object().unwrap().insert("three", Thrown::object());
//!     let one = Thrown::object();
//!     one.as_object().unwrap().insert("two", two);
//!     node.insert("one", one);
//! }
//!
//! let shallow = serialize_error(&error, SerializeOptions::default().with_max_depth(1));
//! assert_eq!(shallow["one"], serde_json::json!({}));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde_json::Value;

pub mod classify;
pub mod error;
pub mod flatten;
pub mod registry;
pub mod value;

pub use classify::{classify, is_error_like, is_minimum_viable_serialized_error, Shape};
pub use error::{PortableError, NON_ERROR_NAME};
pub use flatten::Reserialize;
pub use registry::{builtin_registry, ErrorCtor, ErrorRegistry, BUILTIN_ERROR_NAMES};
pub use value::{
    ArrayNode, FunctionStub, NodeKind, ObjectId, ObjectNode, Property, PropertyLocked,
    StringifyError, Thrown, ToJsonHook, BUFFER_MARKER, CIRCULAR_MARKER, STREAM_MARKER,
};

use crate::flatten::{flatten, FlattenCtx};

// ============================================================================
// Options
// ============================================================================

/// Per-call configuration for [`serialize_error`].
#[derive(Debug, Clone, Copy)]
pub struct SerializeOptions {
    /// Maximum depth of properties to preserve. Unbounded by default.
    pub max_depth: usize,
    /// Whether to honor a custom serialization hook when the value carries
    /// one. Enabled by default.
    pub use_to_json: bool,
}

impl SerializeOptions {
    /// Limit the depth of preserved properties.
    #[inline]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable custom serialization hooks.
    #[inline]
    pub fn with_to_json(mut self, use_to_json: bool) -> Self {
        self.use_to_json = use_to_json;
        self
    }
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            max_depth: usize::MAX,
            use_to_json: true,
        }
    }
}

/// Per-call configuration for [`deserialize_error`].
#[derive(Debug, Clone, Copy)]
pub struct DeserializeOptions {
    /// Maximum depth of properties to preserve. Unbounded by default.
    pub max_depth: usize,
}

impl DeserializeOptions {
    /// Limit the depth of preserved properties.
    #[inline]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for DeserializeOptions {
    fn default() -> Self {
        Self {
            max_depth: usize::MAX,
        }
    }
}

// ============================================================================
// Serializer
// ============================================================================

/// Serializer/deserializer owning its constructor registry.
///
/// The convenience functions at the crate root cover the common case with
/// the builtin registry; construct one of these to resolve custom error
/// types without touching shared state.
#[derive(Debug, Default)]
pub struct ErrorSerializer {
    registry: ErrorRegistry,
}

impl ErrorSerializer {
    /// Serializer over the builtin registry.
    pub fn new() -> Self {
        Self {
            registry: ErrorRegistry::builtin(),
        }
    }

    /// Serializer over a caller-supplied registry.
    pub fn with_registry(registry: ErrorRegistry) -> Self {
        Self { registry }
    }

    /// The registry this serializer resolves error types against.
    pub fn registry(&self) -> &ErrorRegistry {
        &self.registry
    }

    /// Convert a thrown value into JSON-safe data.
    ///
    /// Primitives pass through unchanged; a thrown function becomes its
    /// `[Function: name]` label; objects, arrays, and errors run through
    /// the flattening walk with every canonical field forced enumerable so
    /// the result displays fully. Never fails.
    pub fn serialize(&self, value: &Thrown, options: SerializeOptions) -> Value {
        serialize_with(&self.registry, value, options)
    }

    /// Rebuild a live error from a thrown value.
    ///
    /// A value that is already a live error passes through by identity. A
    /// plausible serialized error is rebuilt as an instance of its recorded
    /// type (falling back to the base type for unknown names). Anything
    /// else is wrapped in a [`NON_ERROR_NAME`]-tagged error whose message
    /// reflects the value. Never fails.
    pub fn deserialize(&self, value: &Thrown, options: DeserializeOptions) -> PortableError {
        deserialize_with(&self.registry, value, options)
    }

    /// Rebuild a live error straight from a JSON payload.
    pub fn deserialize_json(&self, value: Value, options: DeserializeOptions) -> PortableError {
        self.deserialize(&Thrown::from_json(value), options)
    }
}

// ============================================================================
// Convenience entry points
// ============================================================================

/// Convert a thrown value into JSON-safe data using the builtin registry.
///
/// See [`ErrorSerializer::serialize`].
pub fn serialize_error(value: &Thrown, options: SerializeOptions) -> Value {
    serialize_with(builtin_registry(), value, options)
}

/// Rebuild a live error from a thrown value using the builtin registry.
///
/// See [`ErrorSerializer::deserialize`].
pub fn deserialize_error(value: &Thrown, options: DeserializeOptions) -> PortableError {
    deserialize_with(builtin_registry(), value, options)
}

/// Rebuild a live error straight from a JSON payload using the builtin
/// registry.
pub fn deserialize_error_json(value: Value, options: DeserializeOptions) -> PortableError {
    deserialize_error(&Thrown::from_json(value), options)
}

fn serialize_with(registry: &ErrorRegistry, value: &Thrown, options: SerializeOptions) -> Value {
    match value {
        // A thrown function is kept as a label rather than dropped.
        Thrown::Function(stub) => Value::String(stub.label()),
        Thrown::Buffer(_) => Value::String(BUFFER_MARKER.to_owned()),
        Thrown::Null | Thrown::Bool(_) | Thrown::Number(_) | Thrown::String(_) => {
            value.to_json_value()
        }
        Thrown::Array(_) | Thrown::Object(_) => {
            let ctx = FlattenCtx::serializing(registry, options.max_depth, options.use_to_json);
            flatten(&ctx, value, &[], None, 0).to_json_value()
        }
    }
}

fn deserialize_with(
    registry: &ErrorRegistry,
    value: &Thrown,
    options: DeserializeOptions,
) -> PortableError {
    if let Some(node) = value.as_object() {
        if node.is_error() {
            return PortableError::from_node(node.clone());
        }
    }

    if is_minimum_viable_serialized_error(value) {
        let name = value.string_property("name");
        let target = registry.construct(name.as_deref());
        let ctx = FlattenCtx::rebuilding(registry, options.max_depth);
        flatten(&ctx, value, &[], Some(Thrown::Object(target.clone())), 0);
        return PortableError::from_node(target);
    }

    PortableError::non_error(value)
}

// ============================================================================
// Tests
// ============================================================================
