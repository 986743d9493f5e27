//! Constructor registry: error type name to constructor.
//!
//! Deserialization rebuilds an error of the *recorded* type, not a generic
//! base error, so `{"name": "TypeError", ...}` comes back as a `TypeError`.
//! The table that makes that possible lives here.
//!
//! A registry is an explicitly constructed value owned by whoever
//! serializes — there is no mutable process-wide table. Embedders that need
//! custom error types build an extended registry during setup and hand it
//! to an [`ErrorSerializer`](crate::ErrorSerializer); the convenience entry
//! points use a shared read-only builtin table.
//!
//! Lookup is total: unknown or absent names fall back to the base `Error`
//! constructor, silently. There are no failure modes.

use crate::value::ObjectNode;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;

/// Constructor producing a fresh live error node, pre-tagged with its type
/// name, before the flattener assigns the recorded properties onto it.
pub type ErrorCtor = Box<dyn Fn() -> Rc<ObjectNode> + Send + Sync>;

/// Well-known error type names carried in serialized payloads.
///
/// These cover the native error hierarchy plus the platform types that
/// commonly show up in payloads produced elsewhere. Every entry here is
/// constructible, so no presence filtering is needed; names outside this
/// set are handled by the lookup fallback.
pub const BUILTIN_ERROR_NAMES: &[&str] = &[
    "Error",
    "EvalError",
    "RangeError",
    "ReferenceError",
    "SyntaxError",
    "TypeError",
    "URIError",
    "DOMException",
    "AssertionError",
    "SystemError",
];

/// Name of the base error type; also the fallback for unknown names.
pub const BASE_ERROR_NAME: &str = "Error";

/// Immutable-after-setup lookup from error type name to constructor.
pub struct ErrorRegistry {
    table: HashMap<String, ErrorCtor>,
    base: ErrorCtor,
}

impl ErrorRegistry {
    /// Registry with no entries beyond the base fallback.
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
            base: Self::named_ctor(BASE_ERROR_NAME),
        }
    }

    /// Registry pre-populated with [`BUILTIN_ERROR_NAMES`].
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for name in BUILTIN_ERROR_NAMES {
            registry.register_name(name);
        }
        registry
    }

    /// Register a constructor under `name`, replacing any previous entry.
    ///
    /// Meant for setup time, before the registry is handed to a serializer.
    pub fn register(&mut self, name: impl Into<String>, ctor: ErrorCtor) {
        self.table.insert(name.into(), ctor);
    }

    /// Register a plain constructor that only tags the node with `name`.
    /// Enough for custom types that carry no defaults of their own.
    pub fn register_name(&mut self, name: &str) {
        self.register(name, Self::named_ctor(name));
    }

    /// The constructor registered under `name`, or the base constructor for
    /// unknown or absent names. Always succeeds.
    pub fn lookup(&self, name: Option<&str>) -> &ErrorCtor {
        name.and_then(|name| self.table.get(name)).unwrap_or(&self.base)
    }

    /// Construct a fresh live error node for `name`.
    pub fn construct(&self, name: Option<&str>) -> Rc<ObjectNode> {
        (self.lookup(name))()
    }

    /// Whether `name` has a registered constructor.
    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    fn named_ctor(name: &str) -> ErrorCtor {
        let name = name.to_owned();
        Box::new(move || ObjectNode::error(name.clone()))
    }
}

impl Default for ErrorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for ErrorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("ErrorRegistry")
            .field("names", &names)
            .finish()
    }
}

/// The shared builtin registry used by the convenience entry points.
/// Initialized once, read-only thereafter.
pub fn builtin_registry() -> &'static ErrorRegistry {
    static REGISTRY: OnceLock<ErrorRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ErrorRegistry::builtin)
}
