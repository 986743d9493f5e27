//! Dynamic thrown-value model.
//!
//! Serialization consumes values that were *thrown*, and thrown values are
//! not well behaved: they alias each other, they form cycles, they carry
//! hidden properties and custom serialization hooks, and sometimes they are
//! not errors at all. `Thrown` models exactly that surface so the flattener
//! has something concrete to walk.
//!
//! # Sharing and identity
//!
//! Containers (`ObjectNode`, `ArrayNode`) are held behind `Rc` with interior
//! mutability; cloning a `Thrown` clones the handle, not the graph. Sharing
//! the same `Rc` from two places is how callers express aliasing, and
//! storing a handle inside its own node is how they express a cycle. Node
//! identity is pointer identity ([`ObjectId`]), which is what the flattener's
//! visited path is keyed on.
//!
//! # JSON boundary
//!
//! `Thrown` is a strict superset of the JSON data model. The conversions at
//! the bottom of this module police the boundary:
//!
//! - [`Thrown::from_json`] lifts any `serde_json::Value` losslessly;
//! - [`Thrown::to_json_value`] projects down, replacing what JSON cannot
//!   express (cycles, byte buffers, functions) with the conventional
//!   markers;
//! - [`Thrown::to_json_string`] is the strict variant that refuses cyclic
//!   graphs instead of marking them.

use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::cell::RefCell;
use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

use crate::flatten::Reserialize;

/// Marker installed where a reference cycle was truncated.
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// Marker substituted for binary byte buffers.
pub const BUFFER_MARKER: &str = "[object Buffer]";

/// Marker substituted for stream-like values.
pub const STREAM_MARKER: &str = "[object Stream]";

/// Custom serialization hook attached to an object node.
///
/// When enabled, the flattener invokes the hook instead of walking the node
/// structurally and uses its return value verbatim. The [`Reserialize`]
/// handle lets a hook hand a value back to the in-flight flattening pass;
/// the pass's reentrancy guard ensures a hook that re-serializes its own
/// node falls through to the structural walk instead of recursing forever.
pub type ToJsonHook = Rc<dyn Fn(&Reserialize<'_>) -> Thrown>;

// ============================================================================
// Identity
// ============================================================================

/// Pointer identity of a shared container node.
///
/// Two `Thrown` values have the same `ObjectId` iff they are handles to the
/// same allocation. Identities are only meaningful while the node is alive;
/// the flattener never holds one past the call that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    #[inline]
    fn of_object(node: &Rc<ObjectNode>) -> Self {
        Self(Rc::as_ptr(node) as usize)
    }

    #[inline]
    fn of_array(node: &Rc<ArrayNode>) -> Self {
        Self(Rc::as_ptr(node) as usize)
    }
}

// ============================================================================
// Leaf stubs
// ============================================================================

/// A function value, reduced to the only part serialization can keep: its
/// name. Bodies are never represented and never survive flattening.
#[derive(Debug, Clone)]
pub struct FunctionStub {
    name: Cow<'static, str>,
}

impl FunctionStub {
    /// A named function.
    #[inline]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into() }
    }

    /// An unnamed function.
    #[inline]
    pub fn anonymous() -> Self {
        Self {
            name: Cow::Borrowed(""),
        }
    }

    /// The function's name; empty for anonymous functions.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display label of the form `[Function: name]`.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            "[Function: anonymous]".to_owned()
        } else {
            format!("[Function: {}]", self.name)
        }
    }
}

// ============================================================================
// Container nodes
// ============================================================================

/// Distinguishes plain mappings from live error instances.
///
/// An `Error`-kind node is what deserialization produces and what the
/// identity pass-through in [`crate::deserialize_error`] recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// An ordinary string-keyed mapping.
    Plain,
    /// A live error instance.
    Error,
}

/// One own property of an [`ObjectNode`].
#[derive(Clone)]
pub struct Property {
    /// The property's value.
    pub value: Thrown,
    /// Whether the own-property walk sees this property. Hidden properties
    /// still answer presence checks and overlay lookups.
    pub enumerable: bool,
    /// A locked property rejects plain assignment. The flattener absorbs
    /// that rejection silently.
    pub locked: bool,
}

/// Error returned by [`ObjectNode::try_assign`] when the property is locked.
#[derive(Debug, Error)]
#[error("property `{key}` is locked")]
pub struct PropertyLocked {
    /// The property that rejected the assignment.
    pub key: String,
}

/// A shared, insertion-ordered, string-keyed mapping.
///
/// Property order is insertion order; the own-property walk and the JSON
/// projection both iterate in that order, which keeps output deterministic.
pub struct ObjectNode {
    kind: NodeKind,
    properties: RefCell<IndexMap<String, Property>>,
    to_json: RefCell<Option<ToJsonHook>>,
}

impl ObjectNode {
    /// Fresh plain mapping.
    pub fn plain() -> Rc<Self> {
        Rc::new(Self {
            kind: NodeKind::Plain,
            properties: RefCell::new(IndexMap::new()),
            to_json: RefCell::new(None),
        })
    }

    /// Fresh live error instance tagged with `name`.
    ///
    /// Seeds only a hidden `name` property; everything else comes from the
    /// value being rebuilt onto the node.
    pub fn error(name: impl Into<String>) -> Rc<Self> {
        let node = Rc::new(Self {
            kind: NodeKind::Error,
            properties: RefCell::new(IndexMap::new()),
            to_json: RefCell::new(None),
        });
        node.define("name", Thrown::String(name.into()), false);
        node
    }

    /// The node's kind tag.
    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Pointer identity of this node.
    #[inline]
    pub fn id(self: &Rc<Self>) -> ObjectId {
        ObjectId::of_object(self)
    }

    /// Whether this node is a live error instance.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.kind == NodeKind::Error
    }

    /// Presence check, regardless of enumerability.
    #[inline]
    pub fn has(&self, key: &str) -> bool {
        self.properties.borrow().contains_key(key)
    }

    /// Fetch a property value, regardless of enumerability.
    pub fn get(&self, key: &str) -> Option<Thrown> {
        self.properties.borrow().get(key).map(|p| p.value.clone())
    }

    /// Fetch a property value only if it is a string.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(Thrown::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Insert or overwrite an enumerable, unlocked property.
    pub fn insert(&self, key: impl Into<String>, value: Thrown) {
        self.properties.borrow_mut().insert(
            key.into(),
            Property {
                value,
                enumerable: true,
                locked: false,
            },
        );
    }

    /// Insert or overwrite a hidden (non-enumerable) property.
    pub fn insert_hidden(&self, key: impl Into<String>, value: Thrown) {
        self.properties.borrow_mut().insert(
            key.into(),
            Property {
                value,
                enumerable: false,
                locked: false,
            },
        );
    }

    /// Lock an existing property against plain assignment. Returns whether
    /// the property was present.
    pub fn lock(&self, key: &str) -> bool {
        match self.properties.borrow_mut().get_mut(key) {
            Some(property) => {
                property.locked = true;
                true
            }
            None => false,
        }
    }

    /// Plain assignment: update an existing property's value (keeping its
    /// enumerability) or insert a fresh enumerable one.
    ///
    /// # Errors
    ///
    /// Fails if the existing property is locked. Callers copying properties
    /// wholesale are expected to ignore the failure.
    pub fn try_assign(&self, key: &str, value: Thrown) -> Result<(), PropertyLocked> {
        let mut properties = self.properties.borrow_mut();
        match properties.get_mut(key) {
            Some(property) if property.locked => Err(PropertyLocked {
                key: key.to_owned(),
            }),
            Some(property) => {
                property.value = value;
                Ok(())
            }
            None => {
                properties.insert(
                    key.to_owned(),
                    Property {
                        value,
                        enumerable: true,
                        locked: false,
                    },
                );
                Ok(())
            }
        }
    }

    /// Unconditional property definition with explicit enumerability.
    ///
    /// Overwrites locked properties and resets the lock; this is how the
    /// flattener's canonical-field overlay always wins over arbitrary
    /// same-named properties.
    pub fn define(&self, key: impl Into<String>, value: Thrown, enumerable: bool) {
        self.properties.borrow_mut().insert(
            key.into(),
            Property {
                value,
                enumerable,
                locked: false,
            },
        );
    }

    /// Snapshot of the enumerable properties in insertion order.
    ///
    /// A snapshot (not a borrow) so a custom serialization hook invoked
    /// mid-walk can mutate the node without poisoning the iteration.
    pub fn entries(&self) -> Vec<(String, Thrown)> {
        self.properties
            .borrow()
            .iter()
            .filter(|(_, p)| p.enumerable)
            .map(|(k, p)| (k.clone(), p.value.clone()))
            .collect()
    }

    /// Enumerability of a property, if present.
    pub fn is_enumerable(&self, key: &str) -> Option<bool> {
        self.properties.borrow().get(key).map(|p| p.enumerable)
    }

    /// Number of own properties, hidden ones included.
    pub fn len(&self) -> usize {
        self.properties.borrow().len()
    }

    /// Whether the node has no own properties at all.
    pub fn is_empty(&self) -> bool {
        self.properties.borrow().is_empty()
    }

    /// Attach a custom serialization hook.
    pub fn set_to_json(&self, hook: ToJsonHook) {
        *self.to_json.borrow_mut() = Some(hook);
    }

    /// The custom serialization hook, if any.
    pub fn to_json_hook(&self) -> Option<ToJsonHook> {
        self.to_json.borrow().clone()
    }
}

impl fmt::Debug for ObjectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectNode")
            .field("kind", &self.kind)
            .field("len", &self.len())
            .field("to_json", &self.to_json.borrow().is_some())
            .finish()
    }
}

/// A shared ordered sequence.
pub struct ArrayNode {
    elements: RefCell<Vec<Thrown>>,
}

impl ArrayNode {
    /// Fresh empty sequence.
    pub fn empty() -> Rc<Self> {
        Rc::new(Self {
            elements: RefCell::new(Vec::new()),
        })
    }

    /// Sequence seeded with `elements`.
    pub fn from_vec(elements: Vec<Thrown>) -> Rc<Self> {
        Rc::new(Self {
            elements: RefCell::new(elements),
        })
    }

    /// Append an element.
    pub fn push(&self, value: Thrown) {
        self.elements.borrow_mut().push(value);
    }

    /// Fetch an element by index.
    pub fn get(&self, index: usize) -> Option<Thrown> {
        self.elements.borrow().get(index).cloned()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.borrow().is_empty()
    }

    /// Snapshot of the elements, for iteration that outlives the borrow.
    pub fn snapshot(&self) -> Vec<Thrown> {
        self.elements.borrow().clone()
    }
}

impl fmt::Debug for ArrayNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayNode").field("len", &self.len()).finish()
    }
}

// ============================================================================
// Thrown
// ============================================================================

/// A dynamically-typed thrown value.
///
/// Cheap to clone: containers are shared handles. See the module docs for
/// the sharing and identity rules.
#[derive(Clone)]
pub enum Thrown {
    /// The null value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number; wraps `serde_json::Number` so integers and floats survive
    /// conversion untouched.
    Number(Number),
    /// A string.
    String(String),
    /// A function value, name only.
    Function(FunctionStub),
    /// A binary byte buffer.
    Buffer(Rc<[u8]>),
    /// A shared ordered sequence.
    Array(Rc<ArrayNode>),
    /// A shared mapping or live error instance.
    Object(Rc<ObjectNode>),
}

impl Thrown {
    /// Fresh empty plain object.
    pub fn object() -> Thrown {
        Thrown::Object(ObjectNode::plain())
    }

    /// Fresh array from `elements`.
    pub fn array(elements: Vec<Thrown>) -> Thrown {
        Thrown::Array(ArrayNode::from_vec(elements))
    }

    /// Fresh live error value with `name`, `message`, and a one-line stack
    /// header, all hidden, the way a freshly constructed error looks.
    pub fn error(name: &str, message: &str) -> Thrown {
        let node = ObjectNode::error(name);
        node.define("message", Thrown::from(message), false);
        node.define("stack", Thrown::String(format!("{name}: {message}")), false);
        Thrown::Object(node)
    }

    /// A named function value.
    pub fn function(name: impl Into<Cow<'static, str>>) -> Thrown {
        Thrown::Function(FunctionStub::new(name))
    }

    /// A byte buffer value.
    pub fn buffer(bytes: impl Into<Vec<u8>>) -> Thrown {
        Thrown::Buffer(Rc::from(bytes.into()))
    }

    /// Whether this is the null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Thrown::Null)
    }

    /// Object handle, if this is an object.
    #[inline]
    pub fn as_object(&self) -> Option<&Rc<ObjectNode>> {
        match self {
            Thrown::Object(node) => Some(node),
            _ => None,
        }
    }

    /// Array handle, if this is an array.
    #[inline]
    pub fn as_array(&self) -> Option<&Rc<ArrayNode>> {
        match self {
            Thrown::Array(node) => Some(node),
            _ => None,
        }
    }

    /// String slice, if this is a string.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Thrown::String(s) => Some(s),
            _ => None,
        }
    }

    /// Pointer identity, for containers.
    pub fn identity(&self) -> Option<ObjectId> {
        match self {
            Thrown::Object(node) => Some(ObjectId::of_object(node)),
            Thrown::Array(node) => Some(ObjectId::of_array(node)),
            _ => None,
        }
    }

    /// Property lookup on object values; `None` for everything else.
    pub fn property(&self, key: &str) -> Option<Thrown> {
        self.as_object().and_then(|node| node.get(key))
    }

    /// String-valued property lookup on object values.
    pub fn string_property(&self, key: &str) -> Option<String> {
        self.as_object().and_then(|node| node.get_str(key))
    }

    // ------------------------------------------------------------------
    // JSON boundary
    // ------------------------------------------------------------------

    /// Lift a JSON value into the thrown-value model. Lossless; objects
    /// keep their key order.
    pub fn from_json(value: Value) -> Thrown {
        match value {
            Value::Null => Thrown::Null,
            Value::Bool(b) => Thrown::Bool(b),
            Value::Number(n) => Thrown::Number(n),
            Value::String(s) => Thrown::String(s),
            Value::Array(items) => {
                Thrown::array(items.into_iter().map(Thrown::from_json).collect())
            }
            Value::Object(map) => {
                let node = ObjectNode::plain();
                for (key, item) in map {
                    node.insert(key, Thrown::from_json(item));
                }
                Thrown::Object(node)
            }
        }
    }

    /// Bridge from a native Rust error: name `Error`, message from
    /// `Display`, and the `source()` chain as nested `cause` values. The
    /// synthesized one-line stack header keeps the result error-like.
    pub fn from_std_error(error: &dyn StdError) -> Thrown {
        let message = error.to_string();
        let node = ObjectNode::error("Error");
        node.define("stack", Thrown::String(format!("Error: {message}")), false);
        node.define("message", Thrown::String(message), false);
        if let Some(source) = error.source() {
            node.define("cause", Thrown::from_std_error(source), false);
        }
        Thrown::Object(node)
    }

    /// Project down to a JSON value, replacing what JSON cannot express.
    ///
    /// Cycles become [`CIRCULAR_MARKER`], byte buffers become
    /// [`BUFFER_MARKER`], function-valued properties are dropped, and
    /// function array elements become `null` so positions hold.
    pub fn to_json_value(&self) -> Value {
        let mut path: SmallVec<[ObjectId; 8]> = SmallVec::new();
        self.jsonify(&mut path)
    }

    fn jsonify(&self, path: &mut SmallVec<[ObjectId; 8]>) -> Value {
        match self {
            Thrown::Null => Value::Null,
            Thrown::Bool(b) => Value::Bool(*b),
            Thrown::Number(n) => Value::Number(n.clone()),
            Thrown::String(s) => Value::String(s.clone()),
            Thrown::Function(_) => Value::Null,
            Thrown::Buffer(_) => Value::String(BUFFER_MARKER.to_owned()),
            Thrown::Array(node) => {
                let id = ObjectId::of_array(node);
                if path.contains(&id) {
                    return Value::String(CIRCULAR_MARKER.to_owned());
                }
                path.push(id);
                let items = node
                    .snapshot()
                    .iter()
                    .map(|element| element.jsonify(path))
                    .collect();
                path.pop();
                Value::Array(items)
            }
            Thrown::Object(node) => {
                let id = ObjectId::of_object(node);
                if path.contains(&id) {
                    return Value::String(CIRCULAR_MARKER.to_owned());
                }
                path.push(id);
                let mut map = Map::new();
                for (key, value) in node.entries() {
                    if matches!(value, Thrown::Function(_)) {
                        continue;
                    }
                    map.insert(key, value.jsonify(path));
                }
                path.pop();
                Value::Object(map)
            }
        }
    }

    /// Strict JSON encoding: refuses cyclic graphs instead of marking them.
    ///
    /// # Errors
    ///
    /// [`StringifyError::Cyclic`] when the graph contains a reference
    /// cycle; [`StringifyError::Encode`] if the encoder itself fails.
    pub fn to_json_string(&self) -> Result<String, StringifyError> {
        let mut path: SmallVec<[ObjectId; 8]> = SmallVec::new();
        let value = self.jsonify_strict(&mut path)?;
        Ok(serde_json::to_string(&value)?)
    }

    fn jsonify_strict(
        &self,
        path: &mut SmallVec<[ObjectId; 8]>,
    ) -> Result<Value, StringifyError> {
        match self {
            Thrown::Array(node) => {
                let id = ObjectId::of_array(node);
                if path.contains(&id) {
                    return Err(StringifyError::Cyclic);
                }
                path.push(id);
                let mut items = Vec::with_capacity(node.len());
                for element in node.snapshot() {
                    items.push(element.jsonify_strict(path)?);
                }
                path.pop();
                Ok(Value::Array(items))
            }
            Thrown::Object(node) => {
                let id = ObjectId::of_object(node);
                if path.contains(&id) {
                    return Err(StringifyError::Cyclic);
                }
                path.push(id);
                let mut map = Map::new();
                for (key, value) in node.entries() {
                    if matches!(value, Thrown::Function(_)) {
                        continue;
                    }
                    map.insert(key, value.jsonify_strict(path)?);
                }
                path.pop();
                Ok(Value::Object(map))
            }
            other => Ok(other.jsonify(path)),
        }
    }

    /// Best-effort display conversion, used as the fallback when strict
    /// stringification fails. Never fails; cycles render as empty.
    pub fn to_display_string(&self) -> String {
        let mut path: SmallVec<[ObjectId; 8]> = SmallVec::new();
        self.display_with(&mut path)
    }

    fn display_with(&self, path: &mut SmallVec<[ObjectId; 8]>) -> String {
        match self {
            Thrown::Null => "null".to_owned(),
            Thrown::Bool(b) => b.to_string(),
            Thrown::Number(n) => n.to_string(),
            Thrown::String(s) => s.clone(),
            Thrown::Function(stub) => stub.label(),
            Thrown::Buffer(_) => BUFFER_MARKER.to_owned(),
            Thrown::Array(node) => {
                let id = ObjectId::of_array(node);
                if path.contains(&id) {
                    return String::new();
                }
                path.push(id);
                let joined = node
                    .snapshot()
                    .iter()
                    .map(|element| element.display_with(path))
                    .collect::<Vec<_>>()
                    .join(",");
                path.pop();
                joined
            }
            Thrown::Object(node) => {
                if node.is_error() {
                    let name = node.get_str("name").unwrap_or_else(|| "Error".to_owned());
                    match node.get_str("message") {
                        Some(message) if !message.is_empty() => format!("{name}: {message}"),
                        _ => name,
                    }
                } else {
                    "[object Object]".to_owned()
                }
            }
        }
    }
}

impl fmt::Debug for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thrown::Null => f.write_str("Null"),
            Thrown::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Thrown::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Thrown::String(s) => f.debug_tuple("String").field(s).finish(),
            Thrown::Function(stub) => f.debug_tuple("Function").field(&stub.name()).finish(),
            Thrown::Buffer(bytes) => f.debug_tuple("Buffer").field(&bytes.len()).finish(),
            // Shallow on purpose: the graph may be cyclic.
            Thrown::Array(node) => f
                .debug_struct("Array")
                .field("len", &node.len())
                .field("id", &self.identity())
                .finish(),
            Thrown::Object(node) => f
                .debug_struct("Object")
                .field("kind", &node.kind())
                .field("len", &node.len())
                .field("id", &self.identity())
                .finish(),
        }
    }
}

impl Serialize for Thrown {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json_value().serialize(serializer)
    }
}

impl From<&str> for Thrown {
    fn from(value: &str) -> Self {
        Thrown::String(value.to_owned())
    }
}

impl From<String> for Thrown {
    fn from(value: String) -> Self {
        Thrown::String(value)
    }
}

impl From<bool> for Thrown {
    fn from(value: bool) -> Self {
        Thrown::Bool(value)
    }
}

impl From<i64> for Thrown {
    fn from(value: i64) -> Self {
        Thrown::Number(Number::from(value))
    }
}

impl From<f64> for Thrown {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Thrown::Null, Thrown::Number)
    }
}

impl From<Rc<ObjectNode>> for Thrown {
    fn from(node: Rc<ObjectNode>) -> Self {
        Thrown::Object(node)
    }
}

impl From<Rc<ArrayNode>> for Thrown {
    fn from(node: Rc<ArrayNode>) -> Self {
        Thrown::Array(node)
    }
}

/// Failure of the strict JSON encoding path.
///
/// The convenience entry points never surface this: they fall back to
/// [`Thrown::to_display_string`] when it occurs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StringifyError {
    /// The value graph contains a reference cycle.
    #[error("value contains a reference cycle")]
    Cyclic,
    /// The JSON encoder failed.
    #[error("JSON encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

// ============================================================================
// Tests
// ============================================================================
