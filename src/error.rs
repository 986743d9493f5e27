//! The live error type produced by deserialization.
//!
//! Deserialization intentionally returns an error *instance*, not plain
//! data: something that implements `std::error::Error`, displays like an
//! error, and exposes its rebuilt cause chain through `source()`.
//! [`PortableError`] wraps the reconstructed node and provides that
//! surface.
//!
//! Values that do not look like serializable errors at all (thrown strings,
//! unrelated objects) are wrapped rather than rejected: the wrapper is an
//! ordinary `PortableError` whose name is [`NON_ERROR_NAME`], so callers
//! distinguish "real error" from "wrapped non-error" by inspecting the
//! type tag.

use crate::value::{ObjectId, ObjectNode, Thrown};
use smallvec::SmallVec;
use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;

/// Type tag carried by wrapped non-error values.
pub const NON_ERROR_NAME: &str = "NonError";

/// A live error instance rebuilt from serialized data.
///
/// Wraps the underlying error node; cloning the wrapper shares the node.
/// The cause chain is materialized at construction so `source()` can hand
/// out borrowed references.
#[must_use = "errors should be handled or logged"]
#[derive(Clone)]
pub struct PortableError {
    node: Rc<ObjectNode>,
    cause: Option<Box<PortableError>>,
}

impl PortableError {
    /// Wrap a live error node, materializing its cause chain.
    ///
    /// A cyclic cause chain (only possible on caller-constructed nodes;
    /// rebuilt chains are acyclic) is cut at the revisit.
    pub(crate) fn from_node(node: Rc<ObjectNode>) -> Self {
        let mut chain: SmallVec<[ObjectId; 8]> = SmallVec::new();
        Self::from_node_guarded(node, &mut chain)
    }

    fn from_node_guarded(node: Rc<ObjectNode>, chain: &mut SmallVec<[ObjectId; 8]>) -> Self {
        chain.push(node.id());

        let cause = match node.get("cause") {
            Some(Thrown::Object(cause_node)) if cause_node.is_error() => {
                if chain.contains(&cause_node.id()) {
                    None
                } else {
                    Some(Box::new(Self::from_node_guarded(cause_node, chain)))
                }
            }
            _ => None,
        };

        chain.pop();
        Self { node, cause }
    }

    /// Wrap a value that does not look like a serializable error.
    ///
    /// The message is the strict JSON encoding of the value, falling back
    /// to a best-effort display conversion when the value cannot be
    /// encoded (cyclic input).
    pub(crate) fn non_error(value: &Thrown) -> Self {
        let message = value
            .to_json_string()
            .unwrap_or_else(|_| value.to_display_string());
        let node = ObjectNode::error(NON_ERROR_NAME);
        node.define("message", Thrown::String(message), false);
        Self { node, cause: None }
    }

    /// The error's type name; `Error` when the rebuilt value carried none.
    pub fn name(&self) -> String {
        self.node
            .get_str("name")
            .unwrap_or_else(|| "Error".to_owned())
    }

    /// The error message; empty when the rebuilt value carried none.
    pub fn message(&self) -> String {
        self.node.get_str("message").unwrap_or_default()
    }

    /// The recorded stack trace, if one survived the round trip.
    pub fn stack(&self) -> Option<String> {
        self.node.get_str("stack")
    }

    /// The recorded error code, if any. Codes are not always strings, so
    /// the raw value is returned.
    pub fn code(&self) -> Option<Thrown> {
        self.node.get("code")
    }

    /// The rebuilt cause, if the serialized data carried one.
    pub fn cause(&self) -> Option<&PortableError> {
        self.cause.as_deref()
    }

    /// An arbitrary property of the rebuilt error.
    pub fn property(&self, key: &str) -> Option<Thrown> {
        self.node.get(key)
    }

    /// Snapshot of the enumerable custom properties in insertion order.
    pub fn properties(&self) -> Vec<(String, Thrown)> {
        self.node.entries()
    }

    /// Whether this error wraps a value that was not a serializable error.
    pub fn is_non_error(&self) -> bool {
        self.node.get_str("name").as_deref() == Some(NON_ERROR_NAME)
    }

    /// The underlying live error node as a thrown value, for re-serializing
    /// or further inspection.
    pub fn thrown(&self) -> Thrown {
        Thrown::Object(self.node.clone())
    }
}

impl fmt::Display for PortableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        let message = self.message();
        if message.is_empty() {
            f.write_str(&name)
        } else {
            write!(f, "{name}: {message}")
        }
    }
}

impl fmt::Debug for PortableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortableError")
            .field("name", &self.name())
            .field("message", &self.message())
            .field("code", &self.code())
            .field("cause", &self.cause.as_ref().map(|c| c.name()))
            .finish()
    }
}

impl StdError for PortableError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}
