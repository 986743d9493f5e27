//! The graph flattener.
//!
//! One recursive walk serves both directions: serialization flattens a
//! thrown value into a plain graph, deserialization runs the same walk with
//! a registry-constructed live error as the target. The walk truncates
//! cycles against a per-path visited list, honors a depth limit, defers to
//! custom serialization hooks, and replaces values that cannot survive
//! flattening (buffers, streams, functions) with their conventional
//! markers.
//!
//! # Per-call state
//!
//! Everything the walk needs lives in a [`FlattenCtx`] created per
//! top-level call: direction, depth limit, enumerability policy, and the
//! hook reentrancy guard. Nothing is process-global, so concurrent calls
//! never interact.
//!
//! # Visited path
//!
//! Cycle detection is per *path*, not per graph: each recursive call
//! extends a copy of its parent's visited list, so sibling branches never
//! see each other's history. A node that legitimately appears in two
//! branches is flattened twice; only a node that appears in its own
//! ancestor chain becomes `"[Circular]"`.

use crate::classify::{classify, is_error_like, Shape};
use crate::registry::ErrorRegistry;
use crate::value::{
    ArrayNode, ObjectId, ObjectNode, Thrown, BUFFER_MARKER, CIRCULAR_MARKER, STREAM_MARKER,
};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::collections::HashSet;

/// Canonical error properties and their default enumerability, installed in
/// this order so they always win over arbitrary same-named own properties.
const COMMON_PROPERTIES: [(&str, bool); 5] = [
    ("name", false),
    ("message", false),
    ("stack", false),
    ("code", true),
    ("cause", false),
];

/// Visited path along one recursive descent. Short in practice; inline
/// storage keeps the per-branch copies off the heap.
type SeenPath = SmallVec<[ObjectId; 8]>;

/// Per-call flattening context.
pub(crate) struct FlattenCtx<'r> {
    registry: &'r ErrorRegistry,
    serialize: bool,
    force_enumerable: bool,
    max_depth: usize,
    use_to_json: bool,
    /// Reentrancy guard: identities of nodes whose custom serialization
    /// hook is currently on the stack of this call.
    hooks_running: RefCell<HashSet<ObjectId>>,
}

impl<'r> FlattenCtx<'r> {
    /// Context for the serialize direction: plain targets, every canonical
    /// field forced enumerable so the result displays fully.
    pub(crate) fn serializing(
        registry: &'r ErrorRegistry,
        max_depth: usize,
        use_to_json: bool,
    ) -> Self {
        Self {
            registry,
            serialize: true,
            force_enumerable: true,
            max_depth,
            use_to_json,
            hooks_running: RefCell::new(HashSet::new()),
        }
    }

    /// Context for the deserialize direction: registry-constructed error
    /// targets, default enumerability, hooks disabled.
    pub(crate) fn rebuilding(registry: &'r ErrorRegistry, max_depth: usize) -> Self {
        Self {
            registry,
            serialize: false,
            force_enumerable: false,
            max_depth,
            use_to_json: false,
            hooks_running: RefCell::new(HashSet::new()),
        }
    }
}

/// Re-entry handle passed to custom serialization hooks.
///
/// Values handed to [`serialize`](Self::serialize) run through the same
/// in-flight pass, guard included: a hook that re-serializes its own node
/// gets the structural walk instead of infinite recursion.
pub struct Reserialize<'a> {
    ctx: &'a FlattenCtx<'a>,
}

impl Reserialize<'_> {
    /// Flatten `value` within the current pass.
    pub fn serialize(&self, value: &Thrown) -> Thrown {
        flatten(self.ctx, value, &[], None, 0)
    }
}

/// Outcome of flattening one property value.
enum Flattened {
    /// The value does not survive flattening (functions).
    Skipped,
    /// The value to install.
    Value(Thrown),
}

/// Flatten `from` into `to` (or a freshly selected target).
///
/// `seen` is the visited path of the *parent* call; this call extends a
/// private copy with `from`'s own identity.
pub(crate) fn flatten(
    ctx: &FlattenCtx<'_>,
    from: &Thrown,
    seen: &[ObjectId],
    to: Option<Thrown>,
    depth: usize,
) -> Thrown {
    let to = to.unwrap_or_else(|| select_target(ctx, from));

    let mut path: SeenPath = SmallVec::from_slice(seen);
    if let Some(id) = from.identity() {
        path.push(id);
    }

    // Depth cutoff drops the structural walk but not the canonical-field
    // overlay, which installs at the current depth.
    if depth >= ctx.max_depth {
        overlay_common(ctx, from, &to, &path, depth);
        return to;
    }

    if ctx.use_to_json {
        if let (Some(node), Some(node_id)) = (from.as_object(), from.identity()) {
            if let Some(hook) = node.to_json_hook() {
                let running = ctx.hooks_running.borrow().contains(&node_id);
                if !running {
                    ctx.hooks_running.borrow_mut().insert(node_id);
                    let result = hook(&Reserialize { ctx });
                    ctx.hooks_running.borrow_mut().remove(&node_id);
                    return result;
                }
            }
        }
    }

    match (from, &to) {
        (Thrown::Array(source), Thrown::Array(target)) => {
            for element in source.snapshot() {
                match flatten_child(ctx, &element, &path, depth) {
                    // Hold the position so later elements keep theirs.
                    Flattened::Skipped => target.push(Thrown::Null),
                    Flattened::Value(value) => target.push(value),
                }
            }
        }
        (Thrown::Object(source), Thrown::Object(target)) => {
            for (key, value) in source.entries() {
                match flatten_child(ctx, &value, &path, depth) {
                    Flattened::Skipped => {}
                    Flattened::Value(value) => {
                        // A locked target property rejects the copy; the
                        // key is simply absent from the result.
                        let _ = target.try_assign(&key, value);
                    }
                }
            }
        }
        _ => {}
    }

    overlay_common(ctx, from, &to, &path, depth);
    to
}

fn select_target(ctx: &FlattenCtx<'_>, from: &Thrown) -> Thrown {
    match from {
        Thrown::Array(_) => Thrown::Array(ArrayNode::empty()),
        // Rebuilding an error-like value produces an instance of the
        // recorded subtype, not a generic base error.
        _ if !ctx.serialize && is_error_like(from) => {
            let name = from.string_property("name");
            Thrown::Object(ctx.registry.construct(name.as_deref()))
        }
        _ => Thrown::Object(ObjectNode::plain()),
    }
}

fn flatten_child(
    ctx: &FlattenCtx<'_>,
    value: &Thrown,
    path: &[ObjectId],
    depth: usize,
) -> Flattened {
    match classify(value) {
        Shape::Buffer => Flattened::Value(Thrown::from(BUFFER_MARKER)),
        Shape::Stream => Flattened::Value(Thrown::from(STREAM_MARKER)),
        Shape::Function => Flattened::Skipped,
        Shape::Primitive => Flattened::Value(value.clone()),
        Shape::Reference => match value.identity() {
            Some(id) if path.contains(&id) => Flattened::Value(Thrown::from(CIRCULAR_MARKER)),
            _ => Flattened::Value(flatten(ctx, value, path, None, depth + 1)),
        },
    }
}

/// Install the canonical error properties, overwriting whatever the
/// structural walk put there and fixing their enumerability.
fn overlay_common(
    ctx: &FlattenCtx<'_>,
    from: &Thrown,
    to: &Thrown,
    path: &[ObjectId],
    depth: usize,
) {
    let Some(source) = from.as_object() else { return };
    let Some(target) = to.as_object() else { return };

    for (property, default_enumerable) in COMMON_PROPERTIES {
        let Some(value) = source.get(property) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let installed = if is_error_like(&value) {
            match value.identity() {
                Some(id) if path.contains(&id) => Thrown::from(CIRCULAR_MARKER),
                // Same depth on purpose: canonical fields are siblings of
                // the node, not deeper nesting, so cause chains are not
                // charged against the depth limit.
                _ => flatten(ctx, &value, path, None, depth),
            }
        } else {
            value
        };
        let enumerable = ctx.force_enumerable || default_enumerable;
        target.define(property, installed, enumerable);
    }
}

// ============================================================================
// Tests
// ============================================================================
