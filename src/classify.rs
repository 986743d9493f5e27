//! Shape classification for thrown values.
//!
//! Everything here is structural: a value is error-like because it carries
//! the expected members, not because of any nominal type relationship. The
//! flattener consumes [`classify`] as a single dispatch tag instead of
//! spreading duck-typing conditionals through the walk.

use crate::value::Thrown;

/// Structural classification of a property value, as seen by the
/// own-property walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A binary byte buffer; replaced with a marker string.
    Buffer,
    /// A stream-like object (exposes a callable `pipe`); replaced with a
    /// marker string.
    Stream,
    /// A function; dropped from the output.
    Function,
    /// Null or a scalar; copied as-is.
    Primitive,
    /// An object or array that must be descended into.
    Reference,
}

/// Classify a value for the own-property walk.
///
/// Order matters: stream-ness is checked before generic reference-ness, so
/// a stream-like object is replaced rather than descended into.
pub fn classify(value: &Thrown) -> Shape {
    match value {
        Thrown::Buffer(_) => Shape::Buffer,
        Thrown::Object(_) if has_callable_pipe(value) => Shape::Stream,
        Thrown::Function(_) => Shape::Function,
        Thrown::Null | Thrown::Bool(_) | Thrown::Number(_) | Thrown::String(_) => {
            Shape::Primitive
        }
        Thrown::Array(_) | Thrown::Object(_) => Shape::Reference,
    }
}

/// Whether a value looks like an error: a non-null object carrying `name`,
/// `message`, and `stack` properties. Presence only; the values may be of
/// any type and any enumerability.
pub fn is_error_like(value: &Thrown) -> bool {
    match value.as_object() {
        Some(node) => node.has("name") && node.has("message") && node.has("stack"),
        None => false,
    }
}

/// Whether a value is plausibly a serialized error: a non-null, non-array
/// object with at least a `message` property. The weakest shape
/// deserialization will try to rebuild an error from.
pub fn is_minimum_viable_serialized_error(value: &Thrown) -> bool {
    match value.as_object() {
        Some(node) => node.has("message"),
        None => false,
    }
}

fn has_callable_pipe(value: &Thrown) -> bool {
    matches!(value.property("pipe"), Some(Thrown::Function(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ObjectNode;

    #[test]
    fn error_like_requires_all_three_members() {
        let node = ObjectNode::plain();
        node.insert("name", Thrown::from("Error"));
        node.insert("message", Thrown::from("boom"));
        assert!(!is_error_like(&Thrown::Object(node.clone())));

        node.insert("stack", Thrown::from("Error: boom"));
        assert!(is_error_like(&Thrown::Object(node)));
    }

    #[test]
    fn error_like_accepts_hidden_members_and_any_value_types() {
        let node = ObjectNode::plain();
        node.insert_hidden("name", Thrown::from(42));
        node.insert_hidden("message", Thrown::Null);
        node.insert_hidden("stack", Thrown::Bool(false));
        assert!(is_error_like(&Thrown::Object(node)));
    }

    #[test]
    fn error_like_rejects_non_objects() {
        assert!(!is_error_like(&Thrown::Null));
        assert!(!is_error_like(&Thrown::from("Error")));
        assert!(!is_error_like(&Thrown::array(vec![])));
    }

    #[test]
    fn minimum_viable_needs_message_and_rejects_arrays() {
        let node = ObjectNode::plain();
        node.insert("message", Thrown::from("boom"));
        assert!(is_minimum_viable_serialized_error(&Thrown::Object(node)));

        assert!(!is_minimum_viable_serialized_error(&Thrown::object()));
        assert!(!is_minimum_viable_serialized_error(&Thrown::from("boom")));
        assert!(!is_minimum_viable_serialized_error(&Thrown::array(vec![
            Thrown::from("message")
        ])));
    }

    #[test]
    fn stream_requires_a_callable_pipe() {
        let stream = ObjectNode::plain();
        stream.insert("pipe", Thrown::function("pipe"));
        assert_eq!(classify(&Thrown::Object(stream)), Shape::Stream);

        // A `pipe` property that is not callable is just data.
        let not_stream = ObjectNode::plain();
        not_stream.insert("pipe", Thrown::from("water"));
        assert_eq!(classify(&Thrown::Object(not_stream)), Shape::Reference);
    }

    #[test]
    fn classification_tags_cover_the_value_space() {
        assert_eq!(classify(&Thrown::buffer(vec![0u8])), Shape::Buffer);
        assert_eq!(classify(&Thrown::function("f")), Shape::Function);
        assert_eq!(classify(&Thrown::Null), Shape::Primitive);
        assert_eq!(classify(&Thrown::from(1)), Shape::Primitive);
        assert_eq!(classify(&Thrown::from("x")), Shape::Primitive);
        assert_eq!(classify(&Thrown::array(vec![])), Shape::Reference);
        assert_eq!(classify(&Thrown::object()), Shape::Reference);
    }
}
