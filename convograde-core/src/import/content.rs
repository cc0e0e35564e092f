//! Content extraction
//!
//! Decides whether a node carries displayable text and pulls out the first
//! non-blank segment. The two parts encodings (current plain strings,
//! legacy `{content}` objects) are told apart per node by the shape of the
//! first part, never by a global format flag, because both generations can
//! appear in the same batch.

use serde_json::Value;

use super::raw::RawNode;

/// Which parts encoding a node uses, decided from its first part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartsShape {
    /// `parts: string[]`
    Current,
    /// `parts: [{content: string}]`
    Legacy,
}

impl PartsShape {
    fn detect(first: &Value) -> Self {
        match first {
            Value::String(_) => PartsShape::Current,
            _ => PartsShape::Legacy,
        }
    }
}

/// Extract the first non-blank text segment from a node, if any.
///
/// Returns `None` for placeholder nodes (no message), non-text content
/// types, missing/empty parts, and parts that are blank after trimming.
/// Only the first qualifying segment is returned; later parts of a
/// multi-part message are ignored. That mirrors how these exports have
/// always been read and is a known limitation, not something to fix here.
///
/// Pure function over its input.
pub fn extract_content(node: &RawNode) -> Option<String> {
    let message = node.message.as_ref()?;
    let content = message.content.as_ref()?;

    if content.content_type.is_some() && content.type_tag() != Some("text") {
        return None;
    }

    let parts = content.parts.as_ref()?;
    let first = parts.first()?;

    match PartsShape::detect(first) {
        PartsShape::Current => parts.iter().find_map(|part| {
            part.as_str()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        }),
        PartsShape::Legacy => parts.iter().find_map(|part| {
            part.get("content")
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: serde_json::Value) -> RawNode {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn first_non_blank_part_wins() {
        let n = node(json!({
            "id": "n1",
            "message": {"content": {"content_type": "text", "parts": ["", "  ", "hello", "world"]}}
        }));
        assert_eq!(extract_content(&n), Some("hello".to_string()));
    }

    #[test]
    fn current_and_legacy_shapes_extract_equally() {
        let current = node(json!({
            "id": "n1",
            "message": {"content": {"content_type": "text", "parts": ["hi"]}}
        }));
        let legacy = node(json!({
            "id": "n1",
            "message": {"content": {"parts": [{"content": "hi"}]}}
        }));
        assert_eq!(extract_content(&current), Some("hi".to_string()));
        assert_eq!(extract_content(&legacy), Some("hi".to_string()));
    }

    #[test]
    fn placeholder_nodes_have_no_content() {
        let n = node(json!({"id": "n1"}));
        assert_eq!(extract_content(&n), None);
    }

    #[test]
    fn non_text_content_type_is_skipped() {
        let n = node(json!({
            "id": "n1",
            "message": {"content": {"content_type": "code", "parts": ["let x = 1;"]}}
        }));
        assert_eq!(extract_content(&n), None);
    }

    #[test]
    fn missing_or_empty_parts_yield_nothing() {
        let no_parts = node(json!({"id": "n1", "message": {"content": {"content_type": "text"}}}));
        assert_eq!(extract_content(&no_parts), None);

        let empty = node(json!({
            "id": "n1",
            "message": {"content": {"content_type": "text", "parts": []}}
        }));
        assert_eq!(extract_content(&empty), None);
    }

    #[test]
    fn all_blank_parts_yield_nothing() {
        let n = node(json!({
            "id": "n1",
            "message": {"content": {"content_type": "text", "parts": ["", "   "]}}
        }));
        assert_eq!(extract_content(&n), None);

        let legacy = node(json!({
            "id": "n1",
            "message": {"content": {"parts": [{"content": "  "}]}}
        }));
        assert_eq!(extract_content(&legacy), None);
    }

    #[test]
    fn shape_is_decided_by_the_first_part() {
        // First part is a string, so the legacy object later is not a candidate.
        let n = node(json!({
            "id": "n1",
            "message": {"content": {"parts": ["", {"content": "hidden"}]}}
        }));
        assert_eq!(extract_content(&n), None);
    }

    #[test]
    fn later_parts_are_not_concatenated() {
        let n = node(json!({
            "id": "n1",
            "message": {"content": {"content_type": "text", "parts": ["one", "two"]}}
        }));
        assert_eq!(extract_content(&n), Some("one".to_string()));
    }
}
