//! Structural validation of raw conversation exports
//!
//! Runs before any typed deserialization so that failures name the exact
//! field and node instead of surfacing as serde noise. Checks are
//! fail-fast and ordered: top-level shape, title, mapping presence, then
//! every node in mapping order, then the whole-conversation contentful
//! requirement. Blank-but-well-formed messages are not a node-level error;
//! they only matter if *no* node in the mapping yields content.

use serde_json::{Map, Value};

use super::content::extract_content;
use super::raw::RawNode;
use crate::error::ValidationError;
use crate::types::Role;

/// Validate one raw conversation value against the export contract.
///
/// Returns the first violation found, per the ordering documented on
/// [`ValidationError`].
pub fn validate_conversation(raw: &Value) -> Result<(), ValidationError> {
    let obj = raw.as_object().ok_or(ValidationError::InvalidShape)?;

    let has_title = obj
        .get("title")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty());
    if !has_title {
        return Err(ValidationError::MissingTitle);
    }

    let mapping = obj
        .get("mapping")
        .filter(|m| !m.is_null())
        .and_then(Value::as_object)
        .ok_or(ValidationError::MissingMapping)?;

    if mapping.is_empty() {
        return Err(ValidationError::EmptyMapping);
    }

    let mut any_contentful = false;
    for (node_id, node) in mapping {
        validate_node(node_id, node)?;
        if node_is_contentful(node) {
            any_contentful = true;
        }
    }

    if !any_contentful {
        return Err(ValidationError::NoValidMessages);
    }

    Ok(())
}

fn validate_node(node_id: &str, node: &Value) -> Result<(), ValidationError> {
    let obj = node.as_object().ok_or_else(|| ValidationError::InvalidNode {
        node_id: node_id.to_string(),
    })?;

    if let Some(id) = present(obj, "id") {
        let matches = id.as_str().map(|s| s == node_id).unwrap_or(false);
        if !matches {
            return Err(ValidationError::NodeIdMismatch {
                node_id: node_id.to_string(),
                found: render(id),
            });
        }
    }

    if let Some(message) = present(obj, "message") {
        validate_message(node_id, message)?;
    }

    Ok(())
}

fn validate_message(node_id: &str, message: &Value) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidMessage {
        node_id: node_id.to_string(),
        reason,
    };

    let msg = message
        .as_object()
        .ok_or_else(|| invalid("message must be an object".to_string()))?;

    let content = present(msg, "content")
        .ok_or_else(|| invalid("missing content object".to_string()))?
        .as_object()
        .ok_or_else(|| invalid("content must be an object".to_string()))?;

    if let Some(content_type) = present(content, "content_type") {
        if content_type.as_str() != Some("text") {
            return Err(invalid(format!(
                "unsupported content_type `{}`",
                render(content_type)
            )));
        }
    }

    let has_parts = present(content, "parts")
        .and_then(Value::as_array)
        .is_some_and(|parts| !parts.is_empty());
    if !has_parts {
        return Err(invalid("content.parts must be a non-empty array".to_string()));
    }

    if let Some(role) = present(msg, "author").and_then(|a| present_value(a, "role")) {
        let known = role
            .as_str()
            .map(|s| s.parse::<Role>().is_ok())
            .unwrap_or(false);
        if !known {
            return Err(invalid(format!("unknown author role `{}`", render(role))));
        }
    }

    if let Some(create_time) = present(msg, "create_time") {
        match create_time {
            Value::Number(n) => {
                let valid = n.as_f64().is_some_and(|v| v.is_finite() && v >= 0.0);
                if !valid {
                    return Err(invalid("create_time must be non-negative".to_string()));
                }
            }
            Value::String(_) => {}
            other => {
                return Err(invalid(format!(
                    "create_time must be a number or string, got `{}`",
                    render(other)
                )));
            }
        }
    }

    Ok(())
}

/// A field counts as present only when it is there and not `null`.
fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn present_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| !v.is_null())
}

/// Whether a node yields extractable content per the content extractor.
///
/// Shares the extractor implementation so validation and resolution can
/// never disagree about contentful-ness.
fn node_is_contentful(node: &Value) -> bool {
    serde_json::from_value::<RawNode>(node.clone())
        .ok()
        .map(|n| extract_content(&n).is_some())
        .unwrap_or(false)
}

/// Compact rendering of an offending value for error messages.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
