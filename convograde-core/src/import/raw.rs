//! Raw export schema types
//!
//! Serde-facing structs for the tree-structured chat export format: a
//! conversation is a `mapping` of node-id to node, each node optionally
//! carrying a message and parent/child links. Two content generations
//! coexist in the wild and can mix within a single batch:
//!
//! - **current**: `content.parts` is an array of plain strings and the
//!   author role lives at `message.author.role`
//! - **legacy**: `content.parts` is an array of `{content: string}` objects
//!   and the role sits at the top level of the message
//!
//! Every field is optional here; the structural validator, not serde,
//! decides what counts as an error. Fields whose shape varies across
//! export generations stay as raw [`Value`]s with accessor methods, so a
//! single odd field never makes a whole node undeserializable.

use serde::Deserialize;
use serde_json::{Map, Value};

/// One conversation record as it appears on disk, untrusted.
///
/// `mapping` preserves the source object's key order; that order is the
/// tie-break when messages share a timestamp.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawConversation {
    pub id: Option<Value>,
    pub conversation_id: Option<Value>,
    pub title: Option<String>,
    pub create_time: Option<Value>,
    pub model: Option<Value>,
    pub mapping: Map<String, Value>,
    pub metadata: Option<Value>,
}

impl RawConversation {
    /// Conversation id from `id`, falling back to `conversation_id`.
    pub fn export_id(&self) -> Option<String> {
        self.id
            .as_ref()
            .and_then(value_to_id)
            .or_else(|| self.conversation_id.as_ref().and_then(value_to_id))
    }

    /// Model name from `model`, falling back to `metadata.model_version`.
    pub fn model_version(&self) -> Option<String> {
        self.model
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                self.metadata
                    .as_ref()
                    .and_then(|m| m.get("model_version"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
    }
}

/// One entry in a conversation mapping.
///
/// A node without a message is a structural placeholder and is skipped
/// during resolution. `parent`/`children` are carried through untouched;
/// ordering never walks them (the resolver flattens and sorts instead).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawNode {
    pub id: Option<Value>,
    pub message: Option<RawMessage>,
    pub parent: Option<Value>,
    pub children: Option<Value>,
}

/// The message payload of a node.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawMessage {
    pub author: Option<Value>,
    /// Legacy exports store the role here instead of under `author`.
    pub role: Option<Value>,
    pub content: Option<RawContent>,
    pub create_time: Option<Value>,
}

impl RawMessage {
    /// The role string at `author.role`, when present.
    pub fn author_role(&self) -> Option<&str> {
        self.author
            .as_ref()
            .and_then(|a| a.get("role"))
            .and_then(Value::as_str)
    }
}

/// Message content: an optional type tag plus the parts array.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawContent {
    pub content_type: Option<Value>,
    pub parts: Option<Vec<Value>>,
}

impl RawContent {
    /// The `content_type` tag, when it is a string.
    pub fn type_tag(&self) -> Option<&str> {
        self.content_type.as_ref().and_then(Value::as_str)
    }
}

/// Render a raw id-ish value as a string id.
///
/// Exports usually use strings, but numeric ids appear in older records.
/// Any present string counts, mirroring the `id ?? conversation_id`
/// coalescing this format has always been read with.
pub(crate) fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
