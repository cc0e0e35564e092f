//! Graph-to-sequence resolution
//!
//! A mapping is not guaranteed to be a tree reachable from one root, and
//! independent branches are possible, so ordering never walks the
//! parent/child links. Instead the mapping is flattened in source order,
//! filtered to contentful nodes, and stable-sorted by normalized
//! timestamp. Stability is load-bearing: many exports stamp consecutive
//! nodes with identical or zero timestamps, and reordering those would
//! scramble the conversation.

use chrono::Utc;
use serde_json::{Map, Value};

use super::content::extract_content;
use super::raw::RawNode;
use super::timestamp::normalize_epoch_ms;
use crate::types::{ParsedMessage, Role};

/// Flatten a validated mapping into a chronologically ordered sequence.
///
/// An empty result is legitimate here; rejecting conversations with zero
/// contentful nodes is the validator's job, not the resolver's.
pub fn resolve_messages(mapping: &Map<String, Value>) -> Vec<ParsedMessage> {
    // One fallback per pass so nodes without timestamps tie with each
    // other and keep their mapping order.
    let fallback_ms = Utc::now().timestamp_millis();

    let mut messages: Vec<ParsedMessage> = Vec::new();
    for (node_id, value) in mapping {
        let node: RawNode = match serde_json::from_value(value.clone()) {
            Ok(node) => node,
            Err(e) => {
                tracing::warn!(node_id = %node_id, error = %e, "skipping unreadable node");
                continue;
            }
        };

        let Some(content) = extract_content(&node) else {
            continue;
        };

        let message = node.message.as_ref();
        let role = message
            .and_then(|m| m.author_role())
            .and_then(|r| r.parse::<Role>().ok())
            .unwrap_or(Role::User);
        let timestamp =
            normalize_epoch_ms(message.and_then(|m| m.create_time.as_ref()), fallback_ms);

        messages.push(ParsedMessage {
            id: node_id.clone(),
            role,
            content,
            sequence_order: 0,
            timestamp,
        });
    }

    // Stable sort: equal timestamps keep mapping order.
    messages.sort_by_key(|m| m.timestamp);
    for (index, message) in messages.iter_mut().enumerate() {
        message.sequence_order = index + 1;
    }

    messages
}
