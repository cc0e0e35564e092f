//! Core domain types for convograde
//!
//! These types represent the normalized conversation model produced by the
//! import pipeline and consumed by rating, comparison, and export.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Mapping** | The dictionary-of-nodes structure inside a raw export, keyed by node id |
//! | **Node** | One entry in a mapping; may or may not carry a message |
//! | **Contentful node** | A node whose message yields at least one non-blank text segment |
//! | **ParsedConversation** | The normalized, ordered, validated form of one export record |
//! | **LegacyConversation** | The minimal backward-compatible view kept for older consumers |
//! | **Epoch-ms** | Milliseconds since 1970-01-01T00:00:00Z, the canonical timestamp encoding |

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message author in the normalized model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// One normalized message in a parsed conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMessage {
    /// Mapping key of the node this message came from
    pub id: String,
    /// Author role; defaults to `user` when the export does not say
    pub role: Role,
    /// First non-blank text segment of the node's content parts
    pub content: String,
    /// 1-based position after chronological ordering
    pub sequence_order: usize,
    /// Epoch-ms timestamp used as the sort key
    pub timestamp: i64,
}

/// Conversation-level metadata derived during assembly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationMetadata {
    /// Model name from the export, when the export carries one
    pub model_version: Option<String>,
    /// Number of normalized messages
    pub conversation_length: usize,
    /// Path of the file this conversation was imported from
    pub file_path: Option<String>,
}

/// A fully parsed conversation: ordered messages plus metadata.
///
/// Created once per import and never mutated afterwards; any update
/// produces a new value. `original_data` keeps the untouched export record
/// so downstream consumers can recover fields the normalized model drops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedConversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<ParsedMessage>,
    pub metadata: ConversationMetadata,
    /// Complete original export record - never loses data
    pub original_data: serde_json::Value,
}

impl ParsedConversation {
    /// Epoch-ms creation time, taken from the first message.
    ///
    /// Falls back to the current wall-clock time for conversations that
    /// somehow carry no messages (the validator rejects those on import).
    pub fn created_at_ms(&self) -> i64 {
        self.messages
            .first()
            .map(|m| m.timestamp)
            .unwrap_or_else(|| Utc::now().timestamp_millis())
    }
}

/// Minimal backward-compatible view of a conversation.
///
/// Derived on demand from [`ParsedConversation`], never persisted on its
/// own. Field names follow the older camelCase wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyConversation {
    pub id: String,
    pub title: String,
    pub model_version: Option<String>,
    pub conversation_length: usize,
    /// ISO-8601 string derived from the first message timestamp
    pub created_at: String,
    pub message_count: usize,
    pub file_path: Option<String>,
}

/// Render an epoch-ms value as an ISO-8601 string with millisecond precision.
///
/// Out-of-range values fall back to the current time; rendering is total.
pub(crate) fn epoch_ms_to_iso(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::User, Role::Assistant, Role::System] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("robot".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn epoch_ms_renders_utc_iso() {
        assert_eq!(epoch_ms_to_iso(1_700_000_000_000), "2023-11-14T22:13:20.000Z");
    }

    #[test]
    fn legacy_view_uses_camel_case_keys() {
        let legacy = LegacyConversation {
            id: "c1".into(),
            title: "T".into(),
            model_version: Some("gpt-4".into()),
            conversation_length: 2,
            created_at: "2023-11-14T22:13:20.000Z".into(),
            message_count: 2,
            file_path: None,
        };
        let json = serde_json::to_string(&legacy).unwrap();
        assert!(json.contains("\"modelVersion\""));
        assert!(json.contains("\"conversationLength\""));
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"messageCount\""));
        assert!(json.contains("\"filePath\""));
    }
}
