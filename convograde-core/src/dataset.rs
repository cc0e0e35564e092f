//! Combined export dataset assembly
//!
//! Pairs parsed conversations with their human and AI ratings into flat,
//! serializable records. Writing the records anywhere is the caller's
//! business; this module only builds them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::import::to_legacy_format;
use crate::rating::{Rating, RatingOrigin};
use crate::types::{LegacyConversation, ParsedConversation};

/// One conversation with its ratings, ready for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub conversation: LegacyConversation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_rating: Option<Rating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_rating: Option<Rating>,
    /// Per-dimension `ai - human` differences, when both ratings exist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_deltas: Option<BTreeMap<String, f64>>,
}

/// Build export records for a set of conversations and ratings.
///
/// Ratings are matched by conversation id; when several ratings of the
/// same origin exist for one conversation, the most recent wins. Records
/// come out in conversation input order.
pub fn build_dataset(conversations: &[ParsedConversation], ratings: &[Rating]) -> Vec<ExportRecord> {
    conversations
        .iter()
        .map(|conversation| {
            let human_rating = latest_rating(ratings, &conversation.id, RatingOrigin::Human);
            let ai_rating = latest_rating(ratings, &conversation.id, RatingOrigin::Ai);
            let score_deltas = match (&human_rating, &ai_rating) {
                (Some(human), Some(ai)) => Some(deltas(human, ai)),
                _ => None,
            };

            ExportRecord {
                conversation: to_legacy_format(conversation),
                human_rating,
                ai_rating,
                score_deltas,
            }
        })
        .collect()
}

fn latest_rating(ratings: &[Rating], conversation_id: &str, origin: RatingOrigin) -> Option<Rating> {
    ratings
        .iter()
        .filter(|r| r.conversation_id == conversation_id && r.origin == origin)
        .max_by_key(|r| r.rated_at)
        .cloned()
}

fn deltas(human: &Rating, ai: &Rating) -> BTreeMap<String, f64> {
    human
        .scores
        .iter()
        .filter_map(|(key, human_score)| {
            ai.scores.get(key).map(|ai_score| (key.clone(), ai_score - human_score))
        })
        .collect()
}
