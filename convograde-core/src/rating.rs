//! Survey templates and ratings
//!
//! A conversation is rated against a template: a named set of dimensions,
//! each with its own numeric scale. Templates are persisted by external
//! collaborators; this module owns the shapes, a built-in default
//! template, and score validation. Human and AI ratings share one record
//! type so they stay directly comparable.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One scored dimension of a survey template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingDimension {
    /// Stable key used in score maps and LLM responses
    pub key: String,
    /// Human-facing label
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Inclusive lower bound of the scale
    pub min: f64,
    /// Inclusive upper bound of the scale
    pub max: f64,
}

impl RatingDimension {
    fn new(key: &str, label: &str, description: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            description: Some(description.to_string()),
            min: 1.0,
            max: 5.0,
        }
    }
}

/// A multi-dimensional survey template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyTemplate {
    pub id: String,
    pub name: String,
    pub dimensions: Vec<RatingDimension>,
}

impl SurveyTemplate {
    /// The built-in template used when no custom template is supplied.
    pub fn default_template() -> Self {
        Self {
            id: "default".to_string(),
            name: "General conversation quality".to_string(),
            dimensions: vec![
                RatingDimension::new(
                    "helpfulness",
                    "Helpfulness",
                    "How well the assistant addressed what was asked",
                ),
                RatingDimension::new(
                    "accuracy",
                    "Accuracy",
                    "Factual correctness of the assistant's statements",
                ),
                RatingDimension::new(
                    "coherence",
                    "Coherence",
                    "Whether replies follow the thread of the conversation",
                ),
                RatingDimension::new(
                    "tone",
                    "Tone",
                    "Appropriateness of register and phrasing",
                ),
                RatingDimension::new("overall", "Overall", "Overall impression"),
            ],
        }
    }

    /// Look up a dimension by key.
    pub fn dimension(&self, key: &str) -> Option<&RatingDimension> {
        self.dimensions.iter().find(|d| d.key == key)
    }

    /// Check a score map against this template.
    ///
    /// Rejects unknown dimension keys and values outside a dimension's
    /// scale. Partial score maps are allowed; completeness is a separate
    /// question answered by [`Self::is_complete`].
    pub fn validate_scores(&self, scores: &BTreeMap<String, f64>) -> Result<()> {
        for (key, value) in scores {
            let dimension = self.dimension(key).ok_or_else(|| {
                Error::Rating(format!(
                    "unknown dimension `{}` for template `{}`",
                    key, self.id
                ))
            })?;

            if !value.is_finite() || *value < dimension.min || *value > dimension.max {
                return Err(Error::Rating(format!(
                    "score {} for `{}` is outside the {}..={} scale",
                    value, key, dimension.min, dimension.max
                )));
            }
        }
        Ok(())
    }

    /// Whether a score map covers every dimension of this template.
    pub fn is_complete(&self, scores: &BTreeMap<String, f64>) -> bool {
        self.dimensions.iter().all(|d| scores.contains_key(&d.key))
    }
}

impl Default for SurveyTemplate {
    fn default() -> Self {
        Self::default_template()
    }
}

/// Who produced a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingOrigin {
    Human,
    Ai,
}

impl RatingOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingOrigin::Human => "human",
            RatingOrigin::Ai => "ai",
        }
    }
}

impl std::fmt::Display for RatingOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rating of one conversation against one template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub conversation_id: String,
    pub template_id: String,
    pub origin: RatingOrigin,
    /// Dimension key → score, validated against the template
    pub scores: BTreeMap<String, f64>,
    /// Free-text notes (human) or model summary (AI)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// LLM model that produced an AI rating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub rated_at: DateTime<Utc>,
    /// SHA-256 of the comparison prompt, for skip-if-unchanged callers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_hash: Option<String>,
}

impl Rating {
    /// Build a validated human rating.
    pub fn new_human(
        conversation_id: impl Into<String>,
        template: &SurveyTemplate,
        scores: BTreeMap<String, f64>,
        notes: Option<String>,
    ) -> Result<Self> {
        template.validate_scores(&scores)?;
        Ok(Self {
            conversation_id: conversation_id.into(),
            template_id: template.id.clone(),
            origin: RatingOrigin::Human,
            scores,
            summary: notes,
            model: None,
            rated_at: Utc::now(),
            prompt_hash: None,
        })
    }
}
