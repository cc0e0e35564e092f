//! AI comparison ratings
//!
//! Asks an LLM to rate a conversation against the same survey template a
//! human rater uses, so the two ratings stay directly comparable. The LLM
//! boundary is one blocking call: prompt string in, response text out.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::config::{LlmConfig, LlmProvider};
use crate::error::{Error, Result};
use crate::rating::{Rating, RatingOrigin, SurveyTemplate};
use crate::types::ParsedConversation;

/// Transcripts are capped at this many characters before prompting.
const MAX_TRANSCRIPT_CHARS: usize = 16_000;

/// LLM completion interface for comparison ratings.
pub trait LlmClient: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Create the default HTTP-backed LLM client.
pub fn create_llm_client(llm: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    Ok(Box::new(HttpLlmClient::new(llm)?))
}

/// Rate a conversation with the configured LLM.
pub fn compare_conversation(
    conversation: &ParsedConversation,
    template: &SurveyTemplate,
    llm: &LlmConfig,
) -> Result<Rating> {
    let client = create_llm_client(llm)?;
    compare_with_client(conversation, template, llm, client.as_ref())
}

/// Rate a conversation using a supplied client.
///
/// Lets callers reuse one initialized client across many conversations,
/// and tests substitute a mock.
pub fn compare_with_client(
    conversation: &ParsedConversation,
    template: &SurveyTemplate,
    llm: &LlmConfig,
    client: &dyn LlmClient,
) -> Result<Rating> {
    let prompt = build_prompt(conversation, template);

    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    let prompt_hash = hex::encode(hasher.finalize());

    let raw_response = client.complete(&prompt)?;
    let value = parse_score_object(&raw_response)?;
    let (scores, summary) = extract_scores(template, &value)?;
    template.validate_scores(&scores)?;

    Ok(Rating {
        conversation_id: conversation.id.clone(),
        template_id: template.id.clone(),
        origin: RatingOrigin::Ai,
        scores,
        summary,
        model: Some(llm.model.clone()),
        rated_at: Utc::now(),
        prompt_hash: Some(prompt_hash),
    })
}

/// Build the comparison prompt for a conversation and template.
///
/// Public so callers can inspect prompts (dry runs) without an API call.
pub fn build_prompt(conversation: &ParsedConversation, template: &SurveyTemplate) -> String {
    let mut transcript = String::new();
    for msg in &conversation.messages {
        let line = format!(
            "[{}] {}: {}\n",
            msg.sequence_order,
            msg.role,
            msg.content.replace('\n', " ")
        );
        transcript.push_str(&line);
        if transcript.len() >= MAX_TRANSCRIPT_CHARS {
            transcript.truncate(MAX_TRANSCRIPT_CHARS);
            transcript.push_str("\n...[truncated]");
            break;
        }
    }

    let mut rubric = String::new();
    for dim in &template.dimensions {
        rubric.push_str(&format!(
            "- {} ({} to {}): {}\n",
            dim.key,
            dim.min,
            dim.max,
            dim.description.as_deref().unwrap_or(&dim.label)
        ));
    }

    format!(
        "You rate conversation transcripts against a survey rubric. \
         Return strict JSON with one numeric score per rubric key, plus a \
         short string field `summary`.\n\n\
         Rubric ({}):\n{}\n\
         Conversation ID: {}\nTitle: {}\n\nTranscript:\n{}\n\nReturn only JSON.",
        template.name, rubric, conversation.id, conversation.title, transcript
    )
}

fn parse_score_object(raw: &str) -> Result<serde_json::Value> {
    let parsed = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => value,
        Err(_) => {
            let extracted = extract_json_object(raw)?;
            serde_json::from_str::<serde_json::Value>(&extracted)?
        }
    };

    if !parsed.is_object() {
        return Err(Error::Llm(
            "comparison response must be a JSON object".to_string(),
        ));
    }

    Ok(parsed)
}

fn extract_json_object(raw: &str) -> Result<String> {
    let start = raw
        .find('{')
        .ok_or_else(|| Error::Llm("comparison response did not contain JSON object".to_string()))?;
    let end = raw
        .rfind('}')
        .ok_or_else(|| Error::Llm("comparison response did not contain JSON object".to_string()))?;
    if end <= start {
        return Err(Error::Llm(
            "comparison response JSON bounds are invalid".to_string(),
        ));
    }
    Ok(raw[start..=end].to_string())
}

fn extract_scores(
    template: &SurveyTemplate,
    value: &serde_json::Value,
) -> Result<(BTreeMap<String, f64>, Option<String>)> {
    let mut scores = BTreeMap::new();
    for dim in &template.dimensions {
        let score = value.get(&dim.key).and_then(|v| v.as_f64()).ok_or_else(|| {
            Error::Llm(format!(
                "comparison response missing numeric score for `{}`",
                dim.key
            ))
        })?;
        scores.insert(dim.key.clone(), score);
    }

    let summary = value
        .get("summary")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Ok((scores, summary))
}

struct HttpLlmClient {
    model: String,
    provider: LlmProvider,
    endpoint: String,
    api_key: Option<String>,
    runtime: tokio::runtime::Runtime,
    http: reqwest::Client,
}

impl HttpLlmClient {
    fn new(config: &LlmConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| config.provider.default_endpoint().to_string());
        let api_key = match config.provider {
            LlmProvider::Ollama => None,
            LlmProvider::Claude => config
                .api_key
                .clone()
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok()),
            LlmProvider::OpenAI => config
                .api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok()),
        };

        if matches!(config.provider, LlmProvider::Claude | LlmProvider::OpenAI) && api_key.is_none()
        {
            return Err(Error::Config(
                "llm.api_key (or provider env var) is required".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Llm(format!("failed to build tokio runtime: {e}")))?;
        let timeout_secs = config.timeout_secs.max(1);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Llm(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            model: config.model.clone(),
            provider: config.provider,
            endpoint,
            api_key,
            runtime,
            http,
        })
    }

    async fn read_success_body(resp: reqwest::Response, provider: &str) -> Result<String> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Llm(format!("{provider} read body failed: {e}")))?;
        if !status.is_success() {
            return Err(Error::Llm(format!(
                "{provider} returned {}: {}",
                status.as_u16(),
                body
            )));
        }
        Ok(body)
    }
}

impl LlmClient for HttpLlmClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        self.runtime.block_on(async {
            match self.provider {
                LlmProvider::Ollama => {
                    let url = format!("{}/api/generate", self.endpoint.trim_end_matches('/'));
                    let resp = self
                        .http
                        .post(url)
                        .json(&json!({
                            "model": self.model,
                            "prompt": prompt,
                            "stream": false,
                        }))
                        .send()
                        .await
                        .map_err(|e| Error::Llm(format!("ollama request failed: {e}")))?;
                    let body = Self::read_success_body(resp, "ollama").await?;
                    let json: serde_json::Value = serde_json::from_str(&body)?;
                    json.get("response")
                        .and_then(|v| v.as_str())
                        .map(ToString::to_string)
                        .ok_or_else(|| {
                            Error::Llm("ollama response missing string field `response`".to_string())
                        })
                }
                LlmProvider::Claude => {
                    let url = format!("{}/v1/messages", self.endpoint.trim_end_matches('/'));
                    let mut headers = HeaderMap::new();
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                    headers.insert(
                        "x-api-key",
                        HeaderValue::from_str(self.api_key.as_deref().unwrap_or_default())
                            .map_err(|e| Error::Llm(format!("invalid claude api key header: {e}")))?,
                    );
                    headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));

                    let resp = self
                        .http
                        .post(url)
                        .headers(headers)
                        .json(&json!({
                            "model": self.model,
                            "max_tokens": 600,
                            "temperature": 0,
                            "messages": [{ "role": "user", "content": prompt }],
                        }))
                        .send()
                        .await
                        .map_err(|e| Error::Llm(format!("claude request failed: {e}")))?;
                    let body = Self::read_success_body(resp, "claude").await?;
                    let json: serde_json::Value = serde_json::from_str(&body)?;
                    json.get("content")
                        .and_then(|v| v.as_array())
                        .and_then(|arr| arr.first())
                        .and_then(|v| v.get("text"))
                        .and_then(|v| v.as_str())
                        .map(ToString::to_string)
                        .ok_or_else(|| {
                            Error::Llm("claude response missing content[0].text".to_string())
                        })
                }
                LlmProvider::OpenAI => {
                    let url = format!(
                        "{}/v1/chat/completions",
                        self.endpoint.trim_end_matches('/')
                    );
                    let mut headers = HeaderMap::new();
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                    headers.insert(
                        AUTHORIZATION,
                        HeaderValue::from_str(&format!(
                            "Bearer {}",
                            self.api_key.as_deref().unwrap_or_default()
                        ))
                        .map_err(|e| Error::Llm(format!("invalid auth header: {e}")))?,
                    );

                    let resp = self
                        .http
                        .post(url)
                        .headers(headers)
                        .json(&json!({
                            "model": self.model,
                            "temperature": 0,
                            "messages": [{ "role": "user", "content": prompt }]
                        }))
                        .send()
                        .await
                        .map_err(|e| Error::Llm(format!("openai request failed: {e}")))?;
                    let body = Self::read_success_body(resp, "openai").await?;
                    let json: serde_json::Value = serde_json::from_str(&body)?;
                    json.get("choices")
                        .and_then(|v| v.as_array())
                        .and_then(|arr| arr.first())
                        .and_then(|v| v.get("message"))
                        .and_then(|v| v.get("content"))
                        .and_then(|v| v.as_str())
                        .map(ToString::to_string)
                        .ok_or_else(|| {
                            Error::Llm(
                                "openai response missing choices[0].message.content".to_string(),
                            )
                        })
                }
            }
        })
    }
}
