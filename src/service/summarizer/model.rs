//! Hosted language model summaries over an OpenAI-compatible
//! chat-completions endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::heuristic::{sentiment_label, SENTIMENT_LABELS};
use super::{HeuristicSummarizer, Summarizer};
use crate::config::LlmConfig;
use crate::domain::models::{Analysis, Document, ReadabilityLevel};
use crate::error::{AppError, Result};
use crate::service::http::{create_client, ClientType};

const SERVICE: &str = "llm";
const LINK_SAMPLE: usize = 25;

const INSTRUCTIONS: &str = "You are a content analyst. You receive the title, headings and link texts of a web page. \
Reply with a single JSON object and nothing else, using exactly these keys: \
\"summary\" (string, 2-3 sentences), \
\"readabilityScore\" (number 0-100, higher is harder to read), \
\"topKeywords\" (array of up to 5 lowercase strings), \
\"sentimentScore\" (number from -1 to 1), \
\"sentimentAnalysis\" (one of \"Very Positive\", \"Positive\", \"Neutral\", \"Negative\", \"Very Negative\"), \
\"suggestions\" (array of short actionable strings).";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Fields the model is asked for. Everything else is computed locally.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelReply {
    summary: String,
    readability_score: f64,
    #[serde(default)]
    top_keywords: Vec<String>,
    sentiment_score: f64,
    #[serde(default)]
    sentiment_analysis: Option<String>,
    #[serde(default)]
    suggestions: Vec<String>,
}

pub struct ModelSummarizer {
    client: Client,
    config: LlmConfig,
    timeout: Duration,
    fallback: HeuristicSummarizer,
}

impl ModelSummarizer {
    pub fn new(config: LlmConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(ClientType::Standard, timeout)?,
            config,
            timeout,
            fallback: HeuristicSummarizer,
        })
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    fn prompt(document: &Document) -> String {
        let title = document.title.as_deref().unwrap_or("(none)");
        let headings = document
            .headings
            .iter()
            .filter(|h| !h.text.trim().is_empty())
            .map(|h| format!("- {}: {}", h.tag(), h.text))
            .collect::<Vec<_>>()
            .join("\n");
        let links = document
            .links
            .iter()
            .take(LINK_SAMPLE)
            .map(|l| format!("- {}", l.text))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "URL: {}\nTitle: {}\n\nHeadings:\n{}\n\nLink texts (sample):\n{}",
            document.url, title, headings, links
        )
    }

    async fn chat(&self, messages: &[Message]) -> Result<String> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": 0.2,
            "response_format": { "type": "json_object" },
        });

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::from_transport(SERVICE, e, self.timeout.as_secs()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::from_transport(SERVICE, e, self.timeout.as_secs()))?;
        if !status.is_success() {
            return Err(AppError::upstream(SERVICE, format!("HTTP {status}: {text}")));
        }

        let json: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| AppError::upstream(SERVICE, format!("invalid response body: {e}")))?;

        json["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .filter(|content| !content.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::upstream(SERVICE, "response has no message content"))
    }

    /// Ask the model and merge its reply with locally computed fields.
    pub async fn try_summarize(&self, document: &Document) -> Result<Analysis> {
        let messages = [
            Message {
                role: "system".to_string(),
                content: INSTRUCTIONS.to_string(),
            },
            Message {
                role: "user".to_string(),
                content: Self::prompt(document),
            },
        ];

        let content = self.chat(&messages).await?;
        let reply = parse_reply(&content)?;
        Ok(self.merge(document, reply))
    }

    fn merge(&self, document: &Document, reply: ModelReply) -> Analysis {
        let mut analysis = self.fallback.analyze(document);

        let readability = reply.readability_score.clamp(0.0, 100.0);
        let sentiment = reply.sentiment_score.clamp(-1.0, 1.0);

        analysis.summary = reply.summary;
        analysis.readability_score = readability;
        analysis.readability_level = ReadabilityLevel::from_score(readability);
        analysis.sentiment_score = sentiment;
        analysis.sentiment_analysis = reply
            .sentiment_analysis
            .and_then(|label| {
                SENTIMENT_LABELS
                    .iter()
                    .find(|known| known.eq_ignore_ascii_case(label.trim()))
            })
            .copied()
            .unwrap_or_else(|| sentiment_label(sentiment))
            .to_string();
        if !reply.top_keywords.is_empty() {
            analysis.top_keywords = reply.top_keywords.into_iter().take(5).collect();
        }
        if !reply.suggestions.is_empty() {
            analysis.suggestions = reply.suggestions;
        }
        analysis
    }
}

/// Parse the model's JSON object, tolerating a Markdown code fence around it.
fn parse_reply(content: &str) -> Result<ModelReply> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let reply: ModelReply = serde_json::from_str(body)
        .map_err(|e| AppError::upstream(SERVICE, format!("malformed model reply: {e}")))?;

    if reply.summary.trim().is_empty() {
        return Err(AppError::upstream(SERVICE, "model reply has an empty summary"));
    }
    Ok(reply)
}

#[async_trait]
impl Summarizer for ModelSummarizer {
    async fn summarize(&self, document: &Document) -> Analysis {
        match self.try_summarize(document).await {
            Ok(analysis) => analysis,
            Err(e) => {
                log::warn!("[SUMMARY] Model summary failed, using heuristics: {}", e);
                self.fallback.analyze(document)
            }
        }
    }

    fn name(&self) -> &'static str {
        "model"
    }
}
