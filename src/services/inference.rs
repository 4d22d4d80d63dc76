use anyhow::{Context, bail};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::AppConfig;

/// Default follow-up questions returned when no API key is configured.
pub const DEFAULT_FOLLOWUP_QUESTIONS: [&str; 5] = [
    "What are the key assumptions behind the main argument?",
    "How could these findings be applied in a real-world scenario?",
    "What are potential limitations or counterarguments?",
    "What further data would strengthen the conclusions?",
    "Which sections need deeper exploration or examples?",
];

/// Remote generative-AI collaborator. One implementation talks to Gemini;
/// tests swap in a mock. Calls are never retried.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn summarize(&self, text: &str) -> anyhow::Result<String>;

    async fn caption_image(
        &self,
        image: &[u8],
        mime_type: &str,
        style: &str,
    ) -> anyhow::Result<String>;

    async fn transcribe_audio(&self, audio: &[u8], mime_type: &str) -> anyhow::Result<String>;

    async fn analyze_mood(&self, transcript: &str) -> anyhow::Result<String>;

    async fn rewrite_tone(&self, text: &str, tone: &str) -> anyhow::Result<String>;

    /// Up to 5 short follow-up questions for a previously produced summary.
    /// Falls back to [`DEFAULT_FOLLOWUP_QUESTIONS`] when unconfigured.
    async fn generate_followups(&self, summary: &str) -> anyhow::Result<Vec<String>>;
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum Part {
    Text(String),
    InlineData { mime_type: String, data: String },
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Gemini REST client (`models/{model}:generateContent`).
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_key(&self) -> anyhow::Result<&str> {
        match &self.api_key {
            Some(key) => Ok(key),
            None => bail!("AI service is not configured"),
        }
    }

    async fn generate(&self, parts: Vec<Part>) -> anyhow::Result<String> {
        let key = self.api_key()?;
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, key
        );

        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("inference request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("inference request returned {}: {}", status, body);
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("failed to decode inference response")?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            bail!("inference response contained no text");
        }

        debug!(model = %self.model, chars = text.len(), "inference call succeeded");
        Ok(text)
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn summarize(&self, text: &str) -> anyhow::Result<String> {
        let prompt = format!(
            "Summarize the following document in clear, concise language:\n\n{}",
            text
        );
        self.generate(vec![Part::Text(prompt)]).await
    }

    async fn caption_image(
        &self,
        image: &[u8],
        mime_type: &str,
        style: &str,
    ) -> anyhow::Result<String> {
        let prompt = format!(
            "Describe the contents of this image in one sentence, in a {} style.",
            style
        );
        let data = base64::engine::general_purpose::STANDARD.encode(image);
        self.generate(vec![
            Part::Text(prompt),
            Part::InlineData {
                mime_type: mime_type.to_string(),
                data,
            },
        ])
        .await
    }

    async fn transcribe_audio(&self, audio: &[u8], mime_type: &str) -> anyhow::Result<String> {
        let data = base64::engine::general_purpose::STANDARD.encode(audio);
        self.generate(vec![
            Part::Text(
                "Transcribe this audio recording. Return only the spoken text, nothing else."
                    .to_string(),
            ),
            Part::InlineData {
                mime_type: mime_type.to_string(),
                data,
            },
        ])
        .await
    }

    async fn analyze_mood(&self, transcript: &str) -> anyhow::Result<String> {
        let prompt = format!(
            "Analyze the following transcript and return the overall mood or sentiment \
             (e.g., happy, sad, angry, neutral, excited, etc.):\n\n{}",
            transcript
        );
        self.generate(vec![Part::Text(prompt)]).await
    }

    async fn rewrite_tone(&self, text: &str, tone: &str) -> anyhow::Result<String> {
        let prompt = format!("Rewrite the following text in a {} tone:\n\n{}", tone, text);
        self.generate(vec![Part::Text(prompt)]).await
    }

    async fn generate_followups(&self, summary: &str) -> anyhow::Result<Vec<String>> {
        if self.api_key.is_none() {
            return Ok(DEFAULT_FOLLOWUP_QUESTIONS
                .iter()
                .map(|q| q.to_string())
                .collect());
        }

        let prompt = format!(
            "You are assisting with study and research follow-ups. Given the following \
             document summary, create 5 concise, high-quality follow-up questions a reader \
             could ask next.\n\
             Respond strictly as a JSON array of strings (no numbering, no extra keys, \
             no prose outside JSON).\n\nSUMMARY:\n{}\n\n\
             Return only a JSON array of strings.",
            summary
        );
        let text = self.generate(vec![Part::Text(prompt)]).await?;
        Ok(parse_followup_questions(&text))
    }
}

/// Extracts up to 5 question strings from a model reply. Tries a strict JSON
/// array first, then a `{"questions": [...]}` object, then falls back to
/// picking question-looking lines out of free text.
pub fn parse_followup_questions(text: &str) -> Vec<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        let array = match &value {
            serde_json::Value::Array(items) => Some(items),
            serde_json::Value::Object(map) => map.get("questions").and_then(|q| q.as_array()),
            _ => None,
        };
        if let Some(items) = array {
            let questions: Vec<String> = items
                .iter()
                .filter_map(|q| q.as_str())
                .map(|q| q.to_string())
                .collect();
            if !questions.is_empty() {
                return questions.into_iter().take(5).collect();
            }
        }
    }

    let raw_lines: Vec<&str> = text.lines().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
    let mut cleaned: Vec<String> = raw_lines
        .iter()
        .map(|l| l.trim_start_matches(['-', '*', '•', ' ']).to_string())
        .filter(|l| !l.is_empty() && (l.ends_with('?') || l.split_whitespace().count() >= 4))
        .collect();
    if cleaned.is_empty() {
        cleaned = raw_lines.iter().map(|l| l.to_string()).collect();
    }
    cleaned.into_iter().take(5).collect()
}
