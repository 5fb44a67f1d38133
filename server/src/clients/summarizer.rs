//! Text summarization client
//!
//! Talks to a Gemini-compatible `generateContent` endpoint. The model is an
//! opaque text-to-text service: one prompt in, one block of text out.

use crate::config::ServerConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// External text summarization capability
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize plain note content
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Prompt sent for every note
pub fn build_prompt(text: &str) -> String {
    format!("Summarize this note in 2 concise sentences:\n\n{}", text)
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        let text = text.trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// HTTP summarizer for the Gemini API
pub struct GeminiSummarizer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiSummarizer {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.summarizer_timeout_secs))
            .user_agent(concat!("notekeeper/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.summarizer_base_url.trim_end_matches('/').to_string(),
            model: config.summarizer_model.clone(),
            api_key: config.summarizer_api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Summarization("API key is not configured".to_string()))?;

        let prompt = build_prompt(text);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };

        tracing::debug!("Requesting summary from model {}", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Summarization(format!(
                "service returned status {}",
                status
            )));
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed
            .into_text()
            .ok_or_else(|| AppError::Summarization("service returned no text".to_string()))
    }
}
