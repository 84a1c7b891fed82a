use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{PlanProfile, build_prompt, parse_plan_response};
use crate::errors::AppError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
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

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send a prompt and return the text of the first candidate.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Upstream("GEMINI_API_KEY not configured".to_string()))?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: [Content { parts: [Part { text: prompt }] }],
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!("Gemini returned {status}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(e.without_url().to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::Upstream("Gemini returned no text".to_string()));
        }
        Ok(text)
    }

    /// Generate a 7-day plan for `profile`.
    pub async fn generate_plan(&self, profile: &PlanProfile) -> Result<Value, AppError> {
        let tdee = profile.daily_calories();
        let prompt = build_prompt(profile, tdee);
        let text = self.generate_text(&prompt).await?;
        Ok(parse_plan_response(&text, tdee))
    }
}
