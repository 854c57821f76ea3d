use crate::model::{GenerateRequest, TextModel};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::settings::ProviderAuth;
use std::env;
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.response_mime_type.is_none()
            && self.response_schema.is_none()
            && self.thinking_config.is_none()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// API key from settings, else `GEMINI_API_KEY`.
    pub fn from_auth(model: &str, auth: &ProviderAuth) -> Result<Self> {
        let api_key = match auth.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            Some(key) => key.clone(),
            None => env::var("GEMINI_API_KEY")
                .map_err(|_| anyhow!("No Gemini API key configured"))?,
        };
        Ok(Self {
            http: Client::builder().timeout(Duration::from_secs(45)).build()?,
            api_key,
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn build_request(request: GenerateRequest) -> GeminiRequest {
    let system_instruction = request.system_instruction.map(|text| GeminiContent {
        role: None,
        parts: vec![GeminiPart { text }],
    });

    let mut contents: Vec<GeminiContent> = Vec::new();
    for m in request.messages {
        // Gemini expects roles: "user" | "model".
        let role = match m.role.as_str() {
            "assistant" => "model",
            "system" => continue,
            other => other,
        };
        contents.push(GeminiContent {
            role: Some(role.to_string()),
            parts: vec![GeminiPart { text: m.content }],
        });
    }

    let config = GenerationConfig {
        response_mime_type: (request.json_response || request.response_schema.is_some())
            .then(|| "application/json".to_string()),
        response_schema: request.response_schema,
        thinking_config: request
            .thinking_budget
            .map(|thinking_budget| ThinkingConfig { thinking_budget }),
    };

    GeminiRequest {
        contents,
        system_instruction,
        generation_config: (!config.is_empty()).then_some(config),
    }
}

fn extract_text(body: GeminiResponse) -> String {
    body.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
        .unwrap_or_default()
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        let req = build_request(request);
        debug!(model = %self.model, turns = req.contents.len(), "gemini request");

        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let body = body.trim();
            if body.is_empty() {
                return Err(anyhow!("gemini error: {}", status));
            }
            let body = if body.chars().count() > 800 {
                format!("{}...", body.chars().take(800).collect::<String>())
            } else {
                body.to_string()
            };
            return Err(anyhow!("gemini error: {}\n{}", status, body));
        }
        let body: GeminiResponse = resp.json().await?;
        Ok(extract_text(body))
    }
}
