use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ticklog_match::{Oracle, OracleError};

use crate::config::GeminiSection;

/// Gemini `generateContent` over HTTP.
pub struct GeminiOracle {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Req<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<RespContent>,
}

#[derive(Deserialize)]
struct RespContent {
    #[serde(default)]
    parts: Vec<RespPart>,
}

#[derive(Deserialize)]
struct RespPart {
    text: Option<String>,
}

impl GeminiOracle {
    pub fn from_config(cfg: &GeminiSection) -> Result<Option<Self>> {
        let Some(api_key) = cfg.resolved_api_key() else {
            return Ok(None);
        };
        let client = reqwest::Client::builder().build().context("build http client")?;
        Ok(Some(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            temperature: cfg.temperature,
        }))
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, OracleError> {
        let body = Req {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: "application/json",
            },
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| OracleError::Transport(format!("invalid api key header: {e}")))?;
        headers.insert("x-goog-api-key", key);

        debug!(model, prompt_chars = prompt.len(), "gemini request");
        let resp = self
            .client
            .post(self.endpoint(model))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Transport(format!("gemini request: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(classify_failure(status, model, &txt));
        }

        let out: Resp = resp
            .json()
            .await
            .map_err(|e| OracleError::Transport(format!("parse gemini response: {e}")))?;
        Ok(reply_text(out))
    }
}

fn reply_text(resp: Resp) -> String {
    resp.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default()
}

/// Map a non-success response onto the cascade's error kinds.
fn classify_failure(status: StatusCode, model: &str, body: &str) -> OracleError {
    let lower = body.to_lowercase();
    if status == StatusCode::NOT_FOUND || lower.contains("not found") || lower.contains("not supported") {
        return OracleError::ModelNotFound(format!("{model}: {status}"));
    }
    if status == StatusCode::TOO_MANY_REQUESTS
        || lower.contains("quota")
        || lower.contains("resource_exhausted")
        || lower.contains("rate limit")
    {
        return OracleError::QuotaExceeded(format!("{model}: {status}"));
    }
    OracleError::Transport(format!("gemini error: {status} {body}"))
}
