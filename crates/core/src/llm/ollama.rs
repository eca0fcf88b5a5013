use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{Provider, TextGenerator};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_NUM_PREDICT: u32 = 2048;
const PROBE_TIMEOUT_SECS: u64 = 3;

/// Local Ollama server, `/api/generate` with streaming off.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    num_predict: u32,
}

impl OllamaClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let timeout_secs = std::env::var("OLLAMA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let num_predict = std::env::var("OLLAMA_NUM_PREDICT")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_NUM_PREDICT);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build ollama http client")?;

        Ok(Self {
            http,
            base_url: settings.ollama_base_url.clone(),
            model: settings.ollama_model.clone(),
            num_predict,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn request<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: 0.0,
                num_predict: self.num_predict,
            },
        }
    }

    pub async fn is_reachable(&self) -> bool {
        let res = self
            .http
            .get(self.url("/api/tags"))
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .send()
            .await;
        matches!(res, Ok(r) if r.status().is_success())
    }
}

#[async_trait::async_trait]
impl TextGenerator for OllamaClient {
    fn provider(&self) -> Provider {
        Provider::Ollama
    }

    async fn generate_text(&self, prompt: &str) -> anyhow::Result<String> {
        let res = self
            .http
            .post(self.url("/api/generate"))
            .json(&self.request(prompt))
            .send()
            .await
            .context("Ollama request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Ollama response body")?;
        if !status.is_success() {
            return Err(LlmDiagnosticsError {
                provider: Provider::Ollama,
                stage: "http",
                detail: format!("status={status}"),
                raw_response_json: serde_json::from_str(&text).ok(),
                raw_output: Some(text),
            }
            .into());
        }

        let parsed = serde_json::from_str::<GenerateResponse>(&text)
            .with_context(|| format!("failed to decode Ollama response: {text}"))?;
        if parsed.response.trim().is_empty() {
            return Err(LlmDiagnosticsError {
                provider: Provider::Ollama,
                stage: "empty_response",
                detail: format!("done={}", parsed.done),
                raw_output: Some(text),
                raw_response_json: None,
            }
            .into());
        }
        Ok(parsed.response)
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.is_reachable().await,
            "Ollama server is not reachable at {}",
            self.base_url
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    done: bool,
}
