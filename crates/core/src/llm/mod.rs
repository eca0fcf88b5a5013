pub mod anthropic;
pub mod error;
pub mod json;
pub mod ollama;

use crate::config::Settings;
use anyhow::bail;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    Ollama,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Anthropic => f.write_str("anthropic"),
            Provider::Ollama => f.write_str("ollama"),
        }
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Provider::Anthropic),
            "ollama" => Ok(Provider::Ollama),
            other => bail!("unknown LLM_PROVIDER: {other} (expected anthropic or ollama)"),
        }
    }
}

/// Hosted text-generation service. Takes a fully assembled prompt and
/// returns the raw completion text.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate_text(&self, prompt: &str) -> anyhow::Result<String>;

    /// Cheap reachability probe; services without one are assumed up.
    async fn health_check(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

pub fn build_generator(settings: &Settings) -> anyhow::Result<Arc<dyn TextGenerator>> {
    let provider = match settings.llm_provider.as_deref() {
        Some(s) => s.parse::<Provider>()?,
        None => Provider::Ollama,
    };
    tracing::debug!(%provider, "building text generator");
    Ok(match provider {
        Provider::Anthropic => Arc::new(anthropic::AnthropicClient::from_settings(settings)?),
        Provider::Ollama => Arc::new(ollama::OllamaClient::from_settings(settings)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("Anthropic".parse::<Provider>().unwrap(), Provider::Anthropic);
        assert_eq!(" ollama ".parse::<Provider>().unwrap(), Provider::Ollama);
        assert!("openai".parse::<Provider>().is_err());
    }
}
