pub mod analysis;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod prompt;
pub mod retrieval;
pub mod scoring;

pub mod config {
    use anyhow::Context;

    const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
    const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-latest";
    const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
    const DEFAULT_OLLAMA_MODEL: &str = "phi3:mini";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub llm_provider: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub anthropic_base_url: String,
        pub anthropic_model: String,
        pub ollama_base_url: String,
        pub ollama_model: String,
        pub market_data_base_url: Option<String>,
        pub market_data_api_key: Option<String>,
        pub vector_index_base_url: Option<String>,
        pub vector_index_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                llm_provider: non_empty_var("LLM_PROVIDER"),
                anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
                anthropic_base_url: non_empty_var("ANTHROPIC_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
                anthropic_model: non_empty_var("ANTHROPIC_MODEL")
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
                ollama_base_url: non_empty_var("OLLAMA_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string()),
                ollama_model: non_empty_var("OLLAMA_MODEL")
                    .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
                market_data_base_url: non_empty_var("MARKET_DATA_BASE_URL"),
                market_data_api_key: non_empty_var("MARKET_DATA_API_KEY"),
                vector_index_base_url: non_empty_var("VECTOR_INDEX_BASE_URL"),
                vector_index_api_key: non_empty_var("VECTOR_INDEX_API_KEY"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        pub fn require_market_data_base_url(&self) -> anyhow::Result<&str> {
            self.market_data_base_url
                .as_deref()
                .context("MARKET_DATA_BASE_URL is required")
        }

        pub fn require_vector_index_base_url(&self) -> anyhow::Result<&str> {
            self.vector_index_base_url
                .as_deref()
                .context("VECTOR_INDEX_BASE_URL is required")
        }
    }

    pub(crate) fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Parses an optional numeric env var; a present but malformed value is an error.
    pub(crate) fn parse_var<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match non_empty_var(key) {
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| anyhow::anyhow!("{key}={raw:?} is invalid: {e}")),
            None => Ok(None),
        }
    }
}
