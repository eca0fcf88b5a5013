use crate::domain::metrics::TickerSymbol;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// External collaborator an adapter call was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    MarketData,
    Retrieval,
    Generation,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceKind::MarketData => "market data",
            ServiceKind::Retrieval => "retrieval",
            ServiceKind::Generation => "generation",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("incomplete financial metrics: `{field}` is missing or not finite")]
    IncompleteMetrics { field: &'static str },

    #[error("score out of range: {name}={value} (expected 0..=10)")]
    ScoreOutOfRange { name: &'static str, value: f64 },

    #[error("{service} call for {ticker} exceeded {timeout_ms} ms")]
    ExternalServiceTimeout {
        ticker: TickerSymbol,
        service: ServiceKind,
        timeout_ms: u64,
    },

    #[error("market data provider failed for {ticker}")]
    Provider {
        ticker: TickerSymbol,
        #[source]
        source: anyhow::Error,
    },

    #[error("passage retrieval failed for {ticker}")]
    Retrieval {
        ticker: TickerSymbol,
        #[source]
        source: anyhow::Error,
    },

    #[error("text generation failed for {ticker}")]
    Generation {
        ticker: TickerSymbol,
        #[source]
        source: anyhow::Error,
    },

    #[error("no context passages were retrieved for {ticker}")]
    NoContextAvailable { ticker: TickerSymbol },

    #[error("invalid analysis config: {0}")]
    InvalidConfig(String),
}

impl AnalysisError {
    /// Stable machine-readable name, used in batch reports and API bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::IncompleteMetrics { .. } => "incomplete_metrics",
            AnalysisError::ScoreOutOfRange { .. } => "score_out_of_range",
            AnalysisError::ExternalServiceTimeout { .. } => "external_service_timeout",
            AnalysisError::Provider { .. } => "provider_error",
            AnalysisError::Retrieval { .. } => "retrieval_error",
            AnalysisError::Generation { .. } => "generation_error",
            AnalysisError::NoContextAvailable { .. } => "no_context_available",
            AnalysisError::InvalidConfig(_) => "invalid_config",
        }
    }

    /// Only deadline overruns are worth a caller-side retry; the core never retries itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnalysisError::ExternalServiceTimeout { .. })
    }

    /// Display of the error followed by its source chain, `a: b: c`.
    pub fn describe(&self) -> String {
        let mut out = self.to_string();
        let mut cur = std::error::Error::source(self);
        while let Some(err) = cur {
            out.push_str(": ");
            out.push_str(&err.to_string());
            cur = std::error::Error::source(err);
        }
        out
    }
}
