//! Per-ticker analysis: metrics -> quantitative score, retrieve -> prompt ->
//! generate -> parse -> qualitative score, then blend into a `Recommendation`.

use crate::config::{non_empty_var, parse_var, Settings};
use crate::domain::metrics::{FinancialMetrics, TickerSymbol};
use crate::domain::recommendation::{QualitativeAssessment, Recommendation};
use crate::error::{AnalysisError, ServiceKind};
use crate::ingest::provider::{HttpJsonMetricsProvider, MetricsProvider};
use crate::llm::{self, json, TextGenerator};
use crate::prompt::{self, QueryBuilder, DEFAULT_INSTRUCTION_TEMPLATE};
use crate::retrieval::http::HttpVectorRetriever;
use crate::retrieval::PassageRetriever;
use crate::scoring::engine::{BlendWeights, LabelThresholds, ScoringEngine};
use crate::scoring::quantitative::{FactorWeights, QuantitativeScorer};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_TOP_K: usize = 8;
const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Read-only settings for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub weights: BlendWeights,
    pub top_k: usize,
    pub timeout_ms: u64,
    pub instruction_template: String,
    /// Fail with `NoContextAvailable` instead of generating without passages.
    pub require_context: bool,
    pub factor_weights: FactorWeights,
    pub thresholds: LabelThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            weights: BlendWeights::default(),
            top_k: DEFAULT_TOP_K,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            instruction_template: DEFAULT_INSTRUCTION_TEMPLATE.to_string(),
            require_context: false,
            factor_weights: FactorWeights::default(),
            thresholds: LabelThresholds::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut out = Self::default();

        let quantitative = parse_var::<f64>("SCORE_WEIGHT_QUANTITATIVE")?;
        let qualitative = parse_var::<f64>("SCORE_WEIGHT_QUALITATIVE")?;
        out.weights = match (quantitative, qualitative) {
            (Some(q), Some(l)) => BlendWeights::new(q, l)?,
            (Some(q), None) => BlendWeights::new(q, 1.0 - q)?,
            (None, Some(l)) => BlendWeights::new(1.0 - l, l)?,
            (None, None) => out.weights,
        };

        if let Some(n) = parse_var::<usize>("RAG_TOP_K")? {
            out.top_k = n;
        }
        if let Some(ms) = parse_var::<u64>("ANALYSIS_TIMEOUT_MS")? {
            out.timeout_ms = ms;
        }
        if let Some(flag) = parse_var::<bool>("REQUIRE_CONTEXT")? {
            out.require_context = flag;
        }
        if let Some(path) = non_empty_var("INSTRUCTION_TEMPLATE_PATH") {
            out.instruction_template = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read instruction template {path}"))?;
        }

        out.validate()?;
        Ok(out)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.top_k == 0 {
            return Err(AnalysisError::InvalidConfig("top_k must be >= 1".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(AnalysisError::InvalidConfig(
                "timeout_ms must be >= 1".to_string(),
            ));
        }
        if self.instruction_template.trim().is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "instruction template must be non-empty".to_string(),
            ));
        }
        self.factor_weights.validate()?;
        self.thresholds.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TickerFailure {
    pub ticker: TickerSymbol,
    pub kind: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl TickerFailure {
    fn new(ticker: TickerSymbol, err: &AnalysisError) -> Self {
        Self {
            ticker,
            kind: err.kind(),
            message: err.describe(),
            retryable: err.is_retryable(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Best overall score first.
    pub recommendations: Vec<Recommendation>,
    pub failures: Vec<TickerFailure>,
}

pub struct Analyzer {
    metrics: Arc<dyn MetricsProvider>,
    retriever: Arc<dyn PassageRetriever>,
    generator: Arc<dyn TextGenerator>,
}

impl Analyzer {
    pub fn new(
        metrics: Arc<dyn MetricsProvider>,
        retriever: Arc<dyn PassageRetriever>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            metrics,
            retriever,
            generator,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::new(
            Arc::new(HttpJsonMetricsProvider::from_settings(settings)?),
            Arc::new(HttpVectorRetriever::from_settings(settings)?),
            llm::build_generator(settings)?,
        ))
    }

    pub async fn check_generator(&self) -> anyhow::Result<()> {
        self.generator.health_check().await
    }

    pub async fn fetch_metrics(
        &self,
        ticker: &TickerSymbol,
        config: &AnalysisConfig,
    ) -> Result<FinancialMetrics, AnalysisError> {
        fetch_metrics(self.metrics.as_ref(), ticker, config.timeout_ms).await
    }

    /// Retrieve, prompt, generate and parse. Strictly sequential.
    pub async fn assess(
        &self,
        ticker: &TickerSymbol,
        config: &AnalysisConfig,
    ) -> Result<QualitativeAssessment, AnalysisError> {
        let query = prompt::retrieval_query(ticker);
        let passages = within_deadline(
            ticker,
            ServiceKind::Retrieval,
            config.timeout_ms,
            self.retriever
                .retrieve_passages(ticker, &query, config.top_k),
        )
        .await?
        .map_err(|source| AnalysisError::Retrieval {
            ticker: ticker.clone(),
            source,
        })?;

        let built = QueryBuilder::new(&config.instruction_template).build(ticker, &passages);
        if built.no_context_available {
            if config.require_context {
                return Err(AnalysisError::NoContextAvailable {
                    ticker: ticker.clone(),
                });
            }
            tracing::warn!(%ticker, "no context passages retrieved; generating without context");
        }

        let text = within_deadline(
            ticker,
            ServiceKind::Generation,
            config.timeout_ms,
            self.generator.generate_text(&built.text),
        )
        .await?
        .map_err(|source| AnalysisError::Generation {
            ticker: ticker.clone(),
            source,
        })?;

        json::parse_assessment(&text).map_err(|source| AnalysisError::Generation {
            ticker: ticker.clone(),
            source: source.context("unparseable generator output"),
        })
    }

    pub async fn analyze(
        &self,
        ticker: &TickerSymbol,
        config: &AnalysisConfig,
    ) -> Result<Recommendation, AnalysisError> {
        config.validate()?;
        let scorer = QuantitativeScorer::new(config.factor_weights)?;
        let engine = ScoringEngine::new(config.weights, config.thresholds)?;

        tracing::info!(%ticker, provider = %self.generator.provider(), "analysis started");

        let metrics = self.fetch_metrics(ticker, config).await?;
        // Score before generating so incomplete metrics never cost a generation call.
        let quantitative = scorer.score(&metrics)?;
        let assessment = self.assess(ticker, config).await?;
        let rec = engine.recommend(ticker, &quantitative, &assessment)?;

        tracing::info!(
            %ticker,
            quantitative = rec.quantitative_score(),
            qualitative = rec.qualitative_score(),
            overall = rec.overall_score(),
            label = %rec.label(),
            "analysis complete"
        );
        Ok(rec)
    }

    /// Analyses every ticker in turn. One ticker's failure is recorded and
    /// does not stop the rest. Only an invalid config fails the whole batch.
    pub async fn analyze_batch(
        &self,
        tickers: &[TickerSymbol],
        config: &AnalysisConfig,
        top_n: Option<usize>,
    ) -> Result<BatchReport, AnalysisError> {
        config.validate()?;

        let run_id = Uuid::new_v4();
        let mut recommendations = Vec::with_capacity(tickers.len());
        let mut failures = Vec::new();

        for ticker in tickers {
            match self.analyze(ticker, config).await {
                Ok(rec) => recommendations.push(rec),
                Err(err) => {
                    tracing::warn!(%run_id, %ticker, kind = err.kind(), error = %err.describe(), "ticker analysis failed");
                    failures.push(TickerFailure::new(ticker.clone(), &err));
                }
            }
        }

        recommendations.sort_by(|a, b| b.overall_score().total_cmp(&a.overall_score()));
        if let Some(n) = top_n {
            recommendations.truncate(n);
        }

        tracing::info!(
            %run_id,
            succeeded = recommendations.len(),
            failed = failures.len(),
            "batch analysis complete"
        );

        Ok(BatchReport {
            run_id,
            generated_at: Utc::now(),
            recommendations,
            failures,
        })
    }
}

/// One metrics lookup under the run deadline. Needs no retriever or generator,
/// so screening works with market data alone.
pub async fn fetch_metrics(
    provider: &dyn MetricsProvider,
    ticker: &TickerSymbol,
    timeout_ms: u64,
) -> Result<FinancialMetrics, AnalysisError> {
    tracing::debug!(%ticker, provider = provider.provider_name(), "fetching metrics");
    within_deadline(
        ticker,
        ServiceKind::MarketData,
        timeout_ms,
        provider.fetch_metrics(ticker),
    )
    .await?
    .map_err(|source| AnalysisError::Provider {
        ticker: ticker.clone(),
        source,
    })
}

async fn within_deadline<T, F>(
    ticker: &TickerSymbol,
    service: ServiceKind,
    timeout_ms: u64,
    fut: F,
) -> Result<anyhow::Result<T>, AnalysisError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    tokio::time::timeout(Duration::from_millis(timeout_ms), fut)
        .await
        .map_err(|_| AnalysisError::ExternalServiceTimeout {
            ticker: ticker.clone(),
            service,
            timeout_ms,
        })
}
