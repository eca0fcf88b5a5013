use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duallens_core::analysis::{AnalysisConfig, Analyzer, BatchReport};
use duallens_core::domain::metrics::TickerSymbol;
use duallens_core::domain::recommendation::Recommendation;
use duallens_core::error::AnalysisError;

const MAX_BATCH_TICKERS: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = duallens_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let config = AnalysisConfig::from_env()?;
    let analyzer: Option<Arc<Analyzer>> = match Analyzer::from_settings(&settings) {
        Ok(analyzer) => Some(Arc::new(analyzer)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "analyzer setup failed; starting API in degraded mode");
            None
        }
    };

    let state = AppState {
        analyzer,
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/recommendations", post(post_recommendations))
        .route("/recommendations/:ticker", get(get_recommendation))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    analyzer: Option<Arc<Analyzer>>,
    config: Arc<AnalysisConfig>,
}

#[derive(Debug, Serialize)]
struct ApiError {
    kind: &'static str,
    message: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn status_for(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        AnalysisError::IncompleteMetrics { .. }
        | AnalysisError::ScoreOutOfRange { .. }
        | AnalysisError::Generation { .. }
        | AnalysisError::NoContextAvailable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisError::ExternalServiceTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        AnalysisError::Provider { .. } | AnalysisError::Retrieval { .. } => StatusCode::BAD_GATEWAY,
    }
}

fn analysis_failure(err: AnalysisError) -> (StatusCode, Json<ApiError>) {
    let status = status_for(&err);
    if matches!(err, AnalysisError::ScoreOutOfRange { .. }) {
        // Out-of-range scores mean a bug upstream, not bad input.
        sentry::capture_error(&err);
    }
    tracing::warn!(kind = err.kind(), error = %err.describe(), "analysis request failed");
    (
        status,
        Json(ApiError {
            kind: err.kind(),
            message: err.describe(),
        }),
    )
}

fn bad_request(message: String) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            kind: "bad_request",
            message,
        }),
    )
}

fn unavailable() -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiError {
            kind: "unavailable",
            message: "analyzer is not configured".to_string(),
        }),
    )
}

async fn readyz(State(state): State<AppState>) -> StatusCode {
    let Some(analyzer) = &state.analyzer else {
        return StatusCode::SERVICE_UNAVAILABLE;
    };
    match analyzer.check_generator().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "generator not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn get_recommendation(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> ApiResult<Recommendation> {
    let Some(analyzer) = &state.analyzer else {
        return Err(unavailable());
    };

    let ticker = TickerSymbol::parse(&ticker).map_err(|e| bad_request(format!("{e:#}")))?;
    let rec = analyzer
        .analyze(&ticker, &state.config)
        .await
        .map_err(analysis_failure)?;
    Ok(Json(rec))
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    tickers: Vec<String>,
    #[serde(default)]
    top_n: Option<usize>,
}

async fn post_recommendations(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> ApiResult<BatchReport> {
    let Some(analyzer) = &state.analyzer else {
        return Err(unavailable());
    };

    let tickers = parse_tickers(&req.tickers).map_err(bad_request)?;
    let report = analyzer
        .analyze_batch(&tickers, &state.config, req.top_n)
        .await
        .map_err(analysis_failure)?;
    Ok(Json(report))
}

fn parse_tickers(raw: &[String]) -> Result<Vec<TickerSymbol>, String> {
    if raw.is_empty() {
        return Err("tickers must be non-empty".to_string());
    }
    if raw.len() > MAX_BATCH_TICKERS {
        return Err(format!(
            "at most {MAX_BATCH_TICKERS} tickers per request (got {})",
            raw.len()
        ));
    }
    raw.iter()
        .map(|s| TickerSymbol::parse(s).map_err(|e| format!("{e:#}")))
        .collect()
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &duallens_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        let t = TickerSymbol::parse("GOOGL").unwrap();
        assert_eq!(
            status_for(&AnalysisError::IncompleteMetrics { field: "beta" }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&AnalysisError::ExternalServiceTimeout {
                ticker: t.clone(),
                service: duallens_core::error::ServiceKind::Retrieval,
                timeout_ms: 5,
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&AnalysisError::Provider {
                ticker: t,
                source: anyhow::anyhow!("down"),
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&AnalysisError::InvalidConfig("x".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn parse_tickers_validates_batch() {
        assert!(parse_tickers(&[]).is_err());
        assert!(parse_tickers(&["GO OG".to_string()]).is_err());
        let many: Vec<String> = (0..=MAX_BATCH_TICKERS).map(|i| format!("T{i}")).collect();
        assert!(parse_tickers(&many).is_err());
        let ok = parse_tickers(&["googl".to_string(), "msft".to_string()]).unwrap();
        assert_eq!(ok[0].as_str(), "GOOGL");
    }
}
