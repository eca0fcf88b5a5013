use crate::config::Settings;
use crate::domain::metrics::{FinancialMetrics, TickerSymbol};
use crate::ingest::types::FundamentalsResponse;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PATH: &str = "/v1/fundamentals";

/// Source of raw financial fields for a ticker.
#[async_trait::async_trait]
pub trait MetricsProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_metrics(&self, ticker: &TickerSymbol) -> Result<FinancialMetrics>;
}

#[derive(Debug, Clone)]
pub struct HttpJsonMetricsProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
}

impl HttpJsonMetricsProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_market_data_base_url()?.to_string();
        let api_key = settings.market_data_api_key.clone();

        let timeout_secs = std::env::var("MARKET_DATA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let path = std::env::var("MARKET_DATA_FUNDAMENTALS_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl MetricsProvider for HttpJsonMetricsProvider {
    fn provider_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn fetch_metrics(&self, ticker: &TickerSymbol) -> Result<FinancialMetrics> {
        let res = self
            .http
            .get(self.url())
            .headers(self.headers()?)
            .query(&[("symbol", ticker.as_str())])
            .send()
            .await
            .context("market data request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data response")?;
        if !status.is_success() {
            anyhow::bail!("market data HTTP {status}: {text}");
        }

        let parsed = serde_json::from_str::<FundamentalsResponse>(&text)
            .with_context(|| format!("market data response is not valid fundamentals JSON: {text}"))?;
        validate(&parsed, ticker)?;
        tracing::debug!(%ticker, name = ?parsed.name, "fetched fundamentals");
        Ok(parsed.into())
    }
}

fn validate(resp: &FundamentalsResponse, expected: &TickerSymbol) -> Result<()> {
    anyhow::ensure!(
        resp.symbol.trim().eq_ignore_ascii_case(expected.as_str()),
        "market data symbol mismatch: expected {expected}, got {}",
        resp.symbol
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nullable_fields() {
        let v = json!({
            "symbol": "IBM",
            "name": "International Business Machines",
            "market_cap": 2.1e11,
            "pe_ratio": 23.4,
            "dividend_yield_pct": 3.1,
            "beta": null,
            "revenue": 6.2e10
        });

        let parsed: FundamentalsResponse = serde_json::from_value(v).unwrap();
        let metrics: FinancialMetrics = parsed.into();
        assert_eq!(metrics.market_cap_usd, Some(2.1e11));
        assert_eq!(metrics.beta, None);
        assert_eq!(metrics.revenue_usd, Some(6.2e10));
    }

    #[test]
    fn absent_fields_become_none() {
        let parsed: FundamentalsResponse =
            serde_json::from_value(json!({"symbol": "AMZN", "market_cap": 1.9e12})).unwrap();
        let metrics: FinancialMetrics = parsed.into();
        assert_eq!(metrics.dividend_yield_pct, None);
        assert_eq!(metrics.pe_ratio, None);
    }

    #[test]
    fn rejects_non_numeric_fields_via_deserialize() {
        let v = json!({"symbol": "IBM", "pe_ratio": "23.4"});
        assert!(serde_json::from_value::<FundamentalsResponse>(v).is_err());
    }

    #[test]
    fn rejects_symbol_mismatch() {
        let resp: FundamentalsResponse = serde_json::from_value(json!({"symbol": "msft"})).unwrap();
        assert!(validate(&resp, &TickerSymbol::parse("MSFT").unwrap()).is_ok());
        assert!(validate(&resp, &TickerSymbol::parse("NVDA").unwrap()).is_err());
    }
}
