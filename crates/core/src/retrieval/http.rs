use crate::config::Settings;
use crate::domain::metrics::TickerSymbol;
use crate::domain::passage::RetrievedPassage;
use crate::retrieval::PassageRetriever;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const SEARCH_PATH: &str = "/v1/search";

/// Similarity search against a vector index served over HTTP. Hits are passed
/// through in the order the index ranked them.
#[derive(Debug, Clone)]
pub struct HttpVectorRetriever {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpVectorRetriever {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_vector_index_base_url()?.to_string();

        let timeout_secs = std::env::var("VECTOR_INDEX_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build vector index http client")?;

        Ok(Self {
            http,
            base_url,
            api_key: settings.vector_index_api_key.clone(),
        })
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
impl PassageRetriever for HttpVectorRetriever {
    async fn retrieve_passages(
        &self,
        ticker: &TickerSymbol,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), SEARCH_PATH);
        let req = SearchRequest {
            query,
            k: top_k,
            filter: SearchFilter {
                ticker: ticker.as_str(),
            },
        };

        let res = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(&req)
            .send()
            .await
            .context("vector index request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read vector index response")?;
        if !status.is_success() {
            anyhow::bail!("vector index HTTP {status}: {text}");
        }

        let parsed = serde_json::from_str::<SearchResponse>(&text)
            .with_context(|| format!("vector index response is not valid search JSON: {text}"))?;
        Ok(into_passages(parsed, top_k))
    }
}

fn into_passages(resp: SearchResponse, top_k: usize) -> Vec<RetrievedPassage> {
    resp.hits
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(rank, hit)| RetrievedPassage {
            source_document: hit.source,
            text: hit.text,
            relevance_rank: rank as u32,
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    k: usize,
    filter: SearchFilter<'a>,
}

#[derive(Debug, Serialize)]
struct SearchFilter<'a> {
    ticker: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    source: String,
    text: String,
}
