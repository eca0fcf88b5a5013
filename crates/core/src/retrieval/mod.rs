pub mod http;

use crate::domain::metrics::TickerSymbol;
use crate::domain::passage::RetrievedPassage;

/// External document index. Returns at most `top_k` passages, best match first.
#[async_trait::async_trait]
pub trait PassageRetriever: Send + Sync {
    async fn retrieve_passages(
        &self,
        ticker: &TickerSymbol,
        query: &str,
        top_k: usize,
    ) -> anyhow::Result<Vec<RetrievedPassage>>;
}
