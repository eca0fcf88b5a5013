use crate::domain::metrics::FinancialMetrics;
use serde::{Deserialize, Serialize};

/// Wire shape of the market-data provider's fundamentals endpoint. Numeric
/// fields may be null or absent; completeness is checked by the scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalsResponse {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    #[serde(default)]
    pub dividend_yield_pct: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default)]
    pub revenue: Option<f64>,
}

impl From<FundamentalsResponse> for FinancialMetrics {
    fn from(r: FundamentalsResponse) -> Self {
        Self {
            market_cap_usd: r.market_cap,
            pe_ratio: r.pe_ratio,
            dividend_yield_pct: r.dividend_yield_pct,
            beta: r.beta,
            revenue_usd: r.revenue,
        }
    }
}
