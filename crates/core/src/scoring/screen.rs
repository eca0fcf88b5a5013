use crate::domain::metrics::{CompleteMetrics, FinancialMetrics, TickerSymbol};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenCriteria {
    pub max_pe: f64,
    pub min_market_cap_usd: f64,
}

impl Default for ScreenCriteria {
    fn default() -> Self {
        Self {
            max_pe: 50.0,
            min_market_cap_usd: 10.0e9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenedTicker {
    pub ticker: TickerSymbol,
    pub metrics: CompleteMetrics,
}

/// Basic quality filter: profitable (0 < P/E <= max), large enough, and with
/// complete metrics. Largest market cap first.
pub fn screen(
    rows: impl IntoIterator<Item = (TickerSymbol, FinancialMetrics)>,
    criteria: &ScreenCriteria,
) -> Vec<ScreenedTicker> {
    let mut out: Vec<ScreenedTicker> = rows
        .into_iter()
        .filter_map(|(ticker, metrics)| {
            let metrics = metrics.require_complete().ok()?;
            let passes = metrics.pe_ratio > 0.0
                && metrics.pe_ratio <= criteria.max_pe
                && metrics.market_cap_usd >= criteria.min_market_cap_usd;
            passes.then_some(ScreenedTicker { ticker, metrics })
        })
        .collect();

    out.sort_by(|a, b| {
        b.metrics
            .market_cap_usd
            .total_cmp(&a.metrics.market_cap_usd)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
    out
}
