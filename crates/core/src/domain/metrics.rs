use crate::error::AnalysisError;
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exchange symbol, normalised to upper case. Join key across every component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TickerSymbol(String);

impl TickerSymbol {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let symbol = raw.trim().to_ascii_uppercase();
        ensure!(!symbol.is_empty(), "ticker must be non-empty");
        ensure!(
            symbol.len() <= 12,
            "ticker is too long ({} chars): {symbol}",
            symbol.len()
        );
        ensure!(
            symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-'),
            "ticker contains invalid characters: {symbol}"
        );
        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TickerSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TickerSymbol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TickerSymbol {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TickerSymbol> for String {
    fn from(value: TickerSymbol) -> Self {
        value.0
    }
}

/// Raw fundamentals for one ticker at one observation time, as the market-data
/// provider reported them. Any field may be absent upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub market_cap_usd: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield_pct: Option<f64>,
    pub beta: Option<f64>,
    pub revenue_usd: Option<f64>,
}

/// `FinancialMetrics` with every field present and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompleteMetrics {
    pub market_cap_usd: f64,
    pub pe_ratio: f64,
    pub dividend_yield_pct: f64,
    pub beta: f64,
    pub revenue_usd: f64,
}

impl FinancialMetrics {
    pub fn require_complete(&self) -> Result<CompleteMetrics, AnalysisError> {
        Ok(CompleteMetrics {
            market_cap_usd: require("market_cap_usd", self.market_cap_usd)?,
            pe_ratio: require("pe_ratio", self.pe_ratio)?,
            dividend_yield_pct: require("dividend_yield_pct", self.dividend_yield_pct)?,
            beta: require("beta", self.beta)?,
            revenue_usd: require("revenue_usd", self.revenue_usd)?,
        })
    }
}

fn require(field: &'static str, value: Option<f64>) -> Result<f64, AnalysisError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(AnalysisError::IncompleteMetrics { field }),
    }
}
