use crate::domain::metrics::TickerSymbol;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationLabel {
    StrongBuy,
    Buy,
    Hold,
    Sell,
}

impl RecommendationLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            RecommendationLabel::StrongBuy => "STRONG_BUY",
            RecommendationLabel::Buy => "BUY",
            RecommendationLabel::Hold => "HOLD",
            RecommendationLabel::Sell => "SELL",
        }
    }
}

impl fmt::Display for RecommendationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed output of the narrative generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitativeAssessment {
    pub score: f64,
    pub narrative: String,
    pub cited_initiatives: Vec<String>,
}

/// Final per-ticker output. Only `ScoringEngine` builds these, so the
/// weighted-sum and label invariants hold for every instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    ticker: TickerSymbol,
    quantitative_score: f64,
    qualitative_score: f64,
    overall_score: f64,
    label: RecommendationLabel,
    justification: String,
}

impl Recommendation {
    pub(crate) fn new(
        ticker: TickerSymbol,
        quantitative_score: f64,
        qualitative_score: f64,
        overall_score: f64,
        label: RecommendationLabel,
        justification: String,
    ) -> Self {
        Self {
            ticker,
            quantitative_score,
            qualitative_score,
            overall_score,
            label,
            justification,
        }
    }

    pub fn ticker(&self) -> &TickerSymbol {
        &self.ticker
    }

    pub fn quantitative_score(&self) -> f64 {
        self.quantitative_score
    }

    pub fn qualitative_score(&self) -> f64 {
        self.qualitative_score
    }

    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    pub fn label(&self) -> RecommendationLabel {
        self.label
    }

    pub fn justification(&self) -> &str {
        &self.justification
    }
}
