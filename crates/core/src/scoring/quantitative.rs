use crate::domain::metrics::FinancialMetrics;
use crate::error::AnalysisError;
use crate::scoring::check_range;
use serde::{Deserialize, Serialize};

// (lower bound, sub-score); first bound the value reaches wins.
const MARKET_CAP_TIERS: &[(f64, f64)] = &[
    (1.0e12, 10.0),
    (5.0e11, 9.0),
    (2.0e11, 8.0),
    (1.0e11, 7.0),
    (5.0e10, 6.0),
    (1.0e10, 5.0),
    (2.0e9, 4.0),
];
const MARKET_CAP_FLOOR: f64 = 2.0;

// (upper bound inclusive, sub-score)
const BETA_TIERS: &[(f64, f64)] = &[(0.8, 10.0), (1.0, 8.0), (1.2, 7.0), (1.5, 5.0), (2.0, 3.0)];
const BETA_FLOOR: f64 = 1.0;

const PE_FAIR_LOW: f64 = 15.0;
const PE_FAIR_HIGH: f64 = 25.0;

/// Relative importance of the four factors. Normalised by their sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub market_cap: f64,
    pub pe_ratio: f64,
    pub dividend_yield: f64,
    pub beta: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            market_cap: 1.0,
            pe_ratio: 1.0,
            dividend_yield: 1.0,
            beta: 1.0,
        }
    }
}

impl FactorWeights {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let all = [self.market_cap, self.pe_ratio, self.dividend_yield, self.beta];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "factor weights must be finite and non-negative: {self:?}"
            )));
        }
        if self.total() <= 0.0 {
            return Err(AnalysisError::InvalidConfig(
                "factor weights must not all be zero".to_string(),
            ));
        }
        Ok(())
    }

    fn total(&self) -> f64 {
        self.market_cap + self.pe_ratio + self.dividend_yield + self.beta
    }
}

/// Per-factor sub-scores, each in [0, 10].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubScores {
    pub market_cap: f64,
    pub pe_ratio: f64,
    pub dividend_yield: f64,
    pub beta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantitativeScore {
    pub score: f64,
    pub breakdown: SubScores,
}

#[derive(Debug, Clone)]
pub struct QuantitativeScorer {
    weights: FactorWeights,
}

impl Default for QuantitativeScorer {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
        }
    }
}

impl QuantitativeScorer {
    pub fn new(weights: FactorWeights) -> Result<Self, AnalysisError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn score(&self, metrics: &FinancialMetrics) -> Result<QuantitativeScore, AnalysisError> {
        let m = metrics.require_complete()?;

        let breakdown = SubScores {
            market_cap: market_cap_tier(m.market_cap_usd),
            pe_ratio: pe_ratio_tier(m.pe_ratio),
            dividend_yield: dividend_yield_tier(m.dividend_yield_pct),
            beta: beta_tier(m.beta),
        };

        let w = &self.weights;
        let weighted = breakdown.market_cap * w.market_cap
            + breakdown.pe_ratio * w.pe_ratio
            + breakdown.dividend_yield * w.dividend_yield
            + breakdown.beta * w.beta;
        let score = check_range("quantitative", weighted / w.total())?;

        Ok(QuantitativeScore { score, breakdown })
    }
}

/// Larger companies score higher, capped at 10 from $1T.
pub fn market_cap_tier(market_cap_usd: f64) -> f64 {
    MARKET_CAP_TIERS
        .iter()
        .find(|(bound, _)| market_cap_usd >= *bound)
        .map_or(MARKET_CAP_FLOOR, |(_, s)| *s)
}

/// Highest inside the 15..=25 fair-value band, falling off with distance.
/// Non-positive P/E means no earnings.
pub fn pe_ratio_tier(pe: f64) -> f64 {
    if pe <= 0.0 {
        return 2.0;
    }
    let distance = if pe < PE_FAIR_LOW {
        PE_FAIR_LOW - pe
    } else if pe > PE_FAIR_HIGH {
        pe - PE_FAIR_HIGH
    } else {
        0.0
    };
    // The band is asymmetric: 5 points below is as bad as 10 points above.
    let scaled = if pe < PE_FAIR_LOW { distance * 2.0 } else { distance };
    match scaled {
        d if d <= 0.0 => 10.0,
        d if d <= 10.0 => 7.0,
        d if d <= 25.0 => 5.0,
        _ => 3.0,
    }
}

/// Moderate yields (1-3%) score highest; no dividend and very high yields score low.
pub fn dividend_yield_tier(yield_pct: f64) -> f64 {
    match yield_pct {
        y if y <= 0.0 => 4.0,
        y if y < 0.5 => 5.0,
        y if y < 1.0 => 7.0,
        y if y <= 3.0 => 10.0,
        y if y <= 5.0 => 7.0,
        y if y <= 8.0 => 5.0,
        _ => 3.0,
    }
}

/// Lower volatility scores higher.
pub fn beta_tier(beta: f64) -> f64 {
    BETA_TIERS
        .iter()
        .find(|(bound, _)| beta <= *bound)
        .map_or(BETA_FLOOR, |(_, s)| *s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(cap: f64, pe: f64, dy: f64, beta: f64) -> FinancialMetrics {
        FinancialMetrics {
            market_cap_usd: Some(cap),
            pe_ratio: Some(pe),
            dividend_yield_pct: Some(dy),
            beta: Some(beta),
            revenue_usd: Some(1.0e11),
        }
    }

    #[test]
    fn equal_weights_average_sub_scores() {
        let scorer = QuantitativeScorer::default();
        let out = scorer.score(&metrics(2.0e12, 20.0, 2.0, 0.7)).unwrap();
        assert_eq!(out.breakdown.market_cap, 10.0);
        assert_eq!(out.breakdown.pe_ratio, 10.0);
        assert_eq!(out.breakdown.dividend_yield, 10.0);
        assert_eq!(out.breakdown.beta, 10.0);
        assert_eq!(out.score, 10.0);

        let out = scorer.score(&metrics(6.0e11, 30.0, 0.0, 1.1)).unwrap();
        // 9 + 7 + 4 + 7 = 27 / 4
        assert!((out.score - 6.75).abs() < 1e-12);
    }

    #[test]
    fn skewed_weights_shift_the_score() {
        let scorer = QuantitativeScorer::new(FactorWeights {
            market_cap: 3.0,
            pe_ratio: 1.0,
            dividend_yield: 0.0,
            beta: 0.0,
        })
        .unwrap();
        let out = scorer.score(&metrics(2.0e12, 60.0, 0.0, 3.0)).unwrap();
        // (10 * 3 + 3 * 1) / 4
        assert!((out.score - 8.25).abs() < 1e-12);
    }

    #[test]
    fn score_stays_in_range_across_extremes() {
        let scorer = QuantitativeScorer::default();
        let caps = [-1.0, 0.0, 1.0e9, 7.5e10, 3.0e12, f64::MAX];
        let pes = [-40.0, 0.0, 3.0, 14.9, 15.0, 25.0, 40.0, 1.0e6];
        let yields = [-1.0, 0.0, 0.2, 0.7, 3.0, 6.0, 25.0];
        let betas = [-0.5, 0.8, 1.3, 1.9, 5.0];
        for &c in &caps {
            for &p in &pes {
                for &y in &yields {
                    for &b in &betas {
                        let s = scorer.score(&metrics(c, p, y, b)).unwrap().score;
                        assert!((0.0..=10.0).contains(&s), "{c} {p} {y} {b} -> {s}");
                    }
                }
            }
        }
    }

    #[test]
    fn tiers_are_monotonic() {
        assert!(market_cap_tier(1.0e12) > market_cap_tier(4.0e11));
        assert!(market_cap_tier(4.0e11) > market_cap_tier(1.0e9));
        assert!(beta_tier(0.5) > beta_tier(1.1));
        assert!(beta_tier(1.1) > beta_tier(2.5));
        assert!(pe_ratio_tier(20.0) > pe_ratio_tier(30.0));
        assert!(pe_ratio_tier(30.0) > pe_ratio_tier(45.0));
        assert!(pe_ratio_tier(45.0) > pe_ratio_tier(80.0));
        assert!(pe_ratio_tier(12.0) > pe_ratio_tier(6.0));
        assert!(dividend_yield_tier(2.0) > dividend_yield_tier(4.0));
        assert!(dividend_yield_tier(4.0) > dividend_yield_tier(12.0));
    }

    #[test]
    fn missing_beta_is_reported_by_name() {
        let mut m = metrics(2.0e12, 20.0, 2.0, 0.7);
        m.beta = None;
        match QuantitativeScorer::default().score(&m) {
            Err(AnalysisError::IncompleteMetrics { field }) => assert_eq!(field, "beta"),
            other => panic!("expected IncompleteMetrics, got {other:?}"),
        }
    }

    #[test]
    fn missing_revenue_is_reported_even_though_unscored() {
        let mut m = metrics(2.0e12, 20.0, 2.0, 0.7);
        m.revenue_usd = Some(f64::INFINITY);
        assert!(matches!(
            QuantitativeScorer::default().score(&m),
            Err(AnalysisError::IncompleteMetrics { field: "revenue_usd" })
        ));
    }

    #[test]
    fn rejects_invalid_weights() {
        assert!(QuantitativeScorer::new(FactorWeights {
            market_cap: 0.0,
            pe_ratio: 0.0,
            dividend_yield: 0.0,
            beta: 0.0,
        })
        .is_err());
        assert!(QuantitativeScorer::new(FactorWeights {
            market_cap: -1.0,
            ..FactorWeights::default()
        })
        .is_err());
    }
}
