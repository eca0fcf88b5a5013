use crate::domain::metrics::TickerSymbol;
use crate::domain::recommendation::{QualitativeAssessment, Recommendation, RecommendationLabel};
use crate::error::AnalysisError;
use crate::scoring::quantitative::QuantitativeScore;
use crate::scoring::{check_range, MAX_SCORE, MIN_SCORE};
use serde::{Deserialize, Serialize};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Blend between the quantitative and qualitative scores. The two weights sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlendWeights")]
pub struct BlendWeights {
    quantitative: f64,
    qualitative: f64,
}

#[derive(Deserialize)]
struct RawBlendWeights {
    quantitative: f64,
    qualitative: f64,
}

impl TryFrom<RawBlendWeights> for BlendWeights {
    type Error = AnalysisError;

    fn try_from(raw: RawBlendWeights) -> Result<Self, Self::Error> {
        Self::new(raw.quantitative, raw.qualitative)
    }
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            quantitative: 0.5,
            qualitative: 0.5,
        }
    }
}

impl BlendWeights {
    pub fn new(quantitative: f64, qualitative: f64) -> Result<Self, AnalysisError> {
        let in_unit = |w: f64| w.is_finite() && (0.0..=1.0).contains(&w);
        if !in_unit(quantitative) || !in_unit(qualitative) {
            return Err(AnalysisError::InvalidConfig(format!(
                "blend weights must be within [0, 1] (got {quantitative}, {qualitative})"
            )));
        }
        if (quantitative + qualitative - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AnalysisError::InvalidConfig(format!(
                "blend weights must sum to 1 (got {quantitative} + {qualitative})"
            )));
        }
        Ok(Self {
            quantitative,
            qualitative,
        })
    }

    pub fn quantitative(&self) -> f64 {
        self.quantitative
    }

    pub fn qualitative(&self) -> f64 {
        self.qualitative
    }
}

/// Inclusive lower bounds of the STRONG_BUY, BUY and HOLD buckets. Anything
/// below `hold` is SELL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelThresholds {
    pub strong_buy: f64,
    pub buy: f64,
    pub hold: f64,
}

impl Default for LabelThresholds {
    fn default() -> Self {
        Self {
            strong_buy: 8.5,
            buy: 7.0,
            hold: 5.5,
        }
    }
}

impl LabelThresholds {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let ordered = MIN_SCORE <= self.hold
            && self.hold < self.buy
            && self.buy < self.strong_buy
            && self.strong_buy <= MAX_SCORE;
        if ordered {
            Ok(())
        } else {
            Err(AnalysisError::InvalidConfig(format!(
                "label thresholds must be strictly descending within [0, 10]: {self:?}"
            )))
        }
    }

    pub fn label_for(&self, overall_score: f64) -> RecommendationLabel {
        if overall_score >= self.strong_buy {
            RecommendationLabel::StrongBuy
        } else if overall_score >= self.buy {
            RecommendationLabel::Buy
        } else if overall_score >= self.hold {
            RecommendationLabel::Hold
        } else {
            RecommendationLabel::Sell
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    weights: BlendWeights,
    thresholds: LabelThresholds,
}

impl ScoringEngine {
    pub fn new(weights: BlendWeights, thresholds: LabelThresholds) -> Result<Self, AnalysisError> {
        thresholds.validate()?;
        Ok(Self {
            weights,
            thresholds,
        })
    }

    /// Weighted sum of the two scores. Inputs outside [0, 10] are rejected, never clamped.
    pub fn combine(&self, quantitative: f64, qualitative: f64) -> Result<f64, AnalysisError> {
        let quantitative = check_range("quantitative", quantitative)?;
        let qualitative = check_range("qualitative", qualitative)?;
        let overall =
            quantitative * self.weights.quantitative + qualitative * self.weights.qualitative;
        // Weights may sum to 1 +/- 1e-9; keep the result inside the scale.
        Ok(overall.clamp(MIN_SCORE, MAX_SCORE))
    }

    pub fn label_for(&self, overall_score: f64) -> RecommendationLabel {
        self.thresholds.label_for(overall_score)
    }

    pub fn recommend(
        &self,
        ticker: &TickerSymbol,
        quantitative: &QuantitativeScore,
        assessment: &QualitativeAssessment,
    ) -> Result<Recommendation, AnalysisError> {
        check_range("market_cap", quantitative.breakdown.market_cap)?;
        check_range("pe_ratio", quantitative.breakdown.pe_ratio)?;
        check_range("dividend_yield", quantitative.breakdown.dividend_yield)?;
        check_range("beta", quantitative.breakdown.beta)?;

        let overall = self.combine(quantitative.score, assessment.score)?;
        let label = self.label_for(overall);

        Ok(Recommendation::new(
            ticker.clone(),
            quantitative.score,
            assessment.score,
            overall,
            label,
            justification(quantitative, assessment),
        ))
    }
}

pub fn justification(quantitative: &QuantitativeScore, assessment: &QualitativeAssessment) -> String {
    let b = &quantitative.breakdown;
    let mut out = format!(
        "Quantitative {:.1}/10 (market cap {:.1}, P/E {:.1}, dividend yield {:.1}, beta {:.1}). \
         Qualitative {:.1}/10: {}",
        quantitative.score,
        b.market_cap,
        b.pe_ratio,
        b.dividend_yield,
        b.beta,
        assessment.score,
        assessment.narrative.trim(),
    );
    if !assessment.cited_initiatives.is_empty() {
        out.push_str(" Initiatives: ");
        out.push_str(&assessment.cited_initiatives.join("; "));
        out.push('.');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::quantitative::SubScores;

    fn quant(score: f64) -> QuantitativeScore {
        QuantitativeScore {
            score,
            breakdown: SubScores {
                market_cap: 10.0,
                pe_ratio: 7.0,
                dividend_yield: 5.0,
                beta: 8.0,
            },
        }
    }

    fn qual(score: f64) -> QualitativeAssessment {
        QualitativeAssessment {
            score,
            narrative: "Leading foundation models and custom accelerators.".to_string(),
            cited_initiatives: vec!["Gemini".to_string(), "TPU".to_string()],
        }
    }

    fn googl() -> TickerSymbol {
        TickerSymbol::parse("GOOGL").unwrap()
    }

    #[test]
    fn googl_example_is_strong_buy() {
        let engine = ScoringEngine::default();
        let rec = engine.recommend(&googl(), &quant(8.5), &qual(9.5)).unwrap();
        assert_eq!(rec.overall_score(), 9.0);
        assert_eq!(rec.label(), RecommendationLabel::StrongBuy);
        assert_eq!(rec.quantitative_score(), 8.5);
        assert_eq!(rec.qualitative_score(), 9.5);
        assert_eq!(rec.ticker().as_str(), "GOOGL");
    }

    #[test]
    fn hold_boundary_is_inclusive() {
        let engine = ScoringEngine::default();
        let overall = engine.combine(6.0, 5.0).unwrap();
        assert_eq!(overall, 5.5);
        assert_eq!(engine.label_for(overall), RecommendationLabel::Hold);
    }

    #[test]
    fn boundaries_resolve_upward() {
        let t = LabelThresholds::default();
        assert_eq!(t.label_for(10.0), RecommendationLabel::StrongBuy);
        assert_eq!(t.label_for(8.5), RecommendationLabel::StrongBuy);
        assert_eq!(t.label_for(8.499_999), RecommendationLabel::Buy);
        assert_eq!(t.label_for(7.0), RecommendationLabel::Buy);
        assert_eq!(t.label_for(6.999_999), RecommendationLabel::Hold);
        assert_eq!(t.label_for(5.5), RecommendationLabel::Hold);
        assert_eq!(t.label_for(5.499_999), RecommendationLabel::Sell);
        assert_eq!(t.label_for(0.0), RecommendationLabel::Sell);
    }

    #[test]
    fn label_partition_is_total_and_monotonic() {
        let t = LabelThresholds::default();
        let rank = |l: RecommendationLabel| match l {
            RecommendationLabel::Sell => 0,
            RecommendationLabel::Hold => 1,
            RecommendationLabel::Buy => 2,
            RecommendationLabel::StrongBuy => 3,
        };
        let mut prev = 0;
        for i in 0..=10_000 {
            let score = f64::from(i) / 1000.0;
            let r = rank(t.label_for(score));
            assert!(r >= prev, "label dropped at {score}");
            prev = r;
        }
        assert_eq!(prev, 3);
    }

    #[test]
    fn overall_is_exact_weighted_sum() {
        let engine =
            ScoringEngine::new(BlendWeights::new(0.4, 0.6).unwrap(), LabelThresholds::default())
                .unwrap();
        for q in 0..=20 {
            for l in 0..=20 {
                let (q, l) = (f64::from(q) / 2.0, f64::from(l) / 2.0);
                let overall = engine.combine(q, l).unwrap();
                assert!((overall - (q * 0.4 + l * 0.6)).abs() <= 1e-9);
                assert!((0.0..=10.0).contains(&overall));
            }
        }
    }

    #[test]
    fn out_of_range_inputs_are_rejected_not_clamped() {
        let engine = ScoringEngine::default();
        match engine.recommend(&googl(), &quant(8.0), &qual(11.0)) {
            Err(AnalysisError::ScoreOutOfRange { name, value }) => {
                assert_eq!(name, "qualitative");
                assert_eq!(value, 11.0);
            }
            other => panic!("expected ScoreOutOfRange, got {other:?}"),
        }
        assert!(engine.combine(-0.1, 5.0).is_err());
        assert!(engine.combine(5.0, f64::NAN).is_err());
    }

    #[test]
    fn out_of_range_sub_score_is_rejected() {
        let engine = ScoringEngine::default();
        let mut q = quant(8.0);
        q.breakdown.beta = 12.0;
        assert!(matches!(
            engine.recommend(&googl(), &q, &qual(5.0)),
            Err(AnalysisError::ScoreOutOfRange { name: "beta", .. })
        ));
    }

    #[test]
    fn blend_weights_must_sum_to_one() {
        assert!(BlendWeights::new(0.5, 0.6).is_err());
        assert!(BlendWeights::new(-0.5, 1.5).is_err());
        assert!(BlendWeights::new(1.0, 0.0).is_ok());
        let w: BlendWeights =
            serde_json::from_value(serde_json::json!({"quantitative": 0.3, "qualitative": 0.7}))
                .unwrap();
        assert_eq!(w.quantitative(), 0.3);
        assert!(serde_json::from_value::<BlendWeights>(
            serde_json::json!({"quantitative": 0.3, "qualitative": 0.3})
        )
        .is_err());
    }

    #[test]
    fn thresholds_must_descend() {
        let bad = LabelThresholds {
            strong_buy: 7.0,
            buy: 7.0,
            hold: 5.5,
        };
        assert!(ScoringEngine::new(BlendWeights::default(), bad).is_err());
    }

    #[test]
    fn justification_cites_breakdown_and_narrative() {
        let text = justification(&quant(8.5), &qual(9.5));
        assert!(text.starts_with("Quantitative 8.5/10 (market cap 10.0, P/E 7.0"));
        assert!(text.contains("Qualitative 9.5/10: Leading foundation models"));
        assert!(text.ends_with("Initiatives: Gemini; TPU."));
    }
}
