use crate::domain::recommendation::QualitativeAssessment;
use anyhow::ensure;
use serde::{Deserialize, Serialize};

/// JSON shape a generator may answer with instead of the labelled-line format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmAssessment {
    #[serde(alias = "qualitative_score")]
    pub score: f64,
    #[serde(alias = "justification")]
    pub narrative: String,
    #[serde(default, alias = "cited_initiatives")]
    pub initiatives: Vec<String>,
}

impl LlmAssessment {
    pub fn validate_and_into_assessment(self) -> anyhow::Result<QualitativeAssessment> {
        ensure!(
            self.score.is_finite() && (0.0..=10.0).contains(&self.score),
            "qualitative score must be between 0 and 10 (got {})",
            self.score
        );

        let narrative = self.narrative.trim().to_string();
        ensure!(!narrative.is_empty(), "narrative must be non-empty");

        let cited_initiatives = self
            .initiatives
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(QualitativeAssessment {
            score: self.score,
            narrative,
            cited_initiatives,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_aliases_and_trims() {
        let raw = json!({
            "qualitative_score": 9.5,
            "justification": "  Strong AI platform.  ",
            "cited_initiatives": ["Gemini", "  ", "TPU v5"],
        });
        let parsed: LlmAssessment = serde_json::from_value(raw).unwrap();
        let a = parsed.validate_and_into_assessment().unwrap();
        assert_eq!(a.score, 9.5);
        assert_eq!(a.narrative, "Strong AI platform.");
        assert_eq!(a.cited_initiatives, vec!["Gemini", "TPU v5"]);
    }

    #[test]
    fn rejects_out_of_range_score() {
        let parsed = LlmAssessment {
            score: 11.0,
            narrative: "x".to_string(),
            initiatives: vec![],
        };
        assert!(parsed.validate_and_into_assessment().is_err());
    }

    #[test]
    fn rejects_blank_narrative() {
        let parsed = LlmAssessment {
            score: 5.0,
            narrative: "   ".to_string(),
            initiatives: vec![],
        };
        assert!(parsed.validate_and_into_assessment().is_err());
    }
}
