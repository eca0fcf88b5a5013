use crate::domain::contract::LlmAssessment;
use crate::domain::recommendation::QualitativeAssessment;
use anyhow::{bail, Context};
use regex::Regex;

pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```).
        let mut inner = trimmed;
        if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        return Some(inner.trim().to_string());
    }

    // Best-effort extraction: first '{' to last '}'.
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

/// Parses generator output into an assessment. Accepts a JSON object or the
/// labelled-line format of the default instruction template. A missing or
/// out-of-range score is an error; no default score is substituted.
pub fn parse_assessment(text: &str) -> anyhow::Result<QualitativeAssessment> {
    if let Some(json_str) = extract_json(text) {
        if let Ok(parsed) = serde_json::from_str::<LlmAssessment>(&json_str) {
            return parsed.validate_and_into_assessment();
        }
    }
    parse_labelled(text)
}

fn parse_labelled(text: &str) -> anyhow::Result<QualitativeAssessment> {
    // Label, optional scale hint such as "(0-10)", then `:` or `-`, then the number.
    let score_re = Regex::new(
        r"(?i)qualitative\s+score\s*\**\s*(?:\([^)\n]*\))?\s*\**\s*[:\-]\s*\**\s*(-?\d+(?:\.\d+)?)",
    )
    .context("invalid score regex")?;

    let Some(caps) = score_re.captures(text) else {
        bail!("generator output has no `Qualitative Score:` line: {text}");
    };
    let score = caps[1]
        .parse::<f64>()
        .with_context(|| format!("qualitative score is not a number: {}", &caps[1]))?;

    let narrative = labelled_value(text, &["narrative", "justification"]).unwrap_or_default();
    let initiatives = labelled_value(text, &["initiatives", "key initiatives"])
        .map(|line| line.split(';').map(str::to_string).collect())
        .unwrap_or_default();

    LlmAssessment {
        score,
        narrative,
        initiatives,
    }
    .validate_and_into_assessment()
}

/// Value after the first `Label:` whose label matches one of `labels`
/// (case-insensitive, markdown bold tolerated).
fn labelled_value(text: &str, labels: &[&str]) -> Option<String> {
    text.lines().find_map(|line| {
        let (label, value) = line.split_once(':')?;
        let label = label.trim().trim_matches('*').trim().to_ascii_lowercase();
        labels
            .iter()
            .any(|l| *l == label)
            .then(|| value.trim().trim_matches('*').trim().to_string())
    })
}
