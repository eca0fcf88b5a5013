//! Prompt assembly for the narrative generator.
//!
//! Passages are embedded in exactly the order the retriever returned them. The
//! generator may truncate long prompts from the end, so the retriever's ranking
//! decides which passages survive.

use crate::domain::metrics::TickerSymbol;
use crate::domain::passage::RetrievedPassage;

pub const DEFAULT_INSTRUCTION_TEMPLATE: &str = "\
You are DualLens Analytics, an investment analyst assessing a company's AI strategy.
Use ONLY the numbered context passages below. Do not state facts they do not support.
Rate AI initiative strength, innovation leadership and strategic positioning on a 0-10 scale.

Respond using exactly these labels, one per line:
Qualitative Score: X.X/10
Narrative: 2-3 sentences justifying the score, including the main risks
Initiatives: initiative one; initiative two";

const NO_CONTEXT_NOTICE: &str = "(no context passages were retrieved)";

/// Question sent to the document index for a ticker.
pub fn retrieval_query(ticker: &TickerSymbol) -> String {
    format!(
        "What are the key AI initiatives, strategic projects, and competitive advantages of {ticker}? \
         What risks or challenges does the company face in its AI strategy?"
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub text: String,
    pub no_context_available: bool,
}

#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    instruction_template: &'a str,
}

impl Default for QueryBuilder<'static> {
    fn default() -> Self {
        Self::new(DEFAULT_INSTRUCTION_TEMPLATE)
    }
}

impl<'a> QueryBuilder<'a> {
    pub fn new(instruction_template: &'a str) -> Self {
        Self {
            instruction_template,
        }
    }

    pub fn build(&self, ticker: &TickerSymbol, passages: &[RetrievedPassage]) -> BuiltPrompt {
        let mut text = String::new();
        text.push_str(self.instruction_template.trim_end());
        text.push_str("\n\nTicker: ");
        text.push_str(ticker.as_str());
        text.push_str("\n\nContext passages (most relevant first):\n");

        if passages.is_empty() {
            text.push_str(NO_CONTEXT_NOTICE);
            text.push('\n');
        }
        for (i, passage) in passages.iter().enumerate() {
            text.push_str(&format!(
                "\n[{}] source: {}\n{}\n",
                i + 1,
                passage.source_document,
                passage.text.trim()
            ));
        }

        BuiltPrompt {
            text,
            no_context_available: passages.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(source: &str, rank: u32) -> RetrievedPassage {
        RetrievedPassage {
            source_document: source.to_string(),
            text: format!("excerpt from {source}"),
            relevance_rank: rank,
        }
    }

    fn ticker() -> TickerSymbol {
        TickerSymbol::parse("NVDA").unwrap()
    }

    #[test]
    fn empty_passages_flag_missing_context() {
        let built = QueryBuilder::default().build(&ticker(), &[]);
        assert!(built.no_context_available);
        assert!(built.text.starts_with("You are DualLens Analytics"));
        assert!(built.text.contains("Ticker: NVDA"));
        assert!(built.text.contains(NO_CONTEXT_NOTICE));
    }

    #[test]
    fn single_passage_is_embedded_with_source() {
        let built = QueryBuilder::new("Assess.").build(&ticker(), &[passage("nvda.pdf", 0)]);
        assert!(!built.no_context_available);
        assert!(built.text.contains("[1] source: nvda.pdf\nexcerpt from nvda.pdf"));
        assert!(!built.text.contains(NO_CONTEXT_NOTICE));
    }

    #[test]
    fn passages_keep_retriever_order() {
        // Deliberately not sorted by name or rank.
        let passages = vec![
            passage("zeta.pdf", 0),
            passage("alpha.pdf", 1),
            passage("mid.pdf", 2),
            passage("beta.pdf", 3),
        ];
        let built = QueryBuilder::default().build(&ticker(), &passages);
        let positions: Vec<usize> = passages
            .iter()
            .map(|p| built.text.find(&format!("source: {}", p.source_document)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn template_precedes_ticker_and_context() {
        let built = QueryBuilder::new("INSTRUCTIONS\n\n").build(&ticker(), &[passage("a.pdf", 0)]);
        let i = built.text.find("INSTRUCTIONS").unwrap();
        let t = built.text.find("Ticker: NVDA").unwrap();
        let c = built.text.find("source: a.pdf").unwrap();
        assert!(i < t && t < c);
    }

    #[test]
    fn retrieval_query_names_ticker() {
        assert!(retrieval_query(&ticker()).contains("competitive advantages of NVDA?"));
    }
}
