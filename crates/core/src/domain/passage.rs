use serde::{Deserialize, Serialize};

/// One excerpt returned by the document index. Sequences are kept in the
/// index's relevance order; `relevance_rank` 0 is the best match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub source_document: String,
    pub text: String,
    pub relevance_rank: u32,
}
