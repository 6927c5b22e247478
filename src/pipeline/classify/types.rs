use serde::{Deserialize, Serialize};

use crate::models::ClassificationMethod;

/// Outcome of GL classification for one document. Always produced; when no
/// strategy fires the configured default code carries a low confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub code: String,
    pub name: String,
    pub category: String,
    pub confidence: f32,
    pub reasoning: String,
    pub matched_keywords: Vec<String>,
    pub method: ClassificationMethod,
}

/// One strategy's proposal, before the classifier picks a winner and
/// applies the agreement boost.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub code: String,
    pub confidence: f32,
    pub reasoning: String,
    pub matched_keywords: Vec<String>,
    pub method: ClassificationMethod,
}
