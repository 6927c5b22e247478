use serde::{Deserialize, Serialize};

use crate::models::{Destination, DocumentKind, PaymentStatus};

/// Matching profile for one destination queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationRule {
    pub destination: Destination,
    /// Payment statuses this queue expects.
    pub statuses: Vec<PaymentStatus>,
    /// Document kinds this queue expects.
    pub kinds: Vec<DocumentKind>,
    /// GL categories (lowercase) this queue covers.
    pub categories: Vec<String>,
    /// Routing keywords, scored as an overlap ratio.
    pub keywords: Vec<String>,
    /// Minimum amount, when the queue only wants material documents.
    pub min_amount: Option<f64>,
}

/// Per-factor breakdown behind a destination's weighted score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorScores {
    pub payment_status: f32,
    pub document_kind: f32,
    pub gl_category: f32,
    pub keyword_overlap: f32,
    pub amount_threshold: f32,
    pub total: f32,
}

/// Where a document landed and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub destination: Destination,
    pub confidence: f32,
    pub reasoning: String,
    /// Factor breakdown of the weighted scoring; `None` for overrides,
    /// and kept for fallback decisions to show what fell short.
    pub factors: Option<FactorScores>,
    pub fallback: bool,
    pub override_actor: Option<String>,
    /// Whether the audit append for this decision succeeded.
    pub audited: bool,
}

impl RoutingDecision {
    pub fn is_override(&self) -> bool {
        self.override_actor.is_some()
    }
}
