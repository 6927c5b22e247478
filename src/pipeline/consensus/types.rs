use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{DetectorKind, DocumentContext, DocumentKind, PaymentStatus};

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Detector input unusable: {0}")]
    BadInput(String),

    #[error("Detector failed: {0}")]
    Failed(String),
}

/// Input shared by every detector in a run. Built once per document and
/// handed to the detector tasks behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct DetectorInput {
    pub text: String,
    pub amount_hint: Option<f64>,
    pub kind_hint: Option<DocumentKind>,
    /// Raw page image, for detectors that note visual artifacts.
    pub image: Option<Vec<u8>>,
}

impl DetectorInput {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    /// Carry over the text and hints gathered for classification.
    pub fn from_context(context: &DocumentContext) -> Self {
        Self {
            text: context.text.clone(),
            amount_hint: context.amount_hint,
            kind_hint: context.kind_hint,
            image: None,
        }
    }

    pub fn with_amount_hint(mut self, amount: f64) -> Self {
        self.amount_hint = Some(amount);
        self
    }

    pub fn with_kind_hint(mut self, kind: DocumentKind) -> Self {
        self.kind_hint = Some(kind);
        self
    }

    pub fn with_image(mut self, bytes: Vec<u8>) -> Self {
        self.image = Some(bytes);
        self
    }
}

/// One detector's verdict. The engine stamps `detector` and `latency_ms`
/// when the task completes; detectors fill the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodResult {
    pub detector: DetectorKind,
    pub status: PaymentStatus,
    pub confidence: f32,
    pub reasoning: String,
    /// Free-form evidence (matched phrases, parsed figures). A BTreeMap
    /// keeps the serialized form stable.
    pub evidence: BTreeMap<String, String>,
    pub latency_ms: u64,
}

impl MethodResult {
    pub fn new(
        detector: DetectorKind,
        status: PaymentStatus,
        confidence: f32,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            detector,
            status,
            confidence,
            reasoning: reasoning.into(),
            evidence: BTreeMap::new(),
            latency_ms: 0,
        }
    }

    pub fn with_evidence(mut self, key: &str, value: impl Into<String>) -> Self {
        self.evidence.insert(key.to_string(), value.into());
        self
    }
}

/// A payment-status detection method. Implementations are synchronous;
/// the engine runs them on blocking tasks under a timeout.
pub trait PaymentDetector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    /// `Ok(None)` means no evidence either way; `Err` means the detector
    /// failed. Neither aborts a consensus run.
    fn detect(&self, input: &DetectorInput) -> Result<Option<MethodResult>, DetectorError>;
}

/// Aggregated verdict across all configured detectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub status: PaymentStatus,
    pub confidence: f32,
    /// How trustworthy the run was: detector coverage blended with the
    /// mean confidence of everything returned.
    pub quality: f32,
    pub consensus_reached: bool,
    /// Individual verdicts, in detector priority order.
    pub methods: Vec<MethodResult>,
}

impl ConsensusResult {
    /// Verdict when no detector returned evidence.
    pub(crate) fn inconclusive() -> Self {
        Self {
            status: PaymentStatus::Unknown,
            confidence: 0.0,
            quality: 0.0,
            consensus_reached: false,
            methods: Vec::new(),
        }
    }
}
