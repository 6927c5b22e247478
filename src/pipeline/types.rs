//! Request, outcome, and trait seams for the processing pipeline.
//!
//! Storage and text extraction live outside this crate. The orchestrator
//! only sees the `DocumentStore` and `TextExtractor` traits, so services
//! plug in blob stores and OCR backends while tests plug in mocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::DocumentKind;
use crate::pipeline::classify::ClassificationResult;
use crate::pipeline::consensus::ConsensusResult;
use crate::pipeline::routing::RoutingDecision;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from the document store seam.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store rejected document: {0}")]
    Rejected(String),
}

/// Errors from the text extraction seam.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction failed: {0}")]
    Failed(String),
}

// ---------------------------------------------------------------------------
// Trait seams
// ---------------------------------------------------------------------------

/// Where the document bytes ended up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Backend-specific location (path, object key, row id).
    pub location: String,
    pub size_bytes: u64,
    pub stored_at: DateTime<Utc>,
}

/// Persists raw document bytes before any analysis runs.
pub trait DocumentStore: Send + Sync {
    fn persist(&self, request: &ProcessRequest) -> Result<StoredDocument, StorageError>;
}

/// Text pulled out of the document, with whatever hints the extractor
/// could recover alongside it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    /// Extractor self-assessment, 0.0 to 1.0.
    pub confidence: f32,
    pub vendor_hint: Option<String>,
    pub amount_hint: Option<f64>,
    pub kind_hint: Option<DocumentKind>,
}

/// Turns stored bytes into text. OCR, PDF parsing, and plaintext reads
/// all live behind this seam.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, request: &ProcessRequest) -> Result<ExtractedText, ExtractError>;
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One document submitted for processing.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub document_id: Uuid,
    pub tenant_id: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Caller-supplied hints. These win over anything extraction recovers.
    pub vendor_hint: Option<String>,
    pub amount_hint: Option<f64>,
    pub kind_hint: Option<DocumentKind>,
    pub known_gl_code: Option<String>,
}

impl ProcessRequest {
    pub fn new(document_id: Uuid, tenant_id: &str, file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            document_id,
            tenant_id: tenant_id.to_string(),
            file_name: file_name.to_string(),
            bytes,
            vendor_hint: None,
            amount_hint: None,
            kind_hint: None,
            known_gl_code: None,
        }
    }

    pub fn with_vendor_hint(mut self, vendor: &str) -> Self {
        self.vendor_hint = Some(vendor.to_string());
        self
    }

    pub fn with_amount_hint(mut self, amount: f64) -> Self {
        self.amount_hint = Some(amount);
        self
    }

    pub fn with_kind_hint(mut self, kind: DocumentKind) -> Self {
        self.kind_hint = Some(kind);
        self
    }

    pub fn with_known_gl_code(mut self, code: &str) -> Self {
        self.known_gl_code = Some(code.to_string());
        self
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Extraction stage summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub text_length: usize,
    pub confidence: f32,
    /// True when extraction failed and the pipeline went on without text.
    pub degraded: bool,
}

/// Everything the pipeline decided about one document. `process` always
/// returns this; `success` and `error` say how far it got.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingOutcome {
    pub document_id: Uuid,
    pub tenant_id: String,
    pub success: bool,
    pub error: Option<String>,
    pub stored_at: Option<DateTime<Utc>>,
    pub extraction: Option<ExtractionSummary>,
    pub classification: Option<ClassificationResult>,
    pub consensus: Option<ConsensusResult>,
    pub routing: Option<RoutingDecision>,
    /// Non-fatal degradations hit along the way.
    pub warnings: Vec<String>,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builders_set_hints() {
        let request = ProcessRequest::new(Uuid::new_v4(), "tenant-a", "inv.pdf", vec![1, 2, 3])
            .with_vendor_hint("Acme Corp")
            .with_amount_hint(120.5)
            .with_kind_hint(DocumentKind::Invoice)
            .with_known_gl_code("6100");
        assert_eq!(request.vendor_hint.as_deref(), Some("Acme Corp"));
        assert_eq!(request.amount_hint, Some(120.5));
        assert_eq!(request.kind_hint, Some(DocumentKind::Invoice));
        assert_eq!(request.known_gl_code.as_deref(), Some("6100"));
        assert_eq!(request.bytes.len(), 3);
    }

    #[test]
    fn outcome_serializes_with_stage_results() {
        let outcome = ProcessingOutcome {
            document_id: Uuid::nil(),
            tenant_id: "tenant-a".into(),
            success: true,
            error: None,
            stored_at: Some(Utc::now()),
            extraction: Some(ExtractionSummary {
                text_length: 42,
                confidence: 0.97,
                degraded: false,
            }),
            classification: None,
            consensus: None,
            routing: None,
            warnings: vec!["extraction hint missing".into()],
            elapsed_ms: 12,
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("tenant-a"));
        assert!(json.contains("\"degraded\":false"));
    }
}
