//! Document processing orchestrator.
//!
//! Single entry point that drives the full pipeline:
//! store → extract → classify → payment consensus → route.
//!
//! Trait-based DI for the outer seams (DocumentStore, TextExtractor,
//! AuditSink) keeps the orchestrator fully testable with mocks. The
//! decision stages are owned engines built from one `EngineConfig`.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::audit::{emit_or_log, AuditEntry, AuditSink};
use crate::catalog::CatalogHandle;
use crate::config::{ConfigError, EngineConfig};
use crate::models::{AuditEvent, DocumentContext};
use crate::pipeline::classify::{ClassificationError, GlClassifier, VendorRegistry};
use crate::pipeline::consensus::{ConsensusEngine, DetectorInput, PaymentDetectionError};
use crate::pipeline::routing::{DestinationRouter, RoutingError};
use crate::pipeline::types::{
    DocumentStore, ExtractedText, ExtractionSummary, ProcessRequest, ProcessingOutcome,
    TextExtractor,
};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while assembling a processor. Per-document processing
/// never returns these; `process` is total.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Configuration rejected: {0}")]
    Config(#[from] ConfigError),

    #[error("Classifier setup failed: {0}")]
    Classification(#[from] ClassificationError),

    #[error("Payment detection setup failed: {0}")]
    PaymentDetection(#[from] PaymentDetectionError),

    #[error("Router setup failed: {0}")]
    Routing(#[from] RoutingError),
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives one document through every stage and always hands back a
/// `ProcessingOutcome`. Storage failure is the only fatal stage; the
/// rest degrade and keep going.
pub struct DocumentProcessor {
    classifier: GlClassifier,
    consensus: ConsensusEngine,
    router: DestinationRouter,
    store: Arc<dyn DocumentStore>,
    extractor: Arc<dyn TextExtractor>,
    audit: Arc<dyn AuditSink>,
}

impl DocumentProcessor {
    pub fn new(
        classifier: GlClassifier,
        consensus: ConsensusEngine,
        router: DestinationRouter,
        store: Arc<dyn DocumentStore>,
        extractor: Arc<dyn TextExtractor>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            classifier,
            consensus,
            router,
            store,
            extractor,
            audit,
        }
    }

    /// Full pipeline for one document.
    ///
    /// 1. Persist the raw bytes. Failure here is fatal: the outcome
    ///    reports the error and no analysis runs.
    /// 2. Extract text. Failure degrades to an empty-text run with a
    ///    recorded warning.
    /// 3. Classify against the GL catalog.
    /// 4. Run the payment-status consensus.
    /// 5. Route to a billing destination.
    pub async fn process(&self, request: ProcessRequest) -> ProcessingOutcome {
        let started = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        info!(
            document_id = %request.document_id,
            tenant_id = %request.tenant_id,
            file_name = %request.file_name,
            size_bytes = request.bytes.len(),
            "processing document"
        );

        let stage = Instant::now();
        let stored = {
            let _span = info_span!("store", document_id = %request.document_id).entered();
            self.store.persist(&request)
        };
        let stored = match stored {
            Ok(stored) => {
                debug!(
                    document_id = %request.document_id,
                    location = %stored.location,
                    elapsed_ms = stage.elapsed().as_millis() as u64,
                    "document stored"
                );
                stored
            }
            Err(error) => {
                warn!(
                    document_id = %request.document_id,
                    error = %error,
                    "storage failed, pipeline aborted"
                );
                return self.fail(&request, &error.to_string(), warnings, started);
            }
        };

        let stage = Instant::now();
        let extracted = {
            let _span = info_span!("extract", document_id = %request.document_id).entered();
            self.extractor.extract(&request)
        };
        let (extracted, degraded) = match extracted {
            Ok(extracted) => (extracted, false),
            Err(error) => {
                warn!(
                    document_id = %request.document_id,
                    error = %error,
                    "extraction failed, continuing without text"
                );
                warnings.push(format!("extraction failed: {error}"));
                (ExtractedText::default(), true)
            }
        };
        debug!(
            document_id = %request.document_id,
            text_length = extracted.text.len(),
            confidence = extracted.confidence,
            degraded,
            elapsed_ms = stage.elapsed().as_millis() as u64,
            "text extracted"
        );
        let extraction = ExtractionSummary {
            text_length: extracted.text.len(),
            confidence: extracted.confidence,
            degraded,
        };

        let context = build_context(&request, &extracted);

        let stage = Instant::now();
        let classification = {
            let _span = info_span!("classify", document_id = %request.document_id).entered();
            self.classifier.classify(&context)
        };
        debug!(
            document_id = %request.document_id,
            gl_code = %classification.code,
            confidence = classification.confidence,
            elapsed_ms = stage.elapsed().as_millis() as u64,
            "document classified"
        );

        let stage = Instant::now();
        let consensus = self
            .consensus
            .run(DetectorInput::from_context(&context))
            .instrument(info_span!("consensus", document_id = %request.document_id))
            .await;
        debug!(
            document_id = %request.document_id,
            status = consensus.status.as_str(),
            confidence = consensus.confidence,
            elapsed_ms = stage.elapsed().as_millis() as u64,
            "payment consensus formed"
        );
        if !consensus.consensus_reached {
            warnings.push(format!(
                "payment consensus not reached (status '{}', confidence {:.2})",
                consensus.status.as_str(),
                consensus.confidence
            ));
        }

        let stage = Instant::now();
        let routing = {
            let _span = info_span!("route", document_id = %request.document_id).entered();
            self.router
                .route(&context, Some(&classification), Some(&consensus))
        };
        debug!(
            document_id = %request.document_id,
            destination = routing.destination.as_str(),
            elapsed_ms = stage.elapsed().as_millis() as u64,
            "destination decided"
        );

        let outcome = ProcessingOutcome {
            document_id: request.document_id,
            tenant_id: request.tenant_id.clone(),
            success: true,
            error: None,
            stored_at: Some(stored.stored_at),
            extraction: Some(extraction),
            classification: Some(classification),
            consensus: Some(consensus),
            routing: Some(routing),
            warnings,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        self.audit_outcome(&outcome);
        info!(
            document_id = %outcome.document_id,
            elapsed_ms = outcome.elapsed_ms,
            warnings = outcome.warnings.len(),
            "document processed"
        );
        outcome
    }

    /// Terminal outcome for a fatal stage failure.
    fn fail(
        &self,
        request: &ProcessRequest,
        error: &str,
        warnings: Vec<String>,
        started: Instant,
    ) -> ProcessingOutcome {
        let outcome = ProcessingOutcome {
            document_id: request.document_id,
            tenant_id: request.tenant_id.clone(),
            success: false,
            error: Some(error.to_string()),
            stored_at: None,
            extraction: None,
            classification: None,
            consensus: None,
            routing: None,
            warnings,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        self.audit_outcome(&outcome);
        outcome
    }

    /// Fire-and-forget pipeline audit event. A sink failure is already
    /// logged inside `emit_or_log`.
    fn audit_outcome(&self, outcome: &ProcessingOutcome) {
        let event = if outcome.success {
            AuditEvent::PipelineCompleted
        } else {
            AuditEvent::PipelineFailed
        };
        let payload = json!({
            "success": outcome.success,
            "error": outcome.error,
            "destination": outcome.routing.as_ref().map(|r| r.destination),
            "gl_code": outcome.classification.as_ref().map(|c| c.code.clone()),
            "payment_status": outcome.consensus.as_ref().map(|c| c.status),
            "warnings": outcome.warnings.len(),
            "elapsed_ms": outcome.elapsed_ms,
        });
        let entry = AuditEntry::new(
            outcome.document_id,
            &outcome.tenant_id,
            event,
            "pipeline",
            payload,
        );
        emit_or_log(self.audit.as_ref(), &entry);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Merge request and extraction into the analysis context. Caller hints
/// win; extraction fills the gaps.
fn build_context(request: &ProcessRequest, extracted: &ExtractedText) -> DocumentContext {
    let mut context = DocumentContext::new(request.document_id, &request.tenant_id, &extracted.text);
    context.vendor_hint = request
        .vendor_hint
        .clone()
        .or_else(|| extracted.vendor_hint.clone());
    context.amount_hint = request.amount_hint.or(extracted.amount_hint);
    context.kind_hint = request.kind_hint.or(extracted.kind_hint);
    context.known_gl_code = request.known_gl_code.clone();
    context
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Build a `DocumentProcessor` from a validated config: classifier over
/// the given catalog and vendor registry, consensus engine over the
/// configured detectors, router over the default rule set.
pub fn build_processor(
    config: EngineConfig,
    catalog: CatalogHandle,
    vendors: Arc<dyn VendorRegistry>,
    store: Arc<dyn DocumentStore>,
    extractor: Arc<dyn TextExtractor>,
    audit: Arc<dyn AuditSink>,
) -> Result<DocumentProcessor, ProcessingError> {
    config.validate()?;
    let classifier = GlClassifier::new(catalog, vendors, config.classifier)?;
    let consensus = ConsensusEngine::new(config.consensus)?;
    let router = DestinationRouter::with_default_rules(config.routing, audit.clone())?;
    info!(
        detectors = consensus.detector_count(),
        "document processor assembled"
    );
    Ok(DocumentProcessor::new(
        classifier, consensus, router, store, extractor, audit,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::catalog::Catalog;
    use crate::models::{ClassificationMethod, Destination, DocumentKind, PaymentStatus};
    use crate::pipeline::classify::InMemoryVendorRegistry;
    use crate::pipeline::types::{ExtractError, StorageError, StoredDocument};
    use chrono::Utc;
    use uuid::Uuid;

    // -- Mock seams ---------------------------------------------------------

    struct MemoryStore {
        fail: bool,
    }

    impl DocumentStore for MemoryStore {
        fn persist(&self, request: &ProcessRequest) -> Result<StoredDocument, StorageError> {
            if self.fail {
                return Err(StorageError::Rejected("disk quota exceeded".into()));
            }
            Ok(StoredDocument {
                location: format!("mem://{}/{}", request.tenant_id, request.document_id),
                size_bytes: request.bytes.len() as u64,
                stored_at: Utc::now(),
            })
        }
    }

    struct FixedExtractor {
        text: String,
        vendor_hint: Option<String>,
        amount_hint: Option<f64>,
        kind_hint: Option<DocumentKind>,
    }

    impl FixedExtractor {
        fn plain(text: &str) -> Self {
            Self {
                text: text.to_string(),
                vendor_hint: None,
                amount_hint: None,
                kind_hint: None,
            }
        }
    }

    impl TextExtractor for FixedExtractor {
        fn extract(&self, _request: &ProcessRequest) -> Result<ExtractedText, ExtractError> {
            Ok(ExtractedText {
                text: self.text.clone(),
                confidence: 0.93,
                vendor_hint: self.vendor_hint.clone(),
                amount_hint: self.amount_hint,
                kind_hint: self.kind_hint,
            })
        }
    }

    struct FailingExtractor;

    impl TextExtractor for FailingExtractor {
        fn extract(&self, _request: &ProcessRequest) -> Result<ExtractedText, ExtractError> {
            Err(ExtractError::Failed("scanner stream truncated".into()))
        }
    }

    // -- Helpers ------------------------------------------------------------

    fn test_registry() -> Arc<InMemoryVendorRegistry> {
        let mut registry = InMemoryVendorRegistry::new();
        registry.register("Request Vendor", "6300");
        registry.register("Extracted Vendor", "6400");
        Arc::new(registry)
    }

    fn build(
        store: Arc<dyn DocumentStore>,
        extractor: Arc<dyn TextExtractor>,
    ) -> (DocumentProcessor, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        let processor = build_processor(
            EngineConfig::default(),
            CatalogHandle::new(Catalog::bundled()),
            test_registry(),
            store,
            extractor,
            sink.clone(),
        )
        .unwrap();
        (processor, sink)
    }

    fn request() -> ProcessRequest {
        ProcessRequest::new(Uuid::new_v4(), "tenant-a", "scan.pdf", vec![0u8; 64])
    }

    const UNPAID_INVOICE: &str = "\
INVOICE #2041
CloudHost Services
Software subscription, annual license renewal
Amount due: $450.00
Payment terms: net 30
PAST DUE";

    // -- Tests --------------------------------------------------------------

    #[tokio::test]
    async fn full_pipeline_routes_an_unpaid_invoice() {
        let (processor, sink) = build(
            Arc::new(MemoryStore { fail: false }),
            Arc::new(FixedExtractor::plain(UNPAID_INVOICE)),
        );
        let outcome = processor
            .process(
                request()
                    .with_kind_hint(DocumentKind::Invoice)
                    .with_amount_hint(450.0),
            )
            .await;

        assert!(outcome.success);
        assert!(outcome.error.is_none());
        assert!(outcome.stored_at.is_some());

        let extraction = outcome.extraction.unwrap();
        assert!(!extraction.degraded);
        assert!(extraction.text_length > 0);

        let classification = outcome.classification.unwrap();
        assert_eq!(classification.code, "6100");

        let consensus = outcome.consensus.unwrap();
        assert_eq!(consensus.status, PaymentStatus::Unpaid);
        assert!(consensus.consensus_reached);

        let routing = outcome.routing.unwrap();
        assert_eq!(routing.destination, Destination::OpenPayable);
        assert!(!routing.fallback);

        // Routing decision plus pipeline completion.
        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event, AuditEvent::RoutingDecision);
        assert_eq!(entries[1].event, AuditEvent::PipelineCompleted);
        assert_eq!(entries[1].component, "pipeline");
        assert_eq!(entries[1].payload["success"], true);
        assert_eq!(entries[1].payload["destination"], "open_payable");
    }

    #[tokio::test]
    async fn storage_failure_aborts_the_pipeline() {
        let (processor, sink) = build(
            Arc::new(MemoryStore { fail: true }),
            Arc::new(FixedExtractor::plain(UNPAID_INVOICE)),
        );
        let outcome = processor.process(request()).await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("disk quota"));
        assert!(outcome.stored_at.is_none());
        assert!(outcome.extraction.is_none());
        assert!(outcome.classification.is_none());
        assert!(outcome.consensus.is_none());
        assert!(outcome.routing.is_none());

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event, AuditEvent::PipelineFailed);
        assert_eq!(entries[0].payload["success"], false);
    }

    #[tokio::test]
    async fn extraction_failure_degrades_to_empty_text() {
        let (processor, _sink) = build(
            Arc::new(MemoryStore { fail: false }),
            Arc::new(FailingExtractor),
        );
        let outcome = processor.process(request()).await;

        assert!(outcome.success);
        let extraction = outcome.extraction.unwrap();
        assert!(extraction.degraded);
        assert_eq!(extraction.text_length, 0);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.contains("extraction failed")));

        // No text, no hints: classification lands on the default code and
        // routing falls back by (unknown) status.
        let classification = outcome.classification.unwrap();
        assert_eq!(classification.code, "6999");
        assert_eq!(classification.method, ClassificationMethod::Default);

        let consensus = outcome.consensus.unwrap();
        assert_eq!(consensus.status, PaymentStatus::Unknown);
        assert!(!consensus.consensus_reached);

        let routing = outcome.routing.unwrap();
        assert!(routing.fallback);
        assert_eq!(routing.destination, Destination::OpenPayable);
    }

    #[tokio::test]
    async fn caller_hints_override_extraction_hints() {
        let (processor, _sink) = build(
            Arc::new(MemoryStore { fail: false }),
            Arc::new(FixedExtractor {
                text: "Quarterly service summary".into(),
                vendor_hint: Some("Extracted Vendor".into()),
                amount_hint: Some(10.0),
                kind_hint: Some(DocumentKind::Receipt),
            }),
        );
        let outcome = processor
            .process(request().with_vendor_hint("Request Vendor"))
            .await;

        // The caller's vendor hint resolves first.
        let classification = outcome.classification.unwrap();
        assert_eq!(classification.code, "6300");
        assert_eq!(classification.method, ClassificationMethod::VendorLookup);
    }

    #[tokio::test]
    async fn extraction_hints_fill_missing_caller_hints() {
        let (processor, _sink) = build(
            Arc::new(MemoryStore { fail: false }),
            Arc::new(FixedExtractor {
                text: "Quarterly service summary".into(),
                vendor_hint: Some("Extracted Vendor".into()),
                amount_hint: None,
                kind_hint: None,
            }),
        );
        let outcome = processor.process(request()).await;

        let classification = outcome.classification.unwrap();
        assert_eq!(classification.code, "6400");
        assert_eq!(classification.method, ClassificationMethod::VendorLookup);
    }

    #[tokio::test]
    async fn known_gl_code_rides_through_the_pipeline() {
        let (processor, _sink) = build(
            Arc::new(MemoryStore { fail: false }),
            Arc::new(FixedExtractor::plain("Payment received, thank you.")),
        );
        let outcome = processor
            .process(request().with_known_gl_code("6600"))
            .await;

        let classification = outcome.classification.unwrap();
        assert_eq!(classification.code, "6600");
        assert_eq!(classification.method, ClassificationMethod::Provided);
    }

    #[test]
    fn build_processor_rejects_bad_config() {
        let mut config = EngineConfig::default();
        config.routing.routing_threshold = 1.5;
        let result = build_processor(
            config,
            CatalogHandle::new(Catalog::bundled()),
            test_registry(),
            Arc::new(MemoryStore { fail: false }),
            Arc::new(FixedExtractor::plain("x")),
            Arc::new(MemoryAuditSink::new()),
        );
        assert!(matches!(result, Err(ProcessingError::Config(_))));
    }

    #[test]
    fn build_processor_rejects_catalog_without_default_code() {
        let catalog = Catalog::from_json_str(
            r#"{"accounts":[{"code":"1000","name":"Cash","category":"assets"}]}"#,
        )
        .unwrap();
        let result = build_processor(
            EngineConfig::default(),
            CatalogHandle::new(catalog),
            test_registry(),
            Arc::new(MemoryStore { fail: false }),
            Arc::new(FixedExtractor::plain("x")),
            Arc::new(MemoryAuditSink::new()),
        );
        assert!(matches!(result, Err(ProcessingError::Classification(_))));
    }
}
