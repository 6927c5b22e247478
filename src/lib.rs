//! Fiscora: the decision core of a scanned financial-document platform.
//!
//! Given a stored document's text and hints, the crate classifies it
//! against a GL account catalog, forms a multi-detector consensus on its
//! payment status, and routes it to one of four billing destinations,
//! with every decision recorded through an audit seam. Storage, OCR,
//! vendor registry persistence, and the API surface stay outside; they
//! plug in through the traits in `pipeline::types`, `classify::vendor`,
//! and `audit`.

pub mod audit;
pub mod catalog;
pub mod config;
pub mod models;
pub mod pipeline;

pub use audit::{AuditEntry, AuditSink, MemoryAuditSink};
pub use catalog::{Catalog, CatalogHandle};
pub use config::EngineConfig;
pub use pipeline::{build_processor, DocumentProcessor, ProcessRequest, ProcessingOutcome};

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to the
/// library default. Embedding services call this once at startup; in
/// tests repeated calls are tolerated.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}
