//! Keyword-indexed GL classification.
//!
//! Five strategies are tried over the same document: a caller-provided
//! code, vendor registry lookup, catalog keyword scoring, curated pattern
//! rules, and an invoice-shaped category heuristic. The most confident
//! proposal wins and cross-strategy agreement raises its confidence.

pub mod classifier;
mod fallback;
mod keywords;
mod patterns;
pub mod types;
pub mod vendor;

pub use classifier::GlClassifier;
pub use types::ClassificationResult;
pub use vendor::{InMemoryVendorRegistry, VendorMatch, VendorRegistry};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("Catalog has no accounts to classify against")]
    EmptyCatalog,

    #[error("Default GL code {0} is not in the catalog")]
    UnknownDefaultCode(String),
}
