//! Vendor registry seam and the vendor-lookup strategy.
//!
//! Registry maintenance (imports, merges, dedup) belongs to the embedding
//! service; the classifier only asks "which GL code does this vendor map
//! to". An in-memory implementation covers tests and simple deployments.

use std::collections::HashMap;

use tracing::warn;

use super::types::Candidate;
use crate::catalog::CatalogSnapshot;
use crate::config::ClassifierConfig;
use crate::models::{ClassificationMethod, DocumentContext};

/// A vendor registry hit.
#[derive(Debug, Clone)]
pub struct VendorMatch {
    /// Canonical vendor name as registered.
    pub vendor_name: String,
    pub gl_code: String,
    /// True when the query matched an alias rather than the canonical name.
    pub alias: bool,
}

/// Lookup seam for vendor-to-GL mappings.
pub trait VendorRegistry: Send + Sync {
    fn lookup(&self, name: &str) -> Option<VendorMatch>;
}

/// Lookup key: lowercased, runs of whitespace collapsed to single spaces.
fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone)]
struct RegisteredVendor {
    display_name: String,
    gl_code: String,
}

/// Map-backed registry. Populate during setup, then share via `Arc`.
#[derive(Debug, Default)]
pub struct InMemoryVendorRegistry {
    canonical: HashMap<String, RegisteredVendor>,
    aliases: HashMap<String, String>,
}

impl InMemoryVendorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vendor under its canonical name.
    pub fn register(&mut self, name: &str, gl_code: &str) {
        self.canonical.insert(
            normalize(name),
            RegisteredVendor {
                display_name: name.trim().to_string(),
                gl_code: gl_code.to_string(),
            },
        );
    }

    /// Register an alias for an already-registered vendor. Returns false
    /// when the canonical name is unknown.
    pub fn register_alias(&mut self, alias: &str, canonical_name: &str) -> bool {
        let canonical_key = normalize(canonical_name);
        if !self.canonical.contains_key(&canonical_key) {
            return false;
        }
        self.aliases.insert(normalize(alias), canonical_key);
        true
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

impl VendorRegistry for InMemoryVendorRegistry {
    fn lookup(&self, name: &str) -> Option<VendorMatch> {
        let key = normalize(name);
        if key.is_empty() {
            return None;
        }
        if let Some(vendor) = self.canonical.get(&key) {
            return Some(VendorMatch {
                vendor_name: vendor.display_name.clone(),
                gl_code: vendor.gl_code.clone(),
                alias: false,
            });
        }
        let canonical_key = self.aliases.get(&key)?;
        let vendor = self.canonical.get(canonical_key)?;
        Some(VendorMatch {
            vendor_name: vendor.display_name.clone(),
            gl_code: vendor.gl_code.clone(),
            alias: true,
        })
    }
}

// ───────────────────────────────────────────────
// Strategy
// ───────────────────────────────────────────────

/// Vendor-lookup strategy: try the caller's vendor hint, then the first
/// non-empty line of the text as a candidate vendor name.
pub(crate) fn vendor_candidate(
    registry: &dyn VendorRegistry,
    snapshot: &CatalogSnapshot,
    context: &DocumentContext,
    config: &ClassifierConfig,
) -> Option<Candidate> {
    let mut names: Vec<&str> = Vec::with_capacity(2);
    if let Some(hint) = context.vendor_hint.as_deref() {
        names.push(hint);
    }
    if let Some(first_line) = context.text.lines().find(|line| !line.trim().is_empty()) {
        names.push(first_line.trim());
    }

    for name in names {
        let Some(matched) = registry.lookup(name) else {
            continue;
        };
        // A registry can drift ahead of the catalog; a mapping to a code
        // the catalog no longer carries is unusable here.
        if !snapshot.index.contains_code(&matched.gl_code) {
            warn!(
                vendor = %matched.vendor_name,
                code = %matched.gl_code,
                "vendor registry maps to a code missing from the catalog, skipping"
            );
            continue;
        }
        let (confidence, kind) = if matched.alias {
            (config.vendor_alias_confidence, "alias")
        } else {
            (config.vendor_confidence, "canonical name")
        };
        return Some(Candidate {
            code: matched.gl_code.clone(),
            confidence,
            reasoning: format!(
                "vendor registry matched '{}' ({kind}) to GL {}",
                matched.vendor_name, matched.gl_code
            ),
            matched_keywords: Vec::new(),
            method: ClassificationMethod::VendorLookup,
        });
    }
    None
}

// ───────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────
