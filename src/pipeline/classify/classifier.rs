//! The GL classifier: strategies run over one document context, the most
//! confident proposal wins, and agreement between strategies earns a boost.

use std::sync::Arc;

use tracing::{debug, warn};

use super::types::{Candidate, ClassificationResult};
use super::vendor::VendorRegistry;
use super::{fallback, keywords, patterns, vendor, ClassificationError};
use crate::catalog::{CatalogHandle, CatalogSnapshot, GlAccount};
use crate::config::ClassifierConfig;
use crate::models::{ClassificationMethod, DocumentContext};

pub struct GlClassifier {
    catalog: CatalogHandle,
    vendors: Arc<dyn VendorRegistry>,
    config: ClassifierConfig,
}

// Manual impl: `vendors` is a `dyn VendorRegistry`, which has no `Debug` bound.
impl std::fmt::Debug for GlClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlClassifier")
            .field("catalog", &self.catalog)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GlClassifier {
    /// Fails fast on an unusable catalog so `classify` never has to.
    pub fn new(
        catalog: CatalogHandle,
        vendors: Arc<dyn VendorRegistry>,
        config: ClassifierConfig,
    ) -> Result<Self, ClassificationError> {
        let snapshot = catalog.load();
        if snapshot.catalog.is_empty() {
            return Err(ClassificationError::EmptyCatalog);
        }
        if !snapshot.index.contains_code(&config.default_code) {
            return Err(ClassificationError::UnknownDefaultCode(
                config.default_code.clone(),
            ));
        }
        Ok(Self {
            catalog,
            vendors,
            config,
        })
    }

    /// Classify one document. Total: every input gets a code, worst case
    /// the configured default. Deterministic for identical text and
    /// catalog version.
    pub fn classify(&self, context: &DocumentContext) -> ClassificationResult {
        let snapshot = self.catalog.load();

        // A caller-provided code that resolves short-circuits scoring.
        if let Some(known) = context.known_gl_code.as_deref() {
            if let Some(account) = snapshot.index.account(known) {
                let result = result_for(
                    account,
                    self.config.provided_confidence,
                    format!("caller supplied GL code {}, present in catalog", account.code),
                    Vec::new(),
                    ClassificationMethod::Provided,
                );
                log_result(context, &snapshot, &result);
                return result;
            }
            warn!(
                document_id = %context.document_id,
                code = known,
                "caller-supplied GL code not in catalog, scoring instead"
            );
        }

        let mut candidates: Vec<Candidate> = Vec::new();
        if let Some(candidate) =
            vendor::vendor_candidate(self.vendors.as_ref(), &snapshot, context, &self.config)
        {
            candidates.push(candidate);
        }
        if let Some(candidate) = keywords::keyword_candidate(&snapshot, &context.text, &self.config)
        {
            candidates.push(candidate);
        }
        if let Some(candidate) = patterns::pattern_candidate(&snapshot, &context.text) {
            candidates.push(candidate);
        }
        // The category heuristic is a last resort, not a voter.
        if candidates.is_empty() {
            if let Some(candidate) =
                fallback::category_candidate(&snapshot, &context.text, &self.config)
            {
                candidates.push(candidate);
            }
        }

        if candidates.is_empty() {
            let result = self.default_result(&snapshot);
            log_result(context, &snapshot, &result);
            return result;
        }

        // Most confident candidate wins; earlier strategies win exact ties.
        let mut winner_index = 0;
        for (index, candidate) in candidates.iter().enumerate().skip(1) {
            if candidate.confidence > candidates[winner_index].confidence {
                winner_index = index;
            }
        }
        let winner = candidates[winner_index].clone();

        let mut matched_keywords = winner.matched_keywords.clone();
        for (index, candidate) in candidates.iter().enumerate() {
            if index == winner_index || candidate.code != winner.code {
                continue;
            }
            for keyword in &candidate.matched_keywords {
                if !matched_keywords.contains(keyword) {
                    matched_keywords.push(keyword.clone());
                }
            }
        }

        let agreeing = candidates
            .iter()
            .filter(|candidate| candidate.code == winner.code)
            .count();
        let mut confidence = winner.confidence;
        let mut reasoning = winner.reasoning;
        if agreeing >= 2 {
            let boost = (self.config.agreement_boost * (agreeing as f32 - 1.0))
                .min(self.config.agreement_boost_cap);
            confidence = (confidence + boost).min(1.0);
            reasoning.push_str(&format!(
                "; {agreeing} strategies agree on GL {}",
                winner.code
            ));
        }

        let result = match snapshot.index.account(&winner.code) {
            Some(account) => result_for(account, confidence, reasoning, matched_keywords, winner.method),
            // Strategies only propose codes present in the snapshot they
            // scored, so this arm is a guard, not a path.
            None => self.default_result(&snapshot),
        };
        log_result(context, &snapshot, &result);
        result
    }

    fn default_result(&self, snapshot: &CatalogSnapshot) -> ClassificationResult {
        if let Some(account) = snapshot.index.account(&self.config.default_code) {
            return result_for(
                account,
                self.config.default_confidence,
                format!(
                    "no strategy produced a match; assigned default code {}",
                    account.code
                ),
                Vec::new(),
                ClassificationMethod::Default,
            );
        }
        // A catalog swap can drop the default code after construction.
        // Swap validation keeps snapshots non-empty.
        warn!(
            code = %self.config.default_code,
            "default GL code missing from current catalog, using first account"
        );
        let account = &snapshot.catalog.accounts[0];
        result_for(
            account,
            self.config.default_confidence,
            format!(
                "default code {} absent from catalog; assigned first account {}",
                self.config.default_code, account.code
            ),
            Vec::new(),
            ClassificationMethod::Default,
        )
    }
}

fn result_for(
    account: &GlAccount,
    confidence: f32,
    reasoning: String,
    matched_keywords: Vec<String>,
    method: ClassificationMethod,
) -> ClassificationResult {
    ClassificationResult {
        code: account.code.clone(),
        name: account.name.clone(),
        category: account.category.clone(),
        confidence,
        reasoning,
        matched_keywords,
        method,
    }
}

fn log_result(context: &DocumentContext, snapshot: &CatalogSnapshot, result: &ClassificationResult) {
    debug!(
        document_id = %context.document_id,
        code = %result.code,
        confidence = result.confidence,
        method = result.method.as_str(),
        catalog_version = snapshot.version,
        "classified document"
    );
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
