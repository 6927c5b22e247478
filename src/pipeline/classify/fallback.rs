//! Category heuristic: when nothing specific matched but the text still
//! reads like an invoice, land it on a configured general-expense code
//! rather than the bare default.

use std::sync::LazyLock;

use super::types::Candidate;
use crate::catalog::CatalogSnapshot;
use crate::config::ClassifierConfig;
use crate::models::ClassificationMethod;

/// Vocabulary that marks a document as invoice-like.
static INVOICE_MARKERS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    vec![
        "invoice",
        "bill to",
        "amount due",
        "total due",
        "balance due",
        "due date",
        "remit to",
        "remittance",
        "payment terms",
        "net 30",
        "net 60",
        "purchase order",
        "po number",
        "statement of account",
    ]
});

pub(crate) fn looks_like_invoice(text: &str) -> bool {
    let lower = text.to_lowercase();
    INVOICE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// First configured fallback code present in the catalog, if the text has
/// invoice markers at all.
pub(crate) fn category_candidate(
    snapshot: &CatalogSnapshot,
    text: &str,
    config: &ClassifierConfig,
) -> Option<Candidate> {
    if !looks_like_invoice(text) {
        return None;
    }
    let code = config
        .fallback_codes
        .iter()
        .find(|code| snapshot.index.contains_code(code))?;
    Some(Candidate {
        code: code.clone(),
        confidence: config.fallback_confidence,
        reasoning: format!(
            "text carries invoice markers but no vendor, keyword or pattern match; \
             assigned general expense code {code}"
        ),
        matched_keywords: Vec::new(),
        method: ClassificationMethod::CategoryFallback,
    })
}
