//! Pattern-matching strategy: curated regexes for phrasings that identify
//! an expense class more reliably than isolated keywords.

use std::sync::LazyLock;

use regex::Regex;

use super::types::Candidate;
use crate::catalog::CatalogSnapshot;
use crate::models::ClassificationMethod;

/// A compiled pattern with the GL code it argues for.
struct CodePattern {
    regex: Regex,
    code: &'static str,
    confidence: f32,
    description: &'static str,
}

static CODE_PATTERNS: LazyLock<Vec<CodePattern>> = LazyLock::new(|| {
    vec![
        pattern(
            r"(?i)\b(?:aws|amazon\s+web\s+services|azure|google\s+cloud|gcp|compute\s+usage)\b",
            "6110",
            0.75,
            "cloud provider billing language",
        ),
        pattern(
            r"(?i)\bsoftware\s+(?:license|subscription|renewal|maintenance)\b",
            "6100",
            0.75,
            "software licensing language",
        ),
        pattern(
            r"(?i)\b(?:airfare|boarding\s+pass|flight\s+(?:number|no\.?)|e-?ticket)\b",
            "6300",
            0.7,
            "airline ticketing language",
        ),
        pattern(
            r"(?i)\b(?:room\s+rate|check[- ]?(?:in|out)\s+date|nights?\s+stayed|folio)\b",
            "6310",
            0.7,
            "hotel folio language",
        ),
        pattern(
            r"(?i)\b(?:attorney|law\s+(?:firm|offices?)|legal\s+services|retainer\s+agreement)\b",
            "6400",
            0.75,
            "legal services language",
        ),
        pattern(
            r"(?i)\b(?:tax\s+preparation|bookkeeping|audit\s+engagement|cpa\s+firm)\b",
            "6410",
            0.7,
            "accounting services language",
        ),
        pattern(
            r"(?i)\b(?:kwh|kilowatt|meter\s+reading|electric\s+service|water\s+service)\b",
            "6210",
            0.8,
            "utility metering language",
        ),
        pattern(
            r"(?i)\b(?:monthly\s+rent|lease\s+payment|rent\s+for\s+the\s+period)\b",
            "6200",
            0.8,
            "lease billing language",
        ),
        pattern(
            r"(?i)\b(?:ad\s+campaign|advertising\s+services|sponsored\s+placement|impressions\s+delivered)\b",
            "6500",
            0.7,
            "advertising billing language",
        ),
        pattern(
            r"(?i)\b(?:insurance\s+premium|policy\s+(?:number|period)|coverage\s+period)\b",
            "6600",
            0.7,
            "insurance policy language",
        ),
        pattern(
            r"(?i)\b(?:freight\s+charges|bill\s+of\s+lading|waybill|shipment\s+tracking)\b",
            "5100",
            0.7,
            "freight billing language",
        ),
        pattern(
            r"(?i)\b(?:payroll\s+(?:period|run)|gross\s+wages|salaries\s+payable)\b",
            "6700",
            0.7,
            "payroll language",
        ),
        pattern(
            r"(?i)\b(?:merchant\s+(?:fees?|services)|processing\s+fees?|chargeback|interchange)\b",
            "6800",
            0.7,
            "merchant fee language",
        ),
        pattern(
            r"(?i)\b(?:data\s+plan|wireless\s+(?:bill|statement)|cellular\s+service)\b",
            "6130",
            0.6,
            "telecom billing language",
        ),
    ]
});

fn pattern(
    regex_str: &str,
    code: &'static str,
    confidence: f32,
    description: &'static str,
) -> CodePattern {
    CodePattern {
        regex: Regex::new(regex_str).expect("Invalid code pattern regex"),
        code,
        confidence,
        description,
    }
}

/// Highest-confidence matching rule whose code exists in the catalog;
/// earlier rules win equal-confidence ties.
pub(crate) fn pattern_candidate(snapshot: &CatalogSnapshot, text: &str) -> Option<Candidate> {
    let mut best: Option<&CodePattern> = None;
    for rule in CODE_PATTERNS.iter() {
        // Rules are curated against the bundled chart; a replacement
        // catalog may not carry every code.
        if !snapshot.index.contains_code(rule.code) {
            continue;
        }
        if !rule.regex.is_match(text) {
            continue;
        }
        if best.map_or(true, |current| rule.confidence > current.confidence) {
            best = Some(rule);
        }
    }
    best.map(|rule| Candidate {
        code: rule.code.to_string(),
        confidence: rule.confidence,
        reasoning: format!("matched {} for GL {}", rule.description, rule.code),
        matched_keywords: Vec::new(),
        method: ClassificationMethod::PatternMatch,
    })
}
