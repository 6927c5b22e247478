//! Keyword detector: status vocabulary counting with hit-scaled confidence.

use std::collections::HashSet;
use std::sync::LazyLock;

use crate::models::{DetectorKind, PaymentStatus};
use crate::pipeline::consensus::types::{DetectorError, DetectorInput, MethodResult, PaymentDetector};

/// Vocabulary per status, in the order ties resolve.
static STATUS_VOCAB: LazyLock<Vec<(PaymentStatus, Vec<&'static str>)>> = LazyLock::new(|| {
    vec![
        (
            PaymentStatus::Paid,
            vec![
                "paid",
                "payment received",
                "payment posted",
                "settled",
                "zero balance",
                "receipt of payment",
            ],
        ),
        (
            PaymentStatus::Unpaid,
            vec![
                "unpaid",
                "past due",
                "overdue",
                "outstanding",
                "amount due",
                "balance due",
                "please pay",
                "remit payment",
            ],
        ),
        (
            PaymentStatus::Partial,
            vec![
                "partial payment",
                "partially paid",
                "installment",
                "remaining balance",
                "deposit received",
            ],
        ),
        (
            PaymentStatus::Void,
            vec!["void", "voided", "cancelled", "canceled", "annulled"],
        ),
    ]
});

/// Same token discipline as the classifier's keyword index: single tokens
/// match whole words only, phrases match as substrings.
fn term_matches(term: &str, lower_text: &str, tokens: &HashSet<&str>) -> bool {
    if term.chars().any(|c| !c.is_alphanumeric()) {
        lower_text.contains(term)
    } else {
        tokens.contains(term)
    }
}

pub struct KeywordDetector;

impl PaymentDetector for KeywordDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Keyword
    }

    fn detect(&self, input: &DetectorInput) -> Result<Option<MethodResult>, DetectorError> {
        let lower = input.text.to_lowercase();
        let tokens: HashSet<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .collect();

        let mut best: Option<(PaymentStatus, Vec<&str>)> = None;
        for (status, terms) in STATUS_VOCAB.iter() {
            let matched: Vec<&str> = terms
                .iter()
                .copied()
                .filter(|term| term_matches(term, &lower, &tokens))
                .collect();
            if matched.is_empty() {
                continue;
            }
            let replace = best
                .as_ref()
                .map_or(true, |(_, current)| matched.len() > current.len());
            if replace {
                best = Some((*status, matched));
            }
        }

        Ok(best.map(|(status, matched)| {
            let confidence = (0.6 + 0.1 * matched.len() as f32).min(0.9);
            MethodResult::new(
                DetectorKind::Keyword,
                status,
                confidence,
                format!("{} status term(s): {}", matched.len(), matched.join(", ")),
            )
            .with_evidence("terms", matched.join(", "))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Option<MethodResult> {
        KeywordDetector.detect(&DetectorInput::new(text)).unwrap()
    }

    #[test]
    fn paid_vocabulary_counts_hits() {
        let result = detect("Payment received, invoice marked paid and settled").unwrap();
        assert_eq!(result.status, PaymentStatus::Paid);
        // paid, payment received, settled
        assert!((result.confidence - 0.9).abs() < 1e-6);
        assert!(result.evidence["terms"].contains("settled"));
    }

    #[test]
    fn single_hit_scores_point_seven() {
        let result = detect("PAID IN FULL. Check #4521.").unwrap();
        assert_eq!(result.status, PaymentStatus::Paid);
        assert!((result.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn unpaid_does_not_feed_the_paid_tally() {
        let result = detect("This invoice is unpaid and overdue").unwrap();
        assert_eq!(result.status, PaymentStatus::Unpaid);
        assert!((result.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn larger_tally_wins_a_conflict() {
        // One paid term against three unpaid terms.
        let result = detect("paid? no: unpaid, past due, balance due $120").unwrap();
        assert_eq!(result.status, PaymentStatus::Unpaid);
    }

    #[test]
    fn void_terms_match_whole_words_only() {
        assert_eq!(detect("order cancelled by customer").unwrap().status, PaymentStatus::Void);
        assert!(detect("avoid unnecessary charges").is_none());
    }

    #[test]
    fn neutral_text_yields_none() {
        assert!(detect("Monthly service summary for your records").is_none());
    }
}
