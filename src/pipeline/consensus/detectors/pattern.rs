//! Pattern detector: curated regexes for wording that settles the payment
//! question on its own.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{DetectorKind, PaymentStatus};
use crate::pipeline::consensus::types::{DetectorError, DetectorInput, MethodResult, PaymentDetector};

struct StatusPattern {
    regex: Regex,
    status: PaymentStatus,
    confidence: f32,
    description: &'static str,
}

static STATUS_PATTERNS: LazyLock<Vec<StatusPattern>> = LazyLock::new(|| {
    vec![
        pattern(
            r"(?i)\bpaid\s+in\s+full\b",
            PaymentStatus::Paid,
            0.95,
            "explicit paid-in-full wording",
        ),
        pattern(
            r"(?i)\bpayment\s+received\b",
            PaymentStatus::Paid,
            0.9,
            "payment-received wording",
        ),
        pattern(
            r"(?i)\bthank\s+you\s+for\s+your\s+payment\b",
            PaymentStatus::Paid,
            0.9,
            "payment acknowledgement",
        ),
        pattern(
            r"(?i)\bbalance(?:\s+due)?\s*:?\s*\$?\s*0+(?:\.0{1,2})?\b",
            PaymentStatus::Paid,
            0.85,
            "zero balance figure",
        ),
        pattern(
            r"(?i)\bpast\s+due\b",
            PaymentStatus::Unpaid,
            0.9,
            "past-due wording",
        ),
        pattern(
            r"(?i)\b(?:payment\s+)?overdue\b",
            PaymentStatus::Unpaid,
            0.9,
            "overdue wording",
        ),
        pattern(
            r"(?i)\bfinal\s+notice\b",
            PaymentStatus::Unpaid,
            0.85,
            "final-notice wording",
        ),
        pattern(
            r"(?i)\bamount\s+due\s*:?\s*\$?\s*[1-9]",
            PaymentStatus::Unpaid,
            0.75,
            "positive amount due",
        ),
        pattern(
            r"(?i)\bplease\s+remit\b",
            PaymentStatus::Unpaid,
            0.7,
            "remittance request",
        ),
        pattern(
            r"(?i)\bpartial(?:ly)?\s+(?:payment|paid)\b",
            PaymentStatus::Partial,
            0.85,
            "partial-payment wording",
        ),
        pattern(
            r"(?i)\bdeposit\s+(?:received|applied)\b",
            PaymentStatus::Partial,
            0.75,
            "deposit wording",
        ),
        pattern(
            r"(?i)\bremaining\s+balance\s*:?\s*\$?\s*[1-9]",
            PaymentStatus::Partial,
            0.7,
            "remaining balance after payment",
        ),
        pattern(
            r"(?i)\bvoid(?:ed)?\b",
            PaymentStatus::Void,
            0.9,
            "void marker",
        ),
        pattern(
            r"(?i)\bcancell?ed\s+(?:invoice|order)\b",
            PaymentStatus::Void,
            0.85,
            "cancellation wording",
        ),
    ]
});

fn pattern(
    regex_str: &str,
    status: PaymentStatus,
    confidence: f32,
    description: &'static str,
) -> StatusPattern {
    StatusPattern {
        regex: Regex::new(regex_str).expect("Invalid status pattern regex"),
        status,
        confidence,
        description,
    }
}

pub struct PatternDetector;

impl PaymentDetector for PatternDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Pattern
    }

    fn detect(&self, input: &DetectorInput) -> Result<Option<MethodResult>, DetectorError> {
        let mut best: Option<(&StatusPattern, String)> = None;
        for rule in STATUS_PATTERNS.iter() {
            let Some(found) = rule.regex.find(&input.text) else {
                continue;
            };
            let replace = best
                .as_ref()
                .map_or(true, |(current, _)| rule.confidence > current.confidence);
            if replace {
                best = Some((rule, found.as_str().to_string()));
            }
        }
        Ok(best.map(|(rule, matched)| {
            MethodResult::new(
                DetectorKind::Pattern,
                rule.status,
                rule.confidence,
                format!("matched {}", rule.description),
            )
            .with_evidence("matched", matched)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Option<MethodResult> {
        PatternDetector.detect(&DetectorInput::new(text)).unwrap()
    }

    #[test]
    fn paid_in_full_is_decisive() {
        let result = detect("PAID IN FULL. Check #4521. Balance: $0.00").unwrap();
        assert_eq!(result.status, PaymentStatus::Paid);
        assert!((result.confidence - 0.95).abs() < 1e-6);
        assert_eq!(result.evidence["matched"], "PAID IN FULL");
    }

    #[test]
    fn zero_balance_reads_as_paid() {
        let result = detect("Thank you for shopping. Balance due: $0.00").unwrap();
        assert_eq!(result.status, PaymentStatus::Paid);
        assert!((result.confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn past_due_reads_as_unpaid() {
        let result = detect("This account is PAST DUE. Please remit.").unwrap();
        assert_eq!(result.status, PaymentStatus::Unpaid);
        assert!((result.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn positive_amount_due_reads_as_unpaid() {
        let result = detect("Amount due: $45.18 by March 1").unwrap();
        assert_eq!(result.status, PaymentStatus::Unpaid);
    }

    #[test]
    fn partial_payment_wording() {
        let result = detect("Partial payment applied, remaining balance: $200").unwrap();
        assert_eq!(result.status, PaymentStatus::Partial);
        assert!((result.confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn void_marker_without_matching_avoid() {
        assert_eq!(detect("Invoice VOIDED by admin").unwrap().status, PaymentStatus::Void);
        // "avoid" must not trip the void rule.
        assert!(detect("please avoid late fees").is_none());
    }

    #[test]
    fn highest_confidence_rule_wins() {
        // Both the remit rule (0.7) and the past-due rule (0.9) match.
        let result = detect("past due, please remit payment").unwrap();
        assert_eq!(result.status, PaymentStatus::Unpaid);
        assert!((result.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn neutral_text_yields_none() {
        assert!(detect("Quarterly newsletter from your supplier").is_none());
    }
}
