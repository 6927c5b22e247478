//! Amount detector: reads balance and amount-due figures out of the text.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{DetectorKind, PaymentStatus};
use crate::pipeline::consensus::types::{DetectorError, DetectorInput, MethodResult, PaymentDetector};

static BALANCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:balance|amount)\s*(?:due|owing|outstanding)?\s*:?\s*\$?\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)",
    )
    .expect("Invalid balance regex")
});

static FIGURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)").expect("Invalid figure regex"));

static PARTIAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:partial(?:ly)?|installment|deposit)\b").expect("Invalid partial regex")
});

fn parse_figure(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse().ok()
}

/// Figures effectively zero at cent precision.
fn is_zero(value: f64) -> bool {
    value < 0.005
}

pub struct AmountDetector;

impl PaymentDetector for AmountDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Amount
    }

    fn detect(&self, input: &DetectorInput) -> Result<Option<MethodResult>, DetectorError> {
        let balance = BALANCE_RE
            .captures(&input.text)
            .and_then(|captures| parse_figure(&captures[1]));

        let has_positive_figure = balance.map_or(false, |value| !is_zero(value))
            || FIGURE_RE
                .captures_iter(&input.text)
                .filter_map(|captures| parse_figure(&captures[1]))
                .any(|value| !is_zero(value));

        let verdict = if PARTIAL_RE.is_match(&input.text) && has_positive_figure {
            Some((
                PaymentStatus::Partial,
                0.7,
                "partial wording alongside payment figures".to_string(),
            ))
        } else {
            balance.map(|value| {
                if is_zero(value) {
                    (PaymentStatus::Paid, 0.85, "balance figure is zero".to_string())
                } else {
                    (
                        PaymentStatus::Unpaid,
                        0.75,
                        format!("balance of {value:.2} still due"),
                    )
                }
            })
        };

        Ok(verdict.map(|(status, confidence, reasoning)| {
            let mut result = MethodResult::new(DetectorKind::Amount, status, confidence, reasoning);
            if let Some(value) = balance {
                result = result.with_evidence("balance", format!("{value:.2}"));
            }
            if let Some(hint) = input.amount_hint {
                result = result.with_evidence("amount_hint", format!("{hint:.2}"));
            }
            result
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Option<MethodResult> {
        AmountDetector.detect(&DetectorInput::new(text)).unwrap()
    }

    #[test]
    fn zero_balance_reads_as_paid() {
        let result = detect("PAID IN FULL. Check #4521. Balance: $0.00").unwrap();
        assert_eq!(result.status, PaymentStatus::Paid);
        assert!((result.confidence - 0.85).abs() < 1e-6);
        assert_eq!(result.evidence["balance"], "0.00");
    }

    #[test]
    fn positive_balance_reads_as_unpaid() {
        let result = detect("Amount due: $1,250.40 within 30 days").unwrap();
        assert_eq!(result.status, PaymentStatus::Unpaid);
        assert!((result.confidence - 0.75).abs() < 1e-6);
        assert_eq!(result.evidence["balance"], "1250.40");
    }

    #[test]
    fn partial_wording_with_figures_reads_as_partial() {
        let result = detect("Deposit of $500 applied, balance due: $1,500.00").unwrap();
        assert_eq!(result.status, PaymentStatus::Partial);
        assert!((result.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn partial_wording_with_zero_balance_still_reads_paid() {
        let result = detect("Deposit previously applied. Balance: $0.00").unwrap();
        assert_eq!(result.status, PaymentStatus::Paid);
    }

    #[test]
    fn amount_hint_lands_in_evidence() {
        let input = DetectorInput::new("Balance due: $12.00").with_amount_hint(12.0);
        let result = AmountDetector.detect(&input).unwrap().unwrap();
        assert_eq!(result.evidence["amount_hint"], "12.00");
    }

    #[test]
    fn text_without_figures_yields_none() {
        assert!(detect("Please see attached statement").is_none());
        assert!(detect("Totals will follow").is_none());
    }
}
