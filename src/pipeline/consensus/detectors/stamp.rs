//! Stamp detector: standalone uppercase marker lines of the kind a rubber
//! stamp or scanner overlay leaves behind.

use crate::models::{DetectorKind, PaymentStatus};
use crate::pipeline::consensus::types::{DetectorError, DetectorInput, MethodResult, PaymentDetector};

/// Marker phrases, most specific first.
const STAMP_MARKERS: [(&str, PaymentStatus, f32); 10] = [
    ("PAYMENT RECEIVED", PaymentStatus::Paid, 0.8),
    ("PAID IN FULL", PaymentStatus::Paid, 0.85),
    ("PARTIAL PAYMENT", PaymentStatus::Partial, 0.75),
    ("PAST DUE", PaymentStatus::Unpaid, 0.8),
    ("FINAL NOTICE", PaymentStatus::Unpaid, 0.75),
    ("UNPAID", PaymentStatus::Unpaid, 0.8),
    ("PAID", PaymentStatus::Paid, 0.8),
    ("VOIDED", PaymentStatus::Void, 0.85),
    ("VOID", PaymentStatus::Void, 0.85),
    ("CANCELLED", PaymentStatus::Void, 0.8),
];

const MAX_STAMP_LINE_LEN: usize = 40;

/// A line counts as stamp-like when it is short, carries letters, and has
/// no lowercase at all.
fn is_stamp_line(line: &str) -> bool {
    !line.is_empty()
        && line.len() <= MAX_STAMP_LINE_LEN
        && line.chars().any(|c| c.is_alphabetic())
        && !line.chars().any(|c| c.is_lowercase())
}

/// Token-sequence containment, so "UNPAID" never matches the "PAID" marker.
fn line_has_marker(line: &str, marker: &str) -> bool {
    let normalized: Vec<&str> = line
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();
    let padded = format!(" {} ", normalized.join(" "));
    padded.contains(&format!(" {marker} "))
}

pub struct StampDetector;

impl PaymentDetector for StampDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Stamp
    }

    fn detect(&self, input: &DetectorInput) -> Result<Option<MethodResult>, DetectorError> {
        for line in input.text.lines() {
            let line = line.trim();
            if !is_stamp_line(line) {
                continue;
            }
            for (marker, status, confidence) in STAMP_MARKERS {
                if !line_has_marker(line, marker) {
                    continue;
                }
                let mut result = MethodResult::new(
                    DetectorKind::Stamp,
                    status,
                    confidence,
                    format!("stamp-like line '{line}'"),
                )
                .with_evidence("line", line);
                if let Some(image) = &input.image {
                    result = result.with_evidence("image_bytes", image.len().to_string());
                }
                return Ok(Some(result));
            }
        }
        Ok(None)
    }
}
