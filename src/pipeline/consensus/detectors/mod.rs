//! The four built-in payment-status detectors.

pub mod amount;
pub mod keyword;
pub mod pattern;
pub mod stamp;

pub use amount::AmountDetector;
pub use keyword::KeywordDetector;
pub use pattern::PatternDetector;
pub use stamp::StampDetector;

use std::sync::Arc;

use super::types::PaymentDetector;
use crate::models::DetectorKind;

/// Instantiate the built-in detector for a kind.
pub fn built_in(kind: DetectorKind) -> Arc<dyn PaymentDetector> {
    match kind {
        DetectorKind::Pattern => Arc::new(PatternDetector),
        DetectorKind::Keyword => Arc::new(KeywordDetector),
        DetectorKind::Amount => Arc::new(AmountDetector),
        DetectorKind::Stamp => Arc::new(StampDetector),
    }
}
