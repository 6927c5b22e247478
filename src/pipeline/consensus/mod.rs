//! Multi-detector payment-status consensus.
//!
//! Independent detectors (pattern, keyword, amount, stamp) examine the
//! same document concurrently; their verdicts are grouped by status and
//! the groups weighted by confidence and head count. One detector having
//! a bad day never takes the run down with it.

pub mod detectors;
pub mod engine;
pub mod types;

pub use engine::ConsensusEngine;
pub use types::{
    ConsensusResult, DetectorError, DetectorInput, MethodResult, PaymentDetector,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentDetectionError {
    #[error("No detectors configured")]
    NoDetectors,

    #[error("Unknown detector: {0}")]
    UnknownDetector(String),

    #[error("Detector {0} configured more than once")]
    DuplicateDetector(String),
}
