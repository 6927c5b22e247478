//! Destination routing: weighted factor scoring over the four billing
//! queues, a payment-status fallback for weak scores, and manual
//! overrides. Every decision lands in the audit trail.

pub mod router;
pub mod rules;
pub mod types;

pub use router::DestinationRouter;
pub use rules::default_rules;
pub use types::{DestinationRule, FactorScores, RoutingDecision};

use thiserror::Error;

use crate::models::Destination;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("Rule set is missing destination '{}'", .0.as_str())]
    MissingDestination(Destination),

    #[error("Rule set names destination '{}' more than once", .0.as_str())]
    DuplicateDestination(Destination),

    #[error("Unknown destination '{0}'")]
    UnknownDestination(String),

    #[error("Override actor must not be empty")]
    EmptyActor,
}
