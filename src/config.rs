//! Engine configuration.
//!
//! Every weight, threshold, boost and timeout the engines apply lives here
//! as a tuned default rather than a constant buried in scoring logic, so an
//! embedding service can reshape behavior from a JSON file without a rebuild.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DetectorKind;

/// Default `RUST_LOG`-style filter for [`crate::init_tracing`].
pub fn default_log_filter() -> &'static str {
    "fiscora=info"
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Tunables for the GL classifier's strategy ladder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Code assigned when no strategy produces a match. Must exist in the
    /// catalog at construction time.
    pub default_code: String,
    /// Confidence of the default assignment.
    pub default_confidence: f32,
    /// Ordered codes the category heuristic tries when text looks like an
    /// invoice but nothing more specific matched; the first code present
    /// in the catalog wins.
    pub fallback_codes: Vec<String>,
    /// Confidence of a category-heuristic assignment.
    pub fallback_confidence: f32,
    /// Confidence when the caller supplied a pre-known GL code that
    /// resolves in the catalog.
    pub provided_confidence: f32,
    /// Confidence of a canonical vendor-registry match.
    pub vendor_confidence: f32,
    /// Confidence of a vendor alias match.
    pub vendor_alias_confidence: f32,
    /// Keyword scoring: `min(cap, base + step × hits)`.
    pub keyword_base: f32,
    pub keyword_step: f32,
    pub keyword_cap: f32,
    /// Boost per additional agreeing strategy, and its cap.
    pub agreement_boost: f32,
    pub agreement_boost_cap: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            default_code: "6999".into(),
            default_confidence: 0.3,
            fallback_codes: vec!["6000".into(), "6999".into()],
            fallback_confidence: 0.4,
            provided_confidence: 0.98,
            vendor_confidence: 0.95,
            vendor_alias_confidence: 0.90,
            keyword_base: 0.6,
            keyword_step: 0.1,
            keyword_cap: 0.9,
            agreement_boost: 0.1,
            agreement_boost_cap: 0.2,
        }
    }
}

/// Tunables for the payment-status consensus engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Detectors to run, by name. Must be non-empty, known and unique.
    pub detectors: Vec<String>,
    /// Per-detector wall-clock budget; a detector that overruns is
    /// treated as having failed.
    pub detector_timeout_ms: u64,
    /// Minimum consensus confidence for `consensus_reached`.
    pub consensus_threshold: f32,
    /// Bonus per additional method agreeing with the winner, and its cap.
    pub agreement_bonus: f32,
    pub agreement_bonus_cap: f32,
    /// Quality = coverage_weight × coverage + confidence_weight × mean
    /// confidence. The two weights must sum to 1.
    pub quality_coverage_weight: f32,
    pub quality_confidence_weight: f32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            detectors: DetectorKind::ALL
                .iter()
                .map(|kind| kind.as_str().to_string())
                .collect(),
            detector_timeout_ms: 2_000,
            consensus_threshold: 0.6,
            agreement_bonus: 0.1,
            agreement_bonus_cap: 0.2,
            quality_coverage_weight: 0.4,
            quality_confidence_weight: 0.6,
        }
    }
}

/// Tunables for the destination router's weighted factor model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Factor weights. Payment status dominates; amount barely nudges.
    pub status_weight: f32,
    pub kind_weight: f32,
    pub category_weight: f32,
    pub keyword_weight: f32,
    pub amount_weight: f32,
    /// Score a factor receives when its input is absent, so missing data
    /// dampens rather than vetoes a destination.
    pub neutral_score: f32,
    /// Below this confidence the router falls back to status-only routing.
    pub routing_threshold: f32,
    /// Weighted total is capped here before the consensus-quality bonus.
    pub confidence_cap: f32,
    /// Added as `bonus × quality` when the consensus reached agreement.
    pub quality_bonus: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            status_weight: 0.40,
            kind_weight: 0.25,
            category_weight: 0.20,
            keyword_weight: 0.10,
            amount_weight: 0.05,
            neutral_score: 0.3,
            routing_threshold: 0.5,
            confidence_cap: 0.95,
            quality_bonus: 0.1,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub classifier: ClassifierConfig,
    pub consensus: ConsensusConfig,
    pub routing: RoutingConfig,
}

// ═══════════════════════════════════════════════════════════
// Loading and validation
// ═══════════════════════════════════════════════════════════

impl EngineConfig {
    /// Parse and validate a config from a JSON document. Omitted fields
    /// keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_range = [
            ("classifier.default_confidence", self.classifier.default_confidence),
            ("classifier.fallback_confidence", self.classifier.fallback_confidence),
            ("classifier.provided_confidence", self.classifier.provided_confidence),
            ("classifier.vendor_confidence", self.classifier.vendor_confidence),
            ("classifier.vendor_alias_confidence", self.classifier.vendor_alias_confidence),
            ("classifier.keyword_base", self.classifier.keyword_base),
            ("classifier.keyword_step", self.classifier.keyword_step),
            ("classifier.keyword_cap", self.classifier.keyword_cap),
            ("classifier.agreement_boost", self.classifier.agreement_boost),
            ("classifier.agreement_boost_cap", self.classifier.agreement_boost_cap),
            ("consensus.consensus_threshold", self.consensus.consensus_threshold),
            ("consensus.agreement_bonus", self.consensus.agreement_bonus),
            ("consensus.agreement_bonus_cap", self.consensus.agreement_bonus_cap),
            ("consensus.quality_coverage_weight", self.consensus.quality_coverage_weight),
            ("consensus.quality_confidence_weight", self.consensus.quality_confidence_weight),
            ("routing.status_weight", self.routing.status_weight),
            ("routing.kind_weight", self.routing.kind_weight),
            ("routing.category_weight", self.routing.category_weight),
            ("routing.keyword_weight", self.routing.keyword_weight),
            ("routing.amount_weight", self.routing.amount_weight),
            ("routing.neutral_score", self.routing.neutral_score),
            ("routing.routing_threshold", self.routing.routing_threshold),
            ("routing.confidence_cap", self.routing.confidence_cap),
            ("routing.quality_bonus", self.routing.quality_bonus),
        ];
        for (name, value) in unit_range {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if self.classifier.default_code.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "classifier.default_code must not be empty".into(),
            ));
        }

        if self.consensus.detectors.is_empty() {
            return Err(ConfigError::Invalid(
                "consensus.detectors must name at least one detector".into(),
            ));
        }
        let mut seen = Vec::with_capacity(self.consensus.detectors.len());
        for name in &self.consensus.detectors {
            let kind = DetectorKind::from_str(name).map_err(|err| {
                ConfigError::Invalid(err.to_string())
            })?;
            if seen.contains(&kind) {
                return Err(ConfigError::Invalid(format!(
                    "consensus.detectors lists '{name}' more than once"
                )));
            }
            seen.push(kind);
        }

        let quality_sum =
            self.consensus.quality_coverage_weight + self.consensus.quality_confidence_weight;
        if (quality_sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::Invalid(format!(
                "consensus quality weights must sum to 1, got {quality_sum}"
            )));
        }

        if self.consensus.detector_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "consensus.detector_timeout_ms must be positive".into(),
            ));
        }

        Ok(())
    }

    /// The configured detector kinds, in config order. Call only after
    /// `validate`; unknown names were rejected there.
    pub fn detector_kinds(&self) -> Result<Vec<DetectorKind>, ConfigError> {
        self.consensus
            .detectors
            .iter()
            .map(|name| {
                DetectorKind::from_str(name)
                    .map_err(|err| ConfigError::Invalid(err.to_string()))
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
