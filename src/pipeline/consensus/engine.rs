//! The consensus engine: fan detectors out concurrently, group their
//! verdicts by status, and score the groups into one aggregated verdict.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tracing::{debug, warn};

use super::detectors::built_in;
use super::types::{ConsensusResult, DetectorInput, MethodResult, PaymentDetector};
use super::PaymentDetectionError;
use crate::config::ConsensusConfig;
use crate::models::{DetectorKind, PaymentStatus};

pub struct ConsensusEngine {
    detectors: Vec<Arc<dyn PaymentDetector>>,
    config: ConsensusConfig,
}

// Manual impl: `detectors` holds `dyn PaymentDetector`, which has no `Debug` bound.
impl std::fmt::Debug for ConsensusEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsensusEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ConsensusEngine {
    /// Build the engine from the configured detector names.
    pub fn new(config: ConsensusConfig) -> Result<Self, PaymentDetectionError> {
        let mut detectors: Vec<Arc<dyn PaymentDetector>> = Vec::with_capacity(config.detectors.len());
        for name in &config.detectors {
            let kind = DetectorKind::from_str(name)
                .map_err(|_| PaymentDetectionError::UnknownDetector(name.clone()))?;
            if detectors.iter().any(|detector| detector.kind() == kind) {
                return Err(PaymentDetectionError::DuplicateDetector(name.clone()));
            }
            detectors.push(built_in(kind));
        }
        Self::with_detectors(detectors, config)
    }

    /// Build from an explicit detector set, for callers that bring their
    /// own implementations.
    pub fn with_detectors(
        detectors: Vec<Arc<dyn PaymentDetector>>,
        config: ConsensusConfig,
    ) -> Result<Self, PaymentDetectionError> {
        if detectors.is_empty() {
            return Err(PaymentDetectionError::NoDetectors);
        }
        for (index, detector) in detectors.iter().enumerate() {
            let kind = detector.kind();
            if detectors[..index].iter().any(|other| other.kind() == kind) {
                return Err(PaymentDetectionError::DuplicateDetector(
                    kind.as_str().to_string(),
                ));
            }
        }
        Ok(Self { detectors, config })
    }

    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    /// Run every detector concurrently and aggregate. Never fails: a
    /// timed-out, panicked or erroring detector is logged and omitted,
    /// and zero verdicts yield an inconclusive result.
    pub async fn run(&self, input: DetectorInput) -> ConsensusResult {
        let input = Arc::new(input);
        let timeout = Duration::from_millis(self.config.detector_timeout_ms);

        let tasks = self.detectors.iter().map(|detector| {
            let detector = Arc::clone(detector);
            let input = Arc::clone(&input);
            async move {
                let kind = detector.kind();
                let started = Instant::now();
                let task = tokio::task::spawn_blocking(move || detector.detect(&input));
                let outcome = tokio::time::timeout(timeout, task).await;
                let elapsed_ms = started.elapsed().as_millis() as u64;
                match outcome {
                    Err(_) => {
                        warn!(
                            detector = kind.as_str(),
                            timeout_ms = timeout.as_millis() as u64,
                            "detector timed out, omitting"
                        );
                        None
                    }
                    Ok(Err(join_error)) => {
                        warn!(
                            detector = kind.as_str(),
                            error = %join_error,
                            "detector task failed, omitting"
                        );
                        None
                    }
                    Ok(Ok(Err(detector_error))) => {
                        warn!(
                            detector = kind.as_str(),
                            error = %detector_error,
                            "detector failed, omitting"
                        );
                        None
                    }
                    Ok(Ok(Ok(None))) => {
                        debug!(detector = kind.as_str(), "detector found no evidence");
                        None
                    }
                    Ok(Ok(Ok(Some(mut result)))) => {
                        result.detector = kind;
                        result.latency_ms = elapsed_ms;
                        Some(result)
                    }
                }
            }
        });

        let methods: Vec<MethodResult> = join_all(tasks).await.into_iter().flatten().collect();
        self.aggregate(methods)
    }

    fn aggregate(&self, mut methods: Vec<MethodResult>) -> ConsensusResult {
        if methods.is_empty() {
            debug!("no detector returned evidence, consensus inconclusive");
            return ConsensusResult::inconclusive();
        }
        methods.sort_by_key(|method| method.detector);

        struct Group {
            sum: f32,
            count: usize,
            top: DetectorKind,
        }
        let mut groups: BTreeMap<PaymentStatus, Group> = BTreeMap::new();
        for method in &methods {
            let group = groups.entry(method.status).or_insert(Group {
                sum: 0.0,
                count: 0,
                top: method.detector,
            });
            group.sum += method.confidence;
            group.count += 1;
            if method.detector < group.top {
                group.top = method.detector;
            }
        }

        // Weighted vote: group score is the confidence sum times the
        // member count, so three lukewarm agreeing detectors outvote one
        // confident dissenter. Ties go to the group holding the
        // highest-priority detector.
        let mut winner: Option<(PaymentStatus, f32, DetectorKind, f32, usize)> = None;
        for (status, group) in &groups {
            let score = group.sum * group.count as f32;
            let mean = group.sum / group.count as f32;
            let replace = match &winner {
                None => true,
                Some((_, best_score, best_top, _, _)) => {
                    score > *best_score || (score == *best_score && group.top < *best_top)
                }
            };
            if replace {
                winner = Some((*status, score, group.top, mean, group.count));
            }
        }
        let Some((status, _, _, mean, agreeing)) = winner else {
            return ConsensusResult::inconclusive();
        };

        let bonus = (self.config.agreement_bonus * (agreeing as f32 - 1.0))
            .min(self.config.agreement_bonus_cap);
        let confidence = (mean + bonus).min(1.0);

        let coverage = methods.len() as f32 / self.detectors.len() as f32;
        let mean_all =
            methods.iter().map(|method| method.confidence).sum::<f32>() / methods.len() as f32;
        let quality = self.config.quality_coverage_weight * coverage
            + self.config.quality_confidence_weight * mean_all;

        let consensus_reached = confidence >= self.config.consensus_threshold;
        debug!(
            status = status.as_str(),
            confidence,
            quality,
            consensus_reached,
            methods = methods.len(),
            "payment consensus aggregated"
        );

        ConsensusResult {
            status,
            confidence,
            quality,
            consensus_reached,
            methods,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
