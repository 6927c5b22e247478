//! Weighted multi-factor routing over the four billing queues.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::json;
use tracing::{debug, info};

use super::types::{DestinationRule, FactorScores, RoutingDecision};
use super::RoutingError;
use crate::audit::{emit_or_log, AuditEntry, AuditSink};
use crate::config::RoutingConfig;
use crate::models::{AuditEvent, Destination, DocumentContext, PaymentStatus};
use crate::pipeline::classify::ClassificationResult;
use crate::pipeline::consensus::ConsensusResult;

pub struct DestinationRouter {
    /// One rule per destination, held in declaration order.
    rules: Vec<DestinationRule>,
    config: RoutingConfig,
    audit: Arc<dyn AuditSink>,
    override_counts: Mutex<HashMap<Destination, u64>>,
}

impl DestinationRouter {
    /// Validate and install a rule set: exactly one rule per destination.
    pub fn new(
        rules: Vec<DestinationRule>,
        config: RoutingConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, RoutingError> {
        let mut ordered = Vec::with_capacity(Destination::ALL.len());
        for &destination in Destination::ALL {
            let mut matching = rules.iter().filter(|rule| rule.destination == destination);
            let rule = matching
                .next()
                .ok_or(RoutingError::MissingDestination(destination))?;
            if matching.next().is_some() {
                return Err(RoutingError::DuplicateDestination(destination));
            }
            ordered.push(rule.clone());
        }
        Ok(Self {
            rules: ordered,
            config,
            audit,
            override_counts: Mutex::new(HashMap::new()),
        })
    }

    /// Router over the built-in rule set.
    pub fn with_default_rules(
        config: RoutingConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, RoutingError> {
        Self::new(super::rules::default_rules(), config, audit)
    }

    /// Score every destination and pick the best. Total per document:
    /// weighted factors decide, the threshold fallback catches weak
    /// scores, and exactly one audit entry records the outcome.
    pub fn route(
        &self,
        context: &DocumentContext,
        classification: Option<&ClassificationResult>,
        consensus: Option<&ConsensusResult>,
    ) -> RoutingDecision {
        let scored: Vec<FactorScores> = self
            .rules
            .iter()
            .map(|rule| self.score(rule, context, classification, consensus))
            .collect();

        // Best total; declaration order breaks ties.
        let mut best_index = 0;
        for index in 1..scored.len() {
            if scored[index].total > scored[best_index].total {
                best_index = index;
            }
        }
        let destination = self.rules[best_index].destination;
        let factors = scored[best_index].clone();

        let mut confidence = factors.total.min(self.config.confidence_cap);
        if let Some(consensus) = consensus {
            if consensus.consensus_reached {
                confidence = (confidence + self.config.quality_bonus * consensus.quality).min(1.0);
            }
        }

        let decision = if confidence < self.config.routing_threshold {
            // Weighted scoring did not separate the queues; route on
            // payment status alone and say so.
            let status = consensus.map(|c| c.status).unwrap_or(PaymentStatus::Unknown);
            let fallback_destination = if status == PaymentStatus::Paid {
                Destination::ClosedPayable
            } else {
                Destination::OpenPayable
            };
            debug!(
                document_id = %context.document_id,
                scored = destination.as_str(),
                confidence,
                "weighted score below threshold, using status fallback"
            );
            RoutingDecision {
                destination: fallback_destination,
                confidence: confidence.max(self.config.routing_threshold),
                reasoning: format!(
                    "weighted score {:.3} for {} fell below the {:.2} threshold; \
                     routed by payment status '{}' instead",
                    factors.total,
                    destination.as_str(),
                    self.config.routing_threshold,
                    status.as_str()
                ),
                factors: Some(factors),
                fallback: true,
                override_actor: None,
                audited: false,
            }
        } else {
            RoutingDecision {
                destination,
                confidence,
                reasoning: format!(
                    "scored {:.3} for {} (status {:.2}, kind {:.2}, category {:.2}, \
                     keywords {:.2}, amount {:.2})",
                    factors.total,
                    destination.as_str(),
                    factors.payment_status,
                    factors.document_kind,
                    factors.gl_category,
                    factors.keyword_overlap,
                    factors.amount_threshold
                ),
                factors: Some(factors),
                fallback: false,
                override_actor: None,
                audited: false,
            }
        };

        let decision = self.audit_decision(context, decision, classification, consensus);
        info!(
            document_id = %context.document_id,
            destination = decision.destination.as_str(),
            confidence = decision.confidence,
            fallback = decision.fallback,
            "routed document"
        );
        decision
    }

    /// Route by operator decree. The named destination must be one of the
    /// four queues and the actor must identify someone.
    pub fn route_override(
        &self,
        context: &DocumentContext,
        destination: &str,
        actor: &str,
    ) -> Result<RoutingDecision, RoutingError> {
        let actor = actor.trim();
        if actor.is_empty() {
            return Err(RoutingError::EmptyActor);
        }
        let destination = Destination::from_str(destination)
            .map_err(|_| RoutingError::UnknownDestination(destination.to_string()))?;

        {
            let mut counts = self
                .override_counts
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *counts.entry(destination).or_insert(0) += 1;
        }

        let decision = RoutingDecision {
            destination,
            confidence: 1.0,
            reasoning: format!("manual override by {actor}"),
            factors: None,
            fallback: false,
            override_actor: Some(actor.to_string()),
            audited: false,
        };
        let decision = self.audit_decision(context, decision, None, None);
        info!(
            document_id = %context.document_id,
            destination = decision.destination.as_str(),
            actor,
            "override routed document"
        );
        Ok(decision)
    }

    /// How many manual overrides have landed on a destination.
    pub fn override_count(&self, destination: Destination) -> u64 {
        self.override_counts
            .lock()
            .map(|counts| counts.get(&destination).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn score(
        &self,
        rule: &DestinationRule,
        context: &DocumentContext,
        classification: Option<&ClassificationResult>,
        consensus: Option<&ConsensusResult>,
    ) -> FactorScores {
        let config = &self.config;

        let payment_status = match consensus {
            Some(c) if c.status != PaymentStatus::Unknown => {
                if rule.statuses.contains(&c.status) {
                    1.0
                } else {
                    0.0
                }
            }
            _ => config.neutral_score,
        };

        let document_kind = match context.kind_hint {
            Some(kind) => {
                if rule.kinds.contains(&kind) {
                    1.0
                } else {
                    0.0
                }
            }
            None => config.neutral_score,
        };

        let gl_category = match classification {
            Some(c) => {
                if rule
                    .categories
                    .iter()
                    .any(|category| category.eq_ignore_ascii_case(&c.category))
                {
                    1.0
                } else {
                    0.0
                }
            }
            None => config.neutral_score,
        };

        let keyword_overlap = if context.text.trim().is_empty() || rule.keywords.is_empty() {
            config.neutral_score
        } else {
            let lower = context.text.to_lowercase();
            let tokens: HashSet<&str> = lower
                .split(|c: char| !c.is_alphanumeric())
                .filter(|token| !token.is_empty())
                .collect();
            let matched = rule
                .keywords
                .iter()
                .filter(|keyword| {
                    if keyword.chars().any(|c| !c.is_alphanumeric()) {
                        lower.contains(keyword.as_str())
                    } else {
                        tokens.contains(keyword.as_str())
                    }
                })
                .count();
            matched as f32 / rule.keywords.len() as f32
        };

        let amount_threshold = match (rule.min_amount, context.amount_hint) {
            // No declared minimum is a satisfied constraint.
            (None, _) => 1.0,
            (Some(_), None) => config.neutral_score,
            (Some(min), Some(amount)) => {
                if amount >= min {
                    1.0
                } else {
                    0.0
                }
            }
        };

        let total = config.status_weight * payment_status
            + config.kind_weight * document_kind
            + config.category_weight * gl_category
            + config.keyword_weight * keyword_overlap
            + config.amount_weight * amount_threshold;

        FactorScores {
            payment_status,
            document_kind,
            gl_category,
            keyword_overlap,
            amount_threshold,
            total,
        }
    }

    /// Append the audit record for a decision and mark the outcome on it.
    fn audit_decision(
        &self,
        context: &DocumentContext,
        mut decision: RoutingDecision,
        classification: Option<&ClassificationResult>,
        consensus: Option<&ConsensusResult>,
    ) -> RoutingDecision {
        let payload = json!({
            "destination": decision.destination,
            "confidence": decision.confidence,
            "reasoning": decision.reasoning,
            "factors": decision.factors,
            "fallback": decision.fallback,
            "override_actor": decision.override_actor,
            "gl_code": classification.map(|c| c.code.clone()),
            "payment_status": consensus.map(|c| c.status),
        });
        let entry = AuditEntry::new(
            context.document_id,
            &context.tenant_id,
            AuditEvent::RoutingDecision,
            "routing",
            payload,
        );
        decision.audited = emit_or_log(self.audit.as_ref(), &entry);
        decision
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditError, MemoryAuditSink};
    use crate::models::{ClassificationMethod, DocumentKind};
    use uuid::Uuid;

    struct FailingSink;

    impl AuditSink for FailingSink {
        fn append(&self, _entry: &AuditEntry) -> Result<(), AuditError> {
            Err(AuditError::Append("sink offline".into()))
        }
    }

    fn router_with_sink(sink: Arc<dyn AuditSink>) -> DestinationRouter {
        DestinationRouter::with_default_rules(RoutingConfig::default(), sink).unwrap()
    }

    fn router() -> (DestinationRouter, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        (router_with_sink(sink.clone()), sink)
    }

    fn context(text: &str) -> DocumentContext {
        DocumentContext::new(Uuid::new_v4(), "tenant-a", text)
    }

    fn classification(code: &str, category: &str) -> ClassificationResult {
        ClassificationResult {
            code: code.into(),
            name: "Test Account".into(),
            category: category.into(),
            confidence: 0.9,
            reasoning: "test".into(),
            matched_keywords: vec![],
            method: ClassificationMethod::KeywordScore,
        }
    }

    fn consensus(status: PaymentStatus, confidence: f32, quality: f32) -> ConsensusResult {
        ConsensusResult {
            status,
            confidence,
            quality,
            consensus_reached: confidence >= 0.6,
            methods: vec![],
        }
    }

    #[test]
    fn rejects_incomplete_rule_set() {
        let mut rules = super::super::rules::default_rules();
        rules.retain(|rule| rule.destination != Destination::ClosedReceivable);
        let result = DestinationRouter::new(
            rules,
            RoutingConfig::default(),
            Arc::new(MemoryAuditSink::new()),
        );
        assert!(matches!(
            result,
            Err(RoutingError::MissingDestination(Destination::ClosedReceivable))
        ));
    }

    #[test]
    fn rejects_duplicate_rule() {
        let mut rules = super::super::rules::default_rules();
        rules.push(rules[0].clone());
        let result = DestinationRouter::new(
            rules,
            RoutingConfig::default(),
            Arc::new(MemoryAuditSink::new()),
        );
        assert!(matches!(
            result,
            Err(RoutingError::DuplicateDestination(Destination::OpenPayable))
        ));
    }

    #[test]
    fn unpaid_expense_invoice_routes_to_open_payable() {
        let (router, sink) = router();
        let decision = router.route(
            &context("Invoice #88. Amount due: $1,200.00, terms net 30.")
                .with_kind_hint(DocumentKind::Invoice)
                .with_amount_hint(1200.0),
            Some(&classification("6000", "operating_expenses")),
            Some(&consensus(PaymentStatus::Unpaid, 0.85, 0.8)),
        );
        assert_eq!(decision.destination, Destination::OpenPayable);
        assert!(!decision.fallback);
        assert!(decision.confidence > 0.9);
        assert!(decision.audited);
        assert_eq!(sink.len(), 1);

        let factors = decision.factors.unwrap();
        assert_eq!(factors.payment_status, 1.0);
        assert_eq!(factors.document_kind, 1.0);
        assert_eq!(factors.gl_category, 1.0);
        // invoice, amount due, net 30 out of five rule keywords.
        assert!((factors.keyword_overlap - 0.6).abs() < 1e-6);
        assert_eq!(factors.amount_threshold, 1.0);
    }

    #[test]
    fn paid_revenue_receipt_routes_to_closed_receivable() {
        let (router, _sink) = router();
        let decision = router.route(
            &context("Payment received with thanks. Remittance enclosed, account settled.")
                .with_kind_hint(DocumentKind::Receipt),
            Some(&classification("4000", "revenue")),
            Some(&consensus(PaymentStatus::Paid, 0.9, 0.85)),
        );
        assert_eq!(decision.destination, Destination::ClosedReceivable);
        assert!(!decision.fallback);
    }

    #[test]
    fn consensus_quality_bonus_raises_confidence() {
        let (router, _sink) = router();
        let base = router.route(
            &context("Invoice #5, amount due $50")
                .with_kind_hint(DocumentKind::Invoice)
                .with_amount_hint(50.0),
            Some(&classification("6000", "operating_expenses")),
            Some(&consensus(PaymentStatus::Unpaid, 0.5, 0.9)),
        );
        let bonused = router.route(
            &context("Invoice #5, amount due $50")
                .with_kind_hint(DocumentKind::Invoice)
                .with_amount_hint(50.0),
            Some(&classification("6000", "operating_expenses")),
            Some(&consensus(PaymentStatus::Unpaid, 0.85, 0.9)),
        );
        // Same factors; only the reached consensus adds its bonus.
        assert!(bonused.confidence > base.confidence);
    }

    #[test]
    fn missing_inputs_fall_back_by_status() {
        let (router, sink) = router();
        let decision = router.route(&context(""), None, None);
        // All factors neutral: nothing clears the threshold, and with no
        // status to go on the fallback lands on open payables.
        assert_eq!(decision.destination, Destination::OpenPayable);
        assert!(decision.fallback);
        assert!((decision.confidence - 0.5).abs() < 1e-6);
        assert!(decision.factors.is_some());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn paid_fallback_lands_on_closed_payable() {
        let mut config = RoutingConfig::default();
        config.routing_threshold = 0.7;
        let router = DestinationRouter::with_default_rules(config, Arc::new(MemoryAuditSink::new()))
            .unwrap();
        let decision = router.route(
            &context(""),
            None,
            Some(&consensus(PaymentStatus::Paid, 0.65, 0.5)),
        );
        assert_eq!(decision.destination, Destination::ClosedPayable);
        assert!(decision.fallback);
        assert!((decision.confidence - 0.7).abs() < 1e-6);
        assert!(decision.reasoning.contains("paid"));
    }

    #[test]
    fn equal_totals_break_to_declaration_order() {
        let (router, _sink) = router();
        // Unpaid invoice with no classification and no text: open payable
        // and open receivable tie on every factor.
        let decision = router.route(
            &context("").with_kind_hint(DocumentKind::Invoice),
            None,
            Some(&consensus(PaymentStatus::Unpaid, 0.9, 0.9)),
        );
        assert_eq!(decision.destination, Destination::OpenPayable);
        assert!(!decision.fallback);
    }

    #[test]
    fn override_routes_exactly_where_told() {
        let (router, sink) = router();
        let decision = router
            .route_override(&context("anything"), "closed_receivable", "maria")
            .unwrap();
        assert_eq!(decision.destination, Destination::ClosedReceivable);
        assert_eq!(decision.confidence, 1.0);
        assert_eq!(decision.reasoning, "manual override by maria");
        assert!(decision.is_override());
        assert!(decision.factors.is_none());
        assert!(decision.audited);
        assert_eq!(sink.len(), 1);
        assert_eq!(router.override_count(Destination::ClosedReceivable), 1);
        assert_eq!(router.override_count(Destination::OpenPayable), 0);

        router
            .route_override(&context("more"), "closed_receivable", "maria")
            .unwrap();
        assert_eq!(router.override_count(Destination::ClosedReceivable), 2);
    }

    #[test]
    fn override_rejects_unknown_destination_and_blank_actor() {
        let (router, sink) = router();
        let unknown = router.route_override(&context("x"), "trash_queue", "maria");
        match unknown {
            Err(RoutingError::UnknownDestination(name)) => assert_eq!(name, "trash_queue"),
            other => panic!("expected UnknownDestination, got {other:?}"),
        }
        assert!(matches!(
            router.route_override(&context("x"), "open_payable", "   "),
            Err(RoutingError::EmptyActor)
        ));
        // Failed overrides must not leave audit entries or counters.
        assert!(sink.is_empty());
        assert_eq!(router.override_count(Destination::OpenPayable), 0);
    }

    #[test]
    fn failed_audit_append_keeps_the_decision() {
        let router = router_with_sink(Arc::new(FailingSink));
        let decision = router.route(
            &context("Invoice, amount due $20").with_amount_hint(20.0),
            Some(&classification("6000", "operating_expenses")),
            Some(&consensus(PaymentStatus::Unpaid, 0.9, 0.9)),
        );
        assert!(!decision.audited);
        assert_eq!(decision.destination, Destination::OpenPayable);
    }

    #[test]
    fn audit_payload_carries_the_decision() {
        let (router, sink) = router();
        router.route(
            &context("Invoice, amount due $20").with_amount_hint(20.0),
            Some(&classification("6000", "operating_expenses")),
            Some(&consensus(PaymentStatus::Unpaid, 0.9, 0.9)),
        );
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.event, AuditEvent::RoutingDecision);
        assert_eq!(entry.component, "routing");
        assert_eq!(entry.payload["destination"], "open_payable");
        assert_eq!(entry.payload["gl_code"], "6000");
        assert_eq!(entry.payload["fallback"], false);
    }

    #[test]
    fn factor_scores_stay_in_unit_range() {
        let (router, _sink) = router();
        let contexts = [
            context("Invoice, amount due $20").with_amount_hint(0.0),
            context("").with_kind_hint(DocumentKind::Other),
            context("receipt paid thank you settled remittance deposit"),
        ];
        for ctx in &contexts {
            let decision = router.route(
                ctx,
                Some(&classification("4000", "revenue")),
                Some(&consensus(PaymentStatus::Partial, 0.7, 0.6)),
            );
            let factors = decision.factors.expect("scored decisions carry factors");
            for value in [
                factors.payment_status,
                factors.document_kind,
                factors.gl_category,
                factors.keyword_overlap,
                factors.amount_threshold,
            ] {
                assert!((0.0..=1.0).contains(&value), "factor {value} out of range");
            }
            assert!(factors.total <= 1.0 + f32::EPSILON);
        }
    }
}
