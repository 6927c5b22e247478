//! Audit trail seam.
//!
//! Every routing decision and pipeline completion produces one
//! [`AuditEntry`]. Persistence is the embedding service's concern; the
//! crate ships a mutex-buffered in-memory sink for services that collect
//! entries themselves and for tests.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::models::AuditEvent;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),

    #[error("Audit append failed: {0}")]
    Append(String),
}

/// One immutable audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub entry_id: Uuid,
    pub document_id: Uuid,
    pub tenant_id: String,
    pub event: AuditEvent,
    /// Component that produced the entry, e.g. "routing" or "pipeline".
    pub component: String,
    pub payload: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        document_id: Uuid,
        tenant_id: &str,
        event: AuditEvent,
        component: &str,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            document_id,
            tenant_id: tenant_id.to_string(),
            event,
            component: component.to_string(),
            payload,
            recorded_at: Utc::now(),
        }
    }
}

/// Destination for audit entries. Implementations must not block for long;
/// the pipeline appends inline.
pub trait AuditSink: Send + Sync {
    fn append(&self, entry: &AuditEntry) -> Result<(), AuditError>;
}

// ═══════════════════════════════════════════════════════════
// In-memory sink
// ═══════════════════════════════════════════════════════════

/// Mutex-buffered sink. Entries stay in memory until the owner drains them.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AuditError::Unavailable("audit buffer lock poisoned".into()))?;
        entries.push(entry.clone());
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════

/// Append an entry, logging and swallowing a failure. The caller's flow
/// must not break because the audit trail is down; returns whether the
/// append succeeded so the decision can record the outcome.
pub fn emit_or_log(sink: &dyn AuditSink, entry: &AuditEntry) -> bool {
    match sink.append(entry) {
        Ok(()) => true,
        Err(err) => {
            warn!(
                document_id = %entry.document_id,
                event = entry.event.as_str(),
                error = %err,
                "audit append failed, continuing without audit record"
            );
            false
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
