use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::DocumentKind;

/// Immutable per-document input, assembled once by the orchestrator and
/// read-only for the rest of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentContext {
    pub document_id: Uuid,
    pub tenant_id: String,
    /// Extracted document text. May be empty when extraction degraded.
    pub text: String,
    pub vendor_hint: Option<String>,
    pub amount_hint: Option<f64>,
    pub kind_hint: Option<DocumentKind>,
    /// GL code already known to the caller (e.g. from a recurring vendor
    /// contract). Honored by the classifier when it resolves in the catalog.
    pub known_gl_code: Option<String>,
}

impl DocumentContext {
    pub fn new(document_id: Uuid, tenant_id: &str, text: &str) -> Self {
        Self {
            document_id,
            tenant_id: tenant_id.to_string(),
            text: text.to_string(),
            vendor_hint: None,
            amount_hint: None,
            kind_hint: None,
            known_gl_code: None,
        }
    }

    pub fn with_vendor_hint(mut self, vendor: &str) -> Self {
        self.vendor_hint = Some(vendor.to_string());
        self
    }

    pub fn with_amount_hint(mut self, amount: f64) -> Self {
        self.amount_hint = Some(amount);
        self
    }

    pub fn with_kind_hint(mut self, kind: DocumentKind) -> Self {
        self.kind_hint = Some(kind);
        self
    }

    pub fn with_known_gl_code(mut self, code: &str) -> Self {
        self.known_gl_code = Some(code.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_has_no_hints() {
        let ctx = DocumentContext::new(Uuid::new_v4(), "tenant-1", "Invoice #42");
        assert_eq!(ctx.tenant_id, "tenant-1");
        assert_eq!(ctx.text, "Invoice #42");
        assert!(ctx.vendor_hint.is_none());
        assert!(ctx.amount_hint.is_none());
        assert!(ctx.kind_hint.is_none());
        assert!(ctx.known_gl_code.is_none());
    }

    #[test]
    fn builder_setters_populate_hints() {
        let ctx = DocumentContext::new(Uuid::new_v4(), "tenant-1", "text")
            .with_vendor_hint("Acme Office Supply")
            .with_amount_hint(129.99)
            .with_kind_hint(DocumentKind::Invoice)
            .with_known_gl_code("6100");

        assert_eq!(ctx.vendor_hint.as_deref(), Some("Acme Office Supply"));
        assert_eq!(ctx.amount_hint, Some(129.99));
        assert_eq!(ctx.kind_hint, Some(DocumentKind::Invoice));
        assert_eq!(ctx.known_gl_code.as_deref(), Some("6100"));
    }

    #[test]
    fn context_serializes() {
        let ctx = DocumentContext::new(Uuid::nil(), "t", "hello")
            .with_kind_hint(DocumentKind::Receipt);
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("\"receipt\""));
        assert!(json.contains("\"tenant_id\":\"t\""));
    }
}
