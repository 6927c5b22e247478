//! The default rule set: one matching profile per billing queue.

use super::types::DestinationRule;
use crate::models::{Destination, DocumentKind, PaymentStatus};

/// Expense-side GL categories from the bundled chart of accounts.
fn expense_categories() -> Vec<String> {
    [
        "cost_of_goods",
        "operating_expenses",
        "technology",
        "facilities",
        "travel",
        "professional_services",
        "marketing",
        "insurance",
        "payroll",
        "financial",
        "taxes",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn revenue_categories() -> Vec<String> {
    vec!["revenue".into()]
}

/// One rule per destination, in declaration order. Payables and
/// receivables share status profiles; GL category, document kind and
/// wording tell them apart.
pub fn default_rules() -> Vec<DestinationRule> {
    vec![
        DestinationRule {
            destination: Destination::OpenPayable,
            statuses: vec![PaymentStatus::Unpaid, PaymentStatus::Partial],
            kinds: vec![
                DocumentKind::Invoice,
                DocumentKind::Statement,
                DocumentKind::PurchaseOrder,
            ],
            categories: expense_categories(),
            keywords: vec![
                "invoice".into(),
                "amount due".into(),
                "net 30".into(),
                "payable".into(),
                "remit".into(),
            ],
            min_amount: Some(0.01),
        },
        DestinationRule {
            destination: Destination::ClosedPayable,
            statuses: vec![PaymentStatus::Paid, PaymentStatus::Void],
            kinds: vec![
                DocumentKind::Receipt,
                DocumentKind::Invoice,
                DocumentKind::CreditNote,
            ],
            categories: expense_categories(),
            keywords: vec![
                "receipt".into(),
                "paid".into(),
                "payment received".into(),
                "thank you".into(),
            ],
            min_amount: None,
        },
        DestinationRule {
            destination: Destination::OpenReceivable,
            statuses: vec![PaymentStatus::Unpaid, PaymentStatus::Partial],
            kinds: vec![
                DocumentKind::Invoice,
                DocumentKind::Statement,
                DocumentKind::RemittanceAdvice,
            ],
            categories: revenue_categories(),
            keywords: vec![
                "customer invoice".into(),
                "please pay".into(),
                "due upon receipt".into(),
                "billed to".into(),
            ],
            min_amount: Some(0.01),
        },
        DestinationRule {
            destination: Destination::ClosedReceivable,
            statuses: vec![PaymentStatus::Paid, PaymentStatus::Void],
            kinds: vec![
                DocumentKind::Receipt,
                DocumentKind::RemittanceAdvice,
                DocumentKind::CreditNote,
            ],
            categories: revenue_categories(),
            keywords: vec![
                "payment received".into(),
                "remittance".into(),
                "settled".into(),
                "deposit".into(),
            ],
            min_amount: None,
        },
    ]
}
