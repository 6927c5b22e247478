use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parse failure for string-backed enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid enum value for {field}: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(PaymentStatus {
    Paid => "paid",
    Unpaid => "unpaid",
    Partial => "partial",
    Void => "void",
    Unknown => "unknown",
});

// The four fixed billing queues. Routing always lands on one of these.
str_enum!(Destination {
    OpenPayable => "open_payable",
    ClosedPayable => "closed_payable",
    OpenReceivable => "open_receivable",
    ClosedReceivable => "closed_receivable",
});

str_enum!(DocumentKind {
    Invoice => "invoice",
    Receipt => "receipt",
    Statement => "statement",
    PurchaseOrder => "purchase_order",
    CreditNote => "credit_note",
    RemittanceAdvice => "remittance_advice",
    Other => "other",
});

// Declaration order is detector priority (derived Ord): when two payment-status
// groups tie on score, the group holding the earliest variant wins.
str_enum!(DetectorKind {
    Pattern => "pattern",
    Keyword => "keyword",
    Amount => "amount",
    Stamp => "stamp",
});

str_enum!(ClassificationMethod {
    Provided => "provided",
    VendorLookup => "vendor_lookup",
    KeywordScore => "keyword_score",
    PatternMatch => "pattern_match",
    CategoryFallback => "category_fallback",
    Default => "default",
});

str_enum!(AuditEvent {
    RoutingDecision => "routing_decision",
    PipelineCompleted => "pipeline_completed",
    PipelineFailed => "pipeline_failed",
});
