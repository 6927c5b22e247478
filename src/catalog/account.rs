// General-ledger account catalog: the chart of accounts the classifier
// scores against. Loaded from JSON once, validated, then shared read-only.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::CatalogError;

/// One general-ledger account: a code, a display name, a coarse category
/// and the lowercase keywords that vote for it during classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlAccount {
    pub code: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// The configured chart of accounts. Never mutated in place; a runtime
/// update builds a fresh [`Catalog`] and swaps it through the handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub accounts: Vec<GlAccount>,
}

impl Catalog {
    /// Parse and validate a catalog from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// The chart of accounts shipped with the crate.
    pub fn bundled() -> Self {
        Self::from_json_str(include_str!("../../resources/gl_catalog.json"))
            .expect("bundled GL catalog is valid")
    }

    /// Reject catalogs the classifier cannot work with: no accounts at
    /// all, or two accounts claiming the same code.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.accounts.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for account in &self.accounts {
            if !seen.insert(account.code.as_str()) {
                return Err(CatalogError::DuplicateCode(account.code.clone()));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
