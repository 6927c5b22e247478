// Derived lookup structures over a catalog, and the shared handle that
// lets a running engine swap catalogs without pausing classification.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::account::{Catalog, GlAccount};
use super::CatalogError;

/// Reverse indexes over a catalog: keyword to candidate codes, category
/// to member codes, and code to account. Built once per catalog version.
#[derive(Debug)]
pub struct KeywordIndex {
    by_keyword: HashMap<String, Vec<String>>,
    by_category: HashMap<String, Vec<String>>,
    by_code: HashMap<String, GlAccount>,
}

impl KeywordIndex {
    pub fn build(catalog: &Catalog) -> Self {
        let mut by_keyword: HashMap<String, Vec<String>> = HashMap::new();
        let mut by_category: HashMap<String, Vec<String>> = HashMap::new();
        let mut by_code = HashMap::new();

        for account in &catalog.accounts {
            for keyword in &account.keywords {
                by_keyword
                    .entry(keyword.to_lowercase())
                    .or_default()
                    .push(account.code.clone());
            }
            by_category
                .entry(account.category.to_lowercase())
                .or_default()
                .push(account.code.clone());
            by_code.insert(account.code.clone(), account.clone());
        }

        // Sorted candidate lists keep scoring deterministic when one
        // keyword maps to several accounts.
        for codes in by_keyword.values_mut() {
            codes.sort();
            codes.dedup();
        }
        for codes in by_category.values_mut() {
            codes.sort();
            codes.dedup();
        }

        Self {
            by_keyword,
            by_category,
            by_code,
        }
    }

    pub fn account(&self, code: &str) -> Option<&GlAccount> {
        self.by_code.get(code)
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    pub fn codes_for_keyword(&self, keyword: &str) -> &[String] {
        self.by_keyword
            .get(&keyword.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn codes_for_category(&self, category: &str) -> &[String] {
        self.by_category
            .get(&category.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All indexed keywords with their candidate codes, for text scans.
    pub fn keywords(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.by_keyword
            .iter()
            .map(|(keyword, codes)| (keyword.as_str(), codes.as_slice()))
    }

    pub fn keyword_count(&self) -> usize {
        self.by_keyword.len()
    }
}

/// A catalog together with its derived indexes, frozen at one version.
/// Snapshots are immutable and shared via `Arc`, so a classification that
/// loaded version N keeps reading version N even if a swap lands mid-call.
#[derive(Debug)]
pub struct CatalogSnapshot {
    pub catalog: Catalog,
    pub index: KeywordIndex,
    pub version: u64,
}

/// Cloneable handle to the current catalog snapshot. Reads clone an `Arc`
/// under a briefly held lock; updates build the replacement snapshot
/// entirely outside the lock and then swap the pointer.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    inner: Arc<RwLock<Arc<CatalogSnapshot>>>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        let snapshot = CatalogSnapshot {
            index: KeywordIndex::build(&catalog),
            catalog,
            version: 1,
        };
        Self {
            inner: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// Current snapshot. A poisoned lock still holds a fully built
    /// snapshot, so recovery is safe.
    pub fn load(&self) -> Arc<CatalogSnapshot> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Validate and install a replacement catalog. Readers never observe
    /// a partially built index; they see either the old snapshot or the
    /// new one. Returns the new version number.
    pub fn swap(&self, catalog: Catalog) -> Result<u64, CatalogError> {
        catalog.validate()?;
        let index = KeywordIndex::build(&catalog);
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let version = guard.version + 1;
        *guard = Arc::new(CatalogSnapshot {
            catalog,
            index,
            version,
        });
        Ok(version)
    }

    pub fn version(&self) -> u64 {
        self.load().version
    }
}
