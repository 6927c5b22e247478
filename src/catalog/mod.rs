pub mod account;
pub mod index;

pub use account::*;
pub use index::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog parsing failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Catalog has no accounts")]
    Empty,

    #[error("Duplicate GL code in catalog: {0}")]
    DuplicateCode(String),
}
