pub mod classify;
pub mod consensus;
pub mod processor; // store → extract → classify → consensus → route
pub mod routing;
pub mod types;

pub use processor::{build_processor, DocumentProcessor, ProcessingError};
pub use types::{
    DocumentStore, ExtractError, ExtractedText, ExtractionSummary, ProcessRequest,
    ProcessingOutcome, StorageError, StoredDocument, TextExtractor,
};
