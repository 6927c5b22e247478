pub mod document;
pub mod enums;

pub use document::*;
pub use enums::*;
