// Price Data - Core Library
// Named price records over a delimited document, with staged, reversible
// numeric transforms that are committed back to storage as a whole.

pub mod config;
pub mod error;
pub mod document;    // Storage collaborator: parse/write the price table
pub mod transform;   // Staged transforms + shift method dispatch
pub mod diff;        // Single-line diff rendering
pub mod record;      // One record + its pending chain
pub mod collection;  // The whole document as a record map

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::DocumentConfig;
pub use error::{PriceDataError, Result};
pub use document::{Document, Node};
pub use transform::{format_value, ShiftMethod, Transform};
pub use diff::{compare, Comparison};
pub use record::{Persist, PriceRecord, RecordSnapshot};
pub use collection::{PriceData, RecordMap};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
