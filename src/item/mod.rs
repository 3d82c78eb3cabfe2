//! The searchable item payload and its mapping to native index attributes.

pub mod attributes;
pub mod schema;

pub use attributes::{AttributeSet, IndexEntry, CONTENT_TYPE};
pub use schema::{ItemError, ItemWarning, ParsedItem, SearchableItem, TextFields, KNOWN_FIELDS};
