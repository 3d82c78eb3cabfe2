use crate::item::IndexEntry;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("search index is not available on this platform")]
    Unavailable,

    #[error("{operation} failed: {message}")]
    Native {
        operation: &'static str,
        message: String,
    },
}

/// Primitive operations of a platform search index.
///
/// Implementations report failures; deciding what to do with them is the
/// caller's business.
pub trait IndexClient: Send + Sync {
    /// Whether this platform has a search index at all
    fn is_available(&self) -> bool;

    /// Add or replace entries, keyed by unique identifier
    fn index_entries(&self, entries: &[IndexEntry]) -> Result<(), IndexError>;

    fn delete_identifiers(&self, identifiers: &[String]) -> Result<(), IndexError>;

    fn delete_all(&self) -> Result<(), IndexError>;

    /// Delete every entry in the given domains and their subdomains
    fn delete_domains(&self, domains: &[String]) -> Result<(), IndexError>;
}

impl<C: IndexClient + ?Sized> IndexClient for std::sync::Arc<C> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn index_entries(&self, entries: &[IndexEntry]) -> Result<(), IndexError> {
        (**self).index_entries(entries)
    }

    fn delete_identifiers(&self, identifiers: &[String]) -> Result<(), IndexError> {
        (**self).delete_identifiers(identifiers)
    }

    fn delete_all(&self) -> Result<(), IndexError> {
        (**self).delete_all()
    }

    fn delete_domains(&self, domains: &[String]) -> Result<(), IndexError> {
        (**self).delete_domains(domains)
    }
}
