use crate::index::client::{IndexClient, IndexError};
use crate::item::IndexEntry;

/// Client for platforms without a system search index.
///
/// Reports itself unavailable and accepts every operation as a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPlatform;

impl IndexClient for UnsupportedPlatform {
    fn is_available(&self) -> bool {
        false
    }

    fn index_entries(&self, _entries: &[IndexEntry]) -> Result<(), IndexError> {
        Ok(())
    }

    fn delete_identifiers(&self, _identifiers: &[String]) -> Result<(), IndexError> {
        Ok(())
    }

    fn delete_all(&self) -> Result<(), IndexError> {
        Ok(())
    }

    fn delete_domains(&self, _domains: &[String]) -> Result<(), IndexError> {
        Ok(())
    }
}
