use crate::index::client::{IndexClient, IndexError};
use crate::item::IndexEntry;
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<String, IndexEntry>,
    failure: Option<String>,
    calls: usize,
}

/// In-process index with the same replace and delete semantics as the
/// system one.
///
/// Failures can be injected to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    state: Mutex<State>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following operation fail with `message` until [`Self::recover`].
    pub fn fail_with(&self, message: impl Into<String>) {
        self.state.lock().failure = Some(message.into());
    }

    pub fn recover(&self) {
        self.state.lock().failure = None;
    }

    /// Number of index or delete operations received, failed ones included.
    pub fn native_calls(&self) -> usize {
        self.state.lock().calls
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, unique_identifier: &str) -> Option<IndexEntry> {
        self.state.lock().entries.get(unique_identifier).cloned()
    }

    /// Identifiers in sorted order
    pub fn identifiers(&self) -> Vec<String> {
        self.state.lock().entries.keys().cloned().collect()
    }

    fn with_state<F>(&self, operation: &'static str, f: F) -> Result<(), IndexError>
    where
        F: FnOnce(&mut BTreeMap<String, IndexEntry>),
    {
        let mut state = self.state.lock();
        state.calls += 1;
        if let Some(message) = &state.failure {
            return Err(IndexError::Native {
                operation,
                message: message.clone(),
            });
        }
        f(&mut state.entries);
        Ok(())
    }
}

fn in_domain(entry: &IndexEntry, domain: &str) -> bool {
    entry.domain_identifier.as_deref().is_some_and(|own| {
        own == domain
            || own
                .strip_prefix(domain)
                .is_some_and(|rest| rest.starts_with('.'))
    })
}

impl IndexClient for MemoryIndex {
    fn is_available(&self) -> bool {
        true
    }

    fn index_entries(&self, entries: &[IndexEntry]) -> Result<(), IndexError> {
        self.with_state("index", |map| {
            for entry in entries {
                map.insert(entry.unique_identifier.clone(), entry.clone());
            }
        })
    }

    fn delete_identifiers(&self, identifiers: &[String]) -> Result<(), IndexError> {
        self.with_state("delete", |map| {
            for id in identifiers {
                map.remove(id);
            }
        })
    }

    fn delete_all(&self) -> Result<(), IndexError> {
        self.with_state("delete all", |map| map.clear())
    }

    fn delete_domains(&self, domains: &[String]) -> Result<(), IndexError> {
        self.with_state("delete domains", |map| {
            map.retain(|_, entry| !domains.iter().any(|domain| in_domain(entry, domain)));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::SearchableItem;

    fn entry(id: &str, domain: Option<&str>) -> IndexEntry {
        let mut item = SearchableItem::new(id, format!("Title {id}"));
        item.domain_identifier = domain.map(str::to_string);
        IndexEntry::from_item(&item)
    }

    #[test]
    fn test_index_replaces_by_identifier() {
        let index = MemoryIndex::new();
        index.index_entries(&[entry("a", None)]).unwrap();
        let mut updated = entry("a", None);
        updated.attributes.title = "Renamed".to_string();
        index.index_entries(&[updated]).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a").unwrap().attributes.title, "Renamed");
    }

    #[test]
    fn test_delete_domain_includes_subdomains() {
        let index = MemoryIndex::new();
        index
            .index_entries(&[
                entry("a", Some("com.app")),
                entry("b", Some("com.app.notes")),
                entry("c", Some("com.application")),
                entry("d", None),
            ])
            .unwrap();

        index.delete_domains(&["com.app".to_string()]).unwrap();
        assert_eq!(index.identifiers(), vec!["c", "d"]);
    }

    #[test]
    fn test_failure_injection() {
        let index = MemoryIndex::new();
        index.fail_with("disk full");

        let err = index.index_entries(&[entry("a", None)]).unwrap_err();
        assert_eq!(err.to_string(), "index failed: disk full");
        assert!(index.is_empty());
        assert_eq!(index.native_calls(), 1);

        index.recover();
        index.index_entries(&[entry("a", None)]).unwrap();
        assert_eq!(index.len(), 1);
    }
}
