use crate::index::client::{IndexClient, IndexError};
use crate::item::{IndexEntry, ItemError, ParsedItem, SearchableItem};
use serde_json::Value;

/// The operations exposed to JavaScript.
///
/// Only item validation errors reach the caller. Index failures are logged
/// and dropped, so every other call succeeds once it has been handed to
/// the client. When the client has no index, indexing resolves at once
/// without looking at the payload.
#[derive(Debug, Default)]
pub struct SpotlightModule<C> {
    client: C,
}

impl<C: IndexClient> SpotlightModule<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn is_available(&self) -> bool {
        self.client.is_available()
    }

    /// Add or update one item.
    pub fn index_item(&self, item: &Value) -> Result<(), ItemError> {
        if !self.client.is_available() {
            tracing::debug!("search index unavailable, item ignored");
            return Ok(());
        }
        let parsed = SearchableItem::from_value(item)?;
        let entry = entry_for(parsed);
        submit("index item", self.client.index_entries(&[entry]));
        Ok(())
    }

    /// Add or update many items in one call. Nothing is submitted unless
    /// every item is valid.
    pub fn index_items(&self, items: &[Value]) -> Result<(), ItemError> {
        if !self.client.is_available() {
            tracing::debug!(count = items.len(), "search index unavailable, items ignored");
            return Ok(());
        }
        let entries: Vec<IndexEntry> = SearchableItem::from_values(items)?
            .into_iter()
            .map(entry_for)
            .collect();
        submit("index items", self.client.index_entries(&entries));
        Ok(())
    }

    pub fn remove_item(&self, unique_identifier: &str) {
        submit(
            "remove item",
            self.client
                .delete_identifiers(&[unique_identifier.to_string()]),
        );
    }

    pub fn remove_items(&self, unique_identifiers: &[String]) {
        submit(
            "remove items",
            self.client.delete_identifiers(unique_identifiers),
        );
    }

    pub fn remove_all_items(&self) {
        submit("remove all items", self.client.delete_all());
    }

    pub fn remove_all_items_from_domain(&self, domain_identifier: &str) {
        submit(
            "remove items from domain",
            self.client
                .delete_domains(&[domain_identifier.to_string()]),
        );
    }
}

fn entry_for(parsed: ParsedItem) -> IndexEntry {
    for warning in &parsed.warnings {
        tracing::debug!(
            id = %parsed.item.unique_identifier,
            "{warning}"
        );
    }
    IndexEntry::from_item(&parsed.item)
}

fn submit(action: &'static str, result: Result<(), IndexError>) {
    if let Err(err) = result {
        tracing::error!(action, error = %err, "search index operation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{MemoryIndex, UnsupportedPlatform};
    use serde_json::json;

    fn module() -> SpotlightModule<MemoryIndex> {
        SpotlightModule::new(MemoryIndex::new())
    }

    #[test]
    fn test_index_and_remove() {
        let module = module();
        module
            .index_item(&json!({ "uniqueIdentifier": "a", "title": "A" }))
            .unwrap();
        module
            .index_items(&[
                json!({ "uniqueIdentifier": "b", "title": "B", "domainIdentifier": "notes" }),
                json!({ "uniqueIdentifier": "c", "title": "C", "domainIdentifier": "notes" }),
            ])
            .unwrap();
        assert_eq!(module.client().len(), 3);

        module.remove_item("a");
        module.remove_all_items_from_domain("notes");
        assert!(module.client().is_empty());
    }

    #[test]
    fn test_invalid_item_is_returned() {
        let module = module();
        let err = module
            .index_item(&json!({ "uniqueIdentifier": "a" }))
            .unwrap_err();
        assert_eq!(err, ItemError::MissingField { field: "title" });
        assert_eq!(module.client().native_calls(), 0);
    }

    #[test]
    fn test_batch_with_invalid_item_submits_nothing() {
        let module = module();
        let result = module.index_items(&[
            json!({ "uniqueIdentifier": "a", "title": "A" }),
            json!({ "title": "no id" }),
        ]);
        assert!(matches!(result, Err(ItemError::InBatch { index: 1, .. })));
        assert_eq!(module.client().native_calls(), 0);
        assert!(module.client().is_empty());
    }

    #[test]
    fn test_native_failure_is_swallowed() {
        let module = module();
        module.client().fail_with("quota exceeded");

        assert!(module
            .index_item(&json!({ "uniqueIdentifier": "a", "title": "A" }))
            .is_ok());
        module.remove_items(&["a".to_string()]);
        module.remove_all_items();
        assert_eq!(module.client().native_calls(), 3);
    }

    #[test]
    fn test_unsupported_platform_resolves_without_validation() {
        let module = SpotlightModule::new(UnsupportedPlatform);
        assert!(!module.is_available());
        assert_eq!(module.index_item(&json!({ "title": "x" })), Ok(()));
        assert_eq!(module.index_item(&json!("not an object")), Ok(()));
        assert_eq!(
            module.index_items(&[json!({ "uniqueIdentifier": "a", "title": "A" }), json!(42)]),
            Ok(())
        );
        module.remove_all_items();
    }
}
