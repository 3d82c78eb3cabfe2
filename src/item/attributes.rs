use crate::item::schema::{SearchableItem, TextFields};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

/// Uniform type identifier attached to every entry.
pub const CONTENT_TYPE: &str = "public.text";

/// Native attribute set for one searchable item.
///
/// Every value has already been converted to the type the index stores.
/// Values that did not convert are absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSet {
    pub content_type: &'static str,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_eligible_for_search: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_eligible_for_prediction: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_data: Option<Vec<u8>>,
    #[serde(rename = "thumbnailURL", skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<Url>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_rating: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<f64>,

    #[serde(flatten)]
    pub text: TextFields,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instant_message_addresses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_unique_identifiers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info: Option<Map<String, Value>>,
}

impl AttributeSet {
    pub fn from_item(item: &SearchableItem) -> Self {
        Self {
            content_type: CONTENT_TYPE,
            title: item.title.clone(),
            content_description: item.content_description.clone(),
            keywords: item.keywords.clone(),
            url: item.url.as_deref().and_then(|raw| parse_url("url", raw)),
            domain_identifier: item.domain_identifier.clone(),
            is_eligible_for_search: item.is_eligible_for_search,
            is_eligible_for_prediction: item.is_eligible_for_prediction,
            thumbnail_data: item.thumbnail_data.as_deref().and_then(decode_thumbnail),
            thumbnail_url: item
                .thumbnail_url
                .as_deref()
                .and_then(|raw| parse_url("thumbnailURL", raw)),
            start_date: item.start_date.and_then(|ms| epoch_millis("startDate", ms)),
            end_date: item.end_date.and_then(|ms| epoch_millis("endDate", ms)),
            last_used_date: item
                .last_used_date
                .and_then(|ms| epoch_millis("lastUsedDate", ms)),
            creation_date: item
                .creation_date
                .and_then(|ms| epoch_millis("creationDate", ms)),
            modification_date: item
                .modification_date
                .and_then(|ms| epoch_millis("modificationDate", ms)),
            expiration_date: item
                .expiration_date
                .and_then(|ms| epoch_millis("expirationDate", ms)),
            rating: item.rating,
            view_count: item.view_count,
            use_count: item.use_count,
            content_rating: item.content_rating,
            latitude: item.latitude,
            longitude: item.longitude,
            altitude: item.altitude,
            speed: item.speed,
            course: item.course,
            text: item.text.clone(),
            instant_message_addresses: item.instant_message_addresses.clone(),
            related_unique_identifiers: item.related_unique_identifiers.clone(),
            user_info: item.user_info.clone(),
        }
    }

    /// Number of attributes that carry a value, content type included.
    pub fn populated_count(&self) -> usize {
        serde_json::to_value(self)
            .ok()
            .and_then(|value| value.as_object().map(Map::len))
            .unwrap_or(0)
    }
}

fn parse_url(field: &'static str, raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(err) => {
            tracing::debug!(field, value = raw, error = %err, "omitting unparseable URL");
            None
        }
    }
}

fn decode_thumbnail(raw: &str) -> Option<Vec<u8>> {
    match base64::engine::general_purpose::STANDARD.decode(raw) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            tracing::debug!(error = %err, "omitting undecodable thumbnail data");
            None
        }
    }
}

/// Epoch milliseconds to a UTC timestamp, keeping sub-millisecond precision.
fn epoch_millis(field: &'static str, millis: f64) -> Option<DateTime<Utc>> {
    let micros = (millis * 1000.0).round();
    let converted = if micros.is_finite() && micros.abs() < i64::MAX as f64 {
        DateTime::from_timestamp_micros(micros as i64)
    } else {
        None
    };
    if converted.is_none() {
        tracing::debug!(field, millis, "omitting out-of-range date");
    }
    converted
}

/// What gets submitted to the index for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub unique_identifier: String,
    pub domain_identifier: Option<String>,
    pub attributes: AttributeSet,
}

impl IndexEntry {
    pub fn from_item(item: &SearchableItem) -> Self {
        Self {
            unique_identifier: item.unique_identifier.clone(),
            domain_identifier: item.domain_identifier.clone(),
            attributes: AttributeSet::from_item(item),
        }
    }
}

impl From<&SearchableItem> for IndexEntry {
    fn from(item: &SearchableItem) -> Self {
        Self::from_item(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item() -> SearchableItem {
        SearchableItem::new("doc-1", "Document")
    }

    #[test]
    fn test_minimal_item() {
        let attributes = AttributeSet::from_item(&item());
        assert_eq!(attributes.content_type, "public.text");
        assert_eq!(attributes.title, "Document");
        assert_eq!(attributes.populated_count(), 2);
    }

    #[test]
    fn test_dates_are_epoch_millis() {
        let mut item = item();
        item.start_date = Some(1_700_000_000_000.0);
        item.end_date = Some(1_700_000_000_500.5);

        let attributes = AttributeSet::from_item(&item);
        assert_eq!(
            attributes.start_date,
            Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
        );
        assert_eq!(
            attributes.end_date,
            Some(Utc.timestamp_opt(1_700_000_000, 500_500_000).unwrap())
        );
    }

    #[test]
    fn test_out_of_range_date_omitted() {
        let mut item = item();
        item.expiration_date = Some(f64::MAX);
        assert_eq!(AttributeSet::from_item(&item).expiration_date, None);
    }

    #[test]
    fn test_bad_url_omitted() {
        let mut item = item();
        item.url = Some("not a url".to_string());
        item.thumbnail_url = Some("https://example.com/thumb.png".to_string());

        let attributes = AttributeSet::from_item(&item);
        assert_eq!(attributes.url, None);
        assert_eq!(
            attributes.thumbnail_url.unwrap().as_str(),
            "https://example.com/thumb.png"
        );
    }

    #[test]
    fn test_custom_scheme_url_kept() {
        let mut item = item();
        item.url = Some("myapp://document/1".to_string());
        let url = AttributeSet::from_item(&item).url.unwrap();
        assert_eq!(url.scheme(), "myapp");
    }

    #[test]
    fn test_thumbnail_base64() {
        let mut item = item();
        item.thumbnail_data = Some("aGVsbG8=".to_string());
        assert_eq!(
            AttributeSet::from_item(&item).thumbnail_data.as_deref(),
            Some(&b"hello"[..])
        );

        item.thumbnail_data = Some("%%%".to_string());
        assert_eq!(AttributeSet::from_item(&item).thumbnail_data, None);
    }

    #[test]
    fn test_entry_carries_domain() {
        let mut item = item();
        item.domain_identifier = Some("com.myapp.documents".to_string());

        let entry = IndexEntry::from(&item);
        assert_eq!(entry.unique_identifier, "doc-1");
        assert_eq!(entry.domain_identifier.as_deref(), Some("com.myapp.documents"));
        assert_eq!(
            entry.attributes.domain_identifier.as_deref(),
            Some("com.myapp.documents")
        );
    }
}
