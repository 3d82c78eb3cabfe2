use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A record for the system search index.
///
/// Only `unique_identifier` and `title` are required. Dates are epoch
/// milliseconds, as delivered by the JavaScript layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchableItem {
    pub unique_identifier: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_eligible_for_search: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_eligible_for_prediction: Option<bool>,
    /// Base64-encoded image bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_data: Option<String>,
    #[serde(default, rename = "thumbnailURL", skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_date: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_rating: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<f64>,

    #[serde(flatten)]
    pub text: TextFields,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instant_message_addresses: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_unique_identifiers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<Map<String, Value>>,
}

/// Contact, classification and media-credit strings, copied verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
}

/// Every wire name the schema understands.
pub const KNOWN_FIELDS: &[&str] = &[
    "uniqueIdentifier",
    "title",
    "contentDescription",
    "keywords",
    "url",
    "domainIdentifier",
    "isEligibleForSearch",
    "isEligibleForPrediction",
    "thumbnailData",
    "thumbnailURL",
    "startDate",
    "endDate",
    "lastUsedDate",
    "creationDate",
    "modificationDate",
    "expirationDate",
    "rating",
    "viewCount",
    "useCount",
    "contentRating",
    "latitude",
    "longitude",
    "altitude",
    "speed",
    "course",
    "countryCode",
    "languageCode",
    "phoneNumber",
    "emailAddress",
    "organizationName",
    "departmentName",
    "jobTitle",
    "givenName",
    "familyName",
    "middleName",
    "nickname",
    "namePrefix",
    "nameSuffix",
    "genre",
    "type",
    "platform",
    "version",
    "author",
    "editor",
    "director",
    "producer",
    "composer",
    "artist",
    "album",
    "instantMessageAddresses",
    "relatedUniqueIdentifiers",
    "userInfo",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("searchable item must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },

    #[error("searchable item is missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("item {index}: {source}")]
    InBatch {
        index: usize,
        #[source]
        source: Box<ItemError>,
    },
}

/// Something in a payload that was accepted but ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemWarning {
    UnknownField {
        field: String,
        suggestion: Option<&'static str>,
    },
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

impl std::fmt::Display for ItemWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemWarning::UnknownField {
                field,
                suggestion: Some(suggestion),
            } => write!(f, "unknown field '{field}' (did you mean '{suggestion}'?)"),
            ItemWarning::UnknownField { field, .. } => write!(f, "unknown field '{field}'"),
            ItemWarning::WrongType { field, expected } => {
                write!(f, "field '{field}' ignored: expected {expected}")
            }
        }
    }
}

/// A validated item and whatever was dropped while reading it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedItem {
    pub item: SearchableItem,
    pub warnings: Vec<ItemWarning>,
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Integer value of a JSON number, accepting doubles with no fractional
/// part since JavaScript has a single number type.
fn whole_number(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

/// Reads optional fields out of a loosely-typed object, recording
/// fields that are present with the wrong type.
struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    warnings: Vec<ItemWarning>,
}

impl<'a> FieldReader<'a> {
    fn get(&mut self, field: &'static str, expected: &'static str) -> Option<&'a Value> {
        match self.object.get(field) {
            None | Some(Value::Null) => None,
            Some(value) => {
                let matches = match expected {
                    "a string" => value.is_string(),
                    "a number" => value.is_number(),
                    "an integer" => whole_number(value).is_some(),
                    "a boolean" => value.is_boolean(),
                    "an array of strings" => value
                        .as_array()
                        .is_some_and(|items| items.iter().all(Value::is_string)),
                    "an object" => value.is_object(),
                    _ => false,
                };
                if matches {
                    Some(value)
                } else {
                    tracing::debug!(field, expected, found = type_name(value), "dropping mistyped item field");
                    self.warnings.push(ItemWarning::WrongType { field, expected });
                    None
                }
            }
        }
    }

    fn string(&mut self, field: &'static str) -> Option<String> {
        self.get(field, "a string")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn number(&mut self, field: &'static str) -> Option<f64> {
        self.get(field, "a number").and_then(Value::as_f64)
    }

    fn integer(&mut self, field: &'static str) -> Option<i64> {
        self.get(field, "an integer").and_then(whole_number)
    }

    fn boolean(&mut self, field: &'static str) -> Option<bool> {
        self.get(field, "a boolean").and_then(Value::as_bool)
    }

    fn strings(&mut self, field: &'static str) -> Option<Vec<String>> {
        self.get(field, "an array of strings")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
    }

    fn object(&mut self, field: &'static str) -> Option<Map<String, Value>> {
        self.get(field, "an object")
            .and_then(Value::as_object)
            .cloned()
    }
}

impl SearchableItem {
    pub fn new(unique_identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            unique_identifier: unique_identifier.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Validate a loosely-typed payload.
    ///
    /// Fails only when the payload is not an object or a required field is
    /// missing or not a string. Mistyped optional fields are dropped and
    /// unknown keys are ignored; both are reported as warnings.
    pub fn from_value(value: &Value) -> Result<ParsedItem, ItemError> {
        let object = value.as_object().ok_or(ItemError::NotAnObject {
            found: type_name(value),
        })?;

        let required = |field: &'static str| {
            object
                .get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(ItemError::MissingField { field })
        };
        let unique_identifier = required("uniqueIdentifier")?;
        let title = required("title")?;

        let mut warnings: Vec<ItemWarning> = object
            .keys()
            .filter(|key| !KNOWN_FIELDS.contains(&key.as_str()))
            .map(|key| ItemWarning::UnknownField {
                field: key.clone(),
                suggestion: suggest_field(key),
            })
            .collect();

        let mut r = FieldReader {
            object,
            warnings: Vec::new(),
        };
        let item = SearchableItem {
            unique_identifier,
            title,
            content_description: r.string("contentDescription"),
            keywords: r.strings("keywords"),
            url: r.string("url"),
            domain_identifier: r.string("domainIdentifier"),
            is_eligible_for_search: r.boolean("isEligibleForSearch"),
            is_eligible_for_prediction: r.boolean("isEligibleForPrediction"),
            thumbnail_data: r.string("thumbnailData"),
            thumbnail_url: r.string("thumbnailURL"),
            start_date: r.number("startDate"),
            end_date: r.number("endDate"),
            last_used_date: r.number("lastUsedDate"),
            creation_date: r.number("creationDate"),
            modification_date: r.number("modificationDate"),
            expiration_date: r.number("expirationDate"),
            rating: r.number("rating"),
            view_count: r.integer("viewCount"),
            use_count: r.integer("useCount"),
            content_rating: r.number("contentRating"),
            latitude: r.number("latitude"),
            longitude: r.number("longitude"),
            altitude: r.number("altitude"),
            speed: r.number("speed"),
            course: r.number("course"),
            text: TextFields {
                country_code: r.string("countryCode"),
                language_code: r.string("languageCode"),
                phone_number: r.string("phoneNumber"),
                email_address: r.string("emailAddress"),
                organization_name: r.string("organizationName"),
                department_name: r.string("departmentName"),
                job_title: r.string("jobTitle"),
                given_name: r.string("givenName"),
                family_name: r.string("familyName"),
                middle_name: r.string("middleName"),
                nickname: r.string("nickname"),
                name_prefix: r.string("namePrefix"),
                name_suffix: r.string("nameSuffix"),
                genre: r.string("genre"),
                kind: r.string("type"),
                platform: r.string("platform"),
                version: r.string("version"),
                author: r.string("author"),
                editor: r.string("editor"),
                director: r.string("director"),
                producer: r.string("producer"),
                composer: r.string("composer"),
                artist: r.string("artist"),
                album: r.string("album"),
            },
            instant_message_addresses: r.strings("instantMessageAddresses"),
            related_unique_identifiers: r.strings("relatedUniqueIdentifiers"),
            user_info: r.object("userInfo"),
        };

        warnings.extend(r.warnings);
        Ok(ParsedItem { item, warnings })
    }

    /// Validate a batch; the first invalid item fails the whole batch.
    pub fn from_values(values: &[Value]) -> Result<Vec<ParsedItem>, ItemError> {
        values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                Self::from_value(value).map_err(|source| ItemError::InBatch {
                    index,
                    source: Box::new(source),
                })
            })
            .collect()
    }
}

/// Closest known field name for a probable typo.
fn suggest_field(unknown: &str) -> Option<&'static str> {
    KNOWN_FIELDS
        .iter()
        .map(|known| (*known, strsim::jaro_winkler(unknown, known)))
        .filter(|(_, score)| *score >= 0.85)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(known, _)| known)
}
