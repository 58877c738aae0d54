//! Exchange document types and input shape dispatch.

use super::ExchangeError;
use crate::model::entry::{Entry, NewEntry};
use crate::model::group::{GroupId, GroupKind};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Group header carried by wrapped documents.
///
/// Imports never act on the header, so an unreadable `type` becomes `None`
/// instead of failing the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabHeader {
    #[serde(default)]
    pub name: String,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<GroupKind>,
}

fn lenient_kind<'de, D>(deserializer: D) -> Result<Option<GroupKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|text| text.parse::<GroupKind>().ok()))
}

fn lenient_tab<'de, D>(deserializer: D) -> Result<Option<TabHeader>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

/// One exported entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub copy_count: Option<i64>,
}

impl ItemRecord {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            description: None,
            copy_count: None,
        }
    }

    pub(crate) fn from_entry(entry: &Entry) -> Self {
        Self {
            title: entry.title.clone(),
            content: entry.body.clone(),
            description: Some(entry.note.clone()),
            copy_count: Some(entry.use_count),
        }
    }

    pub(crate) fn into_new_entry(self, group_id: GroupId) -> NewEntry {
        NewEntry::new(group_id, self.title, self.content)
            .with_note(self.description.unwrap_or_default())
            .with_use_count(self.copy_count.unwrap_or(0))
    }
}

/// Canonical document shape; exports always carry `tab`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeDocument {
    #[serde(
        default,
        deserialize_with = "lenient_tab",
        skip_serializing_if = "Option::is_none"
    )]
    pub tab: Option<TabHeader>,
    pub items: Vec<ItemRecord>,
}

/// Accepted import shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeInput {
    /// `{ "tab"?: {...}, "items": [...] }`
    Wrapped(ExchangeDocument),
    /// `[ {...}, ... ]`
    Bare(Vec<ItemRecord>),
}

impl ExchangeInput {
    /// Parses raw text into one of the accepted shapes.
    ///
    /// # Errors
    /// - `Syntax` when the text is not JSON.
    /// - `Shape` for any other JSON value, or records with wrong field types.
    pub fn parse(text: &str) -> Result<Self, ExchangeError> {
        let value: Value = serde_json::from_str(text)?;
        if value.is_array() {
            return serde_json::from_value(value)
                .map(Self::Bare)
                .map_err(|err| ExchangeError::Shape(format!("item list: {err}")));
        }
        if value.get("items").is_some() {
            return serde_json::from_value(value)
                .map(Self::Wrapped)
                .map_err(|err| ExchangeError::Shape(format!("wrapped document: {err}")));
        }
        if value.is_object() {
            return Err(ExchangeError::Shape(
                "object without an `items` array".to_string(),
            ));
        }
        Err(ExchangeError::Shape(format!(
            "expected an object or array, got {}",
            json_type_name(&value)
        )))
    }

    /// Normalizes either shape to the canonical document.
    pub fn into_document(self) -> ExchangeDocument {
        match self {
            Self::Wrapped(document) => document,
            Self::Bare(items) => ExchangeDocument { tab: None, items },
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_and_bare_normalize_to_same_items() {
        let wrapped = ExchangeInput::parse(
            r#"{"tab":{"name":"Links","type":"link"},"items":[{"title":"docs","content":"https://docs.rs"}]}"#,
        )
        .unwrap();
        let bare =
            ExchangeInput::parse(r#"[{"title":"docs","content":"https://docs.rs"}]"#).unwrap();

        assert!(matches!(wrapped, ExchangeInput::Wrapped(_)));
        assert!(matches!(bare, ExchangeInput::Bare(_)));
        let wrapped = wrapped.into_document();
        assert_eq!(wrapped.tab.as_ref().unwrap().kind, Some(GroupKind::Link));
        assert_eq!(wrapped.items, bare.into_document().items);
    }

    #[test]
    fn wrapped_without_tab_is_accepted() {
        let input = ExchangeInput::parse(r#"{"items":[]}"#).unwrap();
        assert_eq!(
            input.into_document(),
            ExchangeDocument {
                tab: None,
                items: Vec::new()
            }
        );
    }

    #[test]
    fn unreadable_tab_header_does_not_block_items() {
        let input = ExchangeInput::parse(
            r#"{"tab":{"name":"Misc","type":"Snippet"},"items":[{"title":"a","content":"b"}]}"#,
        )
        .unwrap()
        .into_document();
        let tab = input.tab.unwrap();
        assert_eq!(tab.name, "Misc");
        assert_eq!(tab.kind, None);
        assert_eq!(input.items.len(), 1);

        let capitalized = ExchangeInput::parse(r#"{"tab":{"type":"LINK"},"items":[]}"#)
            .unwrap()
            .into_document();
        assert_eq!(capitalized.tab.unwrap().kind, Some(GroupKind::Link));

        let scalar = ExchangeInput::parse(r#"{"tab":"Git","items":[]}"#)
            .unwrap()
            .into_document();
        assert_eq!(scalar.tab, None);
    }

    #[test]
    fn other_shapes_are_rejected() {
        for text in [r#"{"entries":[]}"#, "42", r#""items""#, "null"] {
            assert!(matches!(
                ExchangeInput::parse(text),
                Err(ExchangeError::Shape(_))
            ));
        }
        assert!(matches!(
            ExchangeInput::parse("{not json"),
            Err(ExchangeError::Syntax(_))
        ));
        assert!(matches!(
            ExchangeInput::parse(r#"[{"title":1,"content":"x"}]"#),
            Err(ExchangeError::Shape(_))
        ));
    }
}
