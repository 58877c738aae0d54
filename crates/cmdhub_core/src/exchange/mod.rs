//! Portable JSON exchange of one group's entries.
//!
//! # Responsibility
//! - Define the exchange document and its two accepted input shapes.
//! - Convert between documents and entry inputs, validating every record.
//!
//! # Invariants
//! - Ids and orders never travel in documents.
//! - A document converts to entry inputs only when every record is valid.

mod document;

pub use document::{ExchangeDocument, ExchangeInput, ItemRecord, TabHeader};

use crate::model::entry::{Entry, NewEntry};
use crate::model::group::{Group, GroupId};
use crate::model::validation::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Malformed exchange input.
#[derive(Debug)]
pub enum ExchangeError {
    /// Input is not JSON at all.
    Syntax(serde_json::Error),
    /// JSON is well-formed but neither accepted shape.
    Shape(String),
}

impl Display for ExchangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax(err) => write!(f, "exchange document is not valid JSON: {err}"),
            Self::Shape(message) => write!(f, "unsupported exchange document: {message}"),
        }
    }
}

impl Error for ExchangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Syntax(err) => Some(err),
            Self::Shape(_) => None,
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Syntax(value)
    }
}

/// How imported records combine with the target group's entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Delete existing entries first; imported orders start at 1.
    Replace,
    /// Keep existing entries; imported orders continue after them.
    #[default]
    Append,
}

impl ImportMode {
    pub fn clears_existing(self) -> bool {
        matches!(self, Self::Replace)
    }
}

impl FromStr for ImportMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            other => Err(format!("unknown import mode `{other}`; expected replace|append")),
        }
    }
}

/// Builds the document for one group from entries in display order.
pub fn document_from_group(group: &Group, entries: &[Entry]) -> ExchangeDocument {
    ExchangeDocument {
        tab: Some(TabHeader {
            name: group.name.clone(),
            kind: Some(group.kind),
        }),
        items: entries.iter().map(ItemRecord::from_entry).collect(),
    }
}

/// Converts records to normalized entry inputs for `group_id`.
///
/// Fails on the first invalid record; nothing is returned partially.
pub fn records_to_entries(
    group_id: GroupId,
    records: Vec<ItemRecord>,
) -> Result<Vec<NewEntry>, ValidationError> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .into_new_entry(group_id)
                .normalized()
                .map_err(|reason| ValidationError::InvalidRecord {
                    index,
                    reason: Box::new(reason),
                })
        })
        .collect()
}
