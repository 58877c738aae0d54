//! Input validation shared by write paths.
//!
//! # Invariants
//! - Every check here runs before the first SQL mutation of an operation.
//! - Normalizers return the exact value that gets stored.

use crate::model::entry::EntryId;
use crate::model::group::GroupId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected caller input. Operations failing with this error change nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Group name is blank after trim.
    BlankGroupName,
    /// Entry title is blank after trim.
    BlankEntryTitle,
    /// Entry body is blank after trim.
    BlankEntryBody,
    /// Use counters never go below zero.
    NegativeUseCount(i64),
    /// Operation is not allowed on the synthetic "All" view.
    AggregateTarget { operation: &'static str },
    /// Unrecognized group kind text.
    UnknownKind(String),
    /// Unrecognized sort mode text.
    UnknownSortMode(String),
    /// Unrecognized group selection text.
    UnknownSelection(String),
    /// Entry belongs to a kind without activatable lines.
    NotActivatable(EntryId),
    /// Requested body line does not exist.
    LineOutOfRange {
        entry_id: EntryId,
        index: usize,
        available: usize,
    },
    /// Another entry of the group already holds this order.
    OrderTaken { group_id: GroupId, order: i64 },
    /// One record of an exchange document failed validation.
    InvalidRecord {
        index: usize,
        reason: Box<ValidationError>,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankGroupName => write!(f, "group name must not be blank"),
            Self::BlankEntryTitle => write!(f, "entry title must not be blank"),
            Self::BlankEntryBody => write!(f, "entry body must not be blank"),
            Self::NegativeUseCount(value) => {
                write!(f, "use count must not be negative, got {value}")
            }
            Self::AggregateTarget { operation } => {
                write!(f, "`{operation}` is not allowed on the aggregate view")
            }
            Self::UnknownKind(value) => {
                write!(f, "unknown group kind `{value}`; expected command|note|link")
            }
            Self::UnknownSortMode(value) => write!(
                f,
                "unknown sort mode `{value}`; expected order-asc|order-desc|count-asc|count-desc"
            ),
            Self::UnknownSelection(value) => {
                write!(f, "unknown group selection `{value}`; expected `all` or a group id")
            }
            Self::NotActivatable(id) => write!(f, "entry {id} has no activatable lines"),
            Self::LineOutOfRange {
                entry_id,
                index,
                available,
            } => write!(
                f,
                "entry {entry_id} has {available} line(s); index {index} is out of range"
            ),
            Self::OrderTaken { group_id, order } => {
                write!(f, "order {order} is already used in group {group_id}")
            }
            Self::InvalidRecord { index, reason } => write!(f, "record #{index}: {reason}"),
        }
    }
}

impl Error for ValidationError {}

/// Trims a group name and rejects blank input.
pub fn normalize_group_name(value: impl Into<String>) -> Result<String, ValidationError> {
    non_blank(value.into(), ValidationError::BlankGroupName)
}

/// Trims an entry title and rejects blank input.
pub fn normalize_title(value: impl Into<String>) -> Result<String, ValidationError> {
    non_blank(value.into(), ValidationError::BlankEntryTitle)
}

/// Rejects blank bodies. Leading indentation is kept; trailing whitespace is not.
pub fn normalize_body(value: impl Into<String>) -> Result<String, ValidationError> {
    let value = value.into();
    if value.trim().is_empty() {
        return Err(ValidationError::BlankEntryBody);
    }
    Ok(value.trim_end().to_string())
}

/// Rejects negative use counters.
pub fn check_use_count(value: i64) -> Result<i64, ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeUseCount(value));
    }
    Ok(value)
}

fn non_blank(value: String, error: ValidationError) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(error);
    }
    Ok(trimmed.to_string())
}
