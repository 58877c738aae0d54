//! Entry ("item") domain model.
//!
//! # Responsibility
//! - Define the stored entry record and its create/patch inputs.
//! - Split multi-line bodies into activatable sub-lines.
//!
//! # Invariants
//! - `group_id` always references an existing group.
//! - `use_count` is never negative.

use crate::model::group::GroupId;
use crate::model::validation::{
    check_use_count, normalize_body, normalize_title, ValidationError,
};
use serde::{Deserialize, Serialize};

/// Stable storage identifier of an entry.
pub type EntryId = i64;

/// A titled unit of content owned by exactly one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub group_id: GroupId,
    pub title: String,
    /// Newline-separated sub-lines for command and link groups.
    pub body: String,
    /// Optional annotation; empty when unset.
    pub note: String,
    /// Number of activations so far.
    pub use_count: i64,
    /// Display position within the owning group.
    pub order: i64,
}

impl Entry {
    /// Activatable sub-lines of the body.
    pub fn lines(&self) -> Vec<&str> {
        body_lines(&self.body)
    }
}

/// Splits a body into trimmed, non-blank lines.
pub fn body_lines(body: &str) -> Vec<&str> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Input for creating one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub group_id: GroupId,
    pub title: String,
    pub body: String,
    pub note: String,
    /// Explicit position; `None` appends after the current maximum.
    pub order: Option<i64>,
    pub use_count: i64,
}

impl NewEntry {
    /// Creates input with empty note, appended order and zero use count.
    pub fn new(group_id: GroupId, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            group_id,
            title: title.into(),
            body: body.into(),
            note: String::new(),
            order: None,
            use_count: 0,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_use_count(mut self, use_count: i64) -> Self {
        self.use_count = use_count;
        self
    }

    /// Returns the normalized input that storage will persist.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        Ok(Self {
            group_id: self.group_id,
            title: normalize_title(self.title)?,
            body: normalize_body(self.body)?,
            note: self.note.trim().to_string(),
            order: self.order,
            use_count: check_use_count(self.use_count)?,
        })
    }
}

/// Partial entry update. `None` leaves the stored field untouched.
///
/// Content edits and administrative edits (`order`, `use_count`) share this
/// shape so callers can patch one without re-sending the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub note: Option<String>,
    pub order: Option<i64>,
    pub use_count: Option<i64>,
}

impl EntryPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.note.is_none()
            && self.order.is_none()
            && self.use_count.is_none()
    }

    /// Returns the normalized patch that storage will apply.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        Ok(Self {
            title: self.title.map(normalize_title).transpose()?,
            body: self.body.map(normalize_body).transpose()?,
            note: self.note.map(|note| note.trim().to_string()),
            order: self.order,
            use_count: self.use_count.map(check_use_count).transpose()?,
        })
    }
}
