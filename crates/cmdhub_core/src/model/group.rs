//! Group ("tab") domain model.
//!
//! # Invariants
//! - `id` is assigned by storage and never reused while the row exists.
//! - `name` is non-blank after normalization.

use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Stable storage identifier of a group.
pub type GroupId = i64;

/// Content kind shared by every entry inside one group.
///
/// The kind decides how entry body lines are activated by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Shell commands; activating a line copies it.
    Command,
    /// Free-form notes; no per-line activation.
    Note,
    /// URLs; activating a line opens it.
    Link,
}

impl GroupKind {
    /// Every kind known to the current schema.
    pub const ALL: [GroupKind; 3] = [Self::Command, Self::Note, Self::Link];

    /// Storage representation used in `tabs.type`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Note => "note",
            Self::Link => "link",
        }
    }

    /// Parses the storage representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "command" => Some(Self::Command),
            "note" => Some(Self::Note),
            "link" => Some(Self::Link),
            _ => None,
        }
    }

    /// Whether entries of this kind expose activatable body lines.
    pub fn has_activatable_lines(self) -> bool {
        !matches!(self, Self::Note)
    }
}

impl Display for GroupKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value.trim().to_ascii_lowercase().as_str())
            .ok_or_else(|| ValidationError::UnknownKind(value.to_string()))
    }
}

/// A named, kind-tagged, manually ordered collection of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    /// Serialized as `type` to match the exchange document naming.
    #[serde(rename = "type")]
    pub kind: GroupKind,
    /// Display position; distinct across all groups.
    pub order: i64,
}
