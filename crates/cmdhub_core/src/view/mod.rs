//! Read views over entries: single group and the cross-group aggregate.
//!
//! # Responsibility
//! - Apply one of four sort modes on top of repository base order.
//! - Model the caller's current selection as an explicit value.
//!
//! # Invariants
//! - Views never mutate state.
//! - Sorting is stable: ties keep base relative order.
//! - The aggregate view defaults to most-used-first; groups default to
//!   manual order.

use crate::model::entry::Entry;
use crate::model::group::{Group, GroupId};
use crate::model::validation::ValidationError;
use crate::repo::entry_repo::EntryRepository;
use crate::repo::RepoResult;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Entry ordering applied by views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// Manual order, first to last.
    #[default]
    OrderAsc,
    /// Manual order, last to first.
    OrderDesc,
    /// Least used first.
    #[serde(rename = "count-asc")]
    UseCountAsc,
    /// Most used first.
    #[serde(rename = "count-desc")]
    UseCountDesc,
}

impl SortMode {
    /// Default mode of the aggregate view.
    pub const AGGREGATE_DEFAULT: SortMode = SortMode::UseCountDesc;

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OrderAsc => "order-asc",
            Self::OrderDesc => "order-desc",
            Self::UseCountAsc => "count-asc",
            Self::UseCountDesc => "count-desc",
        }
    }

    fn compare(self, left: &Entry, right: &Entry) -> Ordering {
        match self {
            Self::OrderAsc => left.order.cmp(&right.order),
            Self::OrderDesc => right.order.cmp(&left.order),
            Self::UseCountAsc => left.use_count.cmp(&right.use_count),
            Self::UseCountDesc => right.use_count.cmp(&left.use_count),
        }
    }
}

impl Display for SortMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "order-asc" | "order" => Ok(Self::OrderAsc),
            "order-desc" => Ok(Self::OrderDesc),
            "count-asc" => Ok(Self::UseCountAsc),
            "count-desc" | "count" => Ok(Self::UseCountDesc),
            _ => Err(ValidationError::UnknownSortMode(value.to_string())),
        }
    }
}

/// Either one stored group or the synthetic "All" view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSelection {
    /// Read-only aggregate over every entry.
    All,
    /// One stored group.
    Group(GroupId),
}

impl GroupSelection {
    /// Resolves to a stored group id, rejecting the aggregate view.
    pub fn require_group(self, operation: &'static str) -> Result<GroupId, ValidationError> {
        match self {
            Self::Group(id) => Ok(id),
            Self::All => Err(ValidationError::AggregateTarget { operation }),
        }
    }
}

impl Display for GroupSelection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Group(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for GroupSelection {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        trimmed
            .parse::<GroupId>()
            .map(Self::Group)
            .map_err(|_| ValidationError::UnknownSelection(value.to_string()))
    }
}

/// Caller-owned view state: what is selected and how it is sorted.
///
/// `sort = None` means "use the default of the selected view".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewContext {
    pub selection: GroupSelection,
    #[serde(default)]
    pub sort: Option<SortMode>,
}

impl ViewContext {
    pub fn all() -> Self {
        Self {
            selection: GroupSelection::All,
            sort: None,
        }
    }

    pub fn group(id: GroupId) -> Self {
        Self {
            selection: GroupSelection::Group(id),
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sort mode that will actually be applied.
    pub fn effective_sort(&self) -> SortMode {
        match (self.selection, self.sort) {
            (_, Some(sort)) => sort,
            (GroupSelection::All, None) => SortMode::AGGREGATE_DEFAULT,
            (GroupSelection::Group(_), None) => SortMode::default(),
        }
    }
}

impl Default for ViewContext {
    fn default() -> Self {
        Self::all()
    }
}

/// Result of rendering a `ViewContext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryView {
    Group { group: Group, entries: Vec<Entry> },
    All { entries: Vec<(Entry, Group)> },
}

impl EntryView {
    pub fn len(&self) -> usize {
        match self {
            Self::Group { entries, .. } => entries.len(),
            Self::All { entries } => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stable in-place sort of entries.
pub fn sort_entries(entries: &mut [Entry], mode: SortMode) {
    entries.sort_by(|left, right| mode.compare(left, right));
}

/// Stable in-place sort of group-tagged entries.
///
/// Manual order is only meaningful inside a group, so the order modes
/// compare `(group order, group id, entry order, entry id)` here.
pub fn sort_tagged_entries(entries: &mut [(Entry, Group)], mode: SortMode) {
    match mode {
        SortMode::OrderAsc => entries.sort_by_key(aggregate_base_key),
        SortMode::OrderDesc => {
            entries.sort_by(|left, right| aggregate_base_key(right).cmp(&aggregate_base_key(left)))
        }
        SortMode::UseCountAsc | SortMode::UseCountDesc => {
            entries.sort_by(|(left, _), (right, _)| mode.compare(left, right))
        }
    }
}

fn aggregate_base_key((entry, group): &(Entry, Group)) -> (i64, GroupId, i64, i64) {
    (group.order, group.id, entry.order, entry.id)
}

/// Entries of one group in `sort` order.
pub fn list_entries<R: EntryRepository>(
    repo: &R,
    group_id: GroupId,
    sort: SortMode,
) -> RepoResult<Vec<Entry>> {
    let mut entries = repo.list_entries(group_id)?;
    sort_entries(&mut entries, sort);
    Ok(entries)
}

/// Every entry tagged with its group; `None` sorts most-used first.
pub fn list_all_entries<R: EntryRepository>(
    repo: &R,
    sort: Option<SortMode>,
) -> RepoResult<Vec<(Entry, Group)>> {
    let mut entries = repo.list_all_entries()?;
    sort_tagged_entries(&mut entries, sort.unwrap_or(SortMode::AGGREGATE_DEFAULT));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, order: i64, use_count: i64) -> Entry {
        Entry {
            id,
            group_id: 1,
            title: format!("entry {id}"),
            body: "echo".to_string(),
            note: String::new(),
            use_count,
            order,
        }
    }

    #[test]
    fn count_desc_is_stable_for_ties() {
        let mut entries = vec![entry(1, 1, 3), entry(2, 2, 0), entry(3, 3, 7), entry(4, 4, 3)];
        sort_entries(&mut entries, SortMode::UseCountDesc);
        let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 1, 4, 2]);
    }

    #[test]
    fn aggregate_order_keeps_groups_together() {
        let group = |id: i64, order: i64| Group {
            id,
            name: format!("group {id}"),
            kind: crate::model::group::GroupKind::Command,
            order,
        };
        let tagged = |id: i64, group_id: i64, order: i64| {
            let mut item = entry(id, order, 0);
            item.group_id = group_id;
            item
        };
        let mut entries = vec![
            (tagged(1, 10, 1), group(10, 2)),
            (tagged(2, 20, 1), group(20, 1)),
            (tagged(3, 10, 2), group(10, 2)),
            (tagged(4, 20, 2), group(20, 1)),
        ];

        sort_tagged_entries(&mut entries, SortMode::OrderAsc);
        let ids: Vec<i64> = entries.iter().map(|(e, _)| e.id).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);

        sort_tagged_entries(&mut entries, SortMode::OrderDesc);
        let ids: Vec<i64> = entries.iter().map(|(e, _)| e.id).collect();
        assert_eq!(ids, vec![3, 1, 4, 2]);
    }

    #[test]
    fn order_desc_reverses_manual_order() {
        let mut entries = vec![entry(1, 1, 0), entry(2, 2, 0), entry(3, 3, 0)];
        sort_entries(&mut entries, SortMode::OrderDesc);
        let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn sort_mode_text_roundtrips() {
        for mode in [
            SortMode::OrderAsc,
            SortMode::OrderDesc,
            SortMode::UseCountAsc,
            SortMode::UseCountDesc,
        ] {
            assert_eq!(mode.as_str().parse::<SortMode>().unwrap(), mode);
        }
        assert!("newest".parse::<SortMode>().is_err());
    }

    #[test]
    fn effective_sort_defaults_differ_per_view() {
        assert_eq!(ViewContext::all().effective_sort(), SortMode::UseCountDesc);
        assert_eq!(ViewContext::group(4).effective_sort(), SortMode::OrderAsc);
        assert_eq!(
            ViewContext::all()
                .with_sort(SortMode::OrderAsc)
                .effective_sort(),
            SortMode::OrderAsc
        );
    }

    #[test]
    fn selection_parses_all_and_ids() {
        assert_eq!("ALL".parse::<GroupSelection>().unwrap(), GroupSelection::All);
        assert_eq!(
            "12".parse::<GroupSelection>().unwrap(),
            GroupSelection::Group(12)
        );
        assert!("tab".parse::<GroupSelection>().is_err());
    }

    #[test]
    fn view_context_serializes_for_session_files() {
        let context = ViewContext::group(3).with_sort(SortMode::UseCountAsc);
        let json = serde_json::to_string(&context).unwrap();
        assert_eq!(json, r#"{"selection":{"group":3},"sort":"count-asc"}"#);
        let parsed: ViewContext = serde_json::from_str(r#"{"selection":"all"}"#).unwrap();
        assert_eq!(parsed, ViewContext::all());
    }
}
