use cmdhub_core::db::open_db_in_memory;
use cmdhub_core::{
    EntryPatch, EntryRepository, GroupKind, Hub, HubError, MemorySnapshotStore, MoveDirection,
    NewEntry, SortMode, SqliteEntryRepository, ValidationError,
};

fn hub_with_group(kind: GroupKind) -> (Hub<MemorySnapshotStore>, MemorySnapshotStore, i64) {
    let store = MemorySnapshotStore::new();
    let mut hub = Hub::open(store.clone()).unwrap();
    let group = hub.create_group("work", kind).unwrap();
    (hub, store, group.id)
}

#[test]
fn create_appends_within_group() {
    let (mut hub, store, group_id) = hub_with_group(GroupKind::Command);

    let first = hub
        .create_entry(NewEntry::new(group_id, " status ", "git status\n").with_note("daily"))
        .unwrap();
    let second = hub
        .create_entry(NewEntry::new(group_id, "log", "git log"))
        .unwrap();

    assert_eq!(first.title, "status");
    assert_eq!(first.body, "git status");
    assert_eq!(first.note, "daily");
    assert_eq!(first.use_count, 0);
    assert_eq!((first.order, second.order), (1, 2));
    assert_eq!(store.save_count(), 4);
    assert_eq!(hub.get_entry(first.id).unwrap(), first);
}

#[test]
fn create_honors_explicit_order() {
    let (mut hub, _store, group_id) = hub_with_group(GroupKind::Note);
    let pinned = hub
        .create_entry(NewEntry::new(group_id, "pinned", "text").with_order(10))
        .unwrap();
    let next = hub
        .create_entry(NewEntry::new(group_id, "next", "text"))
        .unwrap();

    assert_eq!(pinned.order, 10);
    assert_eq!(next.order, 11);
}

#[test]
fn colliding_explicit_order_is_rejected_on_create() {
    let (mut hub, store, group_id) = hub_with_group(GroupKind::Command);
    let first = hub
        .create_entry(NewEntry::new(group_id, "first", "echo 1"))
        .unwrap();
    let saves = store.save_count();

    let err = hub
        .create_entry(NewEntry::new(group_id, "clash", "echo 2").with_order(first.order))
        .unwrap_err();
    assert!(matches!(
        err,
        HubError::Validation(ValidationError::OrderTaken { group_id: g, order })
            if g == group_id && order == first.order
    ));
    assert_eq!(store.save_count(), saves);
    assert_eq!(hub.list_entries(group_id, SortMode::OrderAsc).unwrap().len(), 1);

    let other = hub.create_group("other", GroupKind::Command).unwrap();
    let elsewhere = hub
        .create_entry(NewEntry::new(other.id, "same slot", "echo 3").with_order(first.order))
        .unwrap();
    assert_eq!(elsewhere.order, first.order);
}

#[test]
fn colliding_order_patch_is_rejected_and_moves_stay_real() {
    let (mut hub, store, group_id) = hub_with_group(GroupKind::Command);
    let a = hub.create_entry(NewEntry::new(group_id, "a", "echo a")).unwrap();
    let b = hub.create_entry(NewEntry::new(group_id, "b", "echo b")).unwrap();
    let c = hub.create_entry(NewEntry::new(group_id, "c", "echo c")).unwrap();

    let err = hub
        .update_entry(
            b.id,
            EntryPatch {
                order: Some(a.order),
                ..EntryPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        HubError::Validation(ValidationError::OrderTaken { .. })
    ));

    let unchanged = hub
        .update_entry(
            b.id,
            EntryPatch {
                order: Some(b.order),
                ..EntryPatch::default()
            },
        )
        .unwrap();
    assert_eq!(unchanged.order, b.order);

    let saves = store.save_count();
    assert!(hub.move_entry(a.id, MoveDirection::Down).unwrap());
    assert_eq!(store.save_count(), saves + 1);
    let sequence: Vec<(i64, i64)> = hub
        .list_entries(group_id, SortMode::OrderAsc)
        .unwrap()
        .iter()
        .map(|entry| (entry.id, entry.order))
        .collect();
    assert_eq!(
        sequence,
        vec![(b.id, a.order), (a.id, b.order), (c.id, c.order)]
    );
}

#[test]
fn create_in_missing_group_is_not_found() {
    let (mut hub, store, _) = hub_with_group(GroupKind::Command);
    let saves = store.save_count();

    let err = hub
        .create_entry(NewEntry::new(404, "lost", "echo"))
        .unwrap_err();
    assert!(matches!(err, HubError::GroupNotFound(404)));
    assert_eq!(store.save_count(), saves);
}

#[test]
fn blank_title_or_body_is_rejected() {
    let (mut hub, _store, group_id) = hub_with_group(GroupKind::Command);

    assert!(matches!(
        hub.create_entry(NewEntry::new(group_id, "  ", "echo")),
        Err(HubError::Validation(ValidationError::BlankEntryTitle))
    ));
    assert!(matches!(
        hub.create_entry(NewEntry::new(group_id, "title", " \n ")),
        Err(HubError::Validation(ValidationError::BlankEntryBody))
    ));
    assert!(hub.list_entries(group_id, SortMode::OrderAsc).unwrap().is_empty());
}

#[test]
fn partial_update_touches_only_supplied_fields() {
    let (mut hub, _store, group_id) = hub_with_group(GroupKind::Command);
    let entry = hub
        .create_entry(NewEntry::new(group_id, "status", "git status").with_note("daily"))
        .unwrap();

    let updated = hub
        .update_entry(
            entry.id,
            EntryPatch {
                body: Some("git status -sb".to_string()),
                use_count: Some(12),
                ..EntryPatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.title, "status");
    assert_eq!(updated.note, "daily");
    assert_eq!(updated.body, "git status -sb");
    assert_eq!(updated.use_count, 12);
    assert_eq!(updated.order, entry.order);
}

#[test]
fn update_rejects_negative_count_and_missing_entry() {
    let (mut hub, store, group_id) = hub_with_group(GroupKind::Command);
    let entry = hub
        .create_entry(NewEntry::new(group_id, "status", "git status"))
        .unwrap();
    let saves = store.save_count();

    let negative = EntryPatch {
        use_count: Some(-1),
        ..EntryPatch::default()
    };
    assert!(matches!(
        hub.update_entry(entry.id, negative),
        Err(HubError::Validation(ValidationError::NegativeUseCount(-1)))
    ));
    assert!(matches!(
        hub.update_entry(
            999,
            EntryPatch {
                title: Some("x".to_string()),
                ..EntryPatch::default()
            }
        ),
        Err(HubError::EntryNotFound(999))
    ));
    assert!(matches!(
        hub.update_entry(999, EntryPatch::default()),
        Err(HubError::EntryNotFound(999))
    ));
    assert_eq!(store.save_count(), saves);
}

#[test]
fn delete_and_increment_report_missing_entries() {
    let (mut hub, _store, group_id) = hub_with_group(GroupKind::Command);
    let entry = hub
        .create_entry(NewEntry::new(group_id, "status", "git status"))
        .unwrap();

    assert_eq!(hub.increment_use_count(entry.id).unwrap(), 1);
    assert_eq!(hub.increment_use_count(entry.id).unwrap(), 2);
    hub.delete_entry(entry.id).unwrap();

    assert!(matches!(
        hub.delete_entry(entry.id),
        Err(HubError::EntryNotFound(_))
    ));
    assert!(matches!(
        hub.increment_use_count(entry.id),
        Err(HubError::EntryNotFound(_))
    ));
}

#[test]
fn move_is_scoped_to_the_owning_group() {
    let (mut hub, store, group_id) = hub_with_group(GroupKind::Command);
    let other = hub.create_group("other", GroupKind::Command).unwrap();
    let a = hub.create_entry(NewEntry::new(group_id, "a", "echo a")).unwrap();
    let b = hub.create_entry(NewEntry::new(group_id, "b", "echo b")).unwrap();
    hub.create_entry(NewEntry::new(other.id, "z", "echo z")).unwrap();
    let saves = store.save_count();

    assert!(!hub.move_entry(a.id, MoveDirection::Up).unwrap());
    assert!(!hub.move_entry(b.id, MoveDirection::Down).unwrap());
    assert!(!hub.move_entry(999, MoveDirection::Down).unwrap());
    assert_eq!(store.save_count(), saves);

    assert!(hub.move_entry(a.id, MoveDirection::Down).unwrap());
    assert_eq!(store.save_count(), saves + 1);
    let titles: Vec<String> = hub
        .list_entries(group_id, SortMode::OrderAsc)
        .unwrap()
        .into_iter()
        .map(|entry| entry.title)
        .collect();
    assert_eq!(titles, vec!["b", "a"]);
}

#[test]
fn activate_resolves_lines_and_counts_use() {
    let (mut hub, store, group_id) = hub_with_group(GroupKind::Command);
    let entry = hub
        .create_entry(NewEntry::new(
            group_id,
            "sync",
            "git fetch --all\n\n  git rebase origin/main  \n",
        ))
        .unwrap();
    let saves = store.save_count();

    let activation = hub.activate(entry.id, 1).unwrap();
    assert_eq!(activation.line, "git rebase origin/main");
    assert_eq!(activation.kind, GroupKind::Command);
    assert_eq!(activation.use_count, 1);
    assert_eq!(store.save_count(), saves + 1);

    let err = hub.activate(entry.id, 2).unwrap_err();
    assert!(matches!(
        err,
        HubError::Validation(ValidationError::LineOutOfRange {
            index: 2,
            available: 2,
            ..
        })
    ));
    assert_eq!(hub.get_entry(entry.id).unwrap().use_count, 1);
}

#[test]
fn note_entries_are_not_activatable() {
    let (mut hub, store, group_id) = hub_with_group(GroupKind::Note);
    let entry = hub
        .create_entry(NewEntry::new(group_id, "idea", "write more tests"))
        .unwrap();
    let saves = store.save_count();

    assert!(matches!(
        hub.activate(entry.id, 0),
        Err(HubError::Validation(ValidationError::NotActivatable(_)))
    ));
    assert_eq!(hub.get_entry(entry.id).unwrap().use_count, 0);
    assert_eq!(store.save_count(), saves);
}

#[test]
fn batch_insert_replaces_or_appends_in_one_call() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO tabs (id, name, type, sort_order) VALUES (1, 'g', 'command', 1);",
        [],
    )
    .unwrap();
    let repo = SqliteEntryRepository::try_new(&conn).unwrap();
    repo.create_entry(&NewEntry::new(1, "old", "echo old")).unwrap();

    let batch = vec![
        NewEntry::new(1, "x", "echo x"),
        NewEntry::new(1, "y", "echo y"),
    ];
    assert_eq!(repo.insert_batch(1, &batch, false).unwrap(), 2);
    let orders: Vec<i64> = repo
        .list_entries(1)
        .unwrap()
        .iter()
        .map(|entry| entry.order)
        .collect();
    assert_eq!(orders, vec![1, 2, 3]);

    assert_eq!(repo.insert_batch(1, &batch, true).unwrap(), 2);
    let titles: Vec<String> = repo
        .list_entries(1)
        .unwrap()
        .into_iter()
        .map(|entry| format!("{}@{}", entry.title, entry.order))
        .collect();
    assert_eq!(titles, vec!["x@1", "y@2"]);
}
