use cmdhub_core::db::open_db_in_memory;
use cmdhub_core::{
    GroupKind, GroupRepository, Hub, HubError, MemorySnapshotStore, MoveDirection, NewEntry,
    RepoError, SqliteGroupRepository, ValidationError, SEED_GROUP_NAMES,
};
use std::collections::HashSet;

#[test]
fn first_run_seeds_two_command_groups_and_saves() {
    let store = MemorySnapshotStore::new();
    let hub = Hub::open(store.clone()).unwrap();

    let groups = hub.list_groups().unwrap();
    let names: Vec<&str> = groups.iter().map(|group| group.name.as_str()).collect();
    assert_eq!(names, SEED_GROUP_NAMES.to_vec());
    assert_eq!(names, vec!["Git 命令", "Claude 命令"]);
    assert!(groups.iter().all(|group| group.kind == GroupKind::Command));
    assert_eq!(
        groups.iter().map(|group| group.order).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(store.save_count(), 1);
}

#[test]
fn create_appends_and_saves() {
    let store = MemorySnapshotStore::new();
    let mut hub = Hub::open(store.clone()).unwrap();

    let group = hub.create_group("  Bookmarks  ", GroupKind::Link).unwrap();
    assert_eq!(group.name, "Bookmarks");
    assert_eq!(group.order, 3);
    assert_eq!(store.save_count(), 2);
    assert_eq!(hub.get_group(group.id).unwrap(), group);
}

#[test]
fn blank_name_is_rejected_without_saving() {
    let store = MemorySnapshotStore::new();
    let mut hub = Hub::open(store.clone()).unwrap();

    let err = hub.create_group("   ", GroupKind::Note).unwrap_err();
    assert!(matches!(
        err,
        HubError::Validation(ValidationError::BlankGroupName)
    ));
    assert_eq!(hub.list_groups().unwrap().len(), 2);
    assert_eq!(store.save_count(), 1);
}

#[test]
fn orders_stay_distinct_under_create_and_delete() {
    let mut hub = Hub::open(MemorySnapshotStore::new()).unwrap();

    let a = hub.create_group("a", GroupKind::Command).unwrap();
    let b = hub.create_group("b", GroupKind::Note).unwrap();
    hub.delete_group(a.id).unwrap();
    hub.create_group("c", GroupKind::Link).unwrap();
    hub.delete_group(b.id).unwrap();
    hub.create_group("d", GroupKind::Command).unwrap();
    hub.create_group("e", GroupKind::Command).unwrap();

    let orders: Vec<i64> = hub
        .list_groups()
        .unwrap()
        .iter()
        .map(|group| group.order)
        .collect();
    let distinct: HashSet<i64> = orders.iter().copied().collect();
    assert_eq!(distinct.len(), orders.len());
}

#[test]
fn update_keeps_order() {
    let mut hub = Hub::open(MemorySnapshotStore::new()).unwrap();
    let group = hub.create_group("Docs", GroupKind::Note).unwrap();

    let updated = hub.update_group(group.id, "Docs links", GroupKind::Link).unwrap();
    assert_eq!(updated.name, "Docs links");
    assert_eq!(updated.kind, GroupKind::Link);
    assert_eq!(updated.order, group.order);
}

#[test]
fn update_and_delete_of_missing_group_report_not_found() {
    let store = MemorySnapshotStore::new();
    let mut hub = Hub::open(store.clone()).unwrap();

    assert!(matches!(
        hub.update_group(404, "x", GroupKind::Note),
        Err(HubError::GroupNotFound(404))
    ));
    assert!(matches!(
        hub.delete_group(404),
        Err(HubError::GroupNotFound(404))
    ));
    assert_eq!(store.save_count(), 1);
}

#[test]
fn delete_removes_exactly_its_entries() {
    let mut hub = Hub::open(MemorySnapshotStore::new()).unwrap();
    let doomed = hub.create_group("doomed", GroupKind::Command).unwrap();
    let kept = hub.create_group("kept", GroupKind::Command).unwrap();
    for title in ["one", "two", "three"] {
        hub.create_entry(NewEntry::new(doomed.id, title, "echo")).unwrap();
    }
    let survivor = hub.create_entry(NewEntry::new(kept.id, "stay", "echo")).unwrap();

    assert_eq!(hub.delete_group(doomed.id).unwrap(), 3);
    assert!(matches!(
        hub.get_group(doomed.id),
        Err(HubError::GroupNotFound(_))
    ));
    let remaining = hub.list_all_entries(None).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].0.id, survivor.id);
}

#[test]
fn move_swaps_only_adjacent_orders() {
    let store = MemorySnapshotStore::new();
    let mut hub = Hub::open(store.clone()).unwrap();
    let third = hub.create_group("third", GroupKind::Note).unwrap();
    let saves = store.save_count();

    assert!(hub.move_group(third.id, MoveDirection::Up).unwrap());
    assert_eq!(store.save_count(), saves + 1);

    let groups = hub.list_groups().unwrap();
    let names: Vec<&str> = groups.iter().map(|group| group.name.as_str()).collect();
    assert_eq!(names, vec![SEED_GROUP_NAMES[0], "third", SEED_GROUP_NAMES[1]]);
    assert_eq!(
        groups.iter().map(|group| group.order).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn boundary_and_missing_moves_are_silent_noops() {
    let store = MemorySnapshotStore::new();
    let mut hub = Hub::open(store.clone()).unwrap();
    let groups = hub.list_groups().unwrap();
    let before = store.snapshot().unwrap();

    assert!(!hub.move_group(groups[0].id, MoveDirection::Up).unwrap());
    assert!(!hub.move_group(groups[1].id, MoveDirection::Down).unwrap());
    assert!(!hub.move_group(999, MoveDirection::Up).unwrap());

    assert_eq!(store.save_count(), 1);
    assert_eq!(store.snapshot().unwrap(), before);
    assert_eq!(hub.list_groups().unwrap(), groups);
}

#[test]
fn move_uses_id_to_break_order_ties() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO tabs (id, name, type, sort_order) VALUES (1, 'a', 'command', 1);
         INSERT INTO tabs (id, name, type, sort_order) VALUES (2, 'b', 'command', 1);
         INSERT INTO tabs (id, name, type, sort_order) VALUES (3, 'c', 'command', 2);",
    )
    .unwrap();
    let repo = SqliteGroupRepository::try_new(&conn).unwrap();

    assert!(repo.move_group(3, MoveDirection::Up).unwrap());
    let order_of = |id| repo.get_group(id).unwrap().unwrap().order;
    assert_eq!(order_of(2), 2);
    assert_eq!(order_of(3), 1);
    assert_eq!(order_of(1), 1);
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let err = SqliteGroupRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::UninitializedConnection { .. }));
}
