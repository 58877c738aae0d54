use cmdhub_core::db::migrations::latest_version;
use cmdhub_core::{
    database_export_file_name, FileSnapshotStore, GroupKind, Hub, HubError, MemorySnapshotStore,
    NewEntry, Snapshot, SnapshotStore, SortMode, StoreError,
};

#[test]
fn state_survives_restart_through_the_slot() {
    let store = MemorySnapshotStore::new();
    let (group_id, entry_id) = {
        let mut hub = Hub::open(store.clone()).unwrap();
        let group = hub.create_group("Links", GroupKind::Link).unwrap();
        let entry = hub
            .create_entry(NewEntry::new(group.id, "docs", "https://docs.rs"))
            .unwrap();
        hub.activate(entry.id, 0).unwrap();
        (group.id, entry.id)
    };

    let hub = Hub::open(store.clone()).unwrap();
    assert_eq!(hub.get_group(group_id).unwrap().kind, GroupKind::Link);
    assert_eq!(hub.get_entry(entry_id).unwrap().use_count, 1);
    assert_eq!(hub.list_groups().unwrap().len(), 3);
}

#[test]
fn failed_save_is_surfaced_and_memory_stays_authoritative() {
    let store = MemorySnapshotStore::new();
    let mut hub = Hub::open(store.clone()).unwrap();
    let before = store.snapshot().unwrap();

    store.set_fail_saves(true);
    let err = hub.create_group("offline", GroupKind::Note).unwrap_err();
    assert!(matches!(err, HubError::Io(StoreError::Unavailable(_))));
    assert_eq!(store.snapshot().unwrap(), before);
    assert_eq!(hub.list_groups().unwrap().len(), 3);

    store.set_fail_saves(false);
    hub.create_group("online", GroupKind::Note).unwrap();
    let reopened = Hub::open(store.clone()).unwrap();
    let names: Vec<String> = reopened
        .list_groups()
        .unwrap()
        .into_iter()
        .map(|group| group.name)
        .collect();
    assert!(names.contains(&"offline".to_string()));
    assert!(names.contains(&"online".to_string()));
}

#[test]
fn database_export_import_replaces_dataset() {
    let mut source = Hub::open(MemorySnapshotStore::new()).unwrap();
    let group = source.create_group("Shared", GroupKind::Command).unwrap();
    source
        .create_entry(NewEntry::new(group.id, "build", "cargo build"))
        .unwrap();
    let image = source.export_database().unwrap();

    let store = MemorySnapshotStore::new();
    let mut target = Hub::open(store.clone()).unwrap();
    target.create_group("Local only", GroupKind::Note).unwrap();
    let saves = store.save_count();

    target.import_database(&image).unwrap();
    assert_eq!(store.save_count(), saves + 1);
    let names: Vec<String> = target
        .list_groups()
        .unwrap()
        .into_iter()
        .map(|group| group.name)
        .collect();
    assert!(names.contains(&"Shared".to_string()));
    assert!(!names.contains(&"Local only".to_string()));
    assert_eq!(
        target.list_entries(group.id, SortMode::OrderAsc).unwrap()[0].body,
        "cargo build"
    );
}

#[test]
fn corrupt_import_leaves_dataset_untouched() {
    let store = MemorySnapshotStore::new();
    let mut hub = Hub::open(store.clone()).unwrap();
    let group = hub.create_group("mine", GroupKind::Command).unwrap();
    let before = store.snapshot().unwrap();
    let saves = store.save_count();

    let garbage = Snapshot::from_bytes(b"definitely not a database".to_vec());
    assert!(matches!(
        hub.import_database(&garbage),
        Err(HubError::Format(_))
    ));

    let mut truncated = before.clone().into_bytes();
    truncated.truncate(200);
    assert!(hub
        .import_database(&Snapshot::from_bytes(truncated))
        .is_err());

    assert_eq!(hub.get_group(group.id).unwrap().name, "mine");
    assert_eq!(store.save_count(), saves);
    assert_eq!(store.snapshot().unwrap(), before);
}

#[test]
fn reset_from_seed_migrates_legacy_seed() {
    let legacy = rusqlite::Connection::open_in_memory().unwrap();
    legacy
        .execute_batch(
            "CREATE TABLE tabs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                type TEXT NOT NULL CHECK(type IN ('command', 'note')),
                sort_order INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tab_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                description TEXT DEFAULT '',
                copy_count INTEGER DEFAULT 0,
                sort_order INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (tab_id) REFERENCES tabs(id) ON DELETE CASCADE
            );
            INSERT INTO tabs (name, type, sort_order) VALUES ('Seeded', 'command', 1);",
        )
        .unwrap();
    let seed = cmdhub_core::db::snapshot::encode(&legacy).unwrap();

    let mut hub = Hub::open(MemorySnapshotStore::new()).unwrap();
    hub.reset_from_seed(&seed).unwrap();

    assert_eq!(hub.schema_version().unwrap(), latest_version());
    let groups = hub.list_groups().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "Seeded");
    hub.create_group("After reset", GroupKind::Link).unwrap();
}

#[test]
fn file_store_backs_a_hub_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::new(dir.path());
    assert!(store.load().unwrap().is_none());

    {
        let mut hub = Hub::open(store.clone()).unwrap();
        hub.create_group("On disk", GroupKind::Note).unwrap();
    }
    assert!(store.slot_path().exists());

    let hub = Hub::open(FileSnapshotStore::new(dir.path())).unwrap();
    assert!(hub
        .list_groups()
        .unwrap()
        .iter()
        .any(|group| group.name == "On disk"));
}

#[test]
fn export_file_name_is_dated() {
    let date = chrono::NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
    assert_eq!(database_export_file_name(date), "command-hub-2026-01-31.db");
}
