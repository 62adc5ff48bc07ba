use moments_core::{
    Clock, CreateStage, DirMomentStore, ImageSource, MomentId, MomentStore, NewMoment,
    ScanObserver, SkipReason, SkippedEntry, StoreError,
};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const FROZEN_MS: i64 = 1_700_000_000_000;

struct FrozenClock(i64);

impl Clock for FrozenClock {
    fn now_ms(&self) -> Option<i64> {
        Some(self.0)
    }
}

#[derive(Default)]
struct RecordingObserver {
    entries: Mutex<Vec<SkippedEntry>>,
}

impl RecordingObserver {
    fn reasons_for(&self, name: &str) -> Vec<SkipReason> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.name == name)
            .map(|entry| entry.reason.clone())
            .collect()
    }
}

impl ScanObserver for RecordingObserver {
    fn on_skipped(&self, entry: &SkippedEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn setup() -> (TempDir, DirMomentStore, Arc<RecordingObserver>) {
    let dir = tempfile::tempdir().unwrap();
    let observer = Arc::new(RecordingObserver::default());
    let store = DirMomentStore::open_with(
        dir.path().join("moments"),
        Arc::new(FrozenClock(FROZEN_MS)),
        observer.clone(),
    )
    .unwrap();
    (dir, store, observer)
}

fn photo() -> ImageSource {
    ImageSource::Bytes(b"jpeg".to_vec())
}

fn write_record(root: &Path, name: &str, metadata: Option<&str>, with_image: bool) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    if with_image {
        fs::write(dir.join("photo.jpg"), b"jpeg").unwrap();
    }
    if let Some(metadata) = metadata {
        fs::write(dir.join("moment.json"), metadata).unwrap();
    }
}

#[test]
fn image_only_directory_is_invisible() {
    let (_dir, store, observer) = setup();
    write_record(store.root(), "1600000000000", None, true);

    assert!(store.list().unwrap().is_empty());
    let id = MomentId::parse("1600000000000").unwrap();
    assert!(matches!(store.get(&id), Err(StoreError::NotFound(_))));
    assert!(observer
        .reasons_for("1600000000000")
        .contains(&SkipReason::MissingMetadata));
}

#[test]
fn delete_refuses_image_only_directory() {
    let (_dir, store, _observer) = setup();
    write_record(store.root(), "1600000000000", None, true);
    let id = MomentId::parse("1600000000000").unwrap();

    assert!(matches!(
        store.delete(&id),
        Err(StoreError::NotFound(name)) if name == "1600000000000"
    ));
    assert!(store.root().join("1600000000000").join("photo.jpg").exists());

    store.purge(&id).unwrap();
    assert!(!store.root().join("1600000000000").exists());
}

#[cfg(unix)]
#[test]
fn symlinked_record_directory_is_invisible_to_get_and_list() {
    let (dir, store, _observer) = setup();
    write_record(
        dir.path(),
        "elsewhere",
        Some(r#"{"id":"1600000000000","createdAt":1600000000000}"#),
        true,
    );
    std::os::unix::fs::symlink(
        dir.path().join("elsewhere"),
        store.root().join("1600000000000"),
    )
    .unwrap();
    let id = MomentId::parse("1600000000000").unwrap();

    let report = store.list_with_report().unwrap();
    assert!(report.moments.is_empty());
    assert_eq!(report.skipped[0].reason, SkipReason::NotADirectory);
    assert!(matches!(store.get(&id), Err(StoreError::NotFound(_))));
    assert!(matches!(
        store.inspect(&id),
        Err(StoreError::CorruptRecord {
            reason: SkipReason::NotADirectory,
            ..
        })
    ));
    assert!(matches!(store.delete(&id), Err(StoreError::NotFound(_))));
    assert!(dir.path().join("elsewhere").join("moment.json").exists());
}

#[test]
fn metadata_without_image_is_invisible() {
    let (_dir, store, _observer) = setup();
    write_record(
        store.root(),
        "1600000000000",
        Some(r#"{"id":"1600000000000","createdAt":1600000000000}"#),
        false,
    );

    let report = store.list_with_report().unwrap();
    assert!(report.moments.is_empty());
    assert_eq!(report.skipped[0].reason, SkipReason::MissingImage);
}

#[test]
fn corrupt_metadata_is_skipped_and_reported_without_hiding_others() {
    let (_dir, store, observer) = setup();
    let good = store.create(NewMoment::new(photo(), "fine")).unwrap();
    write_record(store.root(), "1600000000000", Some("{ truncated"), true);

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, good.id);

    let reasons = observer.reasons_for("1600000000000");
    assert!(matches!(reasons.as_slice(), [SkipReason::Corrupt(_)]));

    let id = MomentId::parse("1600000000000").unwrap();
    assert!(matches!(
        store.inspect(&id),
        Err(StoreError::CorruptRecord { reason: SkipReason::Corrupt(_), .. })
    ));
}

#[test]
fn metadata_id_must_match_directory() {
    let (_dir, store, _observer) = setup();
    write_record(
        store.root(),
        "1600000000000",
        Some(r#"{"id":"1600000000001","createdAt":1600000000001}"#),
        true,
    );

    let report = store.list_with_report().unwrap();
    assert!(report.moments.is_empty());
    assert_eq!(report.corrupt_count(), 1);
}

#[test]
fn legacy_records_remain_readable() {
    let (_dir, store, _observer) = setup();
    write_record(
        store.root(),
        "1600000000000",
        Some(r#"{"id":"1600000000000","description":"old","createdAt":1600000000123,"photo":"photo.jpg"}"#),
        true,
    );

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].description, "old");
    assert_eq!(listed[0].created_at, 1_600_000_000_123);
    assert!(listed[0].location.is_none());
}

#[test]
fn hidden_and_foreign_entries_are_ignored() {
    let (_dir, store, _observer) = setup();
    write_record(store.root(), ".staging-abc", Some("{}"), true);
    fs::write(store.root().join("notes.txt"), b"hi").unwrap();
    fs::write(store.root().join("1600000000000"), b"file, not dir").unwrap();

    let report = store.list_with_report().unwrap();
    assert!(report.moments.is_empty());
    let reasons = report
        .skipped
        .iter()
        .map(|entry| (entry.name.as_str(), entry.reason.clone()))
        .collect::<Vec<_>>();
    assert!(reasons.contains(&(".staging-abc", SkipReason::Staging)));
    assert!(reasons.contains(&("notes.txt", SkipReason::UnrecognizedName)));
    assert!(reasons.contains(&("1600000000000", SkipReason::NotADirectory)));
}

#[test]
fn sweep_removes_leftover_staging_and_trash() {
    let (_dir, store, _observer) = setup();
    write_record(store.root(), ".staging-abc", None, true);
    write_record(store.root(), ".trash-1600000000000-def", None, true);
    let kept = store.create(NewMoment::new(photo(), "")).unwrap();

    assert_eq!(store.sweep().unwrap(), 2);
    let names = fs::read_dir(store.root())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    assert_eq!(names, vec![kept.id.to_string()]);
}

#[test]
fn reopening_store_seeds_allocator_past_existing_ids() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("moments");
    write_record(
        &root,
        "1700000000000-0005",
        Some(r#"{"id":"1700000000000-0005","createdAt":1700000000000}"#),
        true,
    );

    let store = DirMomentStore::open_with(
        &root,
        Arc::new(FrozenClock(FROZEN_MS)),
        Arc::new(RecordingObserver::default()),
    )
    .unwrap();
    let created = store.create(NewMoment::new(photo(), "")).unwrap();
    assert_eq!(created.id.as_str(), "1700000000000-0006");
    assert_eq!(store.list().unwrap().len(), 2);
}

#[test]
fn publish_collision_retries_with_fresh_id() {
    let (_dir, store, _observer) = setup();
    write_record(store.root(), "1700000000000", None, true);

    let created = store.create(NewMoment::new(photo(), "retry")).unwrap();
    assert_eq!(created.id.as_str(), "1700000000000-0001");
    assert_eq!(store.get(&created.id).unwrap(), created);
}

#[test]
fn persistent_collision_fails_without_leftovers() {
    let (_dir, store, _observer) = setup();
    write_record(store.root(), "1700000000000", None, true);
    write_record(store.root(), "1700000000000-0001", None, true);

    let err = store.create(NewMoment::new(photo(), "")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::CreateFailed {
            stage: CreateStage::Publish,
            ..
        }
    ));
    let mut names = fs::read_dir(store.root())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(names, vec!["1700000000000", "1700000000000-0001"]);
}

#[test]
fn repeated_listing_is_stable() {
    let (_dir, store, _observer) = setup();
    for _ in 0..3 {
        store.create(NewMoment::new(photo(), "same")).unwrap();
    }
    assert_eq!(store.list().unwrap(), store.list().unwrap());
}

#[test]
fn missing_root_is_recreated_on_list() {
    let (_dir, store, _observer) = setup();
    fs::remove_dir_all(store.root()).unwrap();

    assert!(store.list().unwrap().is_empty());
    assert!(store.root().is_dir());
}
