//! Moment store contract and its directory-backed implementation.
//!
//! # Responsibility
//! - Provide create/get/list/delete over one collection root.
//! - Be the only code path that mutates the collection.
//!
//! # Invariants
//! - `create` assembles a record under a hidden staging name and publishes
//!   it with a single rename; on failure nothing is published.
//! - `delete` unpublishes with a single rename to a hidden trash name before
//!   removing any file.
//! - `delete` only removes records `get` would return; `purge` removes any
//!   directory carrying the id.
//! - Every `list` is a fresh scan; nothing is cached between calls.

use crate::model::moment::{GeoPoint, Moment};
use crate::model::moment_id::MomentId;
use crate::store::id_allocator::{Clock, IdAllocator, SystemClock};
use crate::store::layout::{self, EntryName};
use crate::store::scanner::{
    DirectoryScanner, LogScanObserver, ScanObserver, ScanReport, SkipReason, SkippedEntry,
};
use crate::store::{CreateStage, StoreError, StoreResult};
use log::{debug, error, info, warn};
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Where the image payload of a new moment comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Encoded image bytes held in memory.
    Bytes(Vec<u8>),
    /// Copy this file; the original is left untouched.
    CopyFrom(PathBuf),
    /// Take ownership of this file; it is removed once the record is
    /// published, and left in place if create fails.
    MoveFrom(PathBuf),
}

/// Input for `MomentStore::create`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMoment {
    pub image: ImageSource,
    /// Truncated to `MAX_DESCRIPTION_CHARS` on create.
    pub description: String,
    pub location: Option<GeoPoint>,
}

impl NewMoment {
    pub fn new(image: ImageSource, description: impl Into<String>) -> Self {
        Self {
            image,
            description: description.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    /// Attaches raw coordinates after range validation.
    pub fn with_coordinates(self, latitude: f64, longitude: f64) -> StoreResult<Self> {
        Ok(self.at(GeoPoint::new(latitude, longitude)?))
    }
}

/// Store interface for moment records.
pub trait MomentStore {
    fn create(&self, request: NewMoment) -> StoreResult<Moment>;
    fn get(&self, id: &MomentId) -> StoreResult<Moment>;
    fn list(&self) -> StoreResult<Vec<Moment>>;
    fn delete(&self, id: &MomentId) -> StoreResult<()>;
}

/// Moment store rooted at one collection directory.
pub struct DirMomentStore {
    root: PathBuf,
    allocator: Mutex<IdAllocator>,
    observer: Arc<dyn ScanObserver>,
}

impl DirMomentStore {
    /// Opens a store with the system clock and log-based scan reporting.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::open_with(root, Arc::new(SystemClock), Arc::new(LogScanObserver))
    }

    /// Opens a store with explicit collaborators.
    ///
    /// # Side effects
    /// - Creates the root when missing.
    /// - Removes staging/trash leftovers of interrupted operations.
    /// - Seeds the id allocator past the largest id already on disk.
    pub fn open_with(
        root: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn ScanObserver>,
    ) -> StoreResult<Self> {
        let started_at = Instant::now();
        let store = Self {
            root: root.into(),
            allocator: Mutex::new(IdAllocator::new(clock)),
            observer,
        };
        store.ensure_root()?;
        let swept = store.sweep()?;
        let newest = store.seed_allocator()?;
        info!(
            "event=store_open module=store status=ok root={} swept={} newest_id={} duration_ms={}",
            store.root.display(),
            swept,
            newest.as_ref().map(MomentId::as_str).unwrap_or("none"),
            started_at.elapsed().as_millis()
        );
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a moment's image payload under the root.
    pub fn photo_path(&self, moment: &Moment) -> PathBuf {
        layout::image_path_for(&layout::directory_for(&self.root, &moment.id))
    }

    /// Lists visible moments together with every skipped entry.
    pub fn list_with_report(&self) -> StoreResult<ScanReport> {
        let started_at = Instant::now();
        self.ensure_root()?;
        let report = self.scanner().scan()?;
        info!(
            "event=moment_list module=store status=ok count={} skipped={} corrupt={} duration_ms={}",
            report.moments.len(),
            report.skipped.len(),
            report.corrupt_count(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Loads one record and surfaces why it is not visible.
    ///
    /// Unlike `get`, a damaged or uncommitted record yields `CorruptRecord`
    /// instead of `NotFound`.
    pub fn inspect(&self, id: &MomentId) -> StoreResult<Moment> {
        match self.scanner().read_record(id) {
            Ok(moment) => Ok(moment),
            Err(SkipReason::Vanished) => Err(StoreError::NotFound(id.to_string())),
            Err(reason) => Err(StoreError::CorruptRecord {
                id: id.to_string(),
                reason,
            }),
        }
    }

    /// Removes staging and trash leftovers. Returns how many were removed.
    ///
    /// Must not run while a `create` on the same root is in flight.
    pub fn sweep(&self) -> StoreResult<usize> {
        let entries = fs::read_dir(&self.root).map_err(|err| {
            StoreError::io(format!("failed to list `{}`", self.root.display()), err)
        })?;

        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !matches!(
                layout::classify_entry(&name),
                EntryName::Staging | EntryName::Trash
            ) {
                continue;
            }
            let path = entry.path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            match result {
                Ok(()) => {
                    removed += 1;
                    debug!("event=store_sweep module=store status=ok entry={name}");
                }
                Err(err) => warn!(
                    "event=store_sweep module=store status=error entry={name} error={err}"
                ),
            }
        }
        Ok(removed)
    }

    fn scanner(&self) -> DirectoryScanner<'_> {
        DirectoryScanner::new(&self.root, self.observer.as_ref())
    }

    fn ensure_root(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.root).map_err(|err| {
            StoreError::io(
                format!("failed to create collection root `{}`", self.root.display()),
                err,
            )
        })
    }

    fn seed_allocator(&self) -> StoreResult<Option<MomentId>> {
        let entries = fs::read_dir(&self.root).map_err(|err| {
            StoreError::io(format!("failed to list `{}`", self.root.display()), err)
        })?;
        let newest = entries
            .flatten()
            .filter_map(|entry| match layout::classify_entry(&entry.file_name().to_string_lossy()) {
                EntryName::Record(id) => Some(id),
                _ => None,
            })
            .max();
        if let Some(id) = &newest {
            self.allocator().observe(id);
        }
        Ok(newest)
    }

    fn allocator(&self) -> MutexGuard<'_, IdAllocator> {
        // Poisoning cannot leave `last` below an id that was handed out.
        self.allocator
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creates the staging directory and writes the image payload into it.
    fn stage(&self, staging: &Path, image: &ImageSource) -> StoreResult<()> {
        fs::create_dir(staging).map_err(|err| StoreError::create_failed(CreateStage::Stage, err))?;
        write_image(image, &layout::image_path_for(staging))
            .map_err(|err| StoreError::create_failed(CreateStage::Image, err))
    }

    /// Writes the metadata and renames the staging directory to the id.
    ///
    /// A taken name is retried once under a fresh id; a second collision is
    /// a `Publish` failure.
    fn commit(&self, staging: &Path, moment: Moment) -> StoreResult<Moment> {
        write_metadata(&moment, staging)?;

        let target = layout::directory_for(&self.root, &moment.id);
        if try_publish(staging, &target)
            .map_err(|err| StoreError::create_failed(CreateStage::Publish, err))?
        {
            return Ok(moment);
        }

        warn!(
            "event=moment_publish module=store status=collision id={}",
            moment.id
        );
        let retry_id = {
            let mut allocator = self.allocator();
            allocator.observe(&moment.id);
            allocator.next()?
        };
        let moment = Moment {
            created_at: retry_id.timestamp_ms(),
            id: retry_id,
            ..moment
        };
        write_metadata(&moment, staging)?;

        let target = layout::directory_for(&self.root, &moment.id);
        if try_publish(staging, &target)
            .map_err(|err| StoreError::create_failed(CreateStage::Publish, err))?
        {
            return Ok(moment);
        }
        Err(StoreError::create_failed(
            CreateStage::Publish,
            io::Error::new(
                ErrorKind::AlreadyExists,
                format!("moment directory `{}` already exists", moment.id),
            ),
        ))
    }

    /// Drops a failed create's staging directory and logs the failure.
    fn abandon(&self, staging: &Path, started_at: Instant, err: StoreError) -> StoreError {
        discard_staging(staging);
        error!(
            "event=moment_create module=store status=error duration_ms={} error_code={} error={}",
            started_at.elapsed().as_millis(),
            err.code(),
            err
        );
        err
    }

    /// Removes the directory named `id` whether or not it forms a visible
    /// record. `delete` refuses invisible records; this is the cleanup path
    /// for the ones `list_with_report` flags as skipped.
    ///
    /// # Errors
    /// - `NotFound` when nothing carries that name.
    /// - `DeleteFailed` with the paths left behind.
    pub fn purge(&self, id: &MomentId) -> StoreResult<()> {
        let started_at = Instant::now();
        let target = layout::directory_for(&self.root, id);
        let meta = match fs::symlink_metadata(&target) {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()))
            }
            Err(err) => {
                return Err(StoreError::DeleteFailed {
                    id: id.to_string(),
                    remaining: vec![target],
                    source: err,
                })
            }
        };

        if meta.is_dir() {
            self.unpublish_and_remove(id, &target)?;
        } else {
            fs::remove_file(&target).map_err(|err| StoreError::DeleteFailed {
                id: id.to_string(),
                remaining: vec![target.clone()],
                source: err,
            })?;
        }
        info!(
            "event=moment_purge module=store status=ok id={} duration_ms={}",
            id,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn unpublish_and_remove(&self, id: &MomentId, target: &Path) -> StoreResult<()> {
        // Why: one rename hides the record before any file goes, so a crash
        // mid-removal never leaves a half-deleted record visible.
        let trash = self.root.join(layout::trash_name(id));
        if let Err(err) = fs::rename(target, &trash) {
            if err.kind() == ErrorKind::NotFound {
                return Err(StoreError::NotFound(id.to_string()));
            }
            error!(
                "event=moment_delete module=store status=error id={} step=unpublish error={}",
                id, err
            );
            return Err(StoreError::DeleteFailed {
                id: id.to_string(),
                remaining: vec![target.to_path_buf()],
                source: err,
            });
        }

        if let Err(err) = fs::remove_dir_all(&trash) {
            let remaining = remaining_paths(&trash);
            error!(
                "event=moment_delete module=store status=error id={} step=purge remaining={} error={}",
                id,
                remaining.len(),
                err
            );
            return Err(StoreError::DeleteFailed {
                id: id.to_string(),
                remaining,
                source: err,
            });
        }
        Ok(())
    }
}

impl MomentStore for DirMomentStore {
    fn create(&self, request: NewMoment) -> StoreResult<Moment> {
        let started_at = Instant::now();
        self.ensure_root()?;
        let id = self.allocator().next()?;
        let moment = Moment::new(id, &request.description, request.location);
        let staging = self.root.join(layout::staging_name());

        let result = self
            .stage(&staging, &request.image)
            .and_then(|()| self.commit(&staging, moment));
        match result {
            Ok(moment) => {
                // Why: the rename is only durable once the parent directory
                // entry is flushed.
                sync_dir(&self.root);
                if let ImageSource::MoveFrom(source) = &request.image {
                    if let Err(err) = fs::remove_file(source) {
                        warn!(
                            "event=moment_create module=store status=ok id={} source_cleanup=failed error={}",
                            moment.id, err
                        );
                    }
                }
                info!(
                    "event=moment_create module=store status=ok id={} has_location={} duration_ms={}",
                    moment.id,
                    moment.has_location(),
                    started_at.elapsed().as_millis()
                );
                Ok(moment)
            }
            Err(err) => Err(self.abandon(&staging, started_at, err)),
        }
    }

    fn get(&self, id: &MomentId) -> StoreResult<Moment> {
        match self.inspect(id) {
            Err(StoreError::CorruptRecord { id, reason }) => {
                self.observer.on_skipped(&SkippedEntry {
                    name: id.clone(),
                    reason,
                });
                Err(StoreError::NotFound(id))
            }
            other => other,
        }
    }

    fn list(&self) -> StoreResult<Vec<Moment>> {
        self.list_with_report().map(|report| report.moments)
    }

    /// Deletes a visible record.
    ///
    /// A directory that fails the visibility rule is `NotFound` here, the
    /// same answer `get` gives; `DirMomentStore::purge` removes those.
    fn delete(&self, id: &MomentId) -> StoreResult<()> {
        let started_at = Instant::now();
        self.get(id)?;

        let target = layout::directory_for(&self.root, id);
        self.unpublish_and_remove(id, &target)?;
        info!(
            "event=moment_delete module=store status=ok id={} duration_ms={}",
            id,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

/// Renames `staging` to `target`; `Ok(false)` means the name is taken.
fn try_publish(staging: &Path, target: &Path) -> io::Result<bool> {
    // Why: `rename` onto an empty directory succeeds on unix, so an existing
    // target has to be ruled out first.
    if fs::symlink_metadata(target).is_ok() {
        return Ok(false);
    }
    match fs::rename(staging, target) {
        Ok(()) => Ok(true),
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::AlreadyExists | ErrorKind::DirectoryNotEmpty
            ) =>
        {
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

fn write_image(source: &ImageSource, dest: &Path) -> io::Result<()> {
    match source {
        ImageSource::Bytes(bytes) => write_synced(dest, bytes),
        ImageSource::CopyFrom(path) => {
            fs::copy(path, dest)?;
            File::open(dest)?.sync_all()
        }
        ImageSource::MoveFrom(path) => link_or_copy(path, dest),
    }
}

/// Hard-links when source and staging share a filesystem, copies otherwise.
fn link_or_copy(from: &Path, to: &Path) -> io::Result<()> {
    // Why: the source must survive until publish, so it is linked rather
    // than renamed; a failed create then still leaves the caller's file.
    match fs::hard_link(from, to) {
        Ok(()) => Ok(()),
        Err(link_err) => {
            debug!(
                "event=moment_create module=store status=fallback step=image_copy error={}",
                link_err
            );
            fs::copy(from, to)?;
            File::open(to)?.sync_all()
        }
    }
}

fn write_metadata(moment: &Moment, staging: &Path) -> StoreResult<()> {
    let bytes = layout::encode(moment)
        .map_err(|err| StoreError::create_failed(CreateStage::Metadata, err.into()))?;
    write_synced(&layout::metadata_path_for(staging), &bytes)
        .map_err(|err| StoreError::create_failed(CreateStage::Metadata, err))
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn discard_staging(staging: &Path) {
    if let Err(err) = fs::remove_dir_all(staging) {
        if err.kind() != ErrorKind::NotFound {
            warn!(
                "event=moment_create module=store status=error step=discard_staging entry={} error={}",
                staging.display(),
                err
            );
        }
    }
}

/// Persists the directory entry change; not every platform supports it.
fn sync_dir(dir: &Path) {
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }
}

fn remaining_paths(root: &Path) -> Vec<PathBuf> {
    let mut remaining = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(path) = pending.pop() {
        if fs::symlink_metadata(&path).is_err() {
            continue;
        }
        if path.is_dir() {
            if let Ok(entries) = fs::read_dir(&path) {
                pending.extend(entries.flatten().map(|entry| entry.path()));
            }
        }
        remaining.push(path);
    }
    remaining
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_failure_discards_staging_and_publishes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirMomentStore::open(dir.path().join("moments")).unwrap();
        let id = store.allocator().next().unwrap();
        let moment = Moment::new(id.clone(), "blocked", None);
        let staging = store.root().join(layout::staging_name());

        store
            .stage(&staging, &ImageSource::Bytes(vec![0xFF, 0xD8, 0xFF, 0xD9]))
            .unwrap();
        // A directory squatting on the metadata name makes the write fail.
        fs::create_dir(layout::metadata_path_for(&staging)).unwrap();

        let err = store
            .commit(&staging, moment)
            .map_err(|err| store.abandon(&staging, Instant::now(), err))
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::CreateFailed {
                stage: CreateStage::Metadata,
                ..
            }
        ));
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 0);
        assert!(matches!(store.get(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn purge_removes_directory_that_delete_refuses() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirMomentStore::open(dir.path().join("moments")).unwrap();
        let id = MomentId::parse("1600000000000").unwrap();
        let record_dir = layout::directory_for(store.root(), &id);
        fs::create_dir(&record_dir).unwrap();
        fs::write(layout::image_path_for(&record_dir), [0xFF, 0xD8]).unwrap();

        assert!(matches!(store.delete(&id), Err(StoreError::NotFound(_))));
        assert!(record_dir.exists());

        store.purge(&id).unwrap();
        assert!(!record_dir.exists());
        assert!(matches!(store.purge(&id), Err(StoreError::NotFound(_))));
    }
}
