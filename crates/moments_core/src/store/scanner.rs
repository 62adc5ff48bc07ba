//! Collection directory enumeration.
//!
//! # Responsibility
//! - Rebuild visible moments from the collection root on every call.
//! - Report, never raise, per-entry problems through a `ScanObserver`.
//!
//! # Invariants
//! - Read-only: the scanner never creates, renames or removes anything.
//! - Only directories whose names parse as `MomentId` are candidates.
//! - Returned moments are sorted newest first by id.

use crate::model::moment::Moment;
use crate::model::moment_id::MomentId;
use crate::store::layout::{self, DecodeError, EntryName};
use crate::store::{StoreError, StoreResult};
use log::{debug, warn};
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Why a collection entry was left out of a listing.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Hidden staging or trash directory (in-flight create/delete).
    Staging,
    /// Entry disappeared between enumeration and reading.
    Vanished,
    NotADirectory,
    UnrecognizedName,
    MissingImage,
    MissingMetadata,
    Corrupt(DecodeError),
    /// Metadata `id` disagrees with the directory name.
    IdMismatch { recorded: MomentId },
    Unreadable(String),
}

impl SkipReason {
    /// Whether the entry looks damaged rather than merely uncommitted.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            Self::Corrupt(_)
                | Self::IdMismatch { .. }
                | Self::Unreadable(_)
                | Self::NotADirectory
                | Self::UnrecognizedName
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Staging => "staging",
            Self::Vanished => "vanished",
            Self::NotADirectory => "not_a_directory",
            Self::UnrecognizedName => "unrecognized_name",
            Self::MissingImage => "missing_image",
            Self::MissingMetadata => "missing_metadata",
            Self::Corrupt(_) => "corrupt_metadata",
            Self::IdMismatch { .. } => "id_mismatch",
            Self::Unreadable(_) => "unreadable",
        }
    }
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Corrupt(err) => write!(f, "{err}"),
            Self::IdMismatch { recorded } => {
                write!(f, "metadata records id `{recorded}` for another directory")
            }
            Self::Unreadable(message) => write!(f, "unreadable entry: {message}"),
            other => f.write_str(other.code()),
        }
    }
}

/// One entry left out of a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    /// File name of the entry inside the collection root.
    pub name: String,
    pub reason: SkipReason,
}

/// Receives entries the scanner skipped.
pub trait ScanObserver: Send + Sync {
    fn on_skipped(&self, entry: &SkippedEntry);
}

/// Default observer: structured log lines, `warn` for corrupt entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogScanObserver;

impl ScanObserver for LogScanObserver {
    fn on_skipped(&self, entry: &SkippedEntry) {
        if entry.reason.is_corrupt() {
            warn!(
                "event=scan_skip module=store status=skip entry={} reason={} detail={}",
                entry.name,
                entry.reason.code(),
                entry.reason
            );
        } else {
            debug!(
                "event=scan_skip module=store status=skip entry={} reason={}",
                entry.name,
                entry.reason.code()
            );
        }
    }
}

/// Result of one full pass over the collection root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Visible moments, newest first.
    pub moments: Vec<Moment>,
    pub skipped: Vec<SkippedEntry>,
}

impl ScanReport {
    pub fn corrupt_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|entry| entry.reason.is_corrupt())
            .count()
    }
}

/// Read-only walker over one collection root.
pub struct DirectoryScanner<'a> {
    root: &'a Path,
    observer: &'a dyn ScanObserver,
}

impl<'a> DirectoryScanner<'a> {
    pub fn new(root: &'a Path, observer: &'a dyn ScanObserver) -> Self {
        Self { root, observer }
    }

    /// Enumerates the root and returns every visible moment.
    ///
    /// A missing root is an empty collection.
    ///
    /// # Errors
    /// - `StoreError::Io` when the root exists but cannot be listed.
    pub fn scan(&self) -> StoreResult<ScanReport> {
        let entries = match fs::read_dir(self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ScanReport::default()),
            Err(err) => {
                return Err(StoreError::io(
                    format!("failed to list `{}`", self.root.display()),
                    err,
                ))
            }
        };

        let mut report = ScanReport::default();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.skip(&mut report, String::new(), SkipReason::Unreadable(err.to_string()));
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();

            let id = match layout::classify_entry(&name) {
                EntryName::Record(id) => id,
                EntryName::Staging | EntryName::Trash => {
                    self.skip(&mut report, name, SkipReason::Staging);
                    continue;
                }
                EntryName::Other => {
                    self.skip(&mut report, name, SkipReason::UnrecognizedName);
                    continue;
                }
            };

            match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => {}
                Ok(_) => {
                    self.skip(&mut report, name, SkipReason::NotADirectory);
                    continue;
                }
                Err(err) => {
                    self.skip(&mut report, name, SkipReason::Unreadable(err.to_string()));
                    continue;
                }
            }

            match self.read_record(&id) {
                Ok(moment) => report.moments.push(moment),
                Err(reason) => self.skip(&mut report, name, reason),
            }
        }

        report.moments.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(report)
    }

    /// Loads one record, applying the visibility rule.
    ///
    /// Symlinks are not followed, matching `scan`.
    pub fn read_record(&self, id: &MomentId) -> Result<Moment, SkipReason> {
        let dir = layout::directory_for(self.root, id);
        match fs::symlink_metadata(&dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(SkipReason::NotADirectory),
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(SkipReason::Vanished),
            Err(err) => return Err(SkipReason::Unreadable(err.to_string())),
        }

        if !layout::image_path_for(&dir).is_file() {
            return Err(SkipReason::MissingImage);
        }

        let bytes = match fs::read(layout::metadata_path_for(&dir)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(SkipReason::MissingMetadata)
            }
            Err(err) => return Err(SkipReason::Unreadable(err.to_string())),
        };

        let moment = layout::decode(&bytes).map_err(SkipReason::Corrupt)?;
        if &moment.id != id {
            return Err(SkipReason::IdMismatch {
                recorded: moment.id,
            });
        }
        Ok(moment)
    }

    fn skip(&self, report: &mut ScanReport, name: String, reason: SkipReason) {
        let entry = SkippedEntry { name, reason };
        self.observer.on_skipped(&entry);
        report.skipped.push(entry);
    }
}
