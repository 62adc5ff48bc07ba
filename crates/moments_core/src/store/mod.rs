//! Filesystem-backed moment record store.
//!
//! # Responsibility
//! - Allocate ids, stage and publish new records, enumerate and delete them.
//! - Keep every on-disk naming and schema detail inside this module.
//!
//! # Invariants
//! - A record is visible only when its image and a decodable metadata file
//!   are both present in a directory named after its id.
//! - New records become visible through one directory rename.
//! - Per-entry scan problems never fail a whole listing.
//!
//! # See also
//! - `layout` for the on-disk format.

use crate::model::moment::GeoError;
use crate::store::scanner::SkipReason;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub mod id_allocator;
pub mod layout;
pub mod moment_store;
pub mod scanner;

pub type StoreResult<T> = Result<T, StoreError>;

/// Step of `create` that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStage {
    /// Creating the hidden staging directory.
    Stage,
    /// Writing the image payload.
    Image,
    /// Encoding or writing `moment.json`.
    Metadata,
    /// Renaming the staging directory to its final name.
    Publish,
}

impl CreateStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::Image => "image",
            Self::Metadata => "metadata",
            Self::Publish => "publish",
        }
    }
}

/// Store-level error for moment operations.
#[derive(Debug)]
pub enum StoreError {
    /// The id allocator could not produce a fresh id.
    AllocationExhausted,
    /// Nothing was published; the staging directory has been discarded.
    CreateFailed {
        stage: CreateStage,
        source: io::Error,
    },
    /// No visible record with this id.
    NotFound(String),
    /// A directory exists for this id but fails the visibility rule.
    CorruptRecord { id: String, reason: SkipReason },
    /// Removal stopped partway; `remaining` lists what is still on disk.
    DeleteFailed {
        id: String,
        remaining: Vec<PathBuf>,
        source: io::Error,
    },
    /// Caller supplied unusable input.
    InvalidInput(String),
    /// Root-level filesystem failure.
    Io { context: String, source: io::Error },
}

impl StoreError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn create_failed(stage: CreateStage, source: io::Error) -> Self {
        Self::CreateFailed { stage, source }
    }

    /// Short stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationExhausted => "allocation_exhausted",
            Self::CreateFailed { .. } => "create_failed",
            Self::NotFound(_) => "not_found",
            Self::CorruptRecord { .. } => "corrupt_record",
            Self::DeleteFailed { .. } => "delete_failed",
            Self::InvalidInput(_) => "invalid_input",
            Self::Io { .. } => "io",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllocationExhausted => write!(f, "no fresh moment id could be allocated"),
            Self::CreateFailed { stage, source } => {
                write!(f, "moment create failed at {} step: {source}", stage.as_str())
            }
            Self::NotFound(id) => write!(f, "moment not found: {id}"),
            Self::CorruptRecord { id, reason } => write!(f, "moment {id} is not readable: {reason}"),
            Self::DeleteFailed {
                id,
                remaining,
                source,
            } => write!(
                f,
                "moment {id} delete failed with {} path(s) remaining: {source}",
                remaining.len()
            ),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Io { context, source } => write!(f, "{context}: {source}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateFailed { source, .. } => Some(source),
            Self::DeleteFailed { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::AllocationExhausted
            | Self::NotFound(_)
            | Self::CorruptRecord { .. }
            | Self::InvalidInput(_) => None,
        }
    }
}

impl From<GeoError> for StoreError {
    fn from(value: GeoError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}
