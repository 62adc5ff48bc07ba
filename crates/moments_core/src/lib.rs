//! Core record store for captured moments.
//! This crate owns the on-disk format and every invariant around it.

pub mod config;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod view;

pub use config::StoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::moment::{clamp_description, GeoError, GeoPoint, Moment, MAX_DESCRIPTION_CHARS};
pub use model::moment_id::{IdError, MomentId};
pub use service::moment_service::MomentService;
pub use store::id_allocator::{Clock, IdAllocator, SystemClock};
pub use store::layout::{DecodeError, MomentRecord};
pub use store::moment_store::{DirMomentStore, ImageSource, MomentStore, NewMoment};
pub use store::scanner::{LogScanObserver, ScanObserver, ScanReport, SkipReason, SkippedEntry};
pub use store::{CreateStage, StoreError, StoreResult};
pub use view::gallery::GalleryGrid;
pub use view::geo::{GeoIndex, MapRegion, MapView, Pin};

/// Minimal health-check API for collaborator wiring.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
