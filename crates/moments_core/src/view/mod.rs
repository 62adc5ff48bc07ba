//! Read-only projections over a moment listing.
//!
//! # Responsibility
//! - Shape `MomentStore::list` output for grid and map collaborators.
//!
//! # Invariants
//! - Pure functions; no store or filesystem access.
//! - Input order (newest first) is preserved.

pub mod gallery;
pub mod geo;
