//! Domain model for captured moments.
//!
//! # Responsibility
//! - Define the canonical `Moment` record and its identifier.
//! - Keep field-level invariants (id syntax, coordinate ranges, description
//!   length) in one place so every store path enforces the same rules.
//!
//! # Invariants
//! - A `Moment` is identified by a `MomentId` that sorts in creation order.
//! - Coordinates are either fully present (`Some(GeoPoint)`) or absent.
//! - Moments are immutable once published; there is no update path.

pub mod moment;
pub mod moment_id;
