//! Moment domain record.
//!
//! # Responsibility
//! - Define the canonical record produced by capture and consumed by the
//!   gallery, map and detail views.
//! - Own the description length policy and coordinate validation.
//!
//! # Invariants
//! - `location` is `Some` only with both coordinates in range.
//! - `description` written by this crate is at most
//!   `MAX_DESCRIPTION_CHARS` characters.
//! - `photo` is a file name relative to the moment directory.

use crate::model::moment_id::MomentId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound on description length, in Unicode scalar values.
pub const MAX_DESCRIPTION_CHARS: usize = 512;

/// Image file name used by every record this crate writes.
pub const PHOTO_FILE_NAME: &str = "photo.jpg";

/// Coordinate validation failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    NonFinite,
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl Display for GeoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite => write!(f, "coordinates must be finite numbers"),
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude {value} is outside [-90, 90]")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude {value} is outside [-180, 180]")
            }
        }
    }
}

impl Error for GeoError {}

/// A validated latitude/longitude pair in signed degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Creates a point after range-checking both axes.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(GeoError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Degrees north, within `[-90, 90]`.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Degrees east, within `[-180, 180]`.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// One persisted capture: a photo plus optional location and text.
#[derive(Debug, Clone, PartialEq)]
pub struct Moment {
    /// Directory name and chronological sort key.
    pub id: MomentId,
    /// Free text, possibly empty.
    pub description: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Where the photo was taken, when location was available.
    pub location: Option<GeoPoint>,
    /// Image file name relative to the moment directory.
    pub photo: String,
}

impl Moment {
    /// Builds a freshly captured moment; `created_at` is taken from the id.
    pub fn new(id: MomentId, description: &str, location: Option<GeoPoint>) -> Self {
        Self {
            created_at: id.timestamp_ms(),
            id,
            description: clamp_description(description),
            location,
            photo: PHOTO_FILE_NAME.to_string(),
        }
    }

    /// Latitude of the attached location, if any.
    pub fn latitude(&self) -> Option<f64> {
        self.location.map(|point| point.latitude())
    }

    /// Longitude of the attached location, if any.
    pub fn longitude(&self) -> Option<f64> {
        self.location.map(|point| point.longitude())
    }

    pub fn has_location(&self) -> bool {
        self.location.is_some()
    }
}

/// Truncates a description to `MAX_DESCRIPTION_CHARS` characters.
///
/// Longer input is cut, never rejected, matching the capture text field.
pub fn clamp_description(value: &str) -> String {
    match value.char_indices().nth(MAX_DESCRIPTION_CHARS) {
        Some((byte_index, _)) => value[..byte_index].to_string(),
        None => value.to_string(),
    }
}
