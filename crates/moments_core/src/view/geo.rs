//! Map pins and framing regions.
//!
//! # Invariants
//! - Only moments with a location produce pins.
//! - A bounding region is centered on the midpoint of the extreme
//!   coordinates; each axis span is the extent times `REGION_MARGIN`, or
//!   `FALLBACK_SPAN_DEGREES` when the extent is zero.
//! - Longitudes are treated linearly; regions do not wrap the antimeridian.

use crate::model::moment::{GeoPoint, Moment};
use crate::model::moment_id::MomentId;

/// Padding factor applied to the pin extent.
pub const REGION_MARGIN: f64 = 1.3;
/// Span used for an axis whose extent collapsed to a single value.
pub const FALLBACK_SPAN_DEGREES: f64 = 0.05;
/// Span of the single-moment detail map.
pub const DETAIL_SPAN_DEGREES: f64 = 0.01;

/// One located moment on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    pub id: MomentId,
    pub point: GeoPoint,
}

/// Visible map window: center plus full span per axis, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRegion {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl MapRegion {
    /// Smallest padded region framing every point; `None` for no points.
    pub fn bounding(points: impl IntoIterator<Item = GeoPoint>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (mut min_lat, mut max_lat) = (first.latitude(), first.latitude());
        let (mut min_lon, mut max_lon) = (first.longitude(), first.longitude());
        for point in points {
            min_lat = min_lat.min(point.latitude());
            max_lat = max_lat.max(point.latitude());
            min_lon = min_lon.min(point.longitude());
            max_lon = max_lon.max(point.longitude());
        }

        Some(Self {
            latitude: (min_lat + max_lat) / 2.0,
            longitude: (min_lon + max_lon) / 2.0,
            latitude_delta: padded_span(max_lat - min_lat),
            longitude_delta: padded_span(max_lon - min_lon),
        })
    }

    /// Close-up region for one moment's detail view.
    pub fn around(point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude(),
            longitude: point.longitude(),
            latitude_delta: DETAIL_SPAN_DEGREES,
            longitude_delta: DETAIL_SPAN_DEGREES,
        }
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        (point.latitude() - self.latitude).abs() <= self.latitude_delta / 2.0
            && (point.longitude() - self.longitude).abs() <= self.longitude_delta / 2.0
    }
}

fn padded_span(extent: f64) -> f64 {
    if extent > 0.0 {
        extent * REGION_MARGIN
    } else {
        FALLBACK_SPAN_DEGREES
    }
}

/// Pins derived from one listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoIndex {
    pins: Vec<Pin>,
}

impl GeoIndex {
    pub fn build(moments: &[Moment]) -> Self {
        let pins = moments
            .iter()
            .filter_map(|moment| {
                moment.location.map(|point| Pin {
                    id: moment.id.clone(),
                    point,
                })
            })
            .collect();
        Self { pins }
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    /// Region framing every pin plus the viewer, when known.
    pub fn region(&self, viewer: Option<GeoPoint>) -> Option<MapRegion> {
        MapRegion::bounding(self.pins.iter().map(|pin| pin.point).chain(viewer))
    }
}

/// Pins and framing region handed to a map collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub pins: Vec<Pin>,
    pub region: Option<MapRegion>,
}

impl MapView {
    pub fn build(moments: &[Moment], viewer: Option<GeoPoint>) -> Self {
        let index = GeoIndex::build(moments);
        let region = index.region(viewer);
        Self {
            pins: index.pins,
            region,
        }
    }
}
