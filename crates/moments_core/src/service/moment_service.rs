//! Moment use-case service.
//!
//! # Responsibility
//! - Accept raw collaborator input (string ids, optional coordinate pairs).
//! - Derive gallery and map projections from fresh listings.
//!
//! # Invariants
//! - Service APIs never bypass the store's staging/visibility contracts.
//! - A malformed id is reported as `NotFound`, never as a parse failure.

use crate::model::moment::{GeoPoint, Moment};
use crate::model::moment_id::MomentId;
use crate::store::moment_store::{ImageSource, MomentStore, NewMoment};
use crate::store::{StoreError, StoreResult};
use crate::view::gallery::GalleryGrid;
use crate::view::geo::{MapRegion, MapView};

/// Use-case wrapper over a `MomentStore`.
pub struct MomentService<S: MomentStore> {
    store: S,
}

impl<S: MomentStore> MomentService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persists a capture.
    ///
    /// # Contract
    /// - `coordinates` is `(latitude, longitude)`; out-of-range values are
    ///   rejected with `InvalidInput` before anything is written.
    /// - Description is truncated to 512 characters.
    pub fn capture(
        &self,
        image: ImageSource,
        description: &str,
        coordinates: Option<(f64, f64)>,
    ) -> StoreResult<Moment> {
        let mut request = NewMoment::new(image, description);
        if let Some((latitude, longitude)) = coordinates {
            request = request.with_coordinates(latitude, longitude)?;
        }
        self.store.create(request)
    }

    pub fn get(&self, id: &str) -> StoreResult<Moment> {
        self.store.get(&parse_id(id)?)
    }

    /// Fresh newest-first listing.
    pub fn list(&self) -> StoreResult<Vec<Moment>> {
        self.store.list()
    }

    pub fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete(&parse_id(id)?)
    }

    pub fn gallery(&self, columns: usize) -> StoreResult<GalleryGrid> {
        Ok(GalleryGrid::build(self.store.list()?, columns))
    }

    /// Pins plus a region framing them and the viewer.
    pub fn map(&self, viewer: Option<GeoPoint>) -> StoreResult<MapView> {
        Ok(MapView::build(&self.store.list()?, viewer))
    }

    /// Moment plus its close-up map region, if located.
    pub fn detail(&self, id: &str) -> StoreResult<(Moment, Option<MapRegion>)> {
        let moment = self.get(id)?;
        let region = moment.location.map(MapRegion::around);
        Ok((moment, region))
    }
}

fn parse_id(id: &str) -> StoreResult<MomentId> {
    MomentId::parse(id.trim()).map_err(|_| StoreError::NotFound(id.to_string()))
}
