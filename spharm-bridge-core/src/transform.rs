//! Seams to the spherical-harmonics backend
//!
//! The transform itself is performed by an external library. This module only
//! describes what such a library must provide: a [`TransformBackend`] that
//! builds a [`SpectralTransform`] handle for a [`GridGeometry`]. Handles are
//! immutable once built and are shared through [`Arc`], so the interface and
//! its [`VectorWind`] pairing refer to the same instance.

use crate::config::{GridType, InterfaceConfig, LegendreMode};
use crate::errors::SpharmResult;
use crate::labeled_array::FloatValue;
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Everything a backend needs to set up a transform for a grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub n_lat: usize,
    pub n_lon: usize,
    /// Sphere radius (m)
    pub rsphere: FloatValue,
    pub grid_type: GridType,
    pub legfunc: LegendreMode,
}

impl GridGeometry {
    pub fn new(n_lat: usize, n_lon: usize, config: &InterfaceConfig) -> Self {
        Self {
            n_lat,
            n_lon,
            rsphere: config.rsphere,
            grid_type: config.grid_type,
            legfunc: config.legfunc,
        }
    }

    /// Shape of a single record on this grid
    pub fn grid_shape(&self) -> (usize, usize) {
        (self.n_lat, self.n_lon)
    }
}

/// A constructed spherical-harmonics transform
pub trait SpectralTransform: Debug + Send + Sync {
    /// Geometry the transform was built for
    fn geometry(&self) -> &GridGeometry;
}

/// Builds transform handles
pub trait TransformBackend {
    type Handle: SpectralTransform;

    fn create_transform(&self, geometry: &GridGeometry) -> SpharmResult<Self::Handle>;
}

/// Pair of horizontal vector components prepared for a backend
///
/// Holds the two `(n_lat, n_lon, n_records)` arrays together with the transform
/// handle used for both of them.
#[derive(Debug)]
pub struct VectorWind<H: SpectralTransform> {
    u: Array3<FloatValue>,
    v: Array3<FloatValue>,
    transform: Arc<H>,
}

impl<H: SpectralTransform> Clone for VectorWind<H> {
    fn clone(&self) -> Self {
        Self {
            u: self.u.clone(),
            v: self.v.clone(),
            transform: Arc::clone(&self.transform),
        }
    }
}

impl<H: SpectralTransform> VectorWind<H> {
    pub fn new(u: Array3<FloatValue>, v: Array3<FloatValue>, transform: Arc<H>) -> Self {
        Self { u, v, transform }
    }

    pub fn u(&self) -> &Array3<FloatValue> {
        &self.u
    }

    pub fn v(&self) -> &Array3<FloatValue> {
        &self.v
    }

    /// The shared transform handle
    pub fn transform(&self) -> &Arc<H> {
        &self.transform
    }
}
