//! Backend that builds handles without any transform behind them.

use crate::errors::SpharmResult;
use crate::transform::{GridGeometry, SpectralTransform, TransformBackend};
use serde::{Deserialize, Serialize};

/// A transform handle that only remembers its geometry.
///
/// Useful for dry runs of the preparation pipeline where no backend library is
/// available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullTransform {
    geometry: GridGeometry,
}

impl SpectralTransform for NullTransform {
    fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }
}

/// Backend producing [`NullTransform`] handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

impl TransformBackend for NullBackend {
    type Handle = NullTransform;

    fn create_transform(&self, geometry: &GridGeometry) -> SpharmResult<NullTransform> {
        Ok(NullTransform {
            geometry: geometry.clone(),
        })
    }
}
