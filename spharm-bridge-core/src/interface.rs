//! Interface object tying labeled wind components to a transform backend.
//!
//! [`SpharmInterfaceBuilder`] takes either both horizontal vector components
//! or explicit grid counts, prepares the components for the backend and, if
//! requested, builds a single transform handle that is shared with the
//! [`VectorWind`] pairing.

use crate::config::InterfaceConfig;
use crate::errors::{SpharmError, SpharmResult};
use crate::labeled_array::{FloatValue, LabeledArray};
use crate::null_transform::NullBackend;
use crate::prep::{prep_array, restore_from_transform, squeeze};
use crate::transform::{GridGeometry, SpectralTransform, TransformBackend, VectorWind};
use log::{debug, info, warn};
use ndarray::{Array3, ArrayD};
use std::sync::Arc;

/// Build a [`SpharmInterface`].
///
/// Either both wind components (`u` and `v`) or both grid counts must be given.
/// When both are given the counts are ignored in favour of the shape of the data.
pub struct SpharmInterfaceBuilder<B: TransformBackend> {
    backend: B,
    u: Option<LabeledArray>,
    v: Option<LabeledArray>,
    counts: Option<(usize, usize)>,
    config: InterfaceConfig,
}

impl Default for SpharmInterfaceBuilder<NullBackend> {
    fn default() -> Self {
        Self::new(NullBackend)
    }
}

impl<B: TransformBackend> SpharmInterfaceBuilder<B> {
    /// Create a builder that builds transform handles with `backend`
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            u: None,
            v: None,
            counts: None,
            config: InterfaceConfig::default(),
        }
    }

    /// Set both horizontal vector components
    pub fn with_components(&mut self, u: LabeledArray, v: LabeledArray) -> &mut Self {
        self.u = Some(u);
        self.v = Some(v);
        self
    }

    pub fn with_u(&mut self, u: LabeledArray) -> &mut Self {
        self.u = Some(u);
        self
    }

    pub fn with_v(&mut self, v: LabeledArray) -> &mut Self {
        self.v = Some(v);
        self
    }

    /// Set the grid size explicitly, used when no components are given
    pub fn with_counts(&mut self, n_lat: usize, n_lon: usize) -> &mut Self {
        self.counts = Some((n_lat, n_lon));
        self
    }

    pub fn with_config(&mut self, config: InterfaceConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Build the interface
    ///
    /// # Errors
    ///
    /// * [`SpharmError::Configuration`] if neither both components nor both counts
    ///   were supplied
    /// * Any error from preparing the components or from the backend
    pub fn build(&self) -> SpharmResult<SpharmInterface<B::Handle>> {
        let axes = &self.config.axes;
        let (u_orig, v_orig) = if self.config.squeeze {
            (
                self.u.as_ref().map(|u| squeeze(u, axes)),
                self.v.as_ref().map(|v| squeeze(v, axes)),
            )
        } else {
            (self.u.clone(), self.v.clone())
        };
        let mask = u_orig.as_ref().and_then(|u| u.mask().cloned());

        let (prepared, n_lat, n_lon) = match (&u_orig, &v_orig) {
            (Some(u), Some(v)) => {
                if let Some((n_lat, n_lon)) = self.counts {
                    warn!(
                        "Ignoring values of n_lat ({}) and n_lon ({}); instead determining them from u and v.",
                        n_lat, n_lon
                    );
                }
                let u = prep_array(u, axes, self.config.fill_value)?;
                let v = prep_array(v, axes, self.config.fill_value)?;
                let (n_lat, n_lon, _) = u.dim();
                (Some((u, v)), n_lat, n_lon)
            }
            _ => match self.counts {
                Some((n_lat, n_lon)) => (None, n_lat, n_lon),
                None => {
                    return Err(SpharmError::Configuration(
                        "None of u, v, n_lat, or n_lon were specified. Either u and v or n_lat and n_lon must be specified."
                            .to_string(),
                    ))
                }
            },
        };

        let geometry = GridGeometry::new(n_lat, n_lon, &self.config);

        let make_vectorwind = self.config.make_vectorwind && prepared.is_some();
        if self.config.make_vectorwind && !make_vectorwind {
            debug!("Not building a vector wind because u and v were not both supplied");
        }

        let transform = if make_vectorwind || self.config.make_spharmt {
            info!(
                "Building {} spherical harmonics transform for a {}x{} grid",
                geometry.grid_type, n_lat, n_lon
            );
            Some(Arc::new(self.backend.create_transform(&geometry)?))
        } else {
            None
        };

        let vector_wind = match (&prepared, &transform) {
            (Some((u, v)), Some(transform)) if make_vectorwind => {
                if u.dim() != v.dim() {
                    return Err(SpharmError::ShapeMismatch {
                        context: "v component".to_string(),
                        expected: u.shape().to_vec(),
                        found: v.shape().to_vec(),
                    });
                }
                Some(VectorWind::new(u.clone(), v.clone(), Arc::clone(transform)))
            }
            _ => None,
        };

        let (u, v) = match prepared {
            Some((u, v)) => (Some(u), Some(v)),
            None => (None, None),
        };

        Ok(SpharmInterface {
            config: self.config.clone(),
            u_orig,
            v_orig,
            u,
            v,
            geometry,
            mask,
            transform,
            vector_wind,
        })
    }
}

/// Wind components prepared for a spherical-harmonics backend
///
/// Keeps the (optionally squeezed) labeled inputs so that backend output can be
/// turned back into labeled arrays with [`SpharmInterface::to_labeled`].
#[derive(Debug)]
pub struct SpharmInterface<H: SpectralTransform> {
    config: InterfaceConfig,
    u_orig: Option<LabeledArray>,
    v_orig: Option<LabeledArray>,
    u: Option<Array3<FloatValue>>,
    v: Option<Array3<FloatValue>>,
    geometry: GridGeometry,
    mask: Option<ArrayD<bool>>,
    transform: Option<Arc<H>>,
    vector_wind: Option<VectorWind<H>>,
}

impl<H: SpectralTransform> SpharmInterface<H> {
    pub fn config(&self) -> &InterfaceConfig {
        &self.config
    }

    /// Prepared `u` component, `(n_lat, n_lon, n_records)`
    pub fn u(&self) -> Option<&Array3<FloatValue>> {
        self.u.as_ref()
    }

    /// Prepared `v` component, `(n_lat, n_lon, n_records)`
    pub fn v(&self) -> Option<&Array3<FloatValue>> {
        self.v.as_ref()
    }

    /// `u` as supplied (after squeezing, if enabled)
    pub fn u_orig(&self) -> Option<&LabeledArray> {
        self.u_orig.as_ref()
    }

    pub fn v_orig(&self) -> Option<&LabeledArray> {
        self.v_orig.as_ref()
    }

    pub fn n_lat(&self) -> usize {
        self.geometry.n_lat
    }

    pub fn n_lon(&self) -> usize {
        self.geometry.n_lon
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Mask of the `u` component, `None` if it had none
    pub fn mask(&self) -> Option<&ArrayD<bool>> {
        self.mask.as_ref()
    }

    pub fn transform(&self) -> Option<&Arc<H>> {
        self.transform.as_ref()
    }

    pub fn vector_wind(&self) -> Option<&VectorWind<H>> {
        self.vector_wind.as_ref()
    }

    /// Turn backend output back into a labeled array
    ///
    /// The dims, coordinates, orientation and mask are taken from `arr_orig`, or
    /// from the `u` component when `arr_orig` is `None`.
    pub fn to_labeled(
        &self,
        plain: &Array3<FloatValue>,
        arr_orig: Option<&LabeledArray>,
    ) -> SpharmResult<LabeledArray> {
        let reference = arr_orig.or(self.u_orig.as_ref()).ok_or_else(|| {
            SpharmError::Configuration(
                "No reference array to restore labels from; pass one explicitly".to_string(),
            )
        })?;
        restore_from_transform(plain, reference, &self.config.axes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AxisNames, GridType};
    use crate::labeled_array::Coordinate;
    use crate::null_transform::NullTransform;
    use is_close::is_close;
    use ndarray::{Array, IxDyn};
    use std::cell::Cell;

    /// Counts how many handles it has been asked to build
    #[derive(Default)]
    struct CountingBackend {
        built: Cell<usize>,
    }

    impl TransformBackend for CountingBackend {
        type Handle = NullTransform;

        fn create_transform(&self, geometry: &GridGeometry) -> SpharmResult<NullTransform> {
            self.built.set(self.built.get() + 1);
            NullBackend.create_transform(geometry)
        }
    }

    struct FailingBackend;

    impl TransformBackend for FailingBackend {
        type Handle = NullTransform;

        fn create_transform(&self, _geometry: &GridGeometry) -> SpharmResult<NullTransform> {
            Err(SpharmError::Backend("no library available".to_string()))
        }
    }

    /// (time=2, lat=3, lon=4) component with south-to-north latitudes
    fn component(offset: FloatValue) -> LabeledArray {
        let data = Array::range(offset, offset + 24.0, 1.0)
            .into_shape(IxDyn(&[2, 3, 4]))
            .unwrap();
        LabeledArray::new(
            data,
            vec!["time".to_string(), "lat".to_string(), "lon".to_string()],
            vec![
                Coordinate::index("time", vec![0.0, 1.0]),
                Coordinate::index("lat", vec![-60.0, 0.0, 60.0]),
                Coordinate::index("lon", vec![0.0, 90.0, 180.0, 270.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn requires_components_or_counts() {
        let result = SpharmInterfaceBuilder::default().build();
        assert!(matches!(result, Err(SpharmError::Configuration(_))));
    }

    #[test]
    fn single_component_is_not_enough() {
        let result = SpharmInterfaceBuilder::default()
            .with_u(component(0.0))
            .build();
        assert!(matches!(result, Err(SpharmError::Configuration(_))));
    }

    #[test]
    fn counts_only() {
        let interface = SpharmInterfaceBuilder::default()
            .with_counts(73, 144)
            .build()
            .unwrap();
        assert_eq!(interface.n_lat(), 73);
        assert_eq!(interface.n_lon(), 144);
        assert!(interface.u().is_none());
        assert!(interface.transform().is_none());
        assert!(interface.mask().is_none());
    }

    #[test]
    fn data_counts_win_over_explicit_counts() {
        let interface = SpharmInterfaceBuilder::default()
            .with_components(component(0.0), component(100.0))
            .with_counts(10, 20)
            .build()
            .unwrap();
        assert_eq!(interface.n_lat(), 3);
        assert_eq!(interface.n_lon(), 4);
        assert_eq!(interface.u().unwrap().shape(), &[3, 4, 2]);
        assert_eq!(interface.v().unwrap().shape(), &[3, 4, 2]);
        // North-most latitude of the first time step comes first
        assert_eq!(interface.u().unwrap()[[0, 0, 0]], 8.0);
        assert_eq!(interface.v().unwrap()[[0, 0, 1]], 120.0);
    }

    #[test]
    fn records_mask_of_u() {
        let mut mask = ArrayD::from_elem(IxDyn(&[2, 3, 4]), false);
        mask[IxDyn(&[1, 2, 3])] = true;
        let u = component(0.0).with_mask(mask.clone()).unwrap();

        let interface = SpharmInterfaceBuilder::default()
            .with_components(u, component(0.0))
            .build()
            .unwrap();
        assert_eq!(interface.mask(), Some(&mask));
        // Masked value filled with zero, at the north-most latitude of the last record
        assert_eq!(interface.u().unwrap()[[0, 3, 1]], 0.0);
    }

    #[test]
    fn squeezes_inputs() {
        let data = Array::range(0.0, 12.0, 1.0)
            .into_shape(IxDyn(&[1, 3, 4]))
            .unwrap();
        let u = LabeledArray::new(
            data,
            vec!["time".to_string(), "lat".to_string(), "lon".to_string()],
            vec![
                Coordinate::index("time", vec![0.0]),
                Coordinate::index("lat", vec![-60.0, 0.0, 60.0]),
                Coordinate::index("lon", vec![0.0, 90.0, 180.0, 270.0]),
            ],
        )
        .unwrap();

        let interface = SpharmInterfaceBuilder::default()
            .with_components(u.clone(), u)
            .with_config(InterfaceConfig {
                squeeze: true,
                ..InterfaceConfig::default()
            })
            .build()
            .unwrap();

        let u_orig = interface.u_orig().unwrap();
        assert_eq!(u_orig.dims(), &["lat".to_string(), "lon".to_string()]);
        assert!(u_orig.coord("time").is_err());
        assert_eq!(interface.u().unwrap().shape(), &[3, 4, 1]);
    }

    #[test]
    fn builds_transform_from_counts() {
        let config = InterfaceConfig {
            make_spharmt: true,
            grid_type: GridType::Gaussian,
            rsphere: 1.0,
            ..InterfaceConfig::default()
        };
        let interface = SpharmInterfaceBuilder::default()
            .with_counts(64, 128)
            .with_config(config)
            .build()
            .unwrap();

        let geometry = interface.transform().unwrap().geometry();
        assert_eq!(geometry.grid_shape(), (64, 128));
        assert_eq!(geometry.grid_type, GridType::Gaussian);
        assert!(is_close!(geometry.rsphere, 1.0));
    }

    #[test]
    fn vector_wind_shares_single_transform() {
        let backend = CountingBackend::default();
        let mut builder = SpharmInterfaceBuilder::new(backend);
        builder
            .with_components(component(0.0), component(100.0))
            .with_config(InterfaceConfig {
                make_vectorwind: true,
                make_spharmt: true,
                ..InterfaceConfig::default()
            });
        let interface = builder.build().unwrap();

        assert_eq!(builder.backend.built.get(), 1);
        let vector_wind = interface.vector_wind().unwrap();
        assert!(Arc::ptr_eq(
            vector_wind.transform(),
            interface.transform().unwrap()
        ));
        assert_eq!(vector_wind.u(), interface.u().unwrap());
        assert_eq!(vector_wind.v(), interface.v().unwrap());
    }

    #[test]
    fn vector_wind_needs_components() {
        let backend = CountingBackend::default();
        let mut builder = SpharmInterfaceBuilder::new(backend);
        builder.with_counts(3, 4).with_config(InterfaceConfig {
            make_vectorwind: true,
            ..InterfaceConfig::default()
        });
        let interface = builder.build().unwrap();

        assert!(interface.vector_wind().is_none());
        assert!(interface.transform().is_none());
        assert_eq!(builder.backend.built.get(), 0);
    }

    #[test]
    fn backend_errors_propagate() {
        let result = SpharmInterfaceBuilder::new(FailingBackend)
            .with_counts(3, 4)
            .with_config(InterfaceConfig {
                make_spharmt: true,
                ..InterfaceConfig::default()
            })
            .build();
        assert_eq!(
            result.unwrap_err(),
            SpharmError::Backend("no library available".to_string())
        );
    }

    #[test]
    fn to_labeled_defaults_to_u() {
        let u = component(0.0);
        let interface = SpharmInterfaceBuilder::default()
            .with_components(u.clone(), component(50.0))
            .build()
            .unwrap();

        let restored = interface.to_labeled(interface.u().unwrap(), None).unwrap();
        assert_eq!(restored, u);

        let v = interface.v_orig().unwrap();
        let restored_v = interface
            .to_labeled(interface.v().unwrap(), Some(v))
            .unwrap();
        assert_eq!(&restored_v, v);
    }

    #[test]
    fn to_labeled_without_reference() {
        let interface = SpharmInterfaceBuilder::default()
            .with_counts(3, 4)
            .build()
            .unwrap();
        let result = interface.to_labeled(&Array3::zeros((3, 4, 1)), None);
        assert!(matches!(result, Err(SpharmError::Configuration(_))));
    }

    #[test]
    fn custom_axis_names() {
        let data = Array::range(0.0, 6.0, 1.0)
            .into_shape(IxDyn(&[3, 2]))
            .unwrap();
        let u = LabeledArray::new(
            data,
            vec!["longitude".to_string(), "latitude".to_string()],
            vec![Coordinate::index("latitude", vec![45.0, -45.0])],
        )
        .unwrap();
        let config = InterfaceConfig {
            axes: AxisNames::new("latitude", "longitude"),
            ..InterfaceConfig::default()
        };

        let interface = SpharmInterfaceBuilder::default()
            .with_components(u.clone(), u.clone())
            .with_config(config)
            .build()
            .unwrap();
        assert_eq!(interface.n_lat(), 2);
        assert_eq!(interface.n_lon(), 3);
        assert_eq!(interface.u().unwrap()[[1, 2, 0]], 5.0);
    }
}
