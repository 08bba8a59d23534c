//! Python bindings for the labeled-array bookkeeping
//!
//! Arrays cross the boundary as numpy arrays. Coordinates are passed as a list
//! of `(name, dims, values)` tuples so their order is kept.

use crate::config::{AxisNames, InterfaceConfig, Orientation};
use crate::errors::SpharmError;
use crate::labeled_array::{Coordinate, FloatValue, LabeledArray};
use crate::prep;
use numpy::{
    IntoPyArray, PyArray3, PyArrayDyn, PyReadonlyArray3, PyReadonlyArrayDyn, ToPyArray,
};
use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;

impl From<SpharmError> for PyErr {
    fn from(err: SpharmError) -> PyErr {
        match err {
            SpharmError::AxisNotFound { .. } | SpharmError::CoordinateNotFound { .. } => {
                PyKeyError::new_err(err.to_string())
            }
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

type PyCoordinate<'py> = (String, Vec<String>, PyReadonlyArrayDyn<'py, FloatValue>);

/// Labeled, optionally masked n-dimensional array
#[pyclass(name = "LabeledArray", module = "spharm_bridge.core")]
#[derive(Debug, Clone)]
pub struct PyLabeledArray(pub LabeledArray);

#[pymethods]
impl PyLabeledArray {
    #[new]
    #[pyo3(signature = (data, dims, coords=None, mask=None))]
    fn new(
        data: PyReadonlyArrayDyn<'_, FloatValue>,
        dims: Vec<String>,
        coords: Option<Vec<PyCoordinate<'_>>>,
        mask: Option<PyReadonlyArrayDyn<'_, bool>>,
    ) -> PyResult<Self> {
        let coords = coords
            .unwrap_or_default()
            .into_iter()
            .map(|(name, coord_dims, values)| {
                let coord_dims: Vec<&str> = coord_dims.iter().map(String::as_str).collect();
                Coordinate::new(&name, &coord_dims, values.as_array().to_owned())
            })
            .collect();
        let arr = LabeledArray::new(data.as_array().to_owned(), dims, coords)?;
        let arr = match mask {
            Some(mask) => arr.with_mask(mask.as_array().to_owned())?,
            None => arr,
        };
        Ok(Self(arr))
    }

    #[getter]
    fn data<'py>(&self, py: Python<'py>) -> Bound<'py, PyArrayDyn<FloatValue>> {
        self.0.data().to_pyarray_bound(py)
    }

    #[getter]
    fn dims(&self) -> Vec<String> {
        self.0.dims().to_vec()
    }

    #[getter]
    fn shape(&self) -> Vec<usize> {
        self.0.shape().to_vec()
    }

    /// Mask of invalid entries, `None` when nothing is masked
    #[getter]
    fn mask<'py>(&self, py: Python<'py>) -> Option<Bound<'py, PyArrayDyn<bool>>> {
        self.0.mask().map(|m| m.to_pyarray_bound(py))
    }

    /// Names of the attached coordinates, in order
    #[getter]
    fn coord_names(&self) -> Vec<String> {
        self.0.coords().iter().map(|c| c.name.clone()).collect()
    }

    /// Values of the coordinate called `name`
    fn coord<'py>(&self, py: Python<'py>, name: &str) -> PyResult<Bound<'py, PyArrayDyn<FloatValue>>> {
        Ok(self.0.coord(name)?.values.to_pyarray_bound(py))
    }

    /// Dimensions spanned by the coordinate called `name`
    fn coord_dims(&self, name: &str) -> PyResult<Vec<String>> {
        Ok(self.0.coord(name)?.dims.clone())
    }

    fn __repr__(&self) -> String {
        format!(
            "LabeledArray(dims={:?}, shape={:?}, masked={})",
            self.0.dims(),
            self.0.shape(),
            self.0.mask().is_some()
        )
    }

    fn __eq__(&self, other: &PyLabeledArray) -> bool {
        self.0 == other.0
    }
}

/// Options for building an interface, loadable from TOML
#[pyclass(name = "InterfaceConfig", module = "spharm_bridge.core")]
#[derive(Debug, Clone)]
pub struct PyInterfaceConfig(pub InterfaceConfig);

#[pymethods]
impl PyInterfaceConfig {
    #[new]
    #[pyo3(signature = (lat_name="lat", lon_name="lon", fill_value=0.0, squeeze=false))]
    fn new(lat_name: &str, lon_name: &str, fill_value: FloatValue, squeeze: bool) -> Self {
        Self(InterfaceConfig {
            axes: AxisNames::new(lat_name, lon_name),
            fill_value,
            squeeze,
            ..InterfaceConfig::default()
        })
    }

    #[staticmethod]
    fn from_toml(s: &str) -> PyResult<Self> {
        Ok(Self(InterfaceConfig::from_toml_str(s)?))
    }

    fn to_toml(&self) -> PyResult<String> {
        Ok(self.0.to_toml_string()?)
    }

    #[getter]
    fn lat_name(&self) -> String {
        self.0.axes.lat.clone()
    }

    #[getter]
    fn lon_name(&self) -> String {
        self.0.axes.lon.clone()
    }

    #[getter]
    fn fill_value(&self) -> FloatValue {
        self.0.fill_value
    }

    #[getter]
    fn rsphere(&self) -> FloatValue {
        self.0.rsphere
    }

    #[getter]
    fn grid_type(&self) -> String {
        self.0.grid_type.to_string()
    }

    #[getter]
    fn legfunc(&self) -> String {
        self.0.legfunc.to_string()
    }

    fn __repr__(&self) -> String {
        format!("InterfaceConfig({:?})", self.0)
    }
}

fn parse_orientation(target: &str) -> PyResult<Orientation> {
    match target {
        "north-to-south" => Ok(Orientation::NorthToSouth),
        "south-to-north" => Ok(Orientation::SouthToNorth),
        _ => Err(PyValueError::new_err(format!(
            "Unknown orientation: {}. Expected 'north-to-south' or 'south-to-north'.",
            target
        ))),
    }
}

fn config_or_default(config: Option<&PyInterfaceConfig>) -> InterfaceConfig {
    config.map(|c| c.0.clone()).unwrap_or_default()
}

/// Fill, orient and reshape an array to `(n_lat, n_lon, n_records)`
#[pyfunction]
#[pyo3(name = "prep_for_transform", signature = (arr, config=None))]
fn py_prep_for_transform<'py>(
    py: Python<'py>,
    arr: Option<&PyLabeledArray>,
    config: Option<&PyInterfaceConfig>,
) -> PyResult<Option<Bound<'py, PyArray3<FloatValue>>>> {
    let config = config_or_default(config);
    let plain = prep::prep_for_transform(arr.map(|a| &a.0), &config.axes, config.fill_value)?;
    Ok(plain.map(|p| p.into_pyarray_bound(py)))
}

/// Restore the labels, orientation and mask of `arr_orig` onto backend output
#[pyfunction]
#[pyo3(name = "restore_from_transform", signature = (plain, arr_orig, config=None))]
fn py_restore_from_transform(
    plain: PyReadonlyArray3<'_, FloatValue>,
    arr_orig: &PyLabeledArray,
    config: Option<&PyInterfaceConfig>,
) -> PyResult<PyLabeledArray> {
    let config = config_or_default(config);
    let plain = plain.as_array().to_owned();
    Ok(PyLabeledArray(prep::restore_from_transform(
        &plain,
        &arr_orig.0,
        &config.axes,
    )?))
}

#[pyfunction]
#[pyo3(name = "flip_lat_order", signature = (arr, target="north-to-south", config=None))]
fn py_flip_lat_order(
    arr: &PyLabeledArray,
    target: &str,
    config: Option<&PyInterfaceConfig>,
) -> PyResult<PyLabeledArray> {
    let config = config_or_default(config);
    let target = parse_orientation(target)?;
    Ok(PyLabeledArray(prep::flip_lat_order(
        &arr.0,
        &config.axes,
        target,
    )?))
}

#[pyfunction]
#[pyo3(name = "fill_mask", signature = (arr, fill_value=0.0))]
fn py_fill_mask(arr: &PyLabeledArray, fill_value: FloatValue) -> PyLabeledArray {
    PyLabeledArray(prep::fill_mask(&arr.0, fill_value))
}

#[pyfunction]
#[pyo3(name = "squeeze", signature = (arr, config=None))]
fn py_squeeze(arr: &PyLabeledArray, config: Option<&PyInterfaceConfig>) -> PyLabeledArray {
    let config = config_or_default(config);
    PyLabeledArray(prep::squeeze(&arr.0, &config.axes))
}

#[pymodule]
pub fn core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyLabeledArray>()?;
    m.add_class::<PyInterfaceConfig>()?;
    m.add_function(wrap_pyfunction!(py_prep_for_transform, m)?)?;
    m.add_function(wrap_pyfunction!(py_restore_from_transform, m)?)?;
    m.add_function(wrap_pyfunction!(py_flip_lat_order, m)?)?;
    m.add_function(wrap_pyfunction!(py_fill_mask, m)?)?;
    m.add_function(wrap_pyfunction!(py_squeeze, m)?)?;
    Ok(())
}
