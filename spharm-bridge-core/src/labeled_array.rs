//! Labeled, optionally masked n-dimensional arrays
//!
//! A [`LabeledArray`] couples an `ndarray::ArrayD` with a name for every
//! dimension, an ordered set of [`Coordinate`]s and an optional boolean mask
//! (`true` marks an invalid entry). It provides the handful of primitives the
//! spherical-harmonics pipeline needs: locating dimensions by name, dropping
//! length-1 dimensions, dropping coordinates, reversing a dimension and
//! replacing the data while keeping the labels.
//!
//! # Examples
//!
//! ```rust
//! use ndarray::array;
//! use spharm_bridge_core::labeled_array::{Coordinate, LabeledArray};
//!
//! let data = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].into_dyn();
//! let arr = LabeledArray::new(
//!     data,
//!     vec!["lat".to_string(), "lon".to_string()],
//!     vec![
//!         Coordinate::index("lat", vec![-45.0, 45.0]),
//!         Coordinate::index("lon", vec![0.0, 120.0, 240.0]),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(arr.shape(), &[2, 3]);
//! assert_eq!(arr.axis_num("lon").unwrap(), 1);
//! assert!(arr.mask().is_none());
//! ```

use crate::errors::{SpharmError, SpharmResult};
use ndarray::{Array1, ArrayD, Axis, IxDyn};
use serde::Serialize;
use std::collections::HashSet;

/// Floating point type used for array values and coordinates
pub type FloatValue = f64;

/// Coordinate values attached to zero or more dimensions of a [`LabeledArray`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coordinate {
    pub name: String,
    /// Dimensions spanned by the coordinate, empty for a scalar coordinate
    pub dims: Vec<String>,
    pub values: ArrayD<FloatValue>,
}

impl Coordinate {
    pub fn new(name: &str, dims: &[&str], values: ArrayD<FloatValue>) -> Self {
        Self {
            name: name.to_string(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            values,
        }
    }

    /// A one-dimensional coordinate that labels the dimension of the same name
    pub fn index(name: &str, values: Vec<FloatValue>) -> Self {
        Self::new(name, &[name], Array1::from(values).into_dyn())
    }

    /// A zero-dimensional coordinate
    pub fn scalar(name: &str, value: FloatValue) -> Self {
        Self::new(name, &[], ArrayD::from_elem(IxDyn(&[]), value))
    }

    /// Number of values held by the coordinate
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Whether this coordinate labels the dimension that shares its name
    pub fn is_index(&self) -> bool {
        self.dims.len() == 1 && self.dims[0] == self.name
    }

    pub fn spans(&self, dim: &str) -> bool {
        self.dims.iter().any(|d| d == dim)
    }

    fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }
}

/// An n-dimensional array with named dimensions, coordinates and an optional mask
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledArray {
    data: ArrayD<FloatValue>,
    dims: Vec<String>,
    coords: Vec<Coordinate>,
    mask: Option<ArrayD<bool>>,
}

impl LabeledArray {
    /// Create an unmasked labeled array
    ///
    /// # Errors
    ///
    /// * [`SpharmError::InvalidDimensions`] if the number of dims does not match the
    ///   rank of `data`, or a dim or coordinate name is repeated
    /// * [`SpharmError::AxisNotFound`] if a coordinate spans an unknown dim
    /// * [`SpharmError::ShapeMismatch`] if a coordinate's shape does not match the
    ///   lengths of the dims it spans
    pub fn new(
        data: ArrayD<FloatValue>,
        dims: Vec<String>,
        coords: Vec<Coordinate>,
    ) -> SpharmResult<Self> {
        if dims.len() != data.ndim() {
            return Err(SpharmError::InvalidDimensions(format!(
                "{} dimension names given for an array of rank {}",
                dims.len(),
                data.ndim()
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = dims.iter().find(|d| !seen.insert(d.as_str())) {
            return Err(SpharmError::InvalidDimensions(format!(
                "dimension '{}' appears more than once",
                dup
            )));
        }

        let arr = Self {
            data,
            dims,
            coords: vec![],
            mask: None,
        };
        coords
            .into_iter()
            .try_fold(arr, |arr, coord| arr.with_coord(coord))
    }

    /// Attach a mask with the same shape as the data
    pub fn with_mask(mut self, mask: ArrayD<bool>) -> SpharmResult<Self> {
        if mask.shape() != self.data.shape() {
            return Err(SpharmError::ShapeMismatch {
                context: "mask".to_string(),
                expected: self.data.shape().to_vec(),
                found: mask.shape().to_vec(),
            });
        }
        self.mask = Some(mask);
        Ok(self)
    }

    /// Add a coordinate, replacing nothing
    pub fn with_coord(mut self, coord: Coordinate) -> SpharmResult<Self> {
        if self.coords.iter().any(|c| c.name == coord.name) {
            return Err(SpharmError::InvalidDimensions(format!(
                "coordinate '{}' appears more than once",
                coord.name
            )));
        }
        if coord.values.ndim() != coord.dims.len() {
            return Err(SpharmError::InvalidDimensions(format!(
                "coordinate '{}' has rank {} but spans {} dimensions",
                coord.name,
                coord.values.ndim(),
                coord.dims.len()
            )));
        }
        let expected = coord
            .dims
            .iter()
            .map(|d| self.dim_len(d))
            .collect::<SpharmResult<Vec<_>>>()?;
        if coord.values.shape() != expected.as_slice() {
            return Err(SpharmError::ShapeMismatch {
                context: format!("coordinate '{}'", coord.name),
                expected,
                found: coord.values.shape().to_vec(),
            });
        }
        self.coords.push(coord);
        Ok(self)
    }

    pub fn data(&self) -> &ArrayD<FloatValue> {
        &self.data
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn coords(&self) -> &[Coordinate] {
        &self.coords
    }

    /// The mask, `None` when no entry is masked out
    pub fn mask(&self) -> Option<&ArrayD<bool>> {
        self.mask.as_ref()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Position of the named dimension
    pub fn axis_num(&self, dim: &str) -> SpharmResult<usize> {
        self.dims
            .iter()
            .position(|d| d == dim)
            .ok_or_else(|| SpharmError::AxisNotFound {
                axis: dim.to_string(),
                available: self.dims.clone(),
            })
    }

    pub fn dim_len(&self, dim: &str) -> SpharmResult<usize> {
        Ok(self.data.len_of(Axis(self.axis_num(dim)?)))
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.dims.iter().any(|d| d == dim)
    }

    pub fn coord(&self, name: &str) -> SpharmResult<&Coordinate> {
        self.coords
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SpharmError::CoordinateNotFound {
                name: name.to_string(),
            })
    }

    /// Whether `mask` is set and at `index` marks an invalid entry
    pub fn is_masked(&self, index: &[usize]) -> bool {
        self.mask
            .as_ref()
            .and_then(|m| m.get(IxDyn(index)).copied())
            .unwrap_or(false)
    }

    /// Replace the values, keeping dims, coordinates and mask
    pub fn with_data(&self, data: ArrayD<FloatValue>) -> SpharmResult<Self> {
        if data.shape() != self.data.shape() {
            return Err(SpharmError::ShapeMismatch {
                context: "replacement data".to_string(),
                expected: self.data.shape().to_vec(),
                found: data.shape().to_vec(),
            });
        }
        Ok(Self {
            data,
            dims: self.dims.clone(),
            coords: self.coords.clone(),
            mask: self.mask.clone(),
        })
    }

    /// Copy with masked positions replaced by `fill_value` and the mask removed
    pub fn filled(&self, fill_value: FloatValue) -> Self {
        let data = match &self.mask {
            Some(mask) => {
                let mut data = self.data.clone();
                data.zip_mut_with(mask, |v, &m| {
                    if m {
                        *v = fill_value
                    }
                });
                data
            }
            None => self.data.clone(),
        };
        Self {
            data,
            dims: self.dims.clone(),
            coords: self.coords.clone(),
            mask: None,
        }
    }

    /// Drop every length-1 dimension for which `keep` returns false
    ///
    /// Data, mask and any coordinate spanning a dropped dimension are indexed at 0
    /// along it, so coordinates of a dropped dimension become scalar coordinates.
    pub fn squeeze_dims<F>(&self, keep: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        let mut out = self.clone();
        let squeezable: Vec<usize> = (0..self.ndim())
            .filter(|&i| self.data.len_of(Axis(i)) == 1 && !keep(&self.dims[i]))
            .collect();

        // Highest axis first so the remaining indices stay valid
        for &i in squeezable.iter().rev() {
            let dim = out.dims.remove(i);
            out.data = out.data.index_axis_move(Axis(i), 0);
            out.mask = out.mask.map(|m| m.index_axis_move(Axis(i), 0));
            for coord in out.coords.iter_mut() {
                if let Some(ax) = coord.axis_of(&dim) {
                    coord.values = coord.values.index_axis(Axis(ax), 0).to_owned();
                    coord.dims.remove(ax);
                }
            }
        }
        out
    }

    /// Remove a coordinate
    ///
    /// # Errors
    ///
    /// * [`SpharmError::CoordinateNotFound`] if there is no such coordinate
    /// * [`SpharmError::CoordinateInUse`] if the array (and so possibly other
    ///   coordinates) still has a dimension of that name
    pub fn drop_coord(&self, name: &str) -> SpharmResult<Self> {
        let idx = self
            .coords
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| SpharmError::CoordinateNotFound {
                name: name.to_string(),
            })?;

        if self.has_dim(name) {
            return Err(SpharmError::CoordinateInUse {
                name: name.to_string(),
            });
        }

        let mut out = self.clone();
        out.coords.remove(idx);
        Ok(out)
    }

    /// Reverse the order of a dimension in the data, the mask and every coordinate
    /// spanning it
    pub fn reverse_dim(&self, dim: &str) -> SpharmResult<Self> {
        let axis = Axis(self.axis_num(dim)?);
        let mut out = self.clone();
        out.data.invert_axis(axis);
        if let Some(mask) = out.mask.as_mut() {
            mask.invert_axis(axis);
        }
        for coord in out.coords.iter_mut() {
            if let Some(ax) = coord.axis_of(dim) {
                coord.values.invert_axis(Axis(ax));
            }
        }
        Ok(out)
    }
}
