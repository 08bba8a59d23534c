//! Conversion between labeled arrays and the spherical-harmonics layout
//!
//! Spherical-harmonics backends operate on plain arrays shaped
//! `(n_lat, n_lon, n_records)` with latitude running north to south and no
//! masked values. [`prep_for_transform`] produces such an array from a
//! [`LabeledArray`] with arbitrary dimension order by
//!
//! 1. filling masked entries ([`fill_mask`]),
//! 2. flipping latitude to north-to-south if needed ([`flip_lat_order`]),
//! 3. moving latitude and longitude to the front and collapsing every other
//!    dimension into one ([`format_axes_for_spharm`]).
//!
//! [`restore_from_transform`] undoes the layout and orientation steps in reverse
//! order and reattaches the labels and mask of a reference array.
//!
//! # Examples
//!
//! ```rust
//! use ndarray::{array, Array3};
//! use spharm_bridge_core::config::AxisNames;
//! use spharm_bridge_core::labeled_array::{Coordinate, LabeledArray};
//! use spharm_bridge_core::prep::{prep_for_transform, restore_from_transform};
//!
//! let axes = AxisNames::default();
//! let arr = LabeledArray::new(
//!     array![[1.0, 2.0], [3.0, 4.0]].into_dyn(),
//!     vec!["lat".to_string(), "lon".to_string()],
//!     vec![
//!         Coordinate::index("lat", vec![-45.0, 45.0]),
//!         Coordinate::index("lon", vec![0.0, 180.0]),
//!     ],
//! )
//! .unwrap();
//!
//! let plain: Array3<f64> = prep_for_transform(Some(&arr), &axes, 0.0).unwrap().unwrap();
//! // Latitude now runs north to south
//! assert_eq!(plain[[0, 0, 0]], 3.0);
//!
//! let restored = restore_from_transform(&plain, &arr, &axes).unwrap();
//! assert_eq!(restored, arr);
//! ```

use crate::config::{AxisNames, Orientation};
use crate::errors::{SpharmError, SpharmResult};
use crate::labeled_array::{FloatValue, LabeledArray};
use log::debug;
use ndarray::{Array1, Array3, ArrayD, Axis, IxDyn};

/// Sources of latitude values for orientation detection
///
/// Implemented for labeled arrays (which are searched for the latitude
/// coordinate) and for bare sequences of latitudes.
pub trait LatitudeValues {
    fn latitude_values(&self, lat_name: &str) -> SpharmResult<Vec<FloatValue>>;
}

impl LatitudeValues for LabeledArray {
    fn latitude_values(&self, lat_name: &str) -> SpharmResult<Vec<FloatValue>> {
        Ok(self.coord(lat_name)?.values.iter().copied().collect())
    }
}

impl LatitudeValues for [FloatValue] {
    fn latitude_values(&self, _lat_name: &str) -> SpharmResult<Vec<FloatValue>> {
        Ok(self.to_vec())
    }
}

impl LatitudeValues for Vec<FloatValue> {
    fn latitude_values(&self, _lat_name: &str) -> SpharmResult<Vec<FloatValue>> {
        Ok(self.clone())
    }
}

impl LatitudeValues for Array1<FloatValue> {
    fn latitude_values(&self, _lat_name: &str) -> SpharmResult<Vec<FloatValue>> {
        Ok(self.to_vec())
    }
}

/// Remove length-1 dimensions and the coordinates left with at most one value
///
/// The latitude and longitude dimensions are always kept. Coordinates that
/// still label a dimension of the array are kept as well.
pub fn squeeze(arr: &LabeledArray, axes: &AxisNames) -> LabeledArray {
    let mut squeezed = arr.squeeze_dims(|dim| axes.is_horizontal(dim));

    let degenerate: Vec<String> = squeezed
        .coords()
        .iter()
        .filter(|c| c.size() <= 1)
        .map(|c| c.name.clone())
        .collect();

    for name in degenerate {
        match squeezed.drop_coord(&name) {
            Ok(dropped) => squeezed = dropped,
            Err(e) => debug!("Keeping coordinate '{}': {}", name, e),
        }
    }
    squeezed
}

/// Replace masked entries with `fill_value`
///
/// Unmasked entries are copied unchanged and the result carries no mask.
pub fn fill_mask(arr: &LabeledArray, fill_value: FloatValue) -> LabeledArray {
    arr.filled(fill_value)
}

/// Whether latitudes must be reversed to reach the `target` orientation
///
/// Latitudes run south to north when every successive difference is positive.
/// A sequence with fewer than two values counts as south to north.
pub fn flag_flip_lat<L>(source: &L, lat_name: &str, target: Orientation) -> SpharmResult<bool>
where
    L: LatitudeValues + ?Sized,
{
    let lat = source.latitude_values(lat_name)?;
    let south_to_north = lat.windows(2).all(|w| w[1] - w[0] > 0.0);

    Ok(match target {
        Orientation::NorthToSouth => south_to_north,
        Orientation::SouthToNorth => !south_to_north,
    })
}

/// Reverse the latitude dimension if it does not already run in `target` order
///
/// Always returns a new array, also when nothing needed flipping.
pub fn flip_lat_order(
    arr: &LabeledArray,
    axes: &AxisNames,
    target: Orientation,
) -> SpharmResult<LabeledArray> {
    if flag_flip_lat(arr, &axes.lat, target)? {
        debug!(
            "Flipping latitude order of array with dims {:?} to {}",
            arr.dims(),
            target
        );
        return arr.reverse_dim(&axes.lat);
    }
    Ok(arr.clone())
}

/// Axis order that puts latitude first, longitude second and keeps the rest in place
fn spharm_axis_order(arr: &LabeledArray, axes: &AxisNames) -> SpharmResult<Vec<usize>> {
    if axes.lat == axes.lon {
        return Err(SpharmError::Configuration(format!(
            "Latitude and longitude must be different dimensions, both are '{}'",
            axes.lat
        )));
    }
    let ax_lat = arr.axis_num(&axes.lat)?;
    let ax_lon = arr.axis_num(&axes.lon)?;

    let mut order = vec![ax_lat, ax_lon];
    order.extend((0..arr.ndim()).filter(|&i| i != ax_lat && i != ax_lon));
    Ok(order)
}

/// Lay out an array as `(n_lat, n_lon, n_other)`
///
/// `n_other` is the product of the lengths of all non-horizontal dimensions, in
/// their original relative order (1 if there are none). Values are not altered.
pub fn format_axes_for_spharm(
    arr: &LabeledArray,
    axes: &AxisNames,
) -> SpharmResult<Array3<FloatValue>> {
    let order = spharm_axis_order(arr, axes)?;
    let shape = arr.shape();
    let n_lat = shape[order[0]];
    let n_lon = shape[order[1]];
    let n_other: usize = order[2..].iter().map(|&i| shape[i]).product();

    let permuted = arr.data().view().permuted_axes(order);
    Array3::from_shape_vec((n_lat, n_lon, n_other), permuted.iter().copied().collect()).map_err(
        |_| SpharmError::ShapeMismatch {
            context: "spharm layout".to_string(),
            expected: vec![n_lat, n_lon, n_other],
            found: shape.to_vec(),
        },
    )
}

/// Prepare an array for a spherical-harmonics backend
///
/// Fills masked values, flips latitude to north-to-south and lays the result out
/// as `(n_lat, n_lon, n_other)`.
pub fn prep_array(
    arr: &LabeledArray,
    axes: &AxisNames,
    fill_value: FloatValue,
) -> SpharmResult<Array3<FloatValue>> {
    let filled = fill_mask(arr, fill_value);
    let flipped = flip_lat_order(&filled, axes, Orientation::NorthToSouth)?;
    format_axes_for_spharm(&flipped, axes)
}

/// [`prep_array`] for optional inputs
///
/// `None` passes straight through, e.g. for an absent second wind component.
pub fn prep_for_transform(
    arr: Option<&LabeledArray>,
    axes: &AxisNames,
    fill_value: FloatValue,
) -> SpharmResult<Option<Array3<FloatValue>>> {
    arr.map(|arr| prep_array(arr, axes, fill_value)).transpose()
}

/// Rebuild a labeled array from backend output
///
/// `plain` must be shaped like the output of [`prep_for_transform`] for
/// `arr_orig`. The collapsed dimensions are expanded, the original axis order
/// and latitude orientation restored, and `arr_orig`'s mask, dims and
/// coordinates attached.
pub fn restore_from_transform(
    plain: &Array3<FloatValue>,
    arr_orig: &LabeledArray,
    axes: &AxisNames,
) -> SpharmResult<LabeledArray> {
    let order = spharm_axis_order(arr_orig, axes)?;
    let expanded_shape: Vec<usize> = order.iter().map(|&i| arr_orig.shape()[i]).collect();
    let n_other: usize = expanded_shape[2..].iter().product();

    let expected = vec![expanded_shape[0], expanded_shape[1], n_other];
    if plain.shape() != expected.as_slice() {
        return Err(SpharmError::ShapeMismatch {
            context: "spharm output".to_string(),
            expected,
            found: plain.shape().to_vec(),
        });
    }

    // Re-expand the collapsed trailing axis
    let expanded = ArrayD::from_shape_vec(IxDyn(&expanded_shape), plain.iter().copied().collect())
        .map_err(|_| SpharmError::ShapeMismatch {
            context: "spharm output".to_string(),
            expected: expanded_shape.clone(),
            found: plain.shape().to_vec(),
        })?;

    // Undo the move of latitude and longitude to the front
    let mut inverse = vec![0; order.len()];
    for (i, &ax) in order.iter().enumerate() {
        inverse[ax] = i;
    }
    let mut restored = expanded.permuted_axes(inverse);

    if flag_flip_lat(arr_orig, &axes.lat, Orientation::NorthToSouth)? {
        restored.invert_axis(Axis(order[0]));
    }

    arr_orig.with_data(restored.as_standard_layout().into_owned())
}
