//! Configuration for the spherical-harmonics interface
//!
//! Axis names, grid geometry options and pipeline switches are all carried
//! explicitly in [`InterfaceConfig`] and passed to every operation that needs
//! them. A configuration can be deserialised from TOML:
//!
//! ```rust
//! use spharm_bridge_core::config::{GridType, InterfaceConfig};
//!
//! let config = InterfaceConfig::from_toml_str(
//!     r#"
//!     grid_type = "gaussian"
//!     squeeze = true
//!
//!     [axes]
//!     lat = "latitude"
//!     lon = "longitude"
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.grid_type, GridType::Gaussian);
//! assert_eq!(config.axes.lat, "latitude");
//! assert_eq!(config.axes.time, "time");
//! ```

use crate::errors::{SpharmError, SpharmResult};
use crate::labeled_array::FloatValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean radius of the Earth (m)
pub const EARTH_RADIUS: FloatValue = 6_370_997.0;

/// Names of the dimensions the interface needs to locate by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisNames {
    pub lat: String,
    pub lon: String,
    pub time: String,
}

impl AxisNames {
    pub fn new(lat: &str, lon: &str) -> Self {
        Self {
            lat: lat.to_string(),
            lon: lon.to_string(),
            ..Self::default()
        }
    }

    /// Whether `dim` is one of the horizontal dimensions
    pub fn is_horizontal(&self, dim: &str) -> bool {
        dim == self.lat || dim == self.lon
    }
}

impl Default for AxisNames {
    fn default() -> Self {
        Self {
            lat: "lat".to_string(),
            lon: "lon".to_string(),
            time: "time".to_string(),
        }
    }
}

/// Direction in which latitude values run along the latitude axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Latitude decreases along the axis (90 → -90)
    #[default]
    NorthToSouth,
    /// Latitude increases along the axis (-90 → 90)
    SouthToNorth,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::NorthToSouth => write!(f, "north-to-south"),
            Orientation::SouthToNorth => write!(f, "south-to-north"),
        }
    }
}

/// Latitude grid layout expected by the transform backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridType {
    /// Equally spaced latitudes including both poles
    #[default]
    Regular,
    /// Gaussian latitudes
    Gaussian,
}

impl fmt::Display for GridType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridType::Regular => write!(f, "regular"),
            GridType::Gaussian => write!(f, "gaussian"),
        }
    }
}

/// How the backend evaluates associated Legendre functions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendreMode {
    /// Recomputed on every transform (less memory)
    #[default]
    Computed,
    /// Precomputed once and stored (faster, more memory)
    Stored,
}

impl fmt::Display for LegendreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegendreMode::Computed => write!(f, "computed"),
            LegendreMode::Stored => write!(f, "stored"),
        }
    }
}

/// Options controlling how an interface is constructed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceConfig {
    pub grid_type: GridType,
    /// Sphere radius handed to the transform backend (m)
    pub rsphere: FloatValue,
    pub legfunc: LegendreMode,
    /// Value written into masked positions before the transform
    pub fill_value: FloatValue,
    /// Drop length-1 dimensions and scalar coordinates from the inputs
    pub squeeze: bool,
    pub make_vectorwind: bool,
    pub make_spharmt: bool,
    pub axes: AxisNames,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            grid_type: GridType::default(),
            rsphere: EARTH_RADIUS,
            legfunc: LegendreMode::default(),
            fill_value: 0.0,
            squeeze: false,
            make_vectorwind: false,
            make_spharmt: false,
            axes: AxisNames::default(),
        }
    }
}

impl InterfaceConfig {
    /// Parse a configuration from a TOML document
    ///
    /// Missing keys take their default values.
    pub fn from_toml_str(s: &str) -> SpharmResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> SpharmResult<String> {
        toml::to_string(self).map_err(|e| SpharmError::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = InterfaceConfig::default();
        assert_eq!(config.axes.lat, "lat");
        assert_eq!(config.axes.lon, "lon");
        assert_eq!(config.grid_type, GridType::Regular);
        assert_eq!(config.legfunc, LegendreMode::Computed);
        assert_eq!(config.rsphere, EARTH_RADIUS);
        assert_eq!(config.fill_value, 0.0);
        assert!(!config.squeeze);
        assert!(!config.make_spharmt);
    }

    #[test]
    fn empty_toml_is_default() {
        let config = InterfaceConfig::from_toml_str("").unwrap();
        assert_eq!(config, InterfaceConfig::default());
    }

    #[test]
    fn toml_round_trip() {
        let config = InterfaceConfig {
            axes: AxisNames::new("latitude", "longitude"),
            grid_type: GridType::Gaussian,
            legfunc: LegendreMode::Stored,
            fill_value: -1.0,
            make_spharmt: true,
            ..InterfaceConfig::default()
        };
        let serialised = config.to_toml_string().unwrap();
        let deserialised = InterfaceConfig::from_toml_str(&serialised).unwrap();
        assert_eq!(deserialised, config);
    }

    #[test]
    fn json_uses_lowercase_names() {
        let json = serde_json::to_string(&GridType::Gaussian).unwrap();
        assert_eq!(json, "\"gaussian\"");
        let json = serde_json::to_string(&Orientation::SouthToNorth).unwrap();
        assert_eq!(json, "\"south_to_north\"");
    }

    #[test]
    fn invalid_toml() {
        let result = InterfaceConfig::from_toml_str("grid_type = \"hexagonal\"");
        assert!(matches!(
            result,
            Err(crate::errors::SpharmError::ConfigParse(_))
        ));
    }

    #[test]
    fn horizontal_axes() {
        let axes = AxisNames::default();
        assert!(axes.is_horizontal("lat"));
        assert!(axes.is_horizontal("lon"));
        assert!(!axes.is_horizontal("time"));
    }
}
