use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpharmError {
    #[error("{0}")]
    Configuration(String),
    #[error("Dimension '{axis}' not found. Available dimensions: {available:?}")]
    AxisNotFound {
        axis: String,
        available: Vec<String>,
    },
    #[error("Coordinate '{name}' not found")]
    CoordinateNotFound { name: String },
    #[error("Coordinate '{name}' cannot be removed because dimension '{name}' is still in use")]
    CoordinateInUse { name: String },
    #[error("Shape mismatch in {context}. Expected {expected:?}, got {found:?}")]
    ShapeMismatch {
        context: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
    #[error("Transform backend failed: {0}")]
    Backend(String),
    #[error("Could not parse configuration: {0}")]
    ConfigParse(String),
}

impl From<toml::de::Error> for SpharmError {
    fn from(e: toml::de::Error) -> Self {
        SpharmError::ConfigParse(e.to_string())
    }
}

/// Convenience type for `Result<T, SpharmError>`.
pub type SpharmResult<T> = Result<T, SpharmError>;
