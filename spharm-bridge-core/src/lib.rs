pub mod config;
pub mod interface;
pub mod labeled_array;
pub mod null_transform;
pub mod prep;
#[cfg(feature = "python")]
pub mod python;
pub mod transform;

pub mod errors;
