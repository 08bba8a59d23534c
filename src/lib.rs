//! Python extension for `spharm-bridge`
//!
//! All logic lives in `spharm-bridge-core`, re-exported here so Rust users can
//! depend on a single crate.

pub use spharm_bridge_core::*;

#[cfg(feature = "python")]
mod python;
