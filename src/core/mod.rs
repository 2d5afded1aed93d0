//! Core building blocks: pipeline configuration, region tiles, product naming
//! rules, footprint/envelope geometry and reflectance normalization. These are
//! internal primitives consumed by the high-level `api` module.
pub mod config;
pub mod geometry;
pub mod naming;
pub mod normalize;
pub mod tiles;
