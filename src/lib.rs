//! Zipcover - service-area coverage polygons from ZIP code boundaries
//!
//! This library provides the geometry store, the coverage builder and the
//! record I/O used by the `zipcover-build` binary.

pub mod coverage;
pub mod geojson;
pub mod models;
pub mod sources;
pub mod store;

pub use coverage::{build_coverage, Coverage, CoverageBuilder, CoverageConfig, CoverageReport};
pub use models::{CoverageFeature, ServiceArea, ZipCode};
pub use store::{StoreError, ZipStore};
