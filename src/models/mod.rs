//! Core data models for coverage building.

pub mod service_area;
pub mod zip;

pub use service_area::{CoverageFeature, ServiceArea};
pub use zip::ZipCode;
