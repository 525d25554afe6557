//! Coverage polygon builder.
//!
//! Turns a set of zipcodes into one smoothed, simplified multi-polygon:
//! every member boundary is expanded, the expanded shapes are unioned, and
//! the union is contracted back by the same distance. Narrow gaps and seams
//! between neighbouring zipcodes close while the outer silhouette stays put.

mod builder;
mod config;
pub mod geometry;
mod hull;

pub use builder::{build_coverage, Coverage, CoverageBuilder, CoverageReport};
pub use config::{ConfigError, CoverageConfig, Smoothing};

/// Approximate meters per degree of latitude, used for every meter to degree
/// conversion. Not a geodesic calculation.
pub const METERS_PER_DEGREE: f64 = 111_139.0;

/// Convert a distance in meters to the degree unit of the stored geometries
pub fn meters_to_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meters_to_degrees() {
        assert_eq!(meters_to_degrees(0.0), 0.0);
        assert!((meters_to_degrees(111_139.0) - 1.0).abs() < 1e-12);
        assert!((meters_to_degrees(1000.0) - 0.008_997_742).abs() < 1e-9);
    }
}
