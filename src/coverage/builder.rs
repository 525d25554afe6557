use geo::{MultiPolygon, Polygon};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::geometry::{
    close, normalize_parts, residue_area, simplify_multipolygon, MIN_RING_AREA,
};
use super::hull::concave_hull_wrap;
use super::{meters_to_degrees, CoverageConfig, Smoothing};
use crate::models::ZipCode;
use crate::store::ZipStore;

/// Diagnostic counts for one coverage computation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageReport {
    /// Identifiers supplied, duplicates included
    pub requested: usize,
    /// Distinct identifiers after canonicalization
    pub unique: usize,
    /// Distinct zipcodes found in the store
    pub resolved: usize,
    /// Distinct identifiers that were malformed or absent from the store
    pub unknown: Vec<String>,
    /// Parts in the final geometry
    pub parts: usize,
}

impl CoverageReport {
    pub fn discarded(&self) -> usize {
        self.unknown.len()
    }
}

/// Coverage geometry plus the diagnostics gathered while building it
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub geometry: MultiPolygon<f64>,
    pub report: CoverageReport,
}

/// Builds coverage polygons against a shared, read-only store.
///
/// Holds no mutable state, so one builder can serve any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct CoverageBuilder<'a> {
    store: &'a ZipStore,
    config: CoverageConfig,
}

impl<'a> CoverageBuilder<'a> {
    pub fn new(store: &'a ZipStore, config: CoverageConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &CoverageConfig {
        &self.config
    }

    /// Build the coverage polygon for a list of zipcode identifiers.
    ///
    /// Duplicates are ignored and unknown identifiers are dropped (and
    /// reported). An input with nothing resolvable yields an empty
    /// multi-polygon.
    pub fn build<I, S>(&self, zipcodes: I) -> Coverage
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = CoverageReport::default();

        // Ordered so repeated builds union in the same order
        let mut members: BTreeMap<ZipCode, &MultiPolygon<f64>> = BTreeMap::new();
        let mut unknown = BTreeSet::new();

        for raw in zipcodes {
            report.requested += 1;
            let raw = raw.as_ref();
            let resolved = ZipCode::parse(raw)
                .and_then(|zip| self.store.get(&zip).map(|geometry| (zip, geometry)));

            match resolved {
                Some((zip, geometry)) => {
                    members.insert(zip, geometry);
                }
                None => {
                    let key = ZipCode::parse(raw)
                        .map(|zip| zip.to_string())
                        .unwrap_or_else(|| raw.trim().to_string());
                    unknown.insert(key);
                }
            }
        }

        report.resolved = members.len();
        report.unique = members.len() + unknown.len();
        report.unknown = unknown.into_iter().collect();

        if members.is_empty() {
            debug!(
                "{} zipcodes, none resolved, empty coverage",
                report.requested
            );
            return Coverage {
                geometry: MultiPolygon::new(Vec::new()),
                report,
            };
        }

        let polygons: Vec<Polygon<f64>> = members
            .values()
            .flat_map(|geometry| geometry.iter().cloned())
            .collect();

        let (merged, min_area) = match self.config.mode {
            Smoothing::Close => {
                let distance = meters_to_degrees(self.config.buffer_distance_m);
                (close(&polygons, distance), residue_area(distance))
            }
            Smoothing::ConcaveHull { concavity } => {
                (concave_hull_wrap(&polygons, concavity), MIN_RING_AREA)
            }
        };

        let geometry = simplify_multipolygon(
            &normalize_parts(merged, min_area),
            meters_to_degrees(self.config.simplify_tolerance_m),
            self.config.preserve_topology,
        );
        report.parts = geometry.0.len();

        debug!(
            "{} zipcodes, {} unique, {} resolved, {} discarded, {} polygons",
            report.requested,
            report.unique,
            report.resolved,
            report.discarded(),
            report.parts
        );

        Coverage { geometry, report }
    }
}

/// Build a coverage multi-polygon for a set of zipcodes
pub fn build_coverage<I, S>(
    store: &ZipStore,
    zipcodes: I,
    config: &CoverageConfig,
) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    CoverageBuilder::new(store, *config).build(zipcodes).geometry
}
