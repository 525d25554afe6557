//! Geometry store: per-zipcode boundary polygons keyed by canonical ZIP.
//!
//! The store is loaded once at startup and then shared read-only by every
//! coverage computation.

mod load;

pub use load::{StoreError, DEFAULT_ZIP_FIELD};

use geo::MultiPolygon;
use hashbrown::HashMap;
use rayon::prelude::*;
use tracing::info;

use crate::coverage::geometry::simplify_multipolygon;
use crate::coverage::meters_to_degrees;
use crate::models::ZipCode;

/// Read-only lookup table from zipcode to boundary geometry
#[derive(Debug, Clone, Default)]
pub struct ZipStore {
    boundaries: HashMap<ZipCode, MultiPolygon<f64>>,
}

impl ZipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a boundary. A zipcode seen twice accumulates both geometries.
    pub fn insert(&mut self, zip: ZipCode, geometry: MultiPolygon<f64>) {
        self.boundaries
            .entry(zip)
            .or_insert_with(|| MultiPolygon::new(Vec::new()))
            .0
            .extend(geometry);
    }

    /// Look up a boundary by raw identifier
    pub fn lookup(&self, identifier: &str) -> Option<&MultiPolygon<f64>> {
        let zip = ZipCode::parse(identifier)?;
        self.boundaries.get(&zip)
    }

    pub fn get(&self, zip: &ZipCode) -> Option<&MultiPolygon<f64>> {
        self.boundaries.get(zip)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.lookup(identifier).is_some()
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn zipcodes(&self) -> impl Iterator<Item = &ZipCode> {
        self.boundaries.keys()
    }

    /// Copy of the store with every boundary simplified.
    ///
    /// Used to prepare raw Census boundaries (the reference data is
    /// simplified at 100 m with topology preserved).
    pub fn simplified(&self, tolerance_m: f64, preserve_topology: bool) -> Self {
        let tolerance = meters_to_degrees(tolerance_m);
        info!(
            "Simplifying {} boundaries with tolerance {} meters ({} degrees)",
            self.len(),
            tolerance_m,
            tolerance
        );

        let entries: Vec<(&ZipCode, &MultiPolygon<f64>)> = self.boundaries.iter().collect();
        let boundaries = entries
            .into_par_iter()
            .map(|(zip, geometry)| {
                (
                    zip.clone(),
                    simplify_multipolygon(geometry, tolerance, preserve_topology),
                )
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect();

        Self { boundaries }
    }
}

impl FromIterator<(ZipCode, MultiPolygon<f64>)> for ZipStore {
    fn from_iter<I: IntoIterator<Item = (ZipCode, MultiPolygon<f64>)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (zip, geometry) in iter {
            store.insert(zip, geometry);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area, CoordsIter, Rect};

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![Rect::new((x, y), (x + size, y + size)).to_polygon()])
    }

    fn zip(raw: &str) -> ZipCode {
        ZipCode::parse(raw).unwrap()
    }

    #[test]
    fn test_lookup_canonicalizes() {
        let store: ZipStore = vec![(zip("02138"), square(0.0, 0.0, 1.0))]
            .into_iter()
            .collect();

        assert!(store.lookup("02138").is_some());
        assert!(store.lookup("2138").is_some());
        assert!(store.lookup(" 02138-0001 ").is_some());
        assert!(store.lookup("99999").is_none());
        assert!(store.lookup("not-a-zip").is_none());
    }

    #[test]
    fn test_duplicate_zip_accumulates() {
        let mut store = ZipStore::new();
        store.insert(zip("30327"), square(0.0, 0.0, 1.0));
        store.insert(zip("30327"), square(5.0, 5.0, 1.0));

        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup("30327").unwrap().0.len(), 2);
    }

    #[test]
    fn test_simplified_drops_redundant_vertices() {
        // Square with collinear midpoints on every edge
        let poly = polygon![
            (x: 0.0, y: 0.0),
            (x: 0.5, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 0.5),
            (x: 1.0, y: 1.0),
            (x: 0.5, y: 1.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.5),
        ];
        let store: ZipStore = vec![(zip("30327"), MultiPolygon::new(vec![poly]))]
            .into_iter()
            .collect();

        let simplified = store.simplified(100.0, true);
        let geometry = simplified.lookup("30327").unwrap();
        assert!(geometry.coords_count() < store.lookup("30327").unwrap().coords_count());
        assert!((geometry.unsigned_area() - 1.0).abs() < 1e-9);
    }
}
