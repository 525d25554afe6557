//! Legacy coverage variant: a concave hull around the raw member boundaries.
//!
//! Kept for comparison with older outputs only. It does not follow the
//! member boundaries closely and always produces a single part.

use geo::algorithm::concave_hull::ConcaveHullOptions;
use geo::{ConcaveHull, MultiPolygon, Polygon};

pub(crate) fn concave_hull_wrap(polygons: &[Polygon<f64>], concavity: f64) -> MultiPolygon<f64> {
    if polygons.is_empty() {
        return MultiPolygon::new(Vec::new());
    }

    let members = MultiPolygon::new(polygons.to_vec());
    let options = ConcaveHullOptions::default().concavity(concavity);
    MultiPolygon::new(vec![members.concave_hull_with_options(options)])
}
