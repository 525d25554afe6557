//! Geometric helpers for coverage building.
//!
//! All distances here are already in degrees; see [`super::meters_to_degrees`].

use geo::orient::Direction;
use geo::{
    unary_union, Area, Buffer, Contains, Intersects, Line, LineString, MultiPolygon, Orient,
    Point, Polygon, Simplify, SimplifyVwPreserve, Winding,
};

/// Floor for the residue cutoff when no buffer distance applies (square degrees)
pub const MIN_RING_AREA: f64 = 1e-12;

/// Parts and holes smaller than `(distance * RESIDUE_FRACTION)²` are buffer residue
const RESIDUE_FRACTION: f64 = 0.1;

/// Morphological close: expand each polygon, union, then contract the union.
///
/// A zero distance degrades to a plain union.
pub fn close(polygons: &[Polygon<f64>], distance: f64) -> MultiPolygon<f64> {
    if polygons.is_empty() {
        return MultiPolygon::new(Vec::new());
    }

    if distance <= 0.0 {
        return unary_union(polygons);
    }

    let expanded: Vec<MultiPolygon<f64>> = polygons.iter().map(|p| p.buffer(distance)).collect();
    unary_union(&expanded).buffer(-distance)
}

/// Smallest part or hole area kept after buffering by `distance` degrees
pub fn residue_area(distance: f64) -> f64 {
    let scale = distance.max(0.0) * RESIDUE_FRACTION;
    (scale * scale).max(MIN_RING_AREA)
}

/// Rebuild a geometry from its non-degenerate parts.
///
/// Drops parts and holes with fewer than four coordinates or an area at or
/// below `min_area`, and orients every part (exterior counter-clockwise,
/// holes clockwise).
pub fn normalize_parts(geometry: MultiPolygon<f64>, min_area: f64) -> MultiPolygon<f64> {
    geometry
        .into_iter()
        .filter_map(|polygon| normalize_polygon(polygon, min_area))
        .collect()
}

fn normalize_polygon(polygon: Polygon<f64>, min_area: f64) -> Option<Polygon<f64>> {
    let (exterior, interiors) = polygon.into_inner();
    if !is_area_ring(&exterior, min_area) {
        return None;
    }

    let interiors = interiors
        .into_iter()
        .filter(|ring| is_area_ring(ring, min_area))
        .collect();
    Some(Polygon::new(exterior, interiors).orient(Direction::Default))
}

fn is_area_ring(ring: &LineString<f64>, min_area: f64) -> bool {
    ring.0.len() >= 4 && Polygon::new(ring.clone(), Vec::new()).unsigned_area() > min_area
}

/// Simplify every ring of a multi-polygon.
///
/// Both paths run Ramer-Douglas-Peucker at `tolerance`. With
/// `preserve_topology` each simplified polygon is checked (rings simple,
/// winding unchanged, rings disjoint, holes inside the shell); a polygon that
/// fails falls back to Visvalingam-Whyatt topology-preserving simplification
/// with an area threshold of `tolerance²`, and failing that is kept as is.
/// Without it the RDP output is returned unchecked and may, rarely, contain
/// invalid rings.
pub fn simplify_multipolygon(
    geometry: &MultiPolygon<f64>,
    tolerance: f64,
    preserve_topology: bool,
) -> MultiPolygon<f64> {
    if tolerance <= 0.0 {
        return geometry.clone();
    }

    if preserve_topology {
        geometry
            .iter()
            .map(|polygon| simplify_polygon_preserving(polygon, tolerance))
            .collect()
    } else {
        geometry.simplify(tolerance)
    }
}

fn simplify_polygon_preserving(polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    let simplified = polygon.simplify(tolerance);
    if keeps_topology(polygon, &simplified) {
        return simplified;
    }

    let simplified = polygon.simplify_vw_preserve(tolerance * tolerance);
    if keeps_topology(polygon, &simplified) {
        return simplified;
    }

    polygon.clone()
}

/// True if `simplified` is still a valid polygon with the same rings and windings as `original`
pub fn keeps_topology(original: &Polygon<f64>, simplified: &Polygon<f64>) -> bool {
    if original.interiors().len() != simplified.interiors().len() {
        return false;
    }

    let rings = std::iter::once((original.exterior(), simplified.exterior()))
        .chain(original.interiors().iter().zip(simplified.interiors()));
    for (before, after) in rings {
        if after.0.len() < 4 || after.winding_order() != before.winding_order() {
            return false;
        }
        if !ring_is_simple(after) {
            return false;
        }
    }

    rings_disjoint(simplified)
}

/// True if no two non-adjacent edges of the ring touch
pub fn ring_is_simple(ring: &LineString<f64>) -> bool {
    let lines: Vec<Line<f64>> = ring.lines().filter(|l| l.start != l.end).collect();
    let n = lines.len();
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            if lines[i].intersects(&lines[j]) {
                return false;
            }
        }
    }
    true
}

// Rings never touch each other and every hole starts inside the shell
fn rings_disjoint(polygon: &Polygon<f64>) -> bool {
    let rings: Vec<&LineString<f64>> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .collect();
    for i in 0..rings.len() {
        for j in (i + 1)..rings.len() {
            if rings[i].intersects(rings[j]) {
                return false;
            }
        }
    }

    let shell = Polygon::new(polygon.exterior().clone(), Vec::new());
    polygon.interiors().iter().all(|hole| {
        hole.0
            .first()
            .map_or(false, |c| shell.contains(&Point::from(*c)))
    })
}

#[cfg(test)]
pub(crate) fn all_rings_simple(geometry: &MultiPolygon<f64>) -> bool {
    geometry.iter().all(|polygon| {
        ring_is_simple(polygon.exterior()) && polygon.interiors().iter().all(ring_is_simple)
    })
}
