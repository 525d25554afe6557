//! Minimal GeoJSON geometry codec for (multi)polygons.
//!
//! Only the geometry types that zip boundaries and coverage polygons use are
//! supported. Coordinates are `[lon, lat]`; any extra ordinates are ignored.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("unsupported geometry type {0}")]
    Unsupported(String),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

type Ring = Vec<Vec<f64>>;

/// Parse a GeoJSON `Polygon` or `MultiPolygon` geometry object
pub fn parse_multipolygon(value: &Value) -> Result<MultiPolygon<f64>, GeometryError> {
    let raw = RawGeometry::deserialize(value)
        .map_err(|e| GeometryError::Invalid(format!("malformed geometry object: {}", e)))?;

    match raw.kind.as_str() {
        "Polygon" => {
            let rings: Vec<Ring> = serde_json::from_value(raw.coordinates)
                .map_err(|e| GeometryError::Invalid(format!("bad Polygon coordinates: {}", e)))?;
            Ok(MultiPolygon::new(vec![polygon_from_rings(rings)?]))
        }
        "MultiPolygon" => {
            let polygons: Vec<Vec<Ring>> = serde_json::from_value(raw.coordinates).map_err(|e| {
                GeometryError::Invalid(format!("bad MultiPolygon coordinates: {}", e))
            })?;
            let polygons = polygons
                .into_iter()
                .map(polygon_from_rings)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MultiPolygon::new(polygons))
        }
        other => Err(GeometryError::Unsupported(other.to_string())),
    }
}

fn polygon_from_rings(rings: Vec<Ring>) -> Result<Polygon<f64>, GeometryError> {
    let mut rings = rings.into_iter().map(ring_from_positions);
    let exterior = match rings.next() {
        Some(ring) => ring?,
        None => return Err(GeometryError::Invalid("polygon has no rings".to_string())),
    };
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn ring_from_positions(positions: Ring) -> Result<LineString<f64>, GeometryError> {
    let coords = positions
        .into_iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
            _ => Err(GeometryError::Invalid(format!("bad position {:?}", p))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Polygon::new closes the ring
    if coords.len() < 3 {
        return Err(GeometryError::Invalid(format!(
            "ring has {} positions, need at least 3",
            coords.len()
        )));
    }

    Ok(LineString::new(coords))
}

fn ring_to_value(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

/// Encode a multi-polygon as a GeoJSON `MultiPolygon` geometry object
pub fn multipolygon_to_value(geometry: &MultiPolygon<f64>) -> Value {
    let polygons: Vec<Value> = geometry
        .iter()
        .map(|polygon| {
            let mut rings = vec![ring_to_value(polygon.exterior())];
            rings.extend(polygon.interiors().iter().map(ring_to_value));
            Value::Array(rings)
        })
        .collect();

    json!({
        "type": "MultiPolygon",
        "coordinates": polygons,
    })
}
