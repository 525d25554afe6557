//! Loading the geometry store from a GeoJSON FeatureCollection.

use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::ZipStore;
use crate::geojson::{parse_multipolygon, GeometryError};
use crate::models::ZipCode;

/// Identifier property written by the store preparation step
pub const DEFAULT_ZIP_FIELD: &str = "zip";

/// Raw Census ZCTA identifier properties, tried when the configured field is absent
const CENSUS_ZIP_FIELDS: &[&str] = &["ZCTA5CE20", "ZCTA5CE10", "GEOID20"];

/// The geometry store could not be loaded. Always fatal to a run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read geometry store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("geometry store is not a valid GeoJSON FeatureCollection: {0}")]
    Json(#[from] serde_json::Error),

    #[error("feature {index} has no `{field}` identifier")]
    MissingId { index: usize, field: String },

    #[error("feature {index} ({zip}) has unsupported geometry: {source}")]
    UnsupportedGeometry {
        index: usize,
        zip: String,
        #[source]
        source: GeometryError,
    },

    #[error("feature {index} ({zip}) has invalid geometry: {source}")]
    InvalidGeometry {
        index: usize,
        zip: String,
        #[source]
        source: GeometryError,
    },
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Value>,
}

impl ZipStore {
    /// Load the store from a GeoJSON file (optionally gzip-compressed)
    pub fn load<P: AsRef<Path>>(path: P, zip_field: &str) -> Result<Self, StoreError> {
        let path = path.as_ref();
        info!("Loading zip boundaries from {}", path.display());

        let file = File::open(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        Self::from_geojson_reader(BufReader::new(reader), zip_field)
    }

    /// Parse a FeatureCollection whose features carry a ZIP identifier property
    pub fn from_geojson_reader<R: Read>(reader: R, zip_field: &str) -> Result<Self, StoreError> {
        let collection: FeatureCollection = serde_json::from_reader(reader)?;

        let mut store = ZipStore::new();
        let mut skipped = 0usize;

        for (index, feature) in collection.features.into_iter().enumerate() {
            let zip = feature
                .properties
                .as_ref()
                .and_then(|props| zip_property(props, zip_field))
                .ok_or_else(|| StoreError::MissingId {
                    index,
                    field: zip_field.to_string(),
                })?;

            let zip = ZipCode::parse(&zip).ok_or_else(|| StoreError::MissingId {
                index,
                field: zip_field.to_string(),
            })?;

            let geometry = match feature.geometry {
                Some(Value::Null) | None => {
                    warn!("Zip {} has no geometry, skipping", zip);
                    skipped += 1;
                    continue;
                }
                Some(value) => value,
            };

            let geometry = parse_multipolygon(&geometry).map_err(|source| match source {
                GeometryError::Unsupported(_) => StoreError::UnsupportedGeometry {
                    index,
                    zip: zip.to_string(),
                    source,
                },
                GeometryError::Invalid(_) => StoreError::InvalidGeometry {
                    index,
                    zip: zip.to_string(),
                    source,
                },
            })?;

            store.insert(zip, geometry);
        }

        info!(
            "Loaded {} zip boundaries ({} without geometry)",
            store.len(),
            skipped
        );
        Ok(store)
    }
}

fn zip_property(props: &Map<String, Value>, zip_field: &str) -> Option<String> {
    std::iter::once(zip_field)
        .chain(CENSUS_ZIP_FIELDS.iter().copied())
        .find_map(|field| match props.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}
