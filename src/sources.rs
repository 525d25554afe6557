//! Reading service-area records and writing the coverage dataset.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::geojson::multipolygon_to_value;
use crate::models::{CoverageFeature, ServiceArea};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SourceError + '_ {
    move |source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Load service areas from a directory of JSON files or a JSON-lines file
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<ServiceArea>, SourceError> {
    let path = path.as_ref();
    if path.is_dir() {
        load_dir(path)
    } else {
        load_jsonl(path)
    }
}

/// One entity per `*.json` file, recursively. Unparseable files are skipped.
pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<ServiceArea>, SourceError> {
    let dir = dir.as_ref();
    info!("Loading service areas from {}", dir.display());

    let mut areas = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| SourceError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if !path.is_file() || path.extension().map_or(true, |e| e != "json") {
            continue;
        }

        let content = fs::read_to_string(path).map_err(io_error(path))?;
        match serde_json::from_str::<ServiceArea>(&content) {
            Ok(area) => areas.push(area),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    info!("Loaded {} service areas", areas.len());
    Ok(areas)
}

/// One entity per line. Blank and unparseable lines are skipped.
pub fn load_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<ServiceArea>, SourceError> {
    let path = path.as_ref();
    info!("Loading service areas from {}", path.display());

    let file = File::open(path).map_err(io_error(path))?;
    let mut areas = Vec::new();

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(io_error(path))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ServiceArea>(&line) {
            Ok(area) => areas.push(area),
            Err(e) => warn!("Skipping {} line {}: {}", path.display(), line_no + 1, e),
        }
    }

    info!("Loaded {} service areas", areas.len());
    Ok(areas)
}

/// Write the merged entity attributes as JSON lines
pub fn write_jsonl<P: AsRef<Path>>(path: P, areas: &[ServiceArea]) -> Result<(), SourceError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path).map_err(io_error(path))?);

    for area in areas {
        serde_json::to_writer(&mut writer, area).map_err(|source| SourceError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        writer.write_all(b"\n").map_err(io_error(path))?;
    }
    writer.flush().map_err(io_error(path))?;

    info!("Wrote {} records to {}", areas.len(), path.display());
    Ok(())
}

fn feature_to_value(
    feature: &CoverageFeature,
    computed_at: &DateTime<Utc>,
) -> Result<Value, serde_json::Error> {
    let mut properties = feature.area.properties()?;
    properties.insert(
        "zipcode_count".to_string(),
        json!(feature.area.zipcodes.len()),
    );
    properties.insert("unique_count".to_string(), json!(feature.report.unique));
    properties.insert(
        "resolved_count".to_string(),
        json!(feature.report.resolved),
    );
    properties.insert("part_count".to_string(), json!(feature.report.parts));
    properties.insert("computed_at".to_string(), json!(computed_at.to_rfc3339()));

    Ok(json!({
        "type": "Feature",
        "id": feature.area.id,
        "properties": properties,
        "geometry": multipolygon_to_value(&feature.geometry),
    }))
}

/// Write coverage features as a GeoJSON FeatureCollection (WGS84 lon/lat)
pub fn write_geojson<P: AsRef<Path>>(
    path: P,
    features: &[CoverageFeature],
) -> Result<(), SourceError> {
    let path = path.as_ref();
    let computed_at = Utc::now();

    let encode_error = |source| SourceError::Encode {
        path: path.to_path_buf(),
        source,
    };

    let features_json = features
        .iter()
        .map(|f| feature_to_value(f, &computed_at))
        .collect::<Result<Vec<_>, _>>()
        .map_err(encode_error)?;
    let collection = json!({
        "type": "FeatureCollection",
        "features": features_json,
    });

    let mut writer = BufWriter::new(File::create(path).map_err(io_error(path))?);
    serde_json::to_writer(&mut writer, &collection).map_err(encode_error)?;
    writer.flush().map_err(io_error(path))?;

    info!("Wrote {} features to {}", features.len(), path.display());
    Ok(())
}
