//! Coverage build pipeline.
//!
//! Loads the zip boundary store once, computes a coverage polygon for every
//! service area in parallel, and writes the results as GeoJSON.

mod config;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use zipcover::coverage::Smoothing;
use zipcover::store::DEFAULT_ZIP_FIELD;
use zipcover::{sources, CoverageBuilder, CoverageConfig, CoverageFeature, ZipStore};

use crate::config::Config;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "zipcover-build")]
#[command(about = "Build service-area coverage polygons from zipcode lists")]
struct Args {
    /// Zip boundary GeoJSON (.geojson or .geojson.gz)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Property holding the zip identifier in the store
    #[arg(long)]
    zip_field: Option<String>,

    /// Directory of per-entity JSON files, or a JSON-lines file
    #[arg(short, long)]
    input: PathBuf,

    /// Output GeoJSON FeatureCollection
    #[arg(short, long, default_value = "_data/mls_data.geojson")]
    output: PathBuf,

    /// Also write the merged entity records as JSON lines
    #[arg(long)]
    jsonl: Option<PathBuf>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Buffer distance in meters [default: 1000]
    #[arg(short, long)]
    buffer: Option<f64>,

    /// Simplification tolerance in meters [default: 500]
    #[arg(short, long)]
    tolerance: Option<f64>,

    /// Preserve geometry topology when simplifying [default: true]
    #[arg(short, long)]
    preserve: Option<bool>,

    /// Simplify the store boundaries at load time (meters)
    #[arg(long)]
    store_tolerance: Option<f64>,

    /// Experimental: wrap members in a concave hull instead of buffering
    #[arg(long, value_name = "CONCAVITY")]
    legacy_hull: Option<f64>,

    #[arg(long)]
    debug: bool,
}

fn init_logging(debug: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Defaults, then the config file, then command-line flags
fn resolve_coverage_config(args: &Args, file: &Config) -> Result<CoverageConfig> {
    let mut config = file.coverage;
    if let Some(buffer) = args.buffer {
        config.buffer_distance_m = buffer;
    }
    if let Some(tolerance) = args.tolerance {
        config.simplify_tolerance_m = tolerance;
    }
    if let Some(preserve) = args.preserve {
        config.preserve_topology = preserve;
    }
    if let Some(concavity) = args.legacy_hull {
        config.mode = Smoothing::ConcaveHull { concavity };
    }

    config.validate().context("Invalid coverage configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug)?;

    info!("Zipcover Build Pipeline");

    let file_config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    let coverage_config = resolve_coverage_config(&args, &file_config)?;

    info!(
        "Buffer {} m, tolerance {} m, preserve topology: {}",
        coverage_config.buffer_distance_m,
        coverage_config.simplify_tolerance_m,
        coverage_config.preserve_topology
    );
    if let Smoothing::ConcaveHull { concavity } = coverage_config.mode {
        warn!(
            "Using experimental concave hull coverage (concavity {}); buffer distance is ignored",
            concavity
        );
    }

    // Load the store once; every worker borrows it read-only
    let store_path = args
        .store
        .clone()
        .or_else(|| file_config.store.path.clone())
        .context("No zip boundary store given (--store or [store].path)")?;
    let zip_field = args
        .zip_field
        .clone()
        .or_else(|| file_config.store.zip_field.clone())
        .unwrap_or_else(|| DEFAULT_ZIP_FIELD.to_string());

    let store = ZipStore::load(&store_path, &zip_field)
        .with_context(|| format!("Failed to load zip boundaries from {}", store_path.display()))?;
    if store.is_empty() {
        warn!("Zip boundary store is empty; every coverage will be empty");
    }

    let store = match args.store_tolerance.or(file_config.store.tolerance_m) {
        Some(tolerance) => store.simplified(tolerance, true),
        None => store,
    };

    let areas = sources::load(&args.input)
        .with_context(|| format!("Failed to load service areas from {}", args.input.display()))?;

    if let Some(path) = &args.jsonl {
        sources::write_jsonl(path, &areas)?;
    }

    let builder = CoverageBuilder::new(&store, coverage_config);

    let pb = ProgressBar::new(areas.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let mut features: Vec<CoverageFeature> = areas
        .into_par_iter()
        .map(|area| {
            let coverage = builder.build(&area.zipcodes);
            pb.inc(1);
            CoverageFeature {
                area,
                geometry: coverage.geometry,
                report: coverage.report,
            }
        })
        .collect();
    pb.finish_with_message("Coverage complete");

    // Completion order is arbitrary; output is keyed and sorted by entity id
    features.sort_by(|a, b| a.area.id.cmp(&b.area.id));

    let mut empty = 0usize;
    let mut unknown = 0usize;
    for feature in &features {
        unknown += feature.report.discarded();
        if feature.geometry.0.is_empty() {
            empty += 1;
            warn!(
                "{} ({}) has empty coverage: {} zipcodes, none resolved",
                feature.area.id,
                feature.area.name.as_deref().unwrap_or("unnamed"),
                feature.report.requested
            );
        } else if feature.report.discarded() > 0 {
            info!(
                "{}: {} of {} zipcodes unknown",
                feature.area.id,
                feature.report.discarded(),
                feature.report.requested
            );
        }
    }

    info!(
        "Built {} coverages in {:.1?} ({} empty, {} unknown zipcodes)",
        features.len(),
        start.elapsed(),
        empty,
        unknown
    );

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    sources::write_geojson(&args.output, &features)?;

    Ok(())
}
