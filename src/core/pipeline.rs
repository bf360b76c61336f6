use crate::core::clip::{ClipProcessor, ClipSummary};
use crate::core::reproject::{ReprojectSummary, ReprojectionProcessor};
use crate::io::{AoiReader, RasterReader};
use crate::types::{RasterResult, ResampleMethod};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Summary of a complete clip-and-reproject run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub clip: ClipSummary,
    pub reproject: ReprojectSummary,
}

/// Clip a raster to an AOI and write the cropped result
pub fn clip_raster<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
    raster_path: P,
    aoi_path: Q,
    output_path: R,
) -> RasterResult<ClipSummary> {
    let reader = RasterReader::open(raster_path)?;
    let aoi = AoiReader::open(aoi_path)?;
    ClipProcessor::new().clip(&reader, &aoi, output_path)
}

/// Reproject a raster to a target CRS and write the result
pub fn reproject_raster<P: AsRef<Path>, Q: AsRef<Path>>(
    raster_path: P,
    target_crs: &str,
    output_path: Q,
    resampling: ResampleMethod,
    resolution: Option<f64>,
) -> RasterResult<ReprojectSummary> {
    let reader = RasterReader::open(raster_path)?;
    let mut processor = ReprojectionProcessor::new(resampling);
    processor.resolution = resolution;
    processor.reproject(&reader, target_crs, output_path)
}

/// Complete clip-and-reproject pipeline
///
/// The clipped intermediate is staged in a temporary directory and removed
/// when the pipeline returns; only the reprojected output persists.
pub fn clip_and_reproject<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
    raster_path: P,
    aoi_path: Q,
    output_path: R,
    target_crs: &str,
    resampling: ResampleMethod,
    resolution: Option<f64>,
) -> RasterResult<PipelineSummary> {
    log::info!("🌍 Starting clip-and-reproject pipeline");

    // Step 1: Open the inputs
    let reader = RasterReader::open(raster_path)?;
    let aoi = AoiReader::open(aoi_path)?;

    // Step 2: Clip to the AOI, staging the intermediate in a temp dir
    let staging = tempfile::tempdir()?;
    let clipped_path = staging.path().join("clipped.tif");
    let clip = ClipProcessor::new().clip(&reader, &aoi, &clipped_path)?;
    drop(reader);

    // Step 3: Reproject the clipped raster onto the target grid
    let clipped = RasterReader::open(&clipped_path)?;
    let mut processor = ReprojectionProcessor::new(resampling);
    processor.resolution = resolution;
    let reproject = processor.reproject(&clipped, target_crs, output_path)?;

    log::info!("🏁 Pipeline complete: {}", reproject.output_path);
    Ok(PipelineSummary { clip, reproject })
}
