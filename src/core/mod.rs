//! Core raster operations: statistics, clipping, reprojection, pipelines

pub mod clip;
pub mod pipeline;
pub mod reproject;
pub mod stats;

// Re-export main types
pub use clip::{ClipProcessor, ClipSummary, PixelWindow};
pub use pipeline::{clip_and_reproject, clip_raster, reproject_raster, PipelineSummary};
pub use reproject::{
    calculate_default_transform, parse_crs, ReprojectSummary, ReprojectionProcessor,
};
pub use stats::BandStatistics;
