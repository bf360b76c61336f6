//! I/O modules for raster datasets, GeoTIFF output, and AOI vector files

pub mod dataset;
pub mod geotiff;
pub mod vector;

pub use dataset::RasterReader;
pub use geotiff::GeoTiffWriter;
pub use vector::AoiReader;
