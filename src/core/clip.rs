use crate::io::vector::envelope_of;
use crate::io::{AoiReader, GeoTiffWriter, RasterReader};
use crate::types::{BoundingBox, GeoTransform, RasterError, RasterResult};
use gdal::spatial_ref::SpatialRef;
use gdal::vector::Geometry;
use gdal::DriverManager;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pixel window of a raster grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelWindow {
    pub col_off: usize,
    pub row_off: usize,
    pub width: usize,
    pub height: usize,
}

/// Summary of a clip operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipSummary {
    pub output_path: String,
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub transform: GeoTransform,
    pub nodata: f64,
    pub masked_percent: f64,
}

/// Clips a raster to area-of-interest polygons
///
/// The AOI is reprojected into the raster CRS, the covering pixel window is
/// intersected with the raster extent, the polygons are rasterized into a
/// mask for that window, and every band is written out cropped with pixels
/// outside the polygons set to the nodata value.
pub struct ClipProcessor {
    writer: GeoTiffWriter,
}

impl Default for ClipProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipProcessor {
    pub fn new() -> Self {
        ClipProcessor {
            writer: GeoTiffWriter::new(),
        }
    }

    pub fn with_writer(writer: GeoTiffWriter) -> Self {
        ClipProcessor { writer }
    }

    /// Clip a raster to the AOI and write the cropped result
    pub fn clip<P: AsRef<Path>>(
        &self,
        reader: &RasterReader,
        aoi: &AoiReader,
        output_path: P,
    ) -> RasterResult<ClipSummary> {
        log::info!(
            "Clipping {} to {} AOI polygon(s)",
            reader.path().display(),
            aoi.geometry_count()
        );

        let transform = reader.transform()?;
        if !transform.is_north_up() {
            return Err(RasterError::InvalidInput(
                "rotated rasters are not supported for clipping".to_string(),
            ));
        }

        let srs = reader.spatial_ref()?;
        let geometries = aoi.to_crs(&srs)?;
        let aoi_bounds = envelope_of(&geometries);
        log::debug!("AOI bounds in raster CRS: {:?}", aoi_bounds);

        let (raster_width, raster_height) = reader.size();
        let window = window_for(&transform, &aoi_bounds, raster_width, raster_height)?;
        let window_transform = transform.for_window(window.col_off, window.row_off);
        log::debug!("Clip window: {:?}", window);

        let nodata = match reader.nodata(1)? {
            Some(value) => value,
            None => {
                log::warn!("Source raster declares no nodata value, using 0");
                0.0
            }
        };

        let mask = rasterize_mask(
            &geometries,
            &window_transform,
            (window.width, window.height),
            &srs,
        )?;
        let outside = mask.iter().filter(|&&m| m == 0).count();
        let masked_percent = 100.0 * outside as f64 / mask.len() as f64;

        let band_count = reader.band_count();
        let mut bands = Vec::with_capacity(band_count);
        for band in 1..=band_count {
            let data = reader.read_band_window(
                band,
                (window.col_off, window.row_off),
                (window.width, window.height),
            )?;
            bands.push(apply_mask(&data, &mask, nodata as f32));
        }

        self.writer.write_bands(
            output_path.as_ref(),
            &bands,
            &window_transform,
            &srs,
            Some(nodata),
            Some(reader.path()),
        )?;

        log::info!(
            "✅ Clip complete: {}x{} pixels, {} band(s), {:.1}% masked",
            window.width,
            window.height,
            band_count,
            masked_percent
        );

        Ok(ClipSummary {
            output_path: output_path.as_ref().display().to_string(),
            width: window.width,
            height: window.height,
            band_count,
            transform: window_transform,
            nodata,
            masked_percent,
        })
    }
}

/// Pixel window covering `bounds`, intersected with the raster extent
pub fn window_for(
    transform: &GeoTransform,
    bounds: &BoundingBox,
    raster_width: usize,
    raster_height: usize,
) -> RasterResult<PixelWindow> {
    let raster_bounds = transform.bounds(raster_width, raster_height);
    let overlap = bounds.intersection(&raster_bounds).ok_or_else(|| {
        RasterError::InvalidInput("AOI does not overlap the raster extent".to_string())
    })?;

    let (col_a, row_a) = transform.geo_to_pixel(overlap.min_x, overlap.max_y);
    let (col_b, row_b) = transform.geo_to_pixel(overlap.max_x, overlap.min_y);

    // The overlap has positive area, so floor/ceil yields at least one pixel
    let col_start = col_a.min(col_b).floor().max(0.0);
    let row_start = row_a.min(row_b).floor().max(0.0);
    let col_end = col_a.max(col_b).ceil().min(raster_width as f64);
    let row_end = row_a.max(row_b).ceil().min(raster_height as f64);

    Ok(PixelWindow {
        col_off: col_start as usize,
        row_off: row_start as usize,
        width: (col_end - col_start) as usize,
        height: (row_end - row_start) as usize,
    })
}

/// Rasterize polygons into a 0/1 mask on the window grid
fn rasterize_mask(
    geometries: &[Geometry],
    window_transform: &GeoTransform,
    size: (usize, usize),
    srs: &SpatialRef,
) -> RasterResult<Array2<u8>> {
    log::debug!("Rasterizing {} polygon(s) into mask", geometries.len());

    let driver = DriverManager::get_driver_by_name("MEM")?;
    let mut mask_dataset =
        driver.create_with_band_type::<u8, _>("", size.0 as isize, size.1 as isize, 1)?;
    mask_dataset.set_geo_transform(&window_transform.to_gdal())?;
    mask_dataset.set_spatial_ref(srs)?;

    for geometry in geometries {
        gdal::raster::rasterize(
            &mut mask_dataset,
            &[1],
            std::slice::from_ref(geometry),
            &[1.0],
            None,
        )?;
    }

    let buffer = mask_dataset
        .rasterband(1)?
        .read_as::<u8>((0, 0), size, size, None)?;
    Array2::from_shape_vec((size.1, size.0), buffer.data)
        .map_err(|e| RasterError::Processing(format!("Failed to reshape mask data: {}", e)))
}

fn apply_mask(data: &Array2<f32>, mask: &Array2<u8>, nodata: f32) -> Array2<f32> {
    #[cfg(feature = "parallel")]
    {
        Zip::from(data)
            .and(mask)
            .par_map_collect(|&value, &m| if m == 0 { nodata } else { value })
    }
    #[cfg(not(feature = "parallel"))]
    {
        Zip::from(data)
            .and(mask)
            .map_collect(|&value, &m| if m == 0 { nodata } else { value })
    }
}
