use crate::io::RasterReader;
use crate::types::{
    BoundingBox, GeoTransform, RasterError, RasterResult, ResampleMethod, TargetGrid,
};
use gdal::raster::{Buffer, RasterCreationOption};
use gdal::spatial_ref::{CoordTransform, SpatialRef};
use gdal::DriverManager;
use gdal_sys::CPLErr;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::ptr::{null, null_mut};

/// Points per boundary edge when densifying the source outline
const DENSIFY_POINTS: usize = 21;

/// Parse a CRS descriptor: `EPSG:<code>`, a PROJ string, or WKT
pub fn parse_crs(crs: &str) -> RasterResult<SpatialRef> {
    let trimmed = crs.trim();
    let epsg = regex::Regex::new(r"(?i)^epsg:\s*(\d+)$").unwrap();

    if let Some(captures) = epsg.captures(trimmed) {
        let code: u32 = captures[1]
            .parse()
            .map_err(|_| RasterError::InvalidInput(format!("invalid EPSG code in {:?}", crs)))?;
        Ok(SpatialRef::from_epsg(code)?)
    } else if trimmed.starts_with('+') {
        Ok(SpatialRef::from_proj4(trimmed)?)
    } else if trimmed.is_empty() {
        Err(RasterError::InvalidInput(
            "empty CRS descriptor".to_string(),
        ))
    } else {
        Ok(SpatialRef::from_wkt(trimmed)?)
    }
}

/// Derive the output grid for reprojecting a source grid to a target CRS
///
/// The source boundary is densified, transformed to the target CRS, and
/// covered with square pixels sized to preserve the source pixel count
/// along the tighter axis. An explicit `resolution` in target CRS units
/// overrides the derived pixel size.
pub fn calculate_default_transform(
    source_transform: &GeoTransform,
    src_width: usize,
    src_height: usize,
    src_srs: &SpatialRef,
    dst_srs: &SpatialRef,
    resolution: Option<f64>,
) -> RasterResult<TargetGrid> {
    if !source_transform.is_north_up() {
        return Err(RasterError::InvalidInput(
            "rotated rasters are not supported for reprojection".to_string(),
        ));
    }

    let (mut xs, mut ys) = boundary_points(source_transform, src_width, src_height);
    let mut zs = vec![0.0; xs.len()];

    let src = src_srs.clone();
    src.set_axis_mapping_strategy(gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
    let dst = dst_srs.clone();
    dst.set_axis_mapping_strategy(gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);

    let transform = CoordTransform::new(&src, &dst)?;
    transform.transform_coords(&mut xs, &mut ys, &mut zs)?;

    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
        return Err(RasterError::Processing(
            "source bounds did not transform to finite target coordinates".to_string(),
        ));
    }
    let bounds = BoundingBox {
        min_x,
        min_y,
        max_x,
        max_y,
    };
    log::debug!(
        "Transformed bounds: x [{:.6}, {:.6}], y [{:.6}, {:.6}]",
        bounds.min_x,
        bounds.max_x,
        bounds.min_y,
        bounds.max_y
    );

    let pixel_size = match resolution {
        Some(r) if r > 0.0 => r,
        Some(r) => {
            return Err(RasterError::InvalidInput(format!(
                "target resolution must be positive, got {}",
                r
            )))
        }
        None => {
            let candidate_x = bounds.width() / src_width as f64;
            let candidate_y = bounds.height() / src_height as f64;
            candidate_x.min(candidate_y)
        }
    };

    let width = ((bounds.width() / pixel_size + 0.5) as usize).max(1);
    let height = ((bounds.height() / pixel_size + 0.5) as usize).max(1);

    let grid = TargetGrid {
        transform: GeoTransform {
            top_left_x: bounds.min_x,
            pixel_width: pixel_size,
            rotation_x: 0.0,
            top_left_y: bounds.max_y,
            rotation_y: 0.0,
            pixel_height: -pixel_size,
        },
        width,
        height,
        crs: srs_descriptor(&dst),
    };
    log::debug!(
        "Target grid: {}x{} at {:.6} units/pixel",
        grid.width,
        grid.height,
        pixel_size
    );

    Ok(grid)
}

/// Summary of a reprojection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReprojectSummary {
    pub output_path: String,
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub crs: String,
    pub transform: GeoTransform,
    pub resampling: ResampleMethod,
    pub nodata: f64,
}

/// Reprojects a raster onto a derived target grid
pub struct ReprojectionProcessor {
    pub resampling: ResampleMethod,
    /// Explicit output pixel size in target CRS units
    pub resolution: Option<f64>,
    /// COMPRESS creation option for the output
    pub compression: Option<String>,
}

impl ReprojectionProcessor {
    pub fn new(resampling: ResampleMethod) -> Self {
        ReprojectionProcessor {
            resampling,
            resolution: None,
            compression: Some("DEFLATE".to_string()),
        }
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Reproject a raster to the target CRS and write the result
    pub fn reproject<P: AsRef<Path>>(
        &self,
        reader: &RasterReader,
        target_crs: &str,
        output_path: P,
    ) -> RasterResult<ReprojectSummary> {
        log::info!(
            "🌍 Reprojecting {} to {} ({} resampling)",
            reader.path().display(),
            target_crs,
            self.resampling
        );

        let src_transform = reader.transform()?;
        if !src_transform.is_north_up() {
            return Err(RasterError::InvalidInput(
                "rotated rasters are not supported for reprojection".to_string(),
            ));
        }
        let (src_width, src_height) = reader.size();
        let src_srs = reader.spatial_ref()?;
        let dst_srs = parse_crs(target_crs)?;

        let grid = calculate_default_transform(
            &src_transform,
            src_width,
            src_height,
            &src_srs,
            &dst_srs,
            self.resolution,
        )?;

        let nodata = match reader.nodata(1)? {
            Some(value) => value,
            None => {
                log::warn!("Source raster declares no nodata value, using 0");
                0.0
            }
        };

        let band_count = reader.band_count();
        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let mut options = Vec::new();
        if let Some(compression) = &self.compression {
            options.push(RasterCreationOption {
                key: "COMPRESS",
                value: compression.as_str(),
            });
        }

        let mut destination = driver.create_with_band_type_with_options::<f32, _>(
            output_path.as_ref(),
            grid.width as isize,
            grid.height as isize,
            band_count as isize,
            &options,
        )?;
        destination.set_geo_transform(&grid.transform.to_gdal())?;
        destination.set_spatial_ref(&dst_srs)?;

        // Pre-fill with nodata so pixels outside the source footprint keep it
        let fill = vec![nodata as f32; grid.width * grid.height];
        for band in 1..=band_count {
            let mut rasterband = destination.rasterband(band as isize)?;
            let buffer = Buffer::new((grid.width, grid.height), fill.clone());
            rasterband.write((0, 0), (grid.width, grid.height), &buffer)?;
            rasterband.set_no_data_value(Some(nodata))?;
        }

        let rv = unsafe {
            gdal_sys::GDALReprojectImage(
                reader.dataset().c_dataset(),
                null(),
                destination.c_dataset(),
                null(),
                self.resampling.to_warp_alg(),
                0.0,
                0.0,
                None,
                null_mut(),
                null_mut(),
            )
        };
        if rv != CPLErr::CE_None {
            return Err(RasterError::Processing(format!(
                "reprojection failed: {}",
                last_cpl_error_message()
            )));
        }

        log::info!(
            "✅ Reprojection complete: {}x{} pixels in {}",
            grid.width,
            grid.height,
            grid.crs
        );

        Ok(ReprojectSummary {
            output_path: output_path.as_ref().display().to_string(),
            width: grid.width,
            height: grid.height,
            band_count,
            crs: grid.crs,
            transform: grid.transform,
            resampling: self.resampling,
            nodata,
        })
    }
}

/// Densified outline of the source grid in geospatial coordinates
fn boundary_points(
    transform: &GeoTransform,
    width: usize,
    height: usize,
) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(4 * (DENSIFY_POINTS + 1));
    let mut ys = Vec::with_capacity(4 * (DENSIFY_POINTS + 1));

    let w = width as f64;
    let h = height as f64;
    for i in 0..=DENSIFY_POINTS {
        let t = i as f64 / DENSIFY_POINTS as f64;
        for (col, row) in [(t * w, 0.0), (t * w, h), (0.0, t * h), (w, t * h)] {
            let (x, y) = transform.pixel_to_geo(col, row);
            xs.push(x);
            ys.push(y);
        }
    }

    (xs, ys)
}

fn srs_descriptor(srs: &SpatialRef) -> String {
    match srs.auth_code() {
        Ok(code) => format!("EPSG:{}", code),
        Err(_) => srs.to_wkt().unwrap_or_else(|_| "unknown".to_string()),
    }
}

fn last_cpl_error_message() -> String {
    unsafe {
        let message = gdal_sys::CPLGetLastErrorMsg();
        if message.is_null() {
            "unknown GDAL error".to_string()
        } else {
            std::ffi::CStr::from_ptr(message)
                .to_string_lossy()
                .into_owned()
        }
    }
}
