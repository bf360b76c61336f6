use crate::types::{BandArray, GeoTransform, RasterError, RasterResult};
use chrono::Utc;
use gdal::raster::{Buffer, RasterCreationOption};
use gdal::spatial_ref::SpatialRef;
use gdal::{DriverManager, Metadata};
use std::path::Path;

/// GeoTIFF writer
///
/// Creates single- or multi-band Float32 outputs with the supplied transform,
/// CRS, and nodata value, and stamps provenance metadata on every file.
pub struct GeoTiffWriter {
    /// COMPRESS creation option, None for uncompressed output
    pub compression: Option<String>,
    /// TILED=YES creation option
    pub tiled: bool,
}

impl Default for GeoTiffWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoTiffWriter {
    pub fn new() -> Self {
        GeoTiffWriter {
            compression: Some("DEFLATE".to_string()),
            tiled: false,
        }
    }

    pub fn with_compression(compression: Option<&str>) -> Self {
        GeoTiffWriter {
            compression: compression.map(|c| c.to_string()),
            tiled: false,
        }
    }

    /// Write one band as a new GeoTIFF
    pub fn write_band<P: AsRef<Path>>(
        &self,
        output_path: P,
        band: &BandArray,
        transform: &GeoTransform,
        srs: &SpatialRef,
        nodata: Option<f64>,
        source: Option<&Path>,
    ) -> RasterResult<()> {
        self.write_bands(
            output_path,
            std::slice::from_ref(band),
            transform,
            srs,
            nodata,
            source,
        )
    }

    /// Write multiple bands as a new GeoTIFF
    ///
    /// All bands must share the same dimensions; arrays are row-major
    /// (rows x columns).
    pub fn write_bands<P: AsRef<Path>>(
        &self,
        output_path: P,
        bands: &[BandArray],
        transform: &GeoTransform,
        srs: &SpatialRef,
        nodata: Option<f64>,
        source: Option<&Path>,
    ) -> RasterResult<()> {
        if bands.is_empty() {
            return Err(RasterError::InvalidInput(
                "no bands supplied for output".to_string(),
            ));
        }
        let (height, width) = bands[0].dim();
        for (i, band) in bands.iter().enumerate() {
            if band.dim() != (height, width) {
                return Err(RasterError::InvalidInput(format!(
                    "band {} dimensions {:?} differ from band 1 ({}x{})",
                    i + 1,
                    band.dim(),
                    height,
                    width
                )));
            }
        }

        log::info!(
            "Writing GeoTIFF: {} ({}x{}, {} band(s))",
            output_path.as_ref().display(),
            width,
            height,
            bands.len()
        );

        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let mut options = Vec::new();
        if let Some(compression) = &self.compression {
            options.push(RasterCreationOption {
                key: "COMPRESS",
                value: compression.as_str(),
            });
        }
        if self.tiled {
            options.push(RasterCreationOption {
                key: "TILED",
                value: "YES",
            });
        }

        let mut dataset = driver.create_with_band_type_with_options::<f32, _>(
            output_path.as_ref(),
            width as isize,
            height as isize,
            bands.len() as isize,
            &options,
        )?;

        dataset.set_geo_transform(&transform.to_gdal())?;
        dataset.set_spatial_ref(srs)?;

        for (i, band) in bands.iter().enumerate() {
            let mut rasterband = dataset.rasterband((i + 1) as isize)?;
            let flat_data: Vec<f32> = band.iter().cloned().collect();
            let buffer = Buffer::new((width, height), flat_data);
            rasterband.write((0, 0), (width, height), &buffer)?;

            if let Some(value) = nodata {
                rasterband.set_no_data_value(Some(value))?;
            }
        }

        // Provenance metadata
        dataset.set_metadata_item(
            "SOFTWARE",
            &format!("rasterops {}", env!("CARGO_PKG_VERSION")),
            "",
        )?;
        dataset.set_metadata_item("PROCESSING_DATETIME", &Utc::now().to_rfc3339(), "")?;
        if let Some(source_path) = source {
            dataset.set_metadata_item("SOURCE_FILE", &source_path.display().to_string(), "")?;
        }

        log::info!("✅ GeoTIFF written: {}", output_path.as_ref().display());
        Ok(())
    }
}
