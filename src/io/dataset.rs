use crate::types::{BandArray, GeoTransform, RasterError, RasterMetadata, RasterResult};
use gdal::spatial_ref::SpatialRef;
use gdal::Dataset;
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// Raster dataset handle
///
/// Owns the underlying GDAL dataset for its lifetime; the file is released
/// when the reader is dropped.
pub struct RasterReader {
    path: PathBuf,
    dataset: Dataset,
}

impl RasterReader {
    /// Open a raster file
    pub fn open<P: AsRef<Path>>(path: P) -> RasterResult<Self> {
        log::info!("Opening raster: {}", path.as_ref().display());

        let dataset = Dataset::open(path.as_ref())?;
        let (width, height) = dataset.raster_size();
        log::debug!(
            "Raster size: {}x{}, {} band(s)",
            width,
            height,
            dataset.raster_count()
        );

        Ok(RasterReader {
            path: path.as_ref().to_path_buf(),
            dataset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Borrow the underlying GDAL dataset
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Pixel dimensions as (width, height)
    pub fn size(&self) -> (usize, usize) {
        self.dataset.raster_size()
    }

    /// Number of raster bands
    pub fn band_count(&self) -> usize {
        self.dataset.raster_count() as usize
    }

    /// Affine transform of the dataset grid
    pub fn transform(&self) -> RasterResult<GeoTransform> {
        let gt = self.dataset.geo_transform().map_err(|e| {
            RasterError::Metadata(format!(
                "no geotransform on {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(GeoTransform::from_gdal(&gt))
    }

    /// Spatial reference of the dataset
    pub fn spatial_ref(&self) -> RasterResult<SpatialRef> {
        Ok(self.dataset.spatial_ref()?)
    }

    /// CRS descriptor: `EPSG:code` when an authority code is known, WKT otherwise
    pub fn crs(&self) -> RasterResult<Option<String>> {
        if self.dataset.projection().is_empty() {
            return Ok(None);
        }
        let srs = self.dataset.spatial_ref()?;
        match srs.auth_code() {
            Ok(code) => Ok(Some(format!("EPSG:{}", code))),
            Err(_) => Ok(Some(srs.to_wkt()?)),
        }
    }

    /// Nodata value of a band (1-based index)
    pub fn nodata(&self, band: usize) -> RasterResult<Option<f64>> {
        let rasterband = self.dataset.rasterband(self.checked_band(band)?)?;
        Ok(rasterband.no_data_value())
    }

    /// Full metadata summary for the dataset
    pub fn metadata(&self) -> RasterResult<RasterMetadata> {
        let (width, height) = self.dataset.raster_size();
        let transform = self.transform()?;
        let rasterband = self.dataset.rasterband(1)?;
        let data_type = format!("{:?}", rasterband.band_type());

        let metadata = RasterMetadata {
            width,
            height,
            band_count: self.band_count(),
            data_type,
            crs: self.crs()?,
            transform,
            nodata: rasterband.no_data_value(),
            bounds: transform.bounds(width, height),
            driver: self.dataset.driver().short_name(),
        };
        log::debug!("Raster metadata: {:?}", metadata);

        Ok(metadata)
    }

    /// Read an entire band into a 2D array (1-based index)
    pub fn read_band(&self, band: usize) -> RasterResult<BandArray> {
        let (width, height) = self.dataset.raster_size();
        self.read_band_window(band, (0, 0), (width, height))
    }

    /// Read a pixel window of a band into a 2D array
    ///
    /// `offset` is (column, row) of the window's top-left pixel, `size` is
    /// (width, height) in pixels.
    pub fn read_band_window(
        &self,
        band: usize,
        offset: (usize, usize),
        size: (usize, usize),
    ) -> RasterResult<BandArray> {
        let (width, height) = self.dataset.raster_size();
        if offset.0 + size.0 > width || offset.1 + size.1 > height {
            return Err(RasterError::InvalidInput(format!(
                "window {:?}+{:?} exceeds raster extent {}x{}",
                offset, size, width, height
            )));
        }

        log::debug!(
            "Reading band {} window at {:?}, size {:?}",
            band,
            offset,
            size
        );
        let rasterband = self.dataset.rasterband(self.checked_band(band)?)?;
        let buffer = rasterband.read_as::<f32>(
            (offset.0 as isize, offset.1 as isize),
            size,
            size,
            None,
        )?;

        Array2::from_shape_vec((size.1, size.0), buffer.data)
            .map_err(|e| RasterError::Processing(format!("Failed to reshape band data: {}", e)))
    }

    /// GDAL's statistics for a band (1-based index), forcing computation
    pub fn gdal_statistics(&self, band: usize) -> RasterResult<gdal::raster::StatisticsAll> {
        let rasterband = self.dataset.rasterband(self.checked_band(band)?)?;
        rasterband
            .get_statistics(true, true)?
            .ok_or_else(|| RasterError::Processing("band statistics unavailable".to_string()))
    }

    fn checked_band(&self, band: usize) -> RasterResult<isize> {
        let count = self.dataset.raster_count();
        if band == 0 || band as isize > count {
            return Err(RasterError::InvalidInput(format!(
                "band index {} out of range (dataset has {} band(s))",
                band, count
            )));
        }
        Ok(band as isize)
    }
}
