//! RasterOps: A Fast, Modular Raster Clipping and Reprojection Toolkit
//!
//! This library provides building blocks for working with satellite raster
//! imagery: opening datasets and inspecting band statistics, clipping imagery
//! to area-of-interest polygons, and reprojecting it to new coordinate
//! reference systems. Every substantive operation delegates to GDAL.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use numpy::ToPyArray;

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    BandArray, BoundingBox, GeoTransform, RasterError, RasterMetadata, RasterResult,
    ResampleMethod, TargetGrid,
};

pub use io::{AoiReader, GeoTiffWriter, RasterReader};

/// Convert Array2<f32> to a numpy array
fn array2_to_numpy(py: Python, arr: &ndarray::Array2<f32>) -> PyResult<PyObject> {
    Ok(arr.to_pyarray(py).into())
}

fn parse_resampling(resampling: Option<String>) -> PyResult<ResampleMethod> {
    match resampling {
        Some(name) => ResampleMethod::from_name(&name)
            .ok_or_else(|| PyValueError::new_err(format!("Invalid resampling method: {}", name))),
        None => Ok(ResampleMethod::Nearest),
    }
}

/// Python wrapper for RasterReader
#[pyclass(name = "RasterDataset")]
struct PyRasterDataset {
    inner: RasterReader,
}

#[pymethods]
impl PyRasterDataset {
    #[new]
    fn new(path: String) -> PyResult<Self> {
        let reader = RasterReader::open(&path).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to open raster: {}",
                e
            ))
        })?;
        Ok(PyRasterDataset { inner: reader })
    }

    #[getter]
    fn width(&self) -> usize {
        self.inner.size().0
    }

    #[getter]
    fn height(&self) -> usize {
        self.inner.size().1
    }

    #[getter]
    fn band_count(&self) -> usize {
        self.inner.band_count()
    }

    #[getter]
    fn crs(&self) -> PyResult<Option<String>> {
        self.inner.crs().map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to read CRS: {}",
                e
            ))
        })
    }

    #[getter]
    fn nodata(&self) -> PyResult<Option<f64>> {
        self.inner.nodata(1).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to read nodata value: {}",
                e
            ))
        })
    }

    /// Affine transform as GDAL's six coefficients
    fn transform(&self) -> PyResult<Vec<f64>> {
        let transform = self.inner.transform().map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to read transform: {}",
                e
            ))
        })?;
        Ok(transform.to_gdal().to_vec())
    }

    /// Geospatial extent as (min_x, min_y, max_x, max_y)
    fn bounds(&self) -> PyResult<(f64, f64, f64, f64)> {
        let (width, height) = self.inner.size();
        let transform = self.inner.transform().map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to read transform: {}",
                e
            ))
        })?;
        let bounds = transform.bounds(width, height);
        Ok((bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y))
    }

    /// Full metadata summary as a dict
    fn metadata(&self, py: Python) -> PyResult<PyObject> {
        let metadata = self.inner.metadata().map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to read metadata: {}",
                e
            ))
        })?;

        let result = PyDict::new(py);
        result.set_item("width", metadata.width)?;
        result.set_item("height", metadata.height)?;
        result.set_item("band_count", metadata.band_count)?;
        result.set_item("data_type", metadata.data_type)?;
        result.set_item("crs", metadata.crs)?;
        result.set_item("transform", metadata.transform.to_gdal().to_vec())?;
        result.set_item("nodata", metadata.nodata)?;
        result.set_item(
            "bounds",
            (
                metadata.bounds.min_x,
                metadata.bounds.min_y,
                metadata.bounds.max_x,
                metadata.bounds.max_y,
            ),
        )?;
        result.set_item("driver", metadata.driver)?;
        Ok(result.into())
    }

    /// Read a band (1-based index) as a float32 numpy array
    fn read(&self, py: Python, band: usize) -> PyResult<PyObject> {
        let data = self.inner.read_band(band).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to read band {}: {}",
                band, e
            ))
        })?;
        array2_to_numpy(py, &data)
    }

    /// Read a pixel window of a band as a float32 numpy array
    fn read_window(
        &self,
        py: Python,
        band: usize,
        col_off: usize,
        row_off: usize,
        width: usize,
        height: usize,
    ) -> PyResult<PyObject> {
        let data = self
            .inner
            .read_band_window(band, (col_off, row_off), (width, height))
            .map_err(|e| {
                PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                    "Failed to read band {} window: {}",
                    band, e
                ))
            })?;
        array2_to_numpy(py, &data)
    }

    /// Nodata-aware statistics for a band (1-based index)
    fn statistics(&self, py: Python, band: usize) -> PyResult<PyObject> {
        use crate::core::stats::BandStatistics;

        let stats = BandStatistics::from_band(&self.inner, band).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to compute statistics for band {}: {}",
                band, e
            ))
        })?;

        let result = PyDict::new(py);
        result.set_item("min", stats.min)?;
        result.set_item("max", stats.max)?;
        result.set_item("mean", stats.mean)?;
        result.set_item("std_dev", stats.std_dev)?;
        result.set_item("valid_count", stats.valid_count)?;
        result.set_item("nodata_count", stats.nodata_count)?;
        Ok(result.into())
    }
}

/// Clip a raster to the polygons of an AOI vector file
#[pyfunction]
fn clip_raster(
    py: Python,
    raster_path: String,
    aoi_path: String,
    output_path: String,
) -> PyResult<PyObject> {
    use crate::core::pipeline;

    let summary = pipeline::clip_raster(&raster_path, &aoi_path, &output_path)
        .map_err(|e| PyValueError::new_err(format!("Clip failed: {}", e)))?;

    let result = PyDict::new(py);
    result.set_item("output_path", summary.output_path)?;
    result.set_item("width", summary.width)?;
    result.set_item("height", summary.height)?;
    result.set_item("band_count", summary.band_count)?;
    result.set_item("transform", summary.transform.to_gdal().to_vec())?;
    result.set_item("nodata", summary.nodata)?;
    result.set_item("masked_percent", summary.masked_percent)?;
    Ok(result.into())
}

/// Derive the output grid for reprojecting a raster to a target CRS
#[pyfunction]
fn calculate_target_grid(
    py: Python,
    raster_path: String,
    target_crs: String,
    resolution: Option<f64>,
) -> PyResult<PyObject> {
    use crate::core::reproject;

    let reader = RasterReader::open(&raster_path).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("Failed to open raster: {}", e))
    })?;
    let transform = reader.transform().map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
            "Failed to read transform: {}",
            e
        ))
    })?;
    let (width, height) = reader.size();
    let src_srs = reader.spatial_ref().map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("Failed to read CRS: {}", e))
    })?;
    let dst_srs = reproject::parse_crs(&target_crs)
        .map_err(|e| PyValueError::new_err(format!("Invalid target CRS: {}", e)))?;

    let grid = reproject::calculate_default_transform(
        &transform, width, height, &src_srs, &dst_srs, resolution,
    )
    .map_err(|e| PyValueError::new_err(format!("Grid calculation failed: {}", e)))?;

    let result = PyDict::new(py);
    result.set_item("transform", grid.transform.to_gdal().to_vec())?;
    result.set_item("width", grid.width)?;
    result.set_item("height", grid.height)?;
    result.set_item("crs", grid.crs)?;
    Ok(result.into())
}

/// Reproject a raster to a target CRS
#[pyfunction]
fn reproject_raster(
    py: Python,
    raster_path: String,
    target_crs: String,
    output_path: String,
    resampling: Option<String>,
    resolution: Option<f64>,
) -> PyResult<PyObject> {
    use crate::core::pipeline;

    let method = parse_resampling(resampling)?;
    let summary = pipeline::reproject_raster(
        &raster_path,
        &target_crs,
        &output_path,
        method,
        resolution,
    )
    .map_err(|e| PyValueError::new_err(format!("Reprojection failed: {}", e)))?;

    let result = PyDict::new(py);
    result.set_item("output_path", summary.output_path)?;
    result.set_item("width", summary.width)?;
    result.set_item("height", summary.height)?;
    result.set_item("band_count", summary.band_count)?;
    result.set_item("crs", summary.crs)?;
    result.set_item("transform", summary.transform.to_gdal().to_vec())?;
    result.set_item("resampling", summary.resampling.to_string())?;
    result.set_item("nodata", summary.nodata)?;
    Ok(result.into())
}

/// Clip a raster to an AOI, then reproject the result to a target CRS
#[pyfunction]
fn clip_and_reproject(
    py: Python,
    raster_path: String,
    aoi_path: String,
    output_path: String,
    target_crs: String,
    resampling: Option<String>,
    resolution: Option<f64>,
) -> PyResult<PyObject> {
    use crate::core::pipeline;

    let method = parse_resampling(resampling)?;
    let summary = pipeline::clip_and_reproject(
        &raster_path,
        &aoi_path,
        &output_path,
        &target_crs,
        method,
        resolution,
    )
    .map_err(|e| PyValueError::new_err(format!("Pipeline failed: {}", e)))?;

    let result = PyDict::new(py);
    result.set_item("output_path", summary.reproject.output_path)?;
    result.set_item("width", summary.reproject.width)?;
    result.set_item("height", summary.reproject.height)?;
    result.set_item("band_count", summary.reproject.band_count)?;
    result.set_item("crs", summary.reproject.crs)?;
    result.set_item("transform", summary.reproject.transform.to_gdal().to_vec())?;
    result.set_item("clip_width", summary.clip.width)?;
    result.set_item("clip_height", summary.clip.height)?;
    result.set_item("masked_percent", summary.clip.masked_percent)?;
    Ok(result.into())
}

/// Python module definition
#[pymodule]
fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
    // Dataset handle
    m.add_class::<PyRasterDataset>()?;

    // Clip to an AOI
    m.add_function(wrap_pyfunction!(clip_raster, m)?)?;

    // Transform calculation
    m.add_function(wrap_pyfunction!(calculate_target_grid, m)?)?;

    // Resampling / reprojection
    m.add_function(wrap_pyfunction!(reproject_raster, m)?)?;

    // Complete pipeline
    m.add_function(wrap_pyfunction!(clip_and_reproject, m)?)?;

    Ok(())
}
