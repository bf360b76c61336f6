use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// 2D raster band data (rows x columns)
pub type BandArray = Array2<f32>;

/// Resampling algorithms exposed for reprojection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResampleMethod {
    Nearest,
    Bilinear,
    Cubic,
    CubicSpline,
    Lanczos,
    Average,
    Mode,
}

impl ResampleMethod {
    /// Parse a resampling method by name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "nearest" | "near" => Some(ResampleMethod::Nearest),
            "bilinear" => Some(ResampleMethod::Bilinear),
            "cubic" => Some(ResampleMethod::Cubic),
            "cubicspline" | "cubic_spline" => Some(ResampleMethod::CubicSpline),
            "lanczos" => Some(ResampleMethod::Lanczos),
            "average" => Some(ResampleMethod::Average),
            "mode" => Some(ResampleMethod::Mode),
            _ => None,
        }
    }

    /// Map onto the warp API's algorithm constant
    pub fn to_warp_alg(self) -> gdal_sys::GDALResampleAlg::Type {
        use gdal_sys::GDALResampleAlg;
        match self {
            ResampleMethod::Nearest => GDALResampleAlg::GRA_NearestNeighbour,
            ResampleMethod::Bilinear => GDALResampleAlg::GRA_Bilinear,
            ResampleMethod::Cubic => GDALResampleAlg::GRA_Cubic,
            ResampleMethod::CubicSpline => GDALResampleAlg::GRA_CubicSpline,
            ResampleMethod::Lanczos => GDALResampleAlg::GRA_Lanczos,
            ResampleMethod::Average => GDALResampleAlg::GRA_Average,
            ResampleMethod::Mode => GDALResampleAlg::GRA_Mode,
        }
    }
}

impl std::fmt::Display for ResampleMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResampleMethod::Nearest => write!(f, "nearest"),
            ResampleMethod::Bilinear => write!(f, "bilinear"),
            ResampleMethod::Cubic => write!(f, "cubic"),
            ResampleMethod::CubicSpline => write!(f, "cubic_spline"),
            ResampleMethod::Lanczos => write!(f, "lanczos"),
            ResampleMethod::Average => write!(f, "average"),
            ResampleMethod::Mode => write!(f, "mode"),
        }
    }
}

/// Geospatial bounding box in CRS units
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Union of two boxes
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Intersection of two boxes, None when disjoint
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let min_x = self.min_x.max(other.min_x);
        let min_y = self.min_y.max(other.min_y);
        let max_x = self.max_x.min(other.max_x);
        let max_y = self.max_y.min(other.max_y);
        if min_x < max_x && min_y < max_y {
            Some(BoundingBox {
                min_x,
                min_y,
                max_x,
                max_y,
            })
        } else {
            None
        }
    }
}

/// Geospatial transformation parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Build from GDAL's six-coefficient array
    pub fn from_gdal(gt: &[f64; 6]) -> Self {
        GeoTransform {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    /// Convert back to GDAL's coefficient order
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    /// True when the grid has no rotation terms
    pub fn is_north_up(&self) -> bool {
        self.rotation_x == 0.0 && self.rotation_y == 0.0
    }

    /// Map a pixel (column, row) to its geospatial coordinate (top-left corner)
    pub fn pixel_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.top_left_x + col * self.pixel_width + row * self.rotation_x;
        let y = self.top_left_y + col * self.rotation_y + row * self.pixel_height;
        (x, y)
    }

    /// Map a geospatial coordinate to fractional pixel (column, row)
    ///
    /// Assumes a north-up grid; callers reject rotated rasters before
    /// windowed arithmetic.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let col = (x - self.top_left_x) / self.pixel_width;
        let row = (y - self.top_left_y) / self.pixel_height;
        (col, row)
    }

    /// Geospatial extent of a grid with the given pixel dimensions
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let (x0, y0) = self.pixel_to_geo(0.0, 0.0);
        let (x1, y1) = self.pixel_to_geo(width as f64, height as f64);
        BoundingBox {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// Transform for a sub-window anchored at pixel (col_off, row_off)
    pub fn for_window(&self, col_off: usize, row_off: usize) -> GeoTransform {
        let (x, y) = self.pixel_to_geo(col_off as f64, row_off as f64);
        GeoTransform {
            top_left_x: x,
            top_left_y: y,
            ..*self
        }
    }
}

/// Raster dataset metadata as reported by the dataset handle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterMetadata {
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub data_type: String,
    pub crs: Option<String>,
    pub transform: GeoTransform,
    pub nodata: Option<f64>,
    pub bounds: BoundingBox,
    pub driver: String,
}

/// Output grid produced by the transform calculation step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetGrid {
    pub transform: GeoTransform,
    pub width: usize,
    pub height: usize,
    pub crs: String,
}

/// Error types for raster operations
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for raster operations
pub type RasterResult<T> = Result<T, RasterError>;
