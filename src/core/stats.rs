use crate::io::RasterReader;
use crate::types::{BandArray, RasterError, RasterResult};
use serde::{Deserialize, Serialize};

/// Per-band statistics over valid pixels
///
/// Pixels equal to the nodata value, and NaN pixels, are excluded from the
/// moments and counted separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub valid_count: usize,
    pub nodata_count: usize,
}

impl BandStatistics {
    /// Compute statistics from an in-memory band array
    pub fn from_array(data: &BandArray, nodata: Option<f64>) -> RasterResult<Self> {
        let acc = accumulate(data, nodata);

        if acc.valid == 0 {
            return Err(RasterError::Processing(
                "band contains no valid pixels".to_string(),
            ));
        }

        let mean = acc.sum / acc.valid as f64;
        let variance = acc.sum_sq / acc.valid as f64 - mean * mean;

        Ok(BandStatistics {
            min: acc.min,
            max: acc.max,
            mean,
            std_dev: variance.max(0.0).sqrt(),
            valid_count: acc.valid,
            nodata_count: acc.masked,
        })
    }

    /// Read a band through the dataset handle and compute its statistics
    pub fn from_band(reader: &RasterReader, band: usize) -> RasterResult<Self> {
        let nodata = reader.nodata(band)?;
        let data = reader.read_band(band)?;
        let stats = Self::from_array(&data, nodata)?;

        log::info!(
            "Band {} statistics: min={:.4}, max={:.4}, mean={:.4}, std_dev={:.4} ({} valid, {} nodata)",
            band,
            stats.min,
            stats.max,
            stats.mean,
            stats.std_dev,
            stats.valid_count,
            stats.nodata_count
        );
        Ok(stats)
    }
}

#[derive(Clone, Copy)]
struct Accumulator {
    min: f64,
    max: f64,
    sum: f64,
    sum_sq: f64,
    valid: usize,
    masked: usize,
}

impl Accumulator {
    fn empty() -> Self {
        Accumulator {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
            sum_sq: 0.0,
            valid: 0,
            masked: 0,
        }
    }

    fn push(mut self, value: f32, nodata: Option<f64>) -> Self {
        if value.is_nan() || nodata.map_or(false, |nd| f64::from(value) == nd) {
            self.masked += 1;
            return self;
        }
        let v = f64::from(value);
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        self.sum += v;
        self.sum_sq += v * v;
        self.valid += 1;
        self
    }

    fn merge(mut self, other: Accumulator) -> Self {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        self.valid += other.valid;
        self.masked += other.masked;
        self
    }
}

#[cfg(feature = "parallel")]
fn accumulate(data: &BandArray, nodata: Option<f64>) -> Accumulator {
    use rayon::prelude::*;

    match data.as_slice() {
        Some(slice) => slice
            .par_iter()
            .fold(Accumulator::empty, |acc, &v| acc.push(v, nodata))
            .reduce(Accumulator::empty, |a, b| a.merge(b)),
        None => accumulate_serial(data, nodata),
    }
}

#[cfg(not(feature = "parallel"))]
fn accumulate(data: &BandArray, nodata: Option<f64>) -> Accumulator {
    accumulate_serial(data, nodata)
}

fn accumulate_serial(data: &BandArray, nodata: Option<f64>) -> Accumulator {
    data.iter()
        .fold(Accumulator::empty(), |acc, &v| acc.push(v, nodata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_statistics_with_nodata() {
        let data = array![[1.0_f32, 2.0, -9999.0], [3.0, 4.0, -9999.0]];
        let stats = BandStatistics::from_array(&data, Some(-9999.0)).unwrap();

        assert_eq!(stats.valid_count, 4);
        assert_eq!(stats.nodata_count, 2);
        assert_abs_diff_eq!(stats.min, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.max, 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.mean, 2.5, epsilon = 1e-12);
        // Population std dev of {1, 2, 3, 4}
        assert_abs_diff_eq!(stats.std_dev, 1.118033988749895, epsilon = 1e-9);
    }

    #[test]
    fn test_nan_pixels_are_masked() {
        let data = array![[f32::NAN, 5.0], [5.0, f32::NAN]];
        let stats = BandStatistics::from_array(&data, None).unwrap();

        assert_eq!(stats.valid_count, 2);
        assert_eq!(stats.nodata_count, 2);
        assert_abs_diff_eq!(stats.std_dev, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_all_nodata_errors() {
        let data = array![[0.0_f32, 0.0], [0.0, 0.0]];
        let result = BandStatistics::from_array(&data, Some(0.0));
        assert!(result.is_err());
    }
}
