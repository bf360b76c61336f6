use approx::assert_abs_diff_eq;
use gdal::spatial_ref::SpatialRef;
use ndarray::Array2;
use rasterops::core::{clip_and_reproject, reproject_raster, ReprojectionProcessor};
use rasterops::io::{GeoTiffWriter, RasterReader};
use rasterops::types::{GeoTransform, ResampleMethod};
use std::path::Path;
use tempfile::TempDir;

/// 20x10 gradient raster with origin (10, 50) and 0.1 degree pixels,
/// so the extent is x [10, 12], y [49, 50] in EPSG:4326.
fn write_test_raster(path: &Path) {
    let band = Array2::from_shape_fn((10, 20), |(row, col)| (row * 20 + col) as f32);
    let transform = GeoTransform {
        top_left_x: 10.0,
        pixel_width: 0.1,
        rotation_x: 0.0,
        top_left_y: 50.0,
        rotation_y: 0.0,
        pixel_height: -0.1,
    };
    let srs = SpatialRef::from_epsg(4326).expect("Failed to build EPSG:4326");
    GeoTiffWriter::new()
        .write_band(path, &band, &transform, &srs, None, None)
        .expect("Failed to write test raster");
}

#[test]
fn test_identity_reprojection_preserves_grid() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let raster_path = temp_dir.path().join("source.tif");
    let output_path = temp_dir.path().join("same_crs.tif");

    write_test_raster(&raster_path);

    let reader = RasterReader::open(&raster_path).expect("Failed to open raster");
    let summary = ReprojectionProcessor::new(ResampleMethod::Nearest)
        .reproject(&reader, "EPSG:4326", &output_path)
        .expect("Reprojection failed");

    assert_eq!(summary.width, 20);
    assert_eq!(summary.height, 10);
    assert_eq!(summary.crs, "EPSG:4326");
    assert_abs_diff_eq!(summary.transform.top_left_x, 10.0, epsilon = 1e-6);
    assert_abs_diff_eq!(summary.transform.top_left_y, 50.0, epsilon = 1e-6);
    assert_abs_diff_eq!(summary.transform.pixel_width, 0.1, epsilon = 1e-6);

    let output = RasterReader::open(&output_path).expect("Failed to reopen output");
    assert_eq!(output.size(), (20, 10));
    // Source has no nodata, so the output gets the 0.0 default
    assert_eq!(output.nodata(1).expect("Failed to read nodata"), Some(0.0));

    // Same grid plus nearest resampling leaves every pixel untouched
    let data = output.read_band(1).expect("Failed to read band");
    assert_eq!(data[(0, 0)], 0.0);
    assert_eq!(data[(0, 19)], 19.0);
    assert_eq!(data[(9, 0)], 180.0);
    assert_eq!(data[(9, 19)], 199.0);
    assert_eq!(data[(5, 10)], 110.0);

    println!("✅ Identity reprojection preserved the grid");
}

#[test]
fn test_reproject_to_web_mercator() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let raster_path = temp_dir.path().join("source.tif");
    let output_path = temp_dir.path().join("mercator.tif");

    write_test_raster(&raster_path);

    let summary = reproject_raster(
        &raster_path,
        "EPSG:3857",
        &output_path,
        ResampleMethod::Bilinear,
        None,
    )
    .expect("Reprojection failed");

    assert_eq!(summary.crs, "EPSG:3857");
    // The x extent spans lon 10..12, and x/20 sets the square pixel size
    assert_eq!(summary.width, 20);
    assert!(
        (14..=17).contains(&summary.height),
        "Unexpected height: {}",
        summary.height
    );
    assert_abs_diff_eq!(
        summary.transform.pixel_width,
        -summary.transform.pixel_height,
        epsilon = 1e-6
    );

    let output = RasterReader::open(&output_path).expect("Failed to reopen output");
    assert_eq!(
        output.crs().expect("Failed to read CRS"),
        Some("EPSG:3857".to_string())
    );
    let metadata = output.metadata().expect("Failed to read metadata");
    // Web Mercator x for lon 10 and lon 12
    assert_abs_diff_eq!(metadata.bounds.min_x, 1113194.9079, epsilon = 1e-2);
    assert_abs_diff_eq!(metadata.bounds.max_x, 1335833.8895, epsilon = 1e-2);

    println!(
        "✅ Reprojected to Web Mercator: {}x{} at {:.1} m pixels",
        summary.width, summary.height, summary.transform.pixel_width
    );
}

#[test]
fn test_utm_border_pixels_are_nodata() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let raster_path = temp_dir.path().join("source.tif");
    let output_path = temp_dir.path().join("utm.tif");

    // Explicit nodata distinct from the gradient values, so any nodata in
    // the output must come from the pre-filled border
    let band = Array2::from_shape_fn((10, 20), |(row, col)| (row * 20 + col) as f32);
    let transform = GeoTransform {
        top_left_x: 10.0,
        pixel_width: 0.1,
        rotation_x: 0.0,
        top_left_y: 50.0,
        rotation_y: 0.0,
        pixel_height: -0.1,
    };
    let srs = SpatialRef::from_epsg(4326).expect("Failed to build EPSG:4326");
    GeoTiffWriter::new()
        .write_band(&raster_path, &band, &transform, &srs, Some(-9999.0), None)
        .expect("Failed to write test raster");

    // UTM zone 32N covers lon 6..12; the lon/lat rectangle maps to a
    // trapezoid, so the output grid corners fall outside the footprint
    let summary = reproject_raster(
        &raster_path,
        "EPSG:32632",
        &output_path,
        ResampleMethod::Nearest,
        None,
    )
    .expect("Reprojection failed");
    assert_eq!(summary.crs, "EPSG:32632");
    assert_abs_diff_eq!(summary.nodata, -9999.0, epsilon = 1e-9);

    let output = RasterReader::open(&output_path).expect("Failed to reopen output");
    let stats = rasterops::core::BandStatistics::from_band(&output, 1)
        .expect("Failed to compute statistics");
    assert!(
        stats.nodata_count > 0,
        "Expected unmapped border pixels filled with nodata"
    );
    // Valid pixels carry source values only
    assert!(stats.min >= 0.0 && stats.max <= 199.0);

    println!(
        "✅ UTM output has {} nodata border pixel(s) of {}",
        stats.nodata_count,
        stats.nodata_count + stats.valid_count
    );
}

#[test]
fn test_resolution_override() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let raster_path = temp_dir.path().join("source.tif");
    let output_path = temp_dir.path().join("resampled.tif");

    write_test_raster(&raster_path);

    let summary = reproject_raster(
        &raster_path,
        "EPSG:4326",
        &output_path,
        ResampleMethod::Average,
        Some(0.05),
    )
    .expect("Reprojection failed");

    // 2 x 1 degree extent at 0.05 degree pixels
    assert_eq!(summary.width, 40);
    assert_eq!(summary.height, 20);
    assert_abs_diff_eq!(summary.transform.pixel_width, 0.05, epsilon = 1e-6);

    let output = RasterReader::open(&output_path).expect("Failed to reopen output");
    assert_eq!(output.size(), (40, 20));
}

#[test]
fn test_invalid_target_crs_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let raster_path = temp_dir.path().join("source.tif");
    let output_path = temp_dir.path().join("never_written.tif");

    write_test_raster(&raster_path);

    let result = reproject_raster(
        &raster_path,
        "not_a_crs",
        &output_path,
        ResampleMethod::Nearest,
        None,
    );
    assert!(result.is_err(), "Bogus CRS should fail");
    assert!(!output_path.exists(), "No output should be created");
}

#[test]
fn test_rotated_raster_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let raster_path = temp_dir.path().join("rotated.tif");
    let output_path = temp_dir.path().join("never_written.tif");

    let band = Array2::from_shape_fn((10, 20), |(row, col)| (row * 20 + col) as f32);
    let rotated = GeoTransform {
        top_left_x: 10.0,
        pixel_width: 0.1,
        rotation_x: 0.05,
        top_left_y: 50.0,
        rotation_y: 0.05,
        pixel_height: -0.1,
    };
    let srs = SpatialRef::from_epsg(4326).expect("Failed to build EPSG:4326");
    GeoTiffWriter::new()
        .write_band(&raster_path, &band, &rotated, &srs, None, None)
        .expect("Failed to write rotated raster");

    let result = reproject_raster(
        &raster_path,
        "EPSG:4326",
        &output_path,
        ResampleMethod::Nearest,
        None,
    );
    let err = result.expect_err("Rotated raster should be rejected");
    assert!(
        err.to_string().contains("rotated"),
        "Unexpected error: {}",
        err
    );
    assert!(!output_path.exists(), "No output should be created");
}

#[test]
fn test_clip_and_reproject_pipeline() {
    // Initialize logging
    env_logger::init();

    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let raster_path = temp_dir.path().join("source.tif");
    let aoi_path = temp_dir.path().join("aoi.geojson");
    let output_path = temp_dir.path().join("final.tif");

    write_test_raster(&raster_path);
    let geojson = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {},
      "geometry": {
        "type": "Polygon",
        "coordinates": [[
          [10.5, 49.2],
          [11.5, 49.2],
          [11.5, 49.8],
          [10.5, 49.8],
          [10.5, 49.2]
        ]]
      }
    }
  ]
}"#;
    std::fs::write(&aoi_path, geojson).expect("Failed to write AOI file");

    let summary = clip_and_reproject(
        &raster_path,
        &aoi_path,
        &output_path,
        "EPSG:3857",
        ResampleMethod::Nearest,
        None,
    )
    .expect("Pipeline failed");

    // Clip stage crops to the AOI window
    assert_eq!(summary.clip.width, 10);
    assert_eq!(summary.clip.height, 6);
    // Reproject stage lands on the target CRS
    assert_eq!(summary.reproject.crs, "EPSG:3857");
    assert!(summary.reproject.width > 0 && summary.reproject.height > 0);

    let output = RasterReader::open(&output_path).expect("Failed to reopen output");
    assert_eq!(
        output.crs().expect("Failed to read CRS"),
        Some("EPSG:3857".to_string())
    );

    println!(
        "✅ Pipeline produced {}x{} output in {}",
        summary.reproject.width, summary.reproject.height, summary.reproject.crs
    );
}
