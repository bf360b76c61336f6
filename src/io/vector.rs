use crate::types::{BoundingBox, RasterError, RasterResult};
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{Geometry, LayerAccess};
use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use std::path::{Path, PathBuf};

/// Area-of-interest reader
///
/// Loads polygon geometries from a vector file (GeoJSON, Shapefile, anything
/// GDAL's vector drivers handle). Geometries are owned copies tagged with the
/// layer CRS so they can be reprojected into a raster's CRS before masking.
pub struct AoiReader {
    path: PathBuf,
    geometries: Vec<Geometry>,
    srs: SpatialRef,
}

impl AoiReader {
    /// Open a vector file and collect the polygon features of its first layer
    pub fn open<P: AsRef<Path>>(path: P) -> RasterResult<Self> {
        log::info!("Opening AOI vector file: {}", path.as_ref().display());

        let dataset = Dataset::open_ex(
            path.as_ref(),
            DatasetOptions {
                open_flags: GdalOpenFlags::GDAL_OF_VECTOR,
                ..Default::default()
            },
        )?;
        let mut layer = dataset.layer(0)?;

        let mut geometries: Vec<Geometry> = Vec::new();
        let mut srs: Option<SpatialRef> = None;
        let mut skipped = 0usize;

        for feature in layer.features() {
            let geometry = feature.geometry_by_index(0)?;
            match geometry.geometry_type() {
                gdal_sys::OGRwkbGeometryType::wkbPolygon
                | gdal_sys::OGRwkbGeometryType::wkbMultiPolygon => {}
                _ => {
                    skipped += 1;
                    continue;
                }
            }

            if srs.is_none() {
                srs = geometry.spatial_ref();
            }

            // Own the geometry independently of the feature's lifetime
            let wkt = geometry.wkt()?;
            geometries.push(Geometry::from_wkt(&wkt)?);
        }

        if skipped > 0 {
            log::warn!("Skipped {} non-polygon feature(s) in AOI layer", skipped);
        }
        if geometries.is_empty() {
            return Err(RasterError::InvalidInput(format!(
                "no polygon features found in {}",
                path.as_ref().display()
            )));
        }

        let srs = match srs {
            Some(srs) => srs,
            None => {
                // GeoJSON without an explicit CRS is WGS84 longitude/latitude
                log::warn!("AOI layer declares no CRS, assuming EPSG:4326");
                let wgs84 = SpatialRef::from_epsg(4326)?;
                wgs84.set_axis_mapping_strategy(
                    gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER,
                );
                wgs84
            }
        };

        for geometry in geometries.iter_mut() {
            geometry.set_spatial_ref(srs.clone());
        }
        log::info!("Loaded {} AOI polygon(s)", geometries.len());

        Ok(AoiReader {
            path: path.as_ref().to_path_buf(),
            geometries,
            srs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// CRS of the AOI layer
    pub fn srs(&self) -> &SpatialRef {
        &self.srs
    }

    /// Polygon geometries in their native CRS
    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    /// Polygon geometries reprojected to a target CRS
    pub fn to_crs(&self, target: &SpatialRef) -> RasterResult<Vec<Geometry>> {
        log::debug!("Reprojecting {} AOI polygon(s)", self.geometries.len());
        let mut reprojected = Vec::with_capacity(self.geometries.len());
        for geometry in &self.geometries {
            let mut transformed = geometry.transform_to(target)?;
            transformed.set_spatial_ref(target.clone());
            reprojected.push(transformed);
        }
        Ok(reprojected)
    }

    /// Union envelope of all polygons in the native CRS
    pub fn envelope(&self) -> BoundingBox {
        envelope_of(&self.geometries)
    }
}

/// Union envelope of a set of geometries
pub fn envelope_of(geometries: &[Geometry]) -> BoundingBox {
    let mut bounds: Option<BoundingBox> = None;
    for geometry in geometries {
        let envelope = geometry.envelope();
        let geometry_bounds = BoundingBox {
            min_x: envelope.MinX,
            min_y: envelope.MinY,
            max_x: envelope.MaxX,
            max_y: envelope.MaxY,
        };
        bounds = Some(match bounds {
            Some(current) => current.union(&geometry_bounds),
            None => geometry_bounds,
        });
    }
    // Callers guarantee at least one geometry
    bounds.unwrap_or(BoundingBox {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 0.0,
        max_y: 0.0,
    })
}
