use gdal::Dataset;
use gdal::errors::GdalError as GdalCrateError;
use gdal::spatial_ref::{AxisMappingStrategy, SpatialRef};
use geo::Rect;
use ndarray::Array2;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::geometry::raster_footprint;

/// Errors encountered when using the GDAL raster and vector readers
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Dimension mismatch: expected {0}x{1}, got {2} values")]
    DimensionMismatch(usize, usize, usize),
    #[error("{path}: missing geotransform")]
    MissingGeoTransform { path: PathBuf },
    #[error("gdalwarp failed: {0}")]
    Warp(String),
}

/// Metadata extracted from a GDAL-supported raster
#[derive(Debug, Clone)]
pub struct RasterMetadata {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
    /// Affine geotransform coefficients
    /// ([origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height])
    pub geotransform: [f64; 6],
    /// Projection in WKT format, empty when the file carries none
    pub projection: String,
}

/// Reader for georeferenced rasters (JPEG2000 bands, GeoTIFF LST products)
pub struct RasterReader {
    pub path: PathBuf,
    pub dataset: Dataset,
    pub metadata: RasterMetadata,
}

// Helper to extract EPSG code from WKT authority tag
pub(crate) fn parse_epsg(wkt: &str) -> Option<String> {
    const KEY: &str = "AUTHORITY[\"EPSG\",\"";
    if let Some(idx) = wkt.rfind(KEY) {
        let start = idx + KEY.len();
        if let Some(end) = wkt[start..].find('"') {
            let code = &wkt[start..start + end];
            return Some(format!("EPSG:{}", code));
        }
    }
    None
}

impl RasterReader {
    /// Open a raster; a geotransform is mandatory since every crop is located in map coordinates
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GdalError> {
        let path = path.as_ref().to_path_buf();
        let dataset = Dataset::open(&path)?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(GdalError::UnsupportedFormat(format!(
                "{}: no raster bands found",
                path.display()
            )));
        }
        let geotransform = dataset
            .geo_transform()
            .map_err(|_| GdalError::MissingGeoTransform { path: path.clone() })?;
        let projection = dataset.projection();
        Ok(RasterReader {
            path,
            dataset,
            metadata: RasterMetadata {
                size_x,
                size_y,
                bands,
                geotransform,
                projection,
            },
        })
    }

    /// Bounds of the raster in its own map coordinates
    pub fn footprint(&self) -> Rect<f64> {
        raster_footprint(
            &self.metadata.geotransform,
            self.metadata.size_x,
            self.metadata.size_y,
        )
    }

    /// Spatial reference of the raster, or `EPSG:<fallback_epsg>` when it has no projection
    pub fn spatial_ref(&self, fallback_epsg: u32) -> Result<SpatialRef, GdalError> {
        let mut srs = if self.metadata.projection.trim().is_empty() {
            SpatialRef::from_epsg(fallback_epsg)?
        } else {
            SpatialRef::from_wkt(&self.metadata.projection)?
        };
        srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        Ok(srs)
    }

    /// Short CRS label for logs
    pub fn crs_label(&self) -> String {
        parse_epsg(&self.metadata.projection).unwrap_or_else(|| "unknown CRS".to_string())
    }

    /// Read a window of band 1 as an f32 ndarray of shape (rows, cols)
    pub fn read_window(
        &self,
        x_off: usize,
        y_off: usize,
        cols: usize,
        rows: usize,
    ) -> Result<Array2<f32>, GdalError> {
        let band = self.dataset.rasterband(1)?;
        let buf = band.read_as::<f32>(
            (x_off as isize, y_off as isize),
            (cols, rows),
            (cols, rows),
            None,
        )?;
        let data_vec = buf.data().to_vec();
        let len = data_vec.len();
        Array2::from_shape_vec((rows, cols), data_vec)
            .map_err(|_| GdalError::DimensionMismatch(cols, rows, len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsg_from_wkt_authority() {
        let wkt = r#"PROJCS["WGS 84 / UTM zone 33N",GEOGCS["WGS 84"],AUTHORITY["EPSG","32633"]]"#;
        assert_eq!(parse_epsg(wkt), Some("EPSG:32633".to_string()));
        assert_eq!(parse_epsg(""), None);
    }
}
