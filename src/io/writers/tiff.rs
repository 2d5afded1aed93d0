use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager, Metadata};
use ndarray::Array2;
use std::path::Path;

use crate::io::GdalError;

/// Georeferencing and provenance written alongside a crop
#[derive(Debug, Clone)]
pub struct CropMetadata<'a> {
    pub geotransform: [f64; 6],
    /// Projection WKT; skipped when empty
    pub projection: &'a str,
    /// `(key, value)` pairs stored in the default metadata domain
    pub items: Vec<(&'static str, String)>,
}

/// Write a single-band Float32 GeoTIFF
pub fn write_tiff_f32(
    output: &Path,
    data: &Array2<f32>,
    meta: &CropMetadata<'_>,
) -> Result<Dataset, GdalError> {
    let (rows, cols) = data.dim();
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut ds = driver.create_with_band_type::<f32, _>(output, cols, rows, 1)?;

    ds.set_geo_transform(&meta.geotransform)?;
    if !meta.projection.is_empty() {
        ds.set_projection(meta.projection)?;
    }
    for (key, value) in &meta.items {
        ds.set_metadata_item(key, value, "")?;
    }

    let values: Vec<f32> = data.iter().copied().collect();
    let mut buf = Buffer::new((cols, rows), values);
    let mut band = ds.rasterband(1)?;
    band.write((0, 0), (cols, rows), &mut buf)?;
    Ok(ds)
}
