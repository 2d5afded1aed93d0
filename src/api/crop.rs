use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::config::{PipelineConfig, ensure_dir};
use crate::core::geometry::{SamplePoint, pixel_window, select_within, window_geotransform};
use crate::core::naming::{crop_output_stem, modis_output_stem};
use crate::core::normalize::normalize_reflectance;
use crate::error::Result;
use crate::io::vector::{SamplePoints, load_sample_points};
use crate::io::warp::warp_to_envelope;
use crate::io::writers::tiff::{CropMetadata, write_tiff_f32};
use crate::io::RasterReader;
use crate::types::{BatchReport, ModisProduct};

use super::{collect_files, has_extension, timestamp};

/// Sample points reprojected once per distinct raster projection
pub struct ReprojectionCache {
    samples: SamplePoints,
    fallback_epsg: u32,
    by_projection: HashMap<String, Vec<SamplePoint>>,
}

impl ReprojectionCache {
    pub fn new(samples: SamplePoints, fallback_epsg: u32) -> Self {
        Self {
            samples,
            fallback_epsg,
            by_projection: HashMap::new(),
        }
    }

    /// Sample points in the coordinates of `reader`
    pub fn points_for(&mut self, reader: &RasterReader) -> Result<&[SamplePoint]> {
        let key = reader.metadata.projection.clone();
        if !self.by_projection.contains_key(&key) {
            let srs = reader.spatial_ref(self.fallback_epsg)?;
            debug!("Reprojecting sample points to {}", reader.crs_label());
            let points = self.samples.reproject_to(&srs)?;
            self.by_projection.insert(key.clone(), points);
        }
        Ok(self
            .by_projection
            .get(&key)
            .map(|v| v.as_slice())
            .unwrap_or(&[]))
    }
}

fn load_cache(config: &PipelineConfig) -> Result<ReprojectionCache> {
    let samples = load_sample_points(
        &config.sample_points_path(),
        &config.code_field,
        &config.region_field,
    )?;
    Ok(ReprojectionCache::new(samples, config.fallback_epsg))
}

/// All `.jp2` bands below the extracted directory
pub fn collect_sentinel2_images(extracted_dir: &Path) -> Result<Vec<PathBuf>> {
    collect_files(extracted_dir, |p| has_extension(p, "jp2"))
}

/// Crop and normalize every extracted Sentinel-2 band around the sample points
pub fn crop_sentinel2(config: &PipelineConfig) -> Result<BatchReport> {
    let mut cache = load_cache(config)?;
    let cropped_dir = config.cropped_dir();
    ensure_dir(&cropped_dir)?;

    let images = collect_sentinel2_images(&config.extracted_dir())?;
    info!("Starting crop at: {}", timestamp());

    let mut report = BatchReport::default();
    for image in images {
        info!("{:?}", image);
        match crop_sentinel2_image(&image, &mut cache, config) {
            Ok(outputs) => {
                if outputs.is_empty() {
                    info!("No sample envelope within {:?}", image);
                }
                report.processed += 1;
                report.outputs += outputs.len();
            }
            Err(e) => {
                warn!("Error cropping {:?}: {}", image, e);
                report.errors += 1;
            }
        }
    }

    info!("Crop finished at: {}", timestamp());
    Ok(report)
}

/// Crop one band to every sample envelope within its footprint; returns the written files
pub fn crop_sentinel2_image(
    image: &Path,
    cache: &mut ReprojectionCache,
    config: &PipelineConfig,
) -> Result<Vec<PathBuf>> {
    let reader = RasterReader::open(image)?;
    let footprint = reader.footprint();
    let points = cache.points_for(&reader)?;
    let selected = select_within(points, &footprint, config.buffer_radius);

    let source_product = image
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let size = (reader.metadata.size_x, reader.metadata.size_y);

    let mut outputs = Vec::with_capacity(selected.len());
    for sel in selected {
        let (x_off, y_off, cols, rows) =
            pixel_window(&reader.metadata.geotransform, &sel.envelope, size)?;
        let mut data = reader.read_window(x_off, y_off, cols, rows)?;

        debug!("Normalize pixel values");
        normalize_reflectance(&mut data, config.scale_factor);

        let out_dir = config.cropped_dir().join(&sel.region);
        ensure_dir(&out_dir)?;
        let output = out_dir.join(format!("{}.tiff", crop_output_stem(image, &sel.code)));

        let meta = CropMetadata {
            geotransform: window_geotransform(&reader.metadata.geotransform, x_off, y_off),
            projection: &reader.metadata.projection,
            items: vec![
                ("SOURCE_PRODUCT", source_product.clone()),
                ("SAMPLE_CODE", sel.code.clone()),
                ("REGION", sel.region.clone()),
                ("SCALE_FACTOR", config.scale_factor.to_string()),
            ],
        };
        write_tiff_f32(&output, &data, &meta)?;
        debug!("Wrote {:?} ({}x{})", output, cols, rows);
        outputs.push(output);
    }

    Ok(outputs)
}

/// MODIS rasters of both LST archives whose file name contains `year`
pub fn collect_modis_images(modis_dir: &Path, year: &str) -> Vec<(ModisProduct, PathBuf)> {
    let mut images = Vec::new();
    for product in ModisProduct::ALL {
        let archive = modis_dir.join(product.archive_dir());
        let contains_year = |p: &Path| {
            p.file_name()
                .map(|n| n.to_string_lossy().contains(year))
                .unwrap_or(false)
        };
        match collect_files(&archive, contains_year) {
            Ok(files) => images.extend(files.into_iter().map(|f| (product, f))),
            Err(e) => warn!("{} archive unavailable: {}", product, e),
        }
    }
    images
}

/// Cut every MODIS LST raster of the configured year around the sample points
pub fn crop_modis(config: &PipelineConfig) -> Result<BatchReport> {
    let mut cache = load_cache(config)?;
    let cropped_dir = config.modis_cropped_dir();
    ensure_dir(&cropped_dir)?;

    let images = collect_modis_images(&config.modis_dir(), &config.year);
    info!("Starting crop at: {}", timestamp());

    let mut report = BatchReport::default();
    for (product, image) in images {
        info!("Crop start for {:?}", image);
        match crop_modis_image(product, &image, &mut cache, config) {
            Ok(crops) => {
                report.processed += 1;
                report.outputs += crops.outputs.len();
                report.errors += crops.failed;
            }
            Err(e) => {
                warn!("Error cropping {:?}: {}", image, e);
                report.errors += 1;
            }
        }
    }

    info!("Crop finished at: {}", timestamp());
    Ok(report)
}

/// Crops written for one MODIS raster, and the envelopes whose warp failed
#[derive(Debug, Default)]
pub struct ModisCrops {
    pub outputs: Vec<PathBuf>,
    pub failed: usize,
}

/// Warp one MODIS raster to each sample envelope within its footprint at the configured resolution.
///
/// A failed envelope is logged and counted; the remaining envelopes are still cut.
pub fn crop_modis_image(
    product: ModisProduct,
    image: &Path,
    cache: &mut ReprojectionCache,
    config: &PipelineConfig,
) -> Result<ModisCrops> {
    let reader = RasterReader::open(image)?;
    let footprint = reader.footprint();
    let points = cache.points_for(&reader)?;
    let selected = select_within(points, &footprint, config.buffer_radius);

    let mut crops = ModisCrops::default();
    for sel in selected {
        let out_dir = config.modis_cropped_dir().join(&sel.region);
        ensure_dir(&out_dir)?;
        let stem = modis_output_stem(product, image, &config.year, &sel.code);
        let output = out_dir.join(format!("{}.tif", stem));

        match warp_to_envelope(image, &output, &sel.envelope, config.modis_resolution) {
            Ok(()) => crops.outputs.push(output),
            Err(e) => {
                warn!("Error cropping {:?} for sample {}: {}", image, sel.code, e);
                crops.failed += 1;
            }
        }
    }
    Ok(crops)
}
