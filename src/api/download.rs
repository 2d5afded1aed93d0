use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::config::{PipelineConfig, ensure_dir};
use crate::core::tiles::tiles_for_region;
use crate::error::Result;
use crate::io::cdse::{CdseClient, CdseError, Product, ProductQuery};
use crate::types::{BatchReport, ProductLevel};

use super::timestamp;

/// Sample L2A product over tile 33TVG used by the quick-start download
pub const SAMPLE_PRODUCT_ID: &str = "d4faeb89-2588-5423-806b-750e32b58257";
pub const SAMPLE_PRODUCT_NAME: &str =
    "S2A_MSIL2A_20220701T095041_N0400_R079_T33TVG_20220701T141709.zip";

/// Parameters of a region download
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// First sensing day, `YYYYMMDD`
    pub from: String,
    /// Last sensing day (inclusive), `YYYYMMDD`
    pub to: String,
    pub product_level: ProductLevel,
    /// Attempts per product before it counts as an error
    pub max_attempts: u32,
}

impl Default for DownloadRequest {
    fn default() -> Self {
        Self {
            from: "20220701".to_string(),
            to: "20220710".to_string(),
            product_level: ProductLevel::Msil2a,
            max_attempts: 5,
        }
    }
}

/// Search the catalogue once per tile of the configured region; results de-duplicated by id
pub fn search_region(
    client: &CdseClient,
    config: &PipelineConfig,
    request: &DownloadRequest,
) -> Result<Vec<Product>> {
    let tiles = tiles_for_region(&config.region)?;
    let mut seen = HashSet::new();
    let mut products = Vec::new();

    for tile in tiles {
        let query = ProductQuery {
            product_type: request.product_level.as_str().to_string(),
            tile: tile.to_string(),
            from: request.from.clone(),
            to: request.to.clone(),
        };
        let found = client.search(&query)?;
        info!("Tile {}: {} products", tile, found.len());
        for product in found {
            if seen.insert(product.id.clone()) {
                products.push(product);
            }
        }
    }
    Ok(products)
}

/// Search and download every product of the configured region and period
pub fn download_region(
    client: &CdseClient,
    config: &PipelineConfig,
    request: &DownloadRequest,
) -> Result<BatchReport> {
    let download_dir = config.download_dir();
    ensure_dir(&download_dir)?;

    let products = search_region(client, config, request)?;
    let mut report = BatchReport::default();
    if products.is_empty() {
        info!("No images to download");
        return Ok(report);
    }

    let total_bytes: u64 = products.iter().filter_map(|p| p.content_length).sum();
    info!("Images found: {}", products.len());
    info!(
        "Total size of the download: {:.2} GB",
        total_bytes as f64 / 1e9
    );
    info!("Download started at: {}", timestamp());

    for product in &products {
        if !product.online {
            warn!("{} is offline (long term archive), skipping", product.name);
            report.skipped += 1;
            continue;
        }
        let target = download_dir.join(product.archive_name());
        if is_complete(&target, product.content_length) {
            info!("{} already downloaded", product.name);
            report.skipped += 1;
            continue;
        }

        match download_with_retries(client, product, &target, request.max_attempts) {
            Ok(()) => {
                report.processed += 1;
                report.outputs += 1;
            }
            Err(e) => {
                warn!("Giving up on {}: {}", product.name, e);
                report.errors += 1;
            }
        }
    }

    info!("Download finished at: {}", timestamp());
    Ok(report)
}

/// Download a single product by id into the configured download directory
pub fn download_product(
    client: &CdseClient,
    config: &PipelineConfig,
    id: &str,
    archive_name: &str,
) -> Result<PathBuf> {
    let download_dir = config.download_dir();
    ensure_dir(&download_dir)?;
    let target = download_dir.join(archive_name);

    info!(
        "{}: Downloading {} from CDSE. Be patient, it might take a while...",
        timestamp(),
        archive_name
    );
    let bytes = client.download(id, &target)?;
    info!("{}: Download finished ({} bytes)", timestamp(), bytes);
    Ok(target)
}

fn download_with_retries(
    client: &CdseClient,
    product: &Product,
    target: &Path,
    max_attempts: u32,
) -> std::result::Result<(), CdseError> {
    retry_download(
        &product.name,
        product.content_length,
        target,
        max_attempts,
        || client.download(&product.id, target),
    )
}

/// Run `attempt_download` until it yields an archive of the `expected` size, at most
/// `max_attempts` times (at least once). An archive of the wrong size is deleted and counts
/// as a failed attempt.
fn retry_download<F>(
    name: &str,
    expected: Option<u64>,
    target: &Path,
    max_attempts: u32,
    mut attempt_download: F,
) -> std::result::Result<(), CdseError>
where
    F: FnMut() -> std::result::Result<u64, CdseError>,
{
    let attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        info!("Downloading {} (attempt {}/{})", name, attempt, attempts);
        let result = attempt_download().and_then(|written| match expected {
            Some(expected) if expected != written => {
                let _ = fs::remove_file(target);
                Err(CdseError::SizeMismatch {
                    expected,
                    actual: written,
                })
            }
            _ => Ok(()),
        });
        match result {
            Ok(()) => return Ok(()),
            Err(e) if attempt < attempts => {
                warn!("Attempt {} failed: {}", attempt, e);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// An archive counts as complete when it exists and matches the advertised size
fn is_complete(target: &Path, expected: Option<u64>) -> bool {
    match fs::metadata(target) {
        Ok(meta) => match expected {
            Some(len) => meta.len() == len,
            None => meta.len() > 0,
        },
        Err(_) => false,
    }
}
