use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::config::{PipelineConfig, ensure_dir};
use crate::core::naming::SafeProductName;
use crate::error::{Error, Result};
use crate::io::archive::{clean_safe_dir, extract_archive};
use crate::types::BatchReport;

use super::{has_extension, timestamp};

/// Extract and clean every archive of the download directory not already present in the
/// extracted directory
pub fn extract_archives(config: &PipelineConfig) -> Result<BatchReport> {
    let download_dir = config.download_dir();
    let extracted_dir = config.extracted_dir();
    ensure_dir(&extracted_dir)?;

    let mut archives: Vec<PathBuf> = fs::read_dir(&download_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    archives.sort();
    info!("[Num. {} files found]", archives.len());

    let mut report = BatchReport::default();
    for archive in archives {
        if !has_extension(&archive, "zip") {
            info!("Skipping non-archive {:?}", archive);
            report.skipped += 1;
            continue;
        }
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let product = match SafeProductName::parse(&name) {
            Ok(p) => p,
            Err(e) => {
                warn!("{}", e);
                report.errors += 1;
                continue;
            }
        };

        let safe_dir = extracted_dir.join(product.safe_dir_name());
        if safe_dir.exists() {
            info!("{} already exists", product.safe_dir_name());
            report.skipped += 1;
            continue;
        }

        info!("Start: {}", timestamp());
        match extract_product(&archive, &extracted_dir, &product) {
            Ok(bands) => {
                info!("{} bands kept in {:?}", bands.len(), safe_dir);
                report.processed += 1;
                report.outputs += bands.len();
            }
            Err(e) => {
                warn!("Error extracting {:?}: {}", archive, e);
                report.errors += 1;
            }
        }
        info!("End: {}", timestamp());
    }

    Ok(report)
}

/// Unpack one archive into `extracted_dir` and clean its `.SAFE` folder; returns the kept bands.
///
/// The archive is unpacked and cleaned in a staging directory inside `extracted_dir`; only the
/// finished `.SAFE` folder is moved into place, so a failure leaves nothing behind.
pub fn extract_product(
    archive: &Path,
    extracted_dir: &Path,
    product: &SafeProductName,
) -> Result<Vec<PathBuf>> {
    info!("Extract {:?} in .SAFE", archive);
    let staging = tempfile::Builder::new()
        .prefix(".extract_")
        .tempdir_in(extracted_dir)?;
    extract_archive(archive, staging.path())?;

    let staged_safe = staging.path().join(product.safe_dir_name());
    if !staged_safe.is_dir() {
        return Err(Error::Processing(format!(
            "{} does not contain {}",
            archive.display(),
            product.safe_dir_name()
        )));
    }
    let bands = clean_safe_dir(&staged_safe, product)?;

    let safe_dir = extracted_dir.join(product.safe_dir_name());
    fs::rename(&staged_safe, &safe_dir)?;
    Ok(bands
        .iter()
        .filter_map(|band| band.file_name())
        .map(|name| safe_dir.join(name))
        .collect())
}
