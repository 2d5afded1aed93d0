//! High-level pipeline stages: download, extract, and crop Sentinel-2 and MODIS
//! rasters around the sample points. Every stage walks its inputs sequentially,
//! logs one line per item and reports counters in a `BatchReport` instead of
//! stopping at the first failed item. Prefer these entrypoints over the
//! low-level `io` and `core` modules when integrating eoprep.
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use walkdir::WalkDir;

use crate::error::{Error, Result};

mod crop;
mod download;
mod extract;

pub use crop::{
    ModisCrops, ReprojectionCache, collect_modis_images, collect_sentinel2_images, crop_modis,
    crop_modis_image, crop_sentinel2, crop_sentinel2_image,
};
pub use download::{
    DownloadRequest, SAMPLE_PRODUCT_ID, SAMPLE_PRODUCT_NAME, download_product, download_region,
    search_region,
};
pub use extract::{extract_archives, extract_product};

/// Wall-clock timestamp used in stage start/finish log lines
pub(crate) fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Files below `dir` (recursive) accepted by `keep`, sorted by path
pub(crate) fn collect_files<F>(dir: &Path, keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    if !dir.is_dir() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("directory not found: {}", dir.display()),
        )));
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| keep(p))
        .collect();
    files.sort();
    Ok(files)
}

pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn collect_files_is_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/two.jp2"), b"").unwrap();
        fs::write(dir.path().join("one.JP2"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let files = collect_files(dir.path(), |p| has_extension(p, "jp2")).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["b/two.jp2", "one.JP2"]);
    }

    #[test]
    fn collect_files_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_files(&dir.path().join("missing"), |_| true).is_err());
    }
}
