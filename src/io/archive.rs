//! Sentinel-2 archive extraction and `.SAFE` folder cleaning.
//!
//! After cleaning, a `.SAFE` folder holds only the 20 m bands of the product,
//! flat and mission-prefixed:
//!
//! ```text
//! S2A_MSIL2A_20220701T095041_N0400_R079_T33TVG_20220701T141709.SAFE/
//!     S2A_T33TVG_20220701T095041_B05_20m.jp2
//!     S2A_T33TVG_20220701T095041_CLD_20m.jp2
//!     ...
//! ```
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::core::naming::{SafeProductName, is_20m_band, is_vis_band};
use crate::error::{Error, Result};

/// Unpack every entry of `zip_path` below `dest`.
///
/// Entries whose path would escape `dest` abort the extraction.
pub fn extract_archive(zip_path: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut files = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => {
                return Err(Error::Processing(format!(
                    "{}: entry `{}` escapes the extraction directory",
                    zip_path.display(),
                    entry.name()
                )));
            }
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        files += 1;
    }

    debug!("Extracted {} files from {:?}", files, zip_path);
    Ok(files)
}

/// Reduce an extracted `.SAFE` folder to its renamed 20 m bands; returns the kept files, sorted
pub fn clean_safe_dir(safe_dir: &Path, product: &SafeProductName) -> Result<Vec<PathBuf>> {
    info!("Clean .SAFE folder {:?}", safe_dir);
    flatten_20m_bands(safe_dir)?;
    remove_subdirectories(safe_dir)?;

    info!("Rename legacy and mask bands");
    for path in list_files(safe_dir)? {
        let name = file_name(&path);
        let renamed = product.normalized_band_name(&name);
        if renamed != name {
            debug!("{} -> {}", name, renamed);
            fs::rename(&path, safe_dir.join(renamed))?;
        }
    }

    info!("Remove 'VIS' images and add '{}_' prefix", product.mission);
    let mut kept = Vec::new();
    for path in list_files(safe_dir)? {
        let name = file_name(&path);
        if is_vis_band(&name) {
            fs::remove_file(&path)?;
        } else {
            let target = safe_dir.join(product.prefixed(&name));
            fs::rename(&path, &target)?;
            kept.push(target);
        }
    }

    kept.sort();
    Ok(kept)
}

/// Move every 20 m band to the folder root, delete every other file
fn flatten_20m_bands(safe_dir: &Path) -> Result<()> {
    let files: Vec<PathBuf> = WalkDir::new(safe_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();

    for path in files {
        let name = file_name(&path);
        if is_20m_band(&name) {
            if path.parent() != Some(safe_dir) {
                fs::rename(&path, safe_dir.join(&name))?;
            }
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

// AUX_DATA, DATASTRIP, GRANULE, HTML, rep_info and any other folder: all empty by now
fn remove_subdirectories(safe_dir: &Path) -> Result<()> {
    for entry in fs::read_dir(safe_dir)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        }
    }
    Ok(())
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "S2A_MSIL2A_20220701T095041_N0400_R079_T33TVG_20220701T141709";

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn cleaning_keeps_prefixed_20m_bands_only() {
        let dir = tempfile::tempdir().unwrap();
        let safe = dir.path().join(format!("{SAMPLE}.SAFE"));
        let granule = safe.join("GRANULE/L2A_T33TVG_A036648_20220701T095715");
        touch(&safe.join("manifest.safe"));
        touch(&safe.join("MTD_MSIL2A.xml"));
        touch(&safe.join("HTML/banner.png"));
        touch(&safe.join("DATASTRIP/DS_2SPA/MTD_DS.xml"));
        touch(&granule.join("IMG_DATA/R20m/T33TVG_20220701T095041_B05_20m.jp2"));
        touch(&granule.join("IMG_DATA/R20m/T33TVG_20220701T095041_SCL_20m.jp2"));
        touch(&granule.join("IMG_DATA/R10m/T33TVG_20220701T095041_B02_10m.jp2"));
        touch(&granule.join("QI_DATA/MSK_CLDPRB_20m.jp2"));
        touch(&granule.join("QI_DATA/MSK_CLDPRB_60m.jp2"));

        let product = SafeProductName::parse(SAMPLE).unwrap();
        let kept = clean_safe_dir(&safe, &product).unwrap();
        let names: Vec<String> = kept.iter().map(|p| file_name(p)).collect();

        assert_eq!(
            names,
            vec![
                "S2A_T33TVG_20220701T095041_B05_20m.jp2",
                "S2A_T33TVG_20220701T095041_CLD_20m.jp2",
                "S2A_T33TVG_20220701T095041_SCL_20m.jp2",
            ]
        );
        let leftovers: Vec<_> = fs::read_dir(&safe).unwrap().collect();
        assert_eq!(leftovers.len(), 3);
    }

    #[test]
    fn escaping_entries_abort_extraction() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("evil.zip");
        let mut writer = zip::ZipWriter::new(File::create(&zip_path).unwrap());
        writer
            .start_file("../evil.txt", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(b"payload").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        let result = extract_archive(&zip_path, &dest);

        assert!(matches!(result, Err(Error::Processing(_))));
        assert!(!dir.path().join("evil.txt").exists());
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
    }

    #[test]
    fn vis_bands_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let safe = dir.path().join(format!("{SAMPLE}.SAFE"));
        touch(&safe.join("GRANULE/g/IMG_DATA/R20m/L2A_T33TVG_20170701T095041_VIS_20m.jp2"));
        touch(&safe.join("GRANULE/g/IMG_DATA/R20m/L2A_T33TVG_20170701T095041_B11_20m.jp2"));

        let product = SafeProductName::parse(SAMPLE).unwrap();
        let kept = clean_safe_dir(&safe, &product).unwrap();
        let names: Vec<String> = kept.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["S2A_T33TVG_20170701T095041_B11_20m.jp2"]);
    }
}
