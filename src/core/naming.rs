//! Sentinel-2 product and band file naming.
//!
//! Product names follow the ESA compact convention
//! `MMM_MSIXXX_YYYYMMDDTHHMMSS_Nxxxx_ROOO_Txxxxx_<discriminator>.SAFE`.
//! The band rules below turn the files of a downloaded product into the flat,
//! mission-prefixed layout consumed by the crop stage, e.g.
//! `S2A_T33TVG_20220701T095041_B02_20m.jp2`.
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::ModisProduct;

/// Length of band names produced by processing baselines older than 02.07,
/// which carry an extra `L2A_` style prefix.
const LEGACY_BAND_NAME_LEN: usize = 38;

/// Parsed Sentinel-2 product name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeProductName {
    /// `S2A`, `S2B` or `S2C`
    pub mission: String,
    /// e.g. `MSIL2A`
    pub level: String,
    /// Datatake sensing start, `YYYYMMDDTHHMMSS`
    pub sensing: String,
    /// Processing baseline, e.g. `N0400`
    pub baseline: String,
    /// Relative orbit, e.g. `R079`
    pub relative_orbit: String,
    /// Tile token including its leading `T`, e.g. `T33TVG`
    pub tile: String,
    /// Product discriminator (generation time)
    pub discriminator: String,
}

impl SafeProductName {
    /// Parse a product name, tolerating a `.SAFE`, `.zip` or `.SAFE.zip` suffix
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = || Error::InvalidProductName(name.to_string());

        let base = strip_product_suffix(name);
        let parts: Vec<&str> = base.split('_').collect();
        if parts.len() != 7 {
            return Err(invalid());
        }

        let mission = parts[0];
        if mission.len() != 3 || !mission.starts_with("S2") {
            return Err(invalid());
        }
        if !parts[1].starts_with("MSI") {
            return Err(invalid());
        }
        if !is_timestamp(parts[2]) || !is_timestamp(parts[6]) {
            return Err(invalid());
        }
        if !parts[3].starts_with('N') || !parts[4].starts_with('R') {
            return Err(invalid());
        }
        let tile = parts[5];
        if tile.len() != 6 || !tile.starts_with('T') {
            return Err(invalid());
        }

        Ok(Self {
            mission: mission.to_string(),
            level: parts[1].to_string(),
            sensing: parts[2].to_string(),
            baseline: parts[3].to_string(),
            relative_orbit: parts[4].to_string(),
            tile: tile.to_string(),
            discriminator: parts[6].to_string(),
        })
    }

    fn base_name(&self) -> String {
        format!(
            "{}_{}_{}_{}_{}_{}_{}",
            self.mission,
            self.level,
            self.sensing,
            self.baseline,
            self.relative_orbit,
            self.tile,
            self.discriminator
        )
    }

    pub fn safe_dir_name(&self) -> String {
        format!("{}.SAFE", self.base_name())
    }

    pub fn zip_name(&self) -> String {
        format!("{}.zip", self.base_name())
    }

    /// Band name after legacy-prefix removal and mask renaming
    pub fn normalized_band_name(&self, name: &str) -> String {
        let name = strip_legacy_prefix(name).unwrap_or(name);
        if name.contains("MSK_") {
            format!(
                "{}_{}_{}",
                self.tile,
                self.sensing,
                name.replace("MSK_", "").replace("PRB", "")
            )
        } else {
            name.to_string()
        }
    }

    /// Final file name with the mission prefix
    pub fn prefixed(&self, name: &str) -> String {
        format!("{}_{}", self.mission, name)
    }
}

fn strip_product_suffix(name: &str) -> &str {
    let name = name.strip_suffix(".zip").unwrap_or(name);
    name.strip_suffix(".SAFE").unwrap_or(name)
}

fn is_timestamp(s: &str) -> bool {
    s.len() == 15
        && s.char_indices().all(|(i, c)| {
            if i == 8 {
                c == 'T'
            } else {
                c.is_ascii_digit()
            }
        })
}

/// `true` for 20 m resolution JPEG2000 bands
pub fn is_20m_band(name: &str) -> bool {
    name.ends_with("_20m.jp2")
}

/// `true` for the `VIS` quicklook bands shipped before April 2018
pub fn is_vis_band(name: &str) -> bool {
    name.contains("_VIS_")
}

/// Drop the 4-character prefix carried by legacy band names
pub fn strip_legacy_prefix(name: &str) -> Option<&str> {
    if name.len() == LEGACY_BAND_NAME_LEN {
        name.get(4..)
    } else {
        None
    }
}

/// Output stem for a Sentinel-2 crop: mission prefix and `_20m` removed, sample code appended.
///
/// `S2A_T33TVG_20220701T095041_B02_20m.jp2` + `123` gives `T33TVG_20220701T095041_B02_123`.
pub fn crop_output_stem(band_file: &Path, code: &str) -> String {
    let stem = band_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = match stem.split_once('_') {
        Some((mission, rest)) if mission.len() == 3 && mission.starts_with("S2") => {
            rest.to_string()
        }
        _ => stem,
    };
    format!("{}_{}", stem.replace("_20m", ""), code)
}

/// Output stem for a MODIS crop: `<LSTD|LSTN>_<date token>_<code>`.
///
/// The date token is the 13 characters of the file stem starting at the first
/// occurrence of `year`; the whole stem is used when the year is absent.
pub fn modis_output_stem(product: ModisProduct, file: &Path, year: &str, code: &str) -> String {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let token: String = match stem.find(year) {
        Some(idx) => stem[idx..].chars().take(13).collect(),
        None => stem,
    };
    format!("{}_{}_{}", product.label(), token, code.replace(".tif", ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = "S2A_MSIL2A_20220701T095041_N0400_R079_T33TVG_20220701T141709";

    #[test]
    fn parses_zip_and_safe_names() {
        let from_zip = SafeProductName::parse(&format!("{SAMPLE}.zip")).unwrap();
        let from_safe = SafeProductName::parse(&format!("{SAMPLE}.SAFE")).unwrap();
        assert_eq!(from_zip, from_safe);
        assert_eq!(from_zip.mission, "S2A");
        assert_eq!(from_zip.tile, "T33TVG");
        assert_eq!(from_zip.sensing, "20220701T095041");
        assert_eq!(from_zip.safe_dir_name(), format!("{SAMPLE}.SAFE"));
        assert_eq!(from_safe.zip_name(), format!("{SAMPLE}.zip"));
    }

    #[test]
    fn rejects_foreign_names() {
        assert!(SafeProductName::parse("notes.txt").is_err());
        assert!(
            SafeProductName::parse("S1A_IW_GRDH_1SDV_20220701T095041_20220701T095106_043914")
                .is_err()
        );
        assert!(
            SafeProductName::parse("S2A_MSIL2A_2022070T095041_N0400_R079_T33TVG_20220701T141709")
                .is_err()
        );
    }

    #[test]
    fn mask_bands_take_tile_and_sensing() {
        let product = SafeProductName::parse(SAMPLE).unwrap();
        assert_eq!(
            product.normalized_band_name("MSK_CLDPRB_20m.jp2"),
            "T33TVG_20220701T095041_CLD_20m.jp2"
        );
        assert_eq!(
            product.normalized_band_name("T33TVG_20220701T095041_B05_20m.jp2"),
            "T33TVG_20220701T095041_B05_20m.jp2"
        );
    }

    #[test]
    fn legacy_names_lose_prefix() {
        let product = SafeProductName::parse(SAMPLE).unwrap();
        let legacy = "L2A_T33TVG_20170701T095041_B05_20m.jp2";
        assert_eq!(legacy.len(), 38);
        assert_eq!(
            product.normalized_band_name(legacy),
            "T33TVG_20170701T095041_B05_20m.jp2"
        );
        assert_eq!(strip_legacy_prefix("short.jp2"), None);
    }

    #[test]
    fn band_predicates() {
        assert!(is_20m_band("T33TVG_20220701T095041_B8A_20m.jp2"));
        assert!(!is_20m_band("T33TVG_20220701T095041_B02_10m.jp2"));
        assert!(!is_20m_band("MTD_TL.xml"));
        assert!(is_vis_band("S2A_T33TVG_20170701T095041_VIS_20m.jp2"));
    }

    #[test]
    fn crop_stem_drops_mission_and_resolution() {
        let band = PathBuf::from("/x/S2A_T33TVG_20220701T095041_B02_20m.jp2");
        assert_eq!(crop_output_stem(&band, "123"), "T33TVG_20220701T095041_B02_123");
    }

    #[test]
    fn modis_stem_uses_year_token() {
        let file = PathBuf::from("/m/DEF_022/LST_Day_2022_07_01_10.tif");
        assert_eq!(
            modis_output_stem(ModisProduct::DayLst, &file, "2022", "A17.tif"),
            "LSTD_2022_07_01_10_A17"
        );
        let other = PathBuf::from("/m/DEF_023/night.tif");
        assert_eq!(
            modis_output_stem(ModisProduct::NightLst, &other, "2022", "9"),
            "LSTN_night_9"
        );
    }
}
