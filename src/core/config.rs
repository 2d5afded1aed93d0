use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Pipeline settings suitable for JSON config files.
///
/// Every directory used by the stages is derived from `root`, `year` and
/// `region`, so two configs that share a root never step on each other's
/// outputs unless they share year and region too.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub year: String,
    pub region: String,
    /// Base data directory
    pub root: PathBuf,
    /// Sample point buffer radius in metres
    pub buffer_radius: f64,
    /// Sentinel-2 L2A reflectance quantification value
    pub scale_factor: f32,
    /// Output pixel size of MODIS crops in metres
    pub modis_resolution: f64,
    /// Used when a raster carries no projection
    pub fallback_epsg: u32,
    pub sample_points: String,
    pub code_field: String,
    pub region_field: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            year: "2022".to_string(),
            region: "Abruzzo".to_string(),
            root: PathBuf::from("."),
            buffer_radius: 2240.0,
            scale_factor: 10000.0,
            modis_resolution: 20.0,
            fallback_epsg: 32633,
            sample_points: "sample_points.shp".to_string(),
            code_field: "COD_AZIEND".to_string(),
            region_field: "REGIONE".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a config from JSON; missing keys take their default value
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        debug!("Loaded config from {:?}: {:?}", path.as_ref(), config);
        Ok(config)
    }

    /// Reject values that would make every crop empty or every path wrong
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("buffer_radius", self.buffer_radius),
            ("scale_factor", f64::from(self.scale_factor)),
            ("modis_resolution", self.modis_resolution),
        ];
        for (arg, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidArgument {
                    arg,
                    value: value.to_string(),
                });
            }
        }
        if self.year.len() != 4 || !self.year.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidArgument {
                arg: "year",
                value: self.year.clone(),
            });
        }
        Ok(())
    }

    pub fn sample_points_dir(&self) -> PathBuf {
        self.root.join("VECTOR_DATA")
    }

    pub fn sample_points_path(&self) -> PathBuf {
        self.sample_points_dir().join(&self.sample_points)
    }

    pub fn modis_dir(&self) -> PathBuf {
        self.root.join("MODIS_SAMPLES")
    }

    pub fn modis_cropped_dir(&self) -> PathBuf {
        self.root.join("MODIS_20M_CROPPED").join(&self.year)
    }

    pub fn download_dir(&self) -> PathBuf {
        self.root.join("S2_DOWNLOAD").join(&self.year).join(&self.region)
    }

    pub fn extracted_dir(&self) -> PathBuf {
        self.root
            .join("S2_20M_EXTRACTED")
            .join(&self.year)
            .join(&self.region)
    }

    pub fn cropped_dir(&self) -> PathBuf {
        self.root.join("S2_20M_CROPPED").join(&self.year)
    }
}

/// Create `path` and its parents when missing
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        debug!("Creating directory {:?}", path);
        fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_follow_year_and_region() {
        let config = PipelineConfig {
            root: PathBuf::from("/data"),
            ..PipelineConfig::default()
        };
        assert_eq!(
            config.download_dir(),
            PathBuf::from("/data/S2_DOWNLOAD/2022/Abruzzo")
        );
        assert_eq!(
            config.extracted_dir(),
            PathBuf::from("/data/S2_20M_EXTRACTED/2022/Abruzzo")
        );
        assert_eq!(config.cropped_dir(), PathBuf::from("/data/S2_20M_CROPPED/2022"));
        assert_eq!(
            config.modis_cropped_dir(),
            PathBuf::from("/data/MODIS_20M_CROPPED/2022")
        );
        assert_eq!(
            config.sample_points_path(),
            PathBuf::from("/data/VECTOR_DATA/sample_points.shp")
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "year": "2023", "buffer_radius": 1000.0 }"#).unwrap();

        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.year, "2023");
        assert_eq!(config.buffer_radius, 1000.0);
        assert_eq!(config.region, "Abruzzo");
        assert_eq!(config.fallback_epsg, 32633);
    }

    #[test]
    fn validation_rejects_bad_values() {
        assert!(PipelineConfig::default().validate().is_ok());

        let config = PipelineConfig {
            buffer_radius: 0.0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidArgument { arg: "buffer_radius", .. })
        ));

        let config = PipelineConfig {
            year: "22".to_string(),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidArgument { arg: "year", .. })
        ));
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
