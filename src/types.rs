//! Shared types and enums used across eoprep.
//! Includes the MODIS LST archive kinds (`ModisProduct`), the Sentinel-2
//! product level searched on CDSE (`ProductLevel`) and the per-stage
//! `BatchReport`.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// MODIS land surface temperature archives stored under the MODIS root.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum ModisProduct {
    /// Daytime LST, archive `DEF_022`
    DayLst,
    /// Nighttime LST, archive `DEF_023`
    NightLst,
}

impl ModisProduct {
    pub const ALL: [ModisProduct; 2] = [ModisProduct::DayLst, ModisProduct::NightLst];

    /// Directory name of the archive inside the MODIS root
    pub fn archive_dir(&self) -> &'static str {
        match self {
            ModisProduct::DayLst => "DEF_022",
            ModisProduct::NightLst => "DEF_023",
        }
    }

    /// Prefix given to every crop of this archive
    pub fn label(&self) -> &'static str {
        match self {
            ModisProduct::DayLst => "LSTD",
            ModisProduct::NightLst => "LSTN",
        }
    }
}

impl std::fmt::Display for ModisProduct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Sentinel-2 processing level as it appears in product names
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum ProductLevel {
    #[value(name = "MSIL2A")]
    Msil2a,
    #[value(name = "MSIL1C")]
    Msil1c,
}

impl ProductLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductLevel::Msil2a => "MSIL2A",
            ProductLevel::Msil1c => "MSIL1C",
        }
    }
}

impl std::fmt::Display for ProductLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome counters of a batch stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Inputs handled successfully
    pub processed: usize,
    /// Inputs left untouched (already done, nothing to do)
    pub skipped: usize,
    /// Inputs that failed; the stage kept going
    pub errors: usize,
    /// Output files written (crops, archives)
    pub outputs: usize,
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "processed={} skipped={} errors={} outputs={}",
            self.processed, self.skipped, self.errors, self.outputs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modis_archives_map_to_labels() {
        assert_eq!(ModisProduct::DayLst.archive_dir(), "DEF_022");
        assert_eq!(ModisProduct::NightLst.archive_dir(), "DEF_023");
        assert_eq!(ModisProduct::DayLst.to_string(), "LSTD");
        assert_eq!(ModisProduct::NightLst.to_string(), "LSTN");
    }

    #[test]
    fn report_display_lists_all_counters() {
        let report = BatchReport {
            processed: 3,
            skipped: 1,
            errors: 0,
            outputs: 7,
        };
        assert_eq!(report.to_string(), "processed=3 skipped=1 errors=0 outputs=7");
    }
}
