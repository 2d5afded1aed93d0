use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use eoprep::ProductLevel;
use eoprep::api::{SAMPLE_PRODUCT_ID, SAMPLE_PRODUCT_NAME};

#[derive(Parser)]
#[command(name = "eoprep", version, about = "Sentinel-2 / MODIS sample preparation")]
pub struct CliArgs {
    /// JSON pipeline configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base data directory (overrides the config file)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Year of the data (overrides the config file)
    #[arg(long, global = true)]
    pub year: Option<String>,

    /// Region name (overrides the config file)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Enable debug logging
    #[arg(long, default_value_t = false, global = true)]
    pub log: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Search CDSE for every tile of the region and download the archives
    Download {
        /// First sensing day (YYYYMMDD)
        #[arg(long, default_value = "20220701")]
        from: String,

        /// Last sensing day, inclusive (YYYYMMDD)
        #[arg(long, default_value = "20220710")]
        to: String,

        /// Product level
        #[arg(long, value_enum, default_value_t = ProductLevel::Msil2a)]
        product_type: ProductLevel,

        /// Attempts per product
        #[arg(long, default_value_t = 5)]
        max_attempts: u32,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Download a single product by id
    DownloadProduct {
        /// CDSE product id
        #[arg(long, default_value = SAMPLE_PRODUCT_ID)]
        id: String,

        /// Archive file name
        #[arg(long, default_value = SAMPLE_PRODUCT_NAME)]
        name: String,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Extract downloaded archives keeping only the 20 m bands
    Extract,

    /// Crop and normalize Sentinel-2 bands around the sample points
    CropS2,

    /// Crop and resample MODIS LST rasters around the sample points
    CropModis,

    /// Extract, then crop Sentinel-2 and MODIS
    Run,
}

#[derive(Args)]
pub struct Credentials {
    /// CDSE username (prompted when absent)
    #[arg(long, env = "CDSE_USERNAME")]
    pub username: Option<String>,

    /// CDSE password (prompted when absent)
    #[arg(long, env = "CDSE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}
