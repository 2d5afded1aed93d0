use std::io::{self, Write};

use tracing::info;
use tracing_subscriber::EnvFilter;

use eoprep::api::{
    DownloadRequest, crop_modis, crop_sentinel2, download_product, download_region,
    extract_archives,
};
use eoprep::{BatchReport, CdseClient, PipelineConfig};

use super::args::{CliArgs, Command, Credentials};
use super::errors::AppError;

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(args: &CliArgs) -> Result<PipelineConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(root) = &args.root {
        config.root = root.clone();
    }
    if let Some(year) = &args.year {
        config.year = year.clone();
    }
    if let Some(region) = &args.region {
        config.region = region.clone();
    }
    config.validate()?;
    Ok(config)
}

fn prompt(label: &str) -> Result<String, AppError> {
    print!("Enter your CDSE {}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        return Err(AppError::MissingArgument {
            arg: format!("--{}", label),
        });
    }
    Ok(value)
}

fn authenticate(credentials: &Credentials) -> Result<CdseClient, AppError> {
    let username = match &credentials.username {
        Some(u) => u.clone(),
        None => prompt("username")?,
    };
    let password = match &credentials.password {
        Some(p) => p.clone(),
        None => prompt("password")?,
    };
    let client = CdseClient::authenticate(&username, &password).map_err(eoprep::Error::from)?;
    Ok(client)
}

fn finish(stage: &'static str, report: BatchReport) -> Result<(), AppError> {
    info!("{} complete: {}", stage, report);
    println!("{}: {}", stage, report);
    if report.errors > 0 {
        return Err(AppError::StageFailed {
            stage,
            errors: report.errors,
        });
    }
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args.log);
    let config = load_config(&args)?;
    info!(
        "Year {}, region {}, root {:?}",
        config.year, config.region, config.root
    );

    match &args.command {
        Command::Download {
            from,
            to,
            product_type,
            max_attempts,
            credentials,
        } => {
            let client = authenticate(credentials)?;
            let request = DownloadRequest {
                from: from.clone(),
                to: to.clone(),
                product_level: *product_type,
                max_attempts: *max_attempts,
            };
            let report = download_region(&client, &config, &request)?;
            finish("download", report)?;
        }
        Command::DownloadProduct {
            id,
            name,
            credentials,
        } => {
            let client = authenticate(credentials)?;
            let path = download_product(&client, &config, id, name)?;
            println!("download-product: {}", path.display());
        }
        Command::Extract => finish("extract", extract_archives(&config)?)?,
        Command::CropS2 => finish("crop-s2", crop_sentinel2(&config)?)?,
        Command::CropModis => finish("crop-modis", crop_modis(&config)?)?,
        Command::Run => {
            let reports = [
                ("extract", extract_archives(&config)?),
                ("crop-s2", crop_sentinel2(&config)?),
                ("crop-modis", crop_modis(&config)?),
            ];
            let mut failed = None;
            for (stage, report) in reports {
                if let Err(e) = finish(stage, report) {
                    failed.get_or_insert(e);
                }
            }
            if let Some(e) = failed {
                return Err(e.into());
            }
        }
    }

    Ok(())
}
