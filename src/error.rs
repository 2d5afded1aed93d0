//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, GDAL, HTTP and archive errors, and provides semantic
//! variants for naming, configuration and processing failures.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("CDSE error: {0}")]
    Cdse(#[from] crate::io::CdseError),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid Sentinel-2 product name: {0}")]
    InvalidProductName(String),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Missing field `{field}` in {source_name}")]
    MissingField { field: String, source_name: String },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Processing error: {0}")]
    Processing(String),
}

impl From<gdal::errors::GdalError> for Error {
    fn from(e: gdal::errors::GdalError) -> Self {
        Error::Gdal(crate::io::GdalError::Gdal(e))
    }
}
