//! I/O layer: the CDSE download client, archive extraction and `.SAFE`
//! cleaning, GDAL-backed raster and sample point readers, `gdalwarp`
//! invocation, and `writers` for GeoTIFF crops.
pub mod archive;

pub mod cdse;
pub use cdse::{CdseClient, CdseError, HttpTimeouts, Product, ProductQuery};

pub mod gdal;
pub use gdal::{GdalError, RasterMetadata, RasterReader};

pub mod vector;
pub use vector::{SamplePoints, load_sample_points};

pub mod warp;

pub mod writers;
