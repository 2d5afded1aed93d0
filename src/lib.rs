#![doc = r#"
eoprep — Sentinel-2 and MODIS sample preparation.

This crate turns downloaded Earth-observation products into small, normalized
GeoTIFF crops centred on a fixed set of sample points. It powers the `eoprep`
CLI and can be embedded in your own Rust applications.

Pipeline
--------
1. **download** — search the Copernicus Data Space Ecosystem per Sentinel-2 tile
   of a region and download the L2A archives.
2. **extract** — unpack every archive and reduce its `.SAFE` folder to the
   mission-prefixed 20 m bands.
3. **crop-s2** — cut each band around the sample points whose buffer envelope
   lies within the band footprint, normalize reflectance to `[.., 1]` and
   write Float32 GeoTIFFs grouped by region.
4. **crop-modis** — warp the day/night MODIS LST rasters of the year to the same
   envelopes at 20 m resolution.

Requirements
------------
- GDAL development headers and runtime available on your system.
- `gdalwarp` on `PATH` for the MODIS stage.

Quick start
-----------
```rust,no_run
use eoprep::{PipelineConfig, extract_archives, crop_sentinel2};

fn main() -> eoprep::Result<()> {
    let config = PipelineConfig {
        root: "/data/eo".into(),
        ..PipelineConfig::default()
    };

    let extracted = extract_archives(&config)?;
    let cropped = crop_sentinel2(&config)?;
    println!("extract: {extracted}\ncrop: {cropped}");
    Ok(())
}
```

Error handling
--------------
All public functions return `eoprep::Result<T>`; match on `eoprep::Error` to
handle specific cases, e.g. GDAL or CDSE errors. Batch stages keep going when a
single input fails and count it in their `BatchReport`.

Useful modules
--------------
- [`api`] — pipeline stages.
- [`core`] — configuration, naming rules, geometry and normalization.
- [`io`] — CDSE client, archive handling, GDAL readers and writers.
- [`error`] — crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
pub use core::config::PipelineConfig;
pub use core::naming::SafeProductName;
pub use error::{Error, Result};
pub use types::{BatchReport, ModisProduct, ProductLevel};

pub use io::{CdseClient, CdseError, GdalError, Product, ProductQuery, RasterReader};

pub use api::{
    DownloadRequest, crop_modis, crop_sentinel2, download_product, download_region,
    extract_archives,
};
