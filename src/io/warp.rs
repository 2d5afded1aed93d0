use geo::Rect;
use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::io::GdalError;

/// Arguments for `gdalwarp` cutting `envelope` out of `input` at `resolution` map units per pixel
pub fn warp_args(
    input: &Path,
    output: &Path,
    envelope: &Rect<f64>,
    resolution: f64,
) -> Vec<String> {
    vec![
        "-of".into(),
        "GTiff".into(),
        "-overwrite".into(),
        "-te".into(),
        envelope.min().x.to_string(),
        envelope.min().y.to_string(),
        envelope.max().x.to_string(),
        envelope.max().y.to_string(),
        "-tr".into(),
        resolution.to_string(),
        resolution.to_string(),
        input.to_string_lossy().to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// Run `gdalwarp` to write the envelope of `input` into `output`
pub fn warp_to_envelope(
    input: &Path,
    output: &Path,
    envelope: &Rect<f64>,
    resolution: f64,
) -> Result<(), GdalError> {
    let args = warp_args(input, output, envelope, resolution);
    debug!("gdalwarp {}", args.join(" "));
    let result = Command::new("gdalwarp")
        .args(args.iter().map(|s| s.as_str()))
        .output()
        .map_err(|e| GdalError::Warp(format!("gdalwarp exec error: {}", e)))?;
    if !result.status.success() {
        // Best-effort cleanup
        let _ = std::fs::remove_file(output);
        return Err(GdalError::Warp(
            String::from_utf8_lossy(&result.stderr).trim().to_string(),
        ));
    }
    Ok(())
}
