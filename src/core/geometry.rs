//! Footprints, sample envelopes and pixel windows.
//!
//! All geometry here is axis-aligned and expressed in the raster's map
//! coordinates, so a `geo::Rect` is enough to model both the raster footprint
//! and the envelope of a buffered sample point.
use geo::{Coord, Rect};

use crate::error::{Error, Result};

/// A sample point in map coordinates with its attributes
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePoint {
    /// Sample identifier (company code)
    pub code: String,
    /// Administrative region, used as output sub-directory
    pub region: String,
    pub x: f64,
    pub y: f64,
}

/// A sample point envelope that lies within a raster footprint
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedEnvelope {
    pub code: String,
    pub region: String,
    pub envelope: Rect<f64>,
}

/// Envelope of the circular buffer of `radius` around (`x`, `y`)
pub fn buffer_envelope(x: f64, y: f64, radius: f64) -> Rect<f64> {
    Rect::new(
        Coord {
            x: x - radius,
            y: y - radius,
        },
        Coord {
            x: x + radius,
            y: y + radius,
        },
    )
}

/// `true` when `inner` lies entirely within `outer`; touching boundaries count as within
pub fn rect_within(inner: &Rect<f64>, outer: &Rect<f64>) -> bool {
    inner.min().x >= outer.min().x
        && inner.min().y >= outer.min().y
        && inner.max().x <= outer.max().x
        && inner.max().y <= outer.max().y
}

/// Envelopes of the buffered points that fall entirely within `footprint`, input order preserved
pub fn select_within(
    points: &[SamplePoint],
    footprint: &Rect<f64>,
    radius: f64,
) -> Vec<SelectedEnvelope> {
    points
        .iter()
        .filter_map(|p| {
            let envelope = buffer_envelope(p.x, p.y, radius);
            if rect_within(&envelope, footprint) {
                Some(SelectedEnvelope {
                    code: p.code.clone(),
                    region: p.region.clone(),
                    envelope,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Bounds covered by a raster of `width` x `height` pixels under `geotransform`
pub fn raster_footprint(geotransform: &[f64; 6], width: usize, height: usize) -> Rect<f64> {
    let w = width as f64;
    let h = height as f64;
    let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

    let mut min = Coord {
        x: f64::MAX,
        y: f64::MAX,
    };
    let mut max = Coord {
        x: f64::MIN,
        y: f64::MIN,
    };
    for (px, py) in corners {
        // X_geo = GT[0] + X_pix * GT[1] + Y_pix * GT[2]
        let x = geotransform[0] + px * geotransform[1] + py * geotransform[2];
        let y = geotransform[3] + px * geotransform[4] + py * geotransform[5];
        min.x = min.x.min(x);
        min.y = min.y.min(y);
        max.x = max.x.max(x);
        max.y = max.y.max(y);
    }
    Rect::new(min, max)
}

/// Pixel window `(x_off, y_off, cols, rows)` of a north-up raster covering `envelope`.
///
/// Rounds the way `gdal_translate -projWin` does and clamps to the raster extent.
pub fn pixel_window(
    geotransform: &[f64; 6],
    envelope: &Rect<f64>,
    size: (usize, usize),
) -> Result<(usize, usize, usize, usize)> {
    if geotransform[2] != 0.0 || geotransform[4] != 0.0 {
        return Err(Error::Processing(
            "rotated geotransforms are not supported for cropping".to_string(),
        ));
    }
    if geotransform[1] == 0.0 || geotransform[5] == 0.0 {
        return Err(Error::Processing("degenerate geotransform".to_string()));
    }

    // Upper-left corner is (min x, max y) for a north-up raster
    let x0 = (envelope.min().x - geotransform[0]) / geotransform[1];
    let x1 = (envelope.max().x - geotransform[0]) / geotransform[1];
    let y0 = (envelope.max().y - geotransform[3]) / geotransform[5];
    let y1 = (envelope.min().y - geotransform[3]) / geotransform[5];

    let (x_start, x_end) = (x0.min(x1), x0.max(x1));
    let (y_start, y_end) = (y0.min(y1), y0.max(y1));

    let x_off = (x_start + 0.001).floor().max(0.0);
    let y_off = (y_start + 0.001).floor().max(0.0);
    let x_stop = (x_end - 0.001).ceil().min(size.0 as f64);
    let y_stop = (y_end - 0.001).ceil().min(size.1 as f64);

    if x_stop <= x_off || y_stop <= y_off {
        return Err(Error::Processing(format!(
            "envelope {:?} does not intersect the raster",
            envelope
        )));
    }

    Ok((
        x_off as usize,
        y_off as usize,
        (x_stop - x_off) as usize,
        (y_stop - y_off) as usize,
    ))
}

/// Geotransform of a window starting at pixel (`x_off`, `y_off`)
pub fn window_geotransform(geotransform: &[f64; 6], x_off: usize, y_off: usize) -> [f64; 6] {
    let (px, py) = (x_off as f64, y_off as f64);
    [
        geotransform[0] + px * geotransform[1] + py * geotransform[2],
        geotransform[1],
        geotransform[2],
        geotransform[3] + px * geotransform[4] + py * geotransform[5],
        geotransform[4],
        geotransform[5],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    // 20 m grid of a Sentinel-2 tile, 5490 x 5490 pixels
    const GT: [f64; 6] = [399960.0, 20.0, 0.0, 4700040.0, 0.0, -20.0];

    fn point(code: &str, x: f64, y: f64) -> SamplePoint {
        SamplePoint {
            code: code.to_string(),
            region: "ABRUZZO".to_string(),
            x,
            y,
        }
    }

    #[test]
    fn footprint_of_north_up_raster() {
        let fp = raster_footprint(&GT, 5490, 5490);
        assert_eq!(fp.min(), Coord { x: 399960.0, y: 4590240.0 });
        assert_eq!(fp.max(), Coord { x: 509760.0, y: 4700040.0 });
    }

    #[test]
    fn buffer_envelope_is_square() {
        let env = buffer_envelope(100.0, 200.0, 2240.0);
        assert_eq!(env.width(), 4480.0);
        assert_eq!(env.height(), 4480.0);
        assert_eq!(env.center(), Coord { x: 100.0, y: 200.0 });
    }

    #[test]
    fn only_fully_contained_envelopes_are_selected() {
        let fp = raster_footprint(&GT, 5490, 5490);
        let points = vec![
            point("inside", 450000.0, 4650000.0),
            point("edge", 399960.0 + 2240.0, 4650000.0),
            point("straddling", 400000.0, 4650000.0),
            point("outside", 600000.0, 4650000.0),
        ];
        let selected = select_within(&points, &fp, 2240.0);
        let codes: Vec<&str> = selected.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["inside", "edge"]);
    }

    #[test]
    fn pixel_window_matches_envelope() {
        let env = buffer_envelope(450000.0, 4650000.0, 2240.0);
        let (x, y, cols, rows) = pixel_window(&GT, &env, (5490, 5490)).unwrap();
        assert_eq!((x, y), (2390, 2390));
        assert_eq!((cols, rows), (224, 224));

        let gt = window_geotransform(&GT, x, y);
        assert_eq!(gt[0], 447760.0);
        assert_eq!(gt[3], 4652240.0);
    }

    #[test]
    fn pixel_window_outside_is_an_error() {
        let env = buffer_envelope(0.0, 0.0, 10.0);
        assert!(pixel_window(&GT, &env, (5490, 5490)).is_err());
    }
}
