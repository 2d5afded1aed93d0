//! Sample point loading and reprojection through GDAL's vector API.
use std::path::Path;

use gdal::Dataset;
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::vector::LayerAccess;
use tracing::{debug, info};

use crate::core::geometry::SamplePoint;
use crate::error::{Error, Result};

/// Sample points together with the spatial reference they are expressed in
#[derive(Debug, Clone)]
pub struct SamplePoints {
    pub points: Vec<SamplePoint>,
    /// WKT of the layer's spatial reference
    pub srs_wkt: String,
}

/// Load point features from the first layer of `path`, reading the sample code and region
/// attributes
pub fn load_sample_points(
    path: &Path,
    code_field: &str,
    region_field: &str,
) -> Result<SamplePoints> {
    let dataset = Dataset::open(path)?;
    let mut layer = dataset.layer(0)?;

    let srs_wkt = match layer.spatial_ref() {
        Some(srs) => srs.to_wkt()?,
        None => {
            debug!("{:?} has no spatial reference, assuming WGS84", path);
            SpatialRef::from_epsg(4326)?.to_wkt()?
        }
    };

    let source_name = path.display().to_string();
    let missing = |field: &str| Error::MissingField {
        field: field.to_string(),
        source_name: source_name.clone(),
    };

    // Attribute columns are resolved once, from the layer schema
    let field_position = |name: &str| {
        layer
            .defn()
            .fields()
            .position(|f| f.name() == name)
            .ok_or_else(|| missing(name))
    };
    let code_idx = field_position(code_field)?;
    let region_idx = field_position(region_field)?;

    let mut points = Vec::new();
    for feature in layer.features() {
        let geometry = feature.geometry().ok_or_else(|| missing("geometry"))?;
        if geometry.point_count() != 1 {
            return Err(Error::Processing(format!(
                "{}: feature {:?} is not a point",
                source_name,
                feature.fid()
            )));
        }
        let (x, y, _) = geometry.get_point(0);

        let code = feature
            .field_as_string(code_idx)?
            .ok_or_else(|| missing(code_field))?;
        let region = feature
            .field_as_string(region_idx)?
            .ok_or_else(|| missing(region_field))?;

        points.push(SamplePoint { code, region, x, y });
    }

    info!("Loaded {} sample points from {:?}", points.len(), path);
    Ok(SamplePoints { points, srs_wkt })
}

impl SamplePoints {
    /// Points transformed into `target`, attributes untouched
    pub fn reproject_to(&self, target: &SpatialRef) -> Result<Vec<SamplePoint>> {
        if self.points.is_empty() {
            return Ok(Vec::new());
        }

        let mut source = SpatialRef::from_wkt(&self.srs_wkt)?;
        source.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        let mut target = target.clone();
        target.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);

        let transform = CoordTransform::new(&source, &target)?;

        let mut xs: Vec<f64> = self.points.iter().map(|p| p.x).collect();
        let mut ys: Vec<f64> = self.points.iter().map(|p| p.y).collect();
        let mut zs = vec![0.0; xs.len()];
        transform.transform_coords(&mut xs, &mut ys, &mut zs)?;

        Ok(self
            .points
            .iter()
            .zip(xs.into_iter().zip(ys))
            .map(|(p, (x, y))| SamplePoint {
                code: p.code.clone(),
                region: p.region.clone(),
                x,
                y,
            })
            .collect())
    }
}
