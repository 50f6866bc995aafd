//! WGS84 geodetic points to and from projected zone coordinates, applying the
//! zone's datum shift on the way.

use thiserror::Error;

use super::zone::{Zone, ZoneId};
use crate::domain::model::{GeodeticPoint, ProjectedPoint};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("{stage} did not converge for ({first}, {second})")]
    Divergence {
        stage: &'static str,
        first: f64,
        second: f64,
    },

    #[error("point projected in zone {point_zone} cannot be inverted with zone {zone}")]
    ZoneMismatch { point_zone: ZoneId, zone: ZoneId },
}

pub fn to_projected(point: GeodeticPoint, zone: &Zone) -> Result<ProjectedPoint, ProjectionError> {
    let (latitude, longitude) = zone.datum().from_wgs84(point);
    let (easting, northing) = zone.projection().forward(latitude, longitude);

    if !easting.is_finite() || !northing.is_finite() {
        return Err(ProjectionError::Divergence {
            stage: "forward projection",
            first: point.latitude(),
            second: point.longitude(),
        });
    }

    Ok(ProjectedPoint::new(easting, northing, zone.id()))
}

pub fn to_geodetic(point: &ProjectedPoint, zone: &Zone) -> Result<GeodeticPoint, ProjectionError> {
    if point.zone() != zone.id() {
        return Err(ProjectionError::ZoneMismatch {
            point_zone: point.zone(),
            zone: zone.id(),
        });
    }

    let divergence = ProjectionError::Divergence {
        stage: "inverse projection",
        first: point.easting(),
        second: point.northing(),
    };
    let (latitude, longitude) = zone
        .projection()
        .inverse(point.easting(), point.northing())
        .filter(|(lat, lon)| lat.is_finite() && lon.is_finite())
        .ok_or_else(|| divergence.clone())?;

    let result = zone.datum().to_wgs84(latitude, longitude)?;
    if result.latitude().abs() > 90.0 {
        return Err(divergence);
    }
    Ok(result)
}
