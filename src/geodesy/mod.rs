//! Geodetic primitives: ellipsoids, datum shifts, the transverse Mercator
//! projection and the table of Argentine projection zones.

pub mod datum;
pub mod ellipsoid;
pub mod projection;
pub mod transverse_mercator;
pub mod zone;

pub use datum::{Datum, Helmert};
pub use ellipsoid::Ellipsoid;
pub use projection::{to_geodetic, to_projected, ProjectionError};
pub use transverse_mercator::TransverseMercator;
pub use zone::{UnknownZoneError, Zone, ZoneId, ZoneRegistry};

/// Normalizes an angle in degrees to (-180, 180].
pub(crate) fn wrap_degrees(degrees: f64) -> f64 {
    if degrees > -180.0 && degrees <= 180.0 {
        return degrees;
    }
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
