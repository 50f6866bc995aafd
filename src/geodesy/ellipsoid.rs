use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

const GEODETIC_MAX_ITERATIONS: usize = 16;
const GEODETIC_TOLERANCE_RAD: f64 = 1e-15;

/// Earth-centred, earth-fixed cartesian coordinates in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geocentric {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Reference ellipsoid of revolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    name: &'static str,
    semi_major_axis: f64,
    inverse_flattening: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid::new("WGS 84", 6_378_137.0, 298.257_223_563);

    /// Hayford 1909, the ellipsoid of the Campo Inchauspe datum.
    pub const INTERNATIONAL_1924: Ellipsoid =
        Ellipsoid::new("International 1924", 6_378_388.0, 297.0);

    pub const fn new(name: &'static str, semi_major_axis: f64, inverse_flattening: f64) -> Self {
        Self {
            name,
            semi_major_axis,
            inverse_flattening,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn semi_major_axis(&self) -> f64 {
        self.semi_major_axis
    }

    pub fn flattening(&self) -> f64 {
        1.0 / self.inverse_flattening
    }

    pub fn eccentricity_squared(&self) -> f64 {
        let f = self.flattening();
        f * (2.0 - f)
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity_squared().sqrt()
    }

    /// n = f / (2 - f), the expansion parameter of Krüger's series.
    pub fn third_flattening(&self) -> f64 {
        let f = self.flattening();
        f / (2.0 - f)
    }

    fn prime_vertical_radius(&self, sin_latitude: f64) -> f64 {
        self.semi_major_axis / (1.0 - self.eccentricity_squared() * sin_latitude * sin_latitude).sqrt()
    }

    /// Latitude and longitude in radians, height in metres above the ellipsoid.
    pub fn to_geocentric(&self, latitude: f64, longitude: f64, height: f64) -> Geocentric {
        let (sin_lat, cos_lat) = latitude.sin_cos();
        let (sin_lon, cos_lon) = longitude.sin_cos();
        let n = self.prime_vertical_radius(sin_lat);

        Geocentric {
            x: (n + height) * cos_lat * cos_lon,
            y: (n + height) * cos_lat * sin_lon,
            z: (n * (1.0 - self.eccentricity_squared()) + height) * sin_lat,
        }
    }

    /// Returns (latitude, longitude) in radians and the ellipsoidal height in metres.
    pub fn to_geodetic(&self, point: Geocentric) -> (f64, f64, f64) {
        let e2 = self.eccentricity_squared();
        let p = point.x.hypot(point.y);
        let longitude = point.y.atan2(point.x);

        if p < 1e-9 {
            let semi_minor_axis = self.semi_major_axis * (1.0 - self.flattening());
            return (
                FRAC_PI_2.copysign(point.z),
                longitude,
                point.z.abs() - semi_minor_axis,
            );
        }

        let mut latitude = point.z.atan2(p * (1.0 - e2));
        for _ in 0..GEODETIC_MAX_ITERATIONS {
            let n = self.prime_vertical_radius(latitude.sin());
            let next = (point.z + e2 * n * latitude.sin()).atan2(p);
            let step = (next - latitude).abs();
            latitude = next;
            if step < GEODETIC_TOLERANCE_RAD {
                break;
            }
        }

        let (sin_lat, cos_lat) = latitude.sin_cos();
        let n = self.prime_vertical_radius(sin_lat);
        // Pick the better-conditioned height formula for the latitude band.
        let height = if cos_lat.abs() > FRAC_1_SQRT_2 {
            p / cos_lat - n
        } else {
            point.z / sin_lat - n * (1.0 - e2)
        };

        (latitude, longitude, height)
    }
}
