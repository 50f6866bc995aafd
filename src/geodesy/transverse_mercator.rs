//! Ellipsoidal transverse Mercator after Krüger (1912), carried to sixth
//! order in the third flattening as given by Karney (2011). Within 4000 km of
//! the central meridian the series is accurate to a few nanometres, far
//! tighter than any Argentine zone requires.

use std::f64::consts::FRAC_PI_2;

use super::ellipsoid::Ellipsoid;
use super::wrap_degrees;

const ORDER: usize = 6;
const NEWTON_MAX_ITERATIONS: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct TransverseMercator {
    eccentricity: f64,
    central_meridian: f64,
    false_easting: f64,
    false_northing: f64,
    /// k0 · A, where A is the rectifying radius.
    scaled_radius: f64,
    /// Conformal northing ξ of the latitude of origin.
    origin_xi: f64,
    alpha: [f64; ORDER],
    beta: [f64; ORDER],
}

impl TransverseMercator {
    pub fn new(
        ellipsoid: &Ellipsoid,
        central_meridian: f64,
        latitude_of_origin: f64,
        scale_factor: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let (rectifying, alpha, beta) = krueger_coefficients(ellipsoid.third_flattening());
        let mut projection = Self {
            eccentricity: ellipsoid.eccentricity(),
            central_meridian,
            false_easting,
            false_northing,
            scaled_radius: scale_factor * ellipsoid.semi_major_axis() * rectifying,
            origin_xi: 0.0,
            alpha,
            beta,
        };

        projection.origin_xi = if latitude_of_origin.abs() >= 90.0 {
            FRAC_PI_2.copysign(latitude_of_origin)
        } else {
            projection.conformal(latitude_of_origin.to_radians(), 0.0).0
        };
        projection
    }

    pub fn central_meridian(&self) -> f64 {
        self.central_meridian
    }

    /// Geodetic latitude/longitude (degrees, on this projection's ellipsoid)
    /// to (easting, northing) in metres.
    pub fn forward(&self, latitude: f64, longitude: f64) -> (f64, f64) {
        let lambda = wrap_degrees(longitude - self.central_meridian).to_radians();
        let (xi, eta) = self.conformal(latitude.to_radians(), lambda);

        (
            self.false_easting + self.scaled_radius * eta,
            self.false_northing + self.scaled_radius * (xi - self.origin_xi),
        )
    }

    /// (easting, northing) back to geodetic latitude/longitude in degrees.
    /// `None` when the latitude iteration does not converge.
    pub fn inverse(&self, easting: f64, northing: f64) -> Option<(f64, f64)> {
        let xi = (northing - self.false_northing) / self.scaled_radius + self.origin_xi;
        let eta = (easting - self.false_easting) / self.scaled_radius;

        let mut xi_prime = xi;
        let mut eta_prime = eta;
        for (j, beta) in self.beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_prime -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_prime -= beta * (k * xi).cos() * (k * eta).sinh();
        }

        let sinh_eta = eta_prime.sinh();
        let cos_xi = xi_prime.cos();
        let r = sinh_eta.hypot(cos_xi);

        let (latitude, lambda) = if r == 0.0 {
            (FRAC_PI_2.copysign(xi_prime), 0.0)
        } else {
            let tau_prime = xi_prime.sin() / r;
            let tau = conformal_to_geodetic_tau(tau_prime, self.eccentricity)?;
            (tau.atan(), sinh_eta.atan2(cos_xi))
        };

        Some((
            latitude.to_degrees(),
            wrap_degrees(self.central_meridian + lambda.to_degrees()),
        ))
    }

    /// Gauss-Schreiber conformal sphere followed by Krüger's series: returns
    /// (ξ, η) for latitude φ and longitude λ from the central meridian, both
    /// in radians.
    fn conformal(&self, latitude: f64, lambda: f64) -> (f64, f64) {
        let tau_prime = geodetic_to_conformal_tau(latitude.tan(), self.eccentricity);
        let cos_lambda = lambda.cos();
        let xi_prime = tau_prime.atan2(cos_lambda);
        let eta_prime = (lambda.sin() / tau_prime.hypot(cos_lambda)).asinh();

        let mut xi = xi_prime;
        let mut eta = eta_prime;
        for (j, alpha) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi += alpha * (k * xi_prime).sin() * (k * eta_prime).cosh();
            eta += alpha * (k * xi_prime).cos() * (k * eta_prime).sinh();
        }
        (xi, eta)
    }
}

/// tan χ from tan φ, χ being the conformal latitude.
fn geodetic_to_conformal_tau(tau: f64, e: f64) -> f64 {
    let tau1 = 1f64.hypot(tau);
    let sigma = (e * (e * tau / tau1).atanh()).sinh();
    tau * 1f64.hypot(sigma) - sigma * tau1
}

/// Newton inversion of [`geodetic_to_conformal_tau`].
fn conformal_to_geodetic_tau(tau_prime: f64, e: f64) -> Option<f64> {
    let one_minus_e2 = 1.0 - e * e;
    let tolerance = f64::EPSILON.sqrt() / 10.0;
    let mut tau = tau_prime;

    for _ in 0..NEWTON_MAX_ITERATIONS {
        let tau1 = 1f64.hypot(tau);
        let estimate = geodetic_to_conformal_tau(tau, e);
        let step = (tau_prime - estimate) / 1f64.hypot(estimate) * (1.0 + one_minus_e2 * tau * tau)
            / (one_minus_e2 * tau1);
        tau += step;
        if !tau.is_finite() {
            return None;
        }
        if step.abs() < tolerance * tau.abs().max(1.0) {
            return Some(tau);
        }
    }
    None
}

/// Rectifying radius ratio A/a plus the forward (α) and reverse (β) series
/// coefficients.
fn krueger_coefficients(n: f64) -> (f64, [f64; ORDER], [f64; ORDER]) {
    let n2 = n * n;
    let n3 = n2 * n;
    let n4 = n3 * n;
    let n5 = n4 * n;
    let n6 = n5 * n;

    let rectifying = (1.0 + n2 / 4.0 + n4 / 64.0 + n6 / 256.0) / (1.0 + n);

    let alpha = [
        n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0 - 127.0 * n5 / 288.0
            + 7891.0 * n6 / 37800.0,
        13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0 + 281.0 * n5 / 630.0
            - 1_983_433.0 * n6 / 1_935_360.0,
        61.0 * n3 / 240.0 - 103.0 * n4 / 140.0 + 15061.0 * n5 / 26880.0
            + 167_603.0 * n6 / 181_440.0,
        49561.0 * n4 / 161_280.0 - 179.0 * n5 / 168.0 + 6_601_661.0 * n6 / 7_257_600.0,
        34729.0 * n5 / 80640.0 - 3_418_889.0 * n6 / 1_995_840.0,
        212_378_941.0 * n6 / 319_334_400.0,
    ];

    let beta = [
        n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0 - n4 / 360.0 - 81.0 * n5 / 512.0
            + 96199.0 * n6 / 604_800.0,
        n2 / 48.0 + n3 / 15.0 - 437.0 * n4 / 1440.0 + 46.0 * n5 / 105.0
            - 1_118_711.0 * n6 / 3_870_720.0,
        17.0 * n3 / 480.0 - 37.0 * n4 / 840.0 - 209.0 * n5 / 4480.0 + 5569.0 * n6 / 90720.0,
        4397.0 * n4 / 161_280.0 - 11.0 * n5 / 504.0 - 830_251.0 * n6 / 7_257_600.0,
        4583.0 * n5 / 161_280.0 - 108_847.0 * n6 / 3_991_680.0,
        20_648_693.0 * n6 / 638_668_800.0,
    ];

    (rectifying, alpha, beta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gk_faja_5() -> TransverseMercator {
        TransverseMercator::new(&Ellipsoid::INTERNATIONAL_1924, -60.0, -90.0, 1.0, 5_500_000.0, 0.0)
    }

    fn utm_20_south() -> TransverseMercator {
        TransverseMercator::new(&Ellipsoid::WGS84, -63.0, 0.0, 0.9996, 500_000.0, 10_000_000.0)
    }

    #[test]
    fn test_equator_on_central_meridian_maps_to_false_origin() {
        let (easting, northing) = utm_20_south().forward(0.0, -63.0);
        assert!((easting - 500_000.0).abs() < 1e-9);
        assert!((northing - 10_000_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_south_pole_origin() {
        let projection = gk_faja_5();
        let (_, northing_at_equator) = projection.forward(0.0, -60.0);
        // Quarter meridian of the International 1924 ellipsoid.
        assert!((northing_at_equator - 10_002_288.3).abs() < 0.1);

        let (_, northing_at_pole) = projection.forward(-90.0, -60.0);
        assert!(northing_at_pole.abs() < 1e-6);
    }

    #[test]
    fn test_symmetry_about_central_meridian() {
        let projection = gk_faja_5();
        let (east, north_east) = projection.forward(-33.0, -58.5);
        let (west, north_west) = projection.forward(-33.0, -61.5);
        assert!(((east - 5_500_000.0) + (west - 5_500_000.0)).abs() < 1e-6);
        assert!((north_east - north_west).abs() < 1e-6);
    }

    #[test]
    fn test_known_projection_without_datum_shift() {
        let (easting, northing) = gk_faja_5().forward(-32.9442, -60.6505);
        assert!((easting - 5_439_167.259_291_5).abs() < 1e-3);
        assert!((northing - 6_355_485.259_338_9).abs() < 1e-3);
    }

    #[test]
    fn test_inverse_recovers_forward_input() {
        for projection in [gk_faja_5(), utm_20_south()] {
            for &(lat, lon) in &[(-22.0, -62.0), (-38.0, -57.1), (-55.0, -66.9), (-41.2, -60.0)] {
                let (easting, northing) = projection.forward(lat, lon);
                let (lat2, lon2) = projection.inverse(easting, northing).unwrap();
                assert!((lat2 - lat).abs() < 1e-12, "{lat2} vs {lat}");
                assert!((lon2 - lon).abs() < 1e-12, "{lon2} vs {lon}");
            }
        }
    }

    #[test]
    fn test_far_from_central_meridian_stays_finite() {
        let projection = gk_faja_5();
        for offset in [-30.0, -20.0, 20.0, 30.0] {
            for lat in [-60.0, -30.0, -5.0, 0.0] {
                let (easting, northing) = projection.forward(lat, -60.0 + offset);
                assert!(easting.is_finite() && northing.is_finite());
                let (lat2, lon2) = projection.inverse(easting, northing).unwrap();
                assert!((lat2 - lat).abs() < 1e-9);
                assert!((lon2 - (-60.0 + offset)).abs() < 1e-9);
            }
        }
    }
}
