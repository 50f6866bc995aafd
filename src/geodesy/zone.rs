use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::datum::Datum;
use super::transverse_mercator::TransverseMercator;

/// Longitudes further than this from the central meridian are outside a zone.
const ZONE_HALF_WIDTH_DEG: f64 = 3.0;
/// Planar half width of a zone around its false easting, in metres.
const EASTING_HALF_WIDTH_M: f64 = 400_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneId {
    Gk1,
    Gk2,
    Gk3,
    Gk4,
    Gk5,
    Gk6,
    Gk7,
    Utm18S,
    Utm19S,
    Utm20S,
}

impl ZoneId {
    pub const ALL: [ZoneId; 10] = [
        ZoneId::Gk1,
        ZoneId::Gk2,
        ZoneId::Gk3,
        ZoneId::Gk4,
        ZoneId::Gk5,
        ZoneId::Gk6,
        ZoneId::Gk7,
        ZoneId::Utm18S,
        ZoneId::Utm19S,
        ZoneId::Utm20S,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneId::Gk1 => "GK1",
            ZoneId::Gk2 => "GK2",
            ZoneId::Gk3 => "GK3",
            ZoneId::Gk4 => "GK4",
            ZoneId::Gk5 => "GK5",
            ZoneId::Gk6 => "GK6",
            ZoneId::Gk7 => "GK7",
            ZoneId::Utm18S => "18S",
            ZoneId::Utm19S => "19S",
            ZoneId::Utm20S => "20S",
        }
    }

    pub fn epsg(&self) -> u32 {
        match self {
            ZoneId::Gk1 => 22191,
            ZoneId::Gk2 => 22192,
            ZoneId::Gk3 => 22193,
            ZoneId::Gk4 => 22194,
            ZoneId::Gk5 => 22195,
            ZoneId::Gk6 => 22196,
            ZoneId::Gk7 => 22197,
            ZoneId::Utm18S => 32718,
            ZoneId::Utm19S => 32719,
            ZoneId::Utm20S => 32720,
        }
    }

    /// Gauss-Krüger faja number, `None` for UTM zones.
    pub fn faja(&self) -> Option<u8> {
        match self {
            ZoneId::Gk1 => Some(1),
            ZoneId::Gk2 => Some(2),
            ZoneId::Gk3 => Some(3),
            ZoneId::Gk4 => Some(4),
            ZoneId::Gk5 => Some(5),
            ZoneId::Gk6 => Some(6),
            ZoneId::Gk7 => Some(7),
            ZoneId::Utm18S | ZoneId::Utm19S | ZoneId::Utm20S => None,
        }
    }

    fn valid_identifiers() -> String {
        ZoneId::ALL
            .iter()
            .map(ZoneId::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneId {
    type Err = UnknownZoneError;

    /// Accepts `GK5`, `gk 5`, `faja 5`, `20S`, `UTM-20S` and `EPSG:22195` style names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_uppercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect();

        let found = if let Some(code) = normalized.strip_prefix("EPSG:") {
            code.parse::<u32>()
                .ok()
                .and_then(|code| ZoneId::ALL.into_iter().find(|id| id.epsg() == code))
        } else if let Some(faja) = normalized.strip_prefix("FAJA") {
            faja.parse::<u8>()
                .ok()
                .and_then(|faja| ZoneId::ALL.into_iter().find(|id| id.faja() == Some(faja)))
        } else {
            let name = normalized.strip_prefix("UTM").unwrap_or(&normalized);
            ZoneId::ALL.into_iter().find(|id| id.as_str() == name)
        };

        found.ok_or_else(|| UnknownZoneError::new(s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown zone '{identifier}' (valid zones: {valid})")]
pub struct UnknownZoneError {
    pub identifier: String,
    pub valid: String,
}

impl UnknownZoneError {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            valid: ZoneId::valid_identifiers(),
        }
    }
}

/// One fully specified transverse Mercator zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    id: ZoneId,
    description: &'static str,
    datum: Datum,
    central_meridian: f64,
    latitude_of_origin: f64,
    scale_factor: f64,
    false_easting: f64,
    false_northing: f64,
    northing_max: f64,
    projection: TransverseMercator,
}

impl Zone {
    fn define(id: ZoneId) -> Self {
        match id.faja() {
            Some(faja) => {
                let faja = f64::from(faja);
                Self::new(
                    id,
                    gauss_krueger_description(id),
                    Datum::CAMPO_INCHAUSPE,
                    -75.0 + 3.0 * faja,
                    -90.0,
                    1.0,
                    faja * 1_000_000.0 + 500_000.0,
                    0.0,
                )
            }
            None => {
                let central_meridian = match id {
                    ZoneId::Utm18S => -75.0,
                    ZoneId::Utm19S => -69.0,
                    _ => -63.0,
                };
                Self::new(
                    id,
                    utm_description(id),
                    Datum::WGS84,
                    central_meridian,
                    0.0,
                    0.9996,
                    500_000.0,
                    10_000_000.0,
                )
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn new(
        id: ZoneId,
        description: &'static str,
        datum: Datum,
        central_meridian: f64,
        latitude_of_origin: f64,
        scale_factor: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let projection = TransverseMercator::new(
            datum.ellipsoid(),
            central_meridian,
            latitude_of_origin,
            scale_factor,
            false_easting,
            false_northing,
        );
        // Zones cover the southern hemisphere only; the equator bounds them.
        let (_, northing_max) = projection.forward(0.0, central_meridian);

        Self {
            id,
            description,
            datum,
            central_meridian,
            latitude_of_origin,
            scale_factor,
            false_easting,
            false_northing,
            northing_max,
            projection,
        }
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn epsg(&self) -> u32 {
        self.id.epsg()
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn datum(&self) -> &Datum {
        &self.datum
    }

    pub fn central_meridian(&self) -> f64 {
        self.central_meridian
    }

    pub fn latitude_of_origin(&self) -> f64 {
        self.latitude_of_origin
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn false_easting(&self) -> f64 {
        self.false_easting
    }

    pub fn false_northing(&self) -> f64 {
        self.false_northing
    }

    pub fn projection(&self) -> &TransverseMercator {
        &self.projection
    }

    /// Inclusive longitude range, in degrees, the zone is meant to serve.
    pub fn valid_longitude_span(&self) -> (f64, f64) {
        (
            self.central_meridian - ZONE_HALF_WIDTH_DEG,
            self.central_meridian + ZONE_HALF_WIDTH_DEG,
        )
    }

    pub fn contains_longitude(&self, longitude: f64) -> bool {
        let (west, east) = self.valid_longitude_span();
        (west..=east).contains(&longitude)
    }

    /// Inclusive easting range in metres.
    pub fn easting_envelope(&self) -> (f64, f64) {
        (
            self.false_easting - EASTING_HALF_WIDTH_M,
            self.false_easting + EASTING_HALF_WIDTH_M,
        )
    }

    /// Northing range in metres; the lower bound is exclusive.
    pub fn northing_envelope(&self) -> (f64, f64) {
        (0.0, self.northing_max)
    }

    pub fn contains_planar(&self, easting: f64, northing: f64) -> bool {
        let (min_e, max_e) = self.easting_envelope();
        let (min_n, max_n) = self.northing_envelope();
        (min_e..=max_e).contains(&easting) && northing > min_n && northing <= max_n
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (EPSG:{}, {})", self.id, self.epsg(), self.description)
    }
}

fn gauss_krueger_description(id: ZoneId) -> &'static str {
    match id {
        ZoneId::Gk1 => "Campo Inchauspe / Argentina faja 1",
        ZoneId::Gk2 => "Campo Inchauspe / Argentina faja 2",
        ZoneId::Gk3 => "Campo Inchauspe / Argentina faja 3",
        ZoneId::Gk4 => "Campo Inchauspe / Argentina faja 4",
        ZoneId::Gk5 => "Campo Inchauspe / Argentina faja 5",
        ZoneId::Gk6 => "Campo Inchauspe / Argentina faja 6",
        _ => "Campo Inchauspe / Argentina faja 7",
    }
}

fn utm_description(id: ZoneId) -> &'static str {
    match id {
        ZoneId::Utm18S => "WGS 84 / UTM zone 18S",
        ZoneId::Utm19S => "WGS 84 / UTM zone 19S",
        _ => "WGS 84 / UTM zone 20S",
    }
}

/// Immutable table of every supported zone, built once and shared by
/// reference.
#[derive(Debug, Clone)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
    default_zone: ZoneId,
}

impl ZoneRegistry {
    pub const DEFAULT_ZONE: ZoneId = ZoneId::Gk5;

    pub fn standard() -> Self {
        Self {
            zones: ZoneId::ALL.into_iter().map(Zone::define).collect(),
            default_zone: Self::DEFAULT_ZONE,
        }
    }

    pub fn lookup(&self, identifier: &str) -> Result<&Zone, UnknownZoneError> {
        let id = identifier.parse::<ZoneId>()?;
        Ok(self.get(id))
    }

    pub fn get(&self, id: ZoneId) -> &Zone {
        // Zones are stored in `ZoneId::ALL` order.
        &self.zones[id as usize]
    }

    pub fn default_zone(&self) -> &Zone {
        self.get(self.default_zone)
    }

    /// `None` or a blank identifier selects the default zone.
    pub fn resolve(&self, identifier: Option<&str>) -> Result<&Zone, UnknownZoneError> {
        match identifier.map(str::trim) {
            None | Some("") => Ok(self.default_zone()),
            Some(identifier) => self.lookup(identifier),
        }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }
}

impl Default for ZoneRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
