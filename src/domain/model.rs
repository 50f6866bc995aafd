use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::ports::InputStream;
use crate::geodesy::ZoneId;

pub const NAME_COLUMN: &str = "nombre";
pub const LATITUDE_COLUMN: &str = "lat";
pub const LONGITUDE_COLUMN: &str = "lng";
pub const COMBINED_COLUMN: &str = "coordenadas";
pub const COMBINED_COLUMN_ALT: &str = "coordenadas_google_maps";
pub const EASTING_COLUMN: &str = "coordenadas_gauss_kruger_easting";
pub const NORTHING_COLUMN: &str = "coordenadas_gauss_kruger_northing";

/// Latitude/longitude in degrees on WGS84.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeodeticPoint {
    latitude: f64,
    longitude: f64,
}

impl GeodeticPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Easting/northing in metres, only meaningful together with its zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    easting: f64,
    northing: f64,
    zone: ZoneId,
}

impl ProjectedPoint {
    pub fn new(easting: f64, northing: f64, zone: ZoneId) -> Self {
        Self {
            easting,
            northing,
            zone,
        }
    }

    pub fn easting(&self) -> f64 {
        self.easting
    }

    pub fn northing(&self) -> f64 {
        self.northing
    }

    pub fn zone(&self) -> ZoneId {
        self.zone
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedPoint {
    Geodetic(GeodeticPoint),
    Projected(ProjectedPoint),
}

impl ParsedPoint {
    /// The two numbers as they appear in the computed output columns.
    pub fn values(&self) -> [f64; 2] {
        match self {
            ParsedPoint::Geodetic(point) => [point.latitude(), point.longitude()],
            ParsedPoint::Projected(point) => [point.easting(), point.northing()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[serde(alias = "wgs84_to_gk", alias = "to_gk")]
    ToGaussKruger,
    #[serde(alias = "gk_to_wgs84", alias = "to_gmaps")]
    ToWgs84,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ToGaussKruger => "wgs84_to_gk",
            Direction::ToWgs84 => "gk_to_wgs84",
        }
    }

    /// Columns appended to every converted row.
    pub fn output_columns(&self) -> [&'static str; 2] {
        match self {
            Direction::ToGaussKruger => [EASTING_COLUMN, NORTHING_COLUMN],
            Direction::ToWgs84 => [LATITUDE_COLUMN, LONGITUDE_COLUMN],
        }
    }

    /// Prefix of the default output name, followed by the input file stem.
    pub fn output_prefix(&self) -> &'static str {
        match self {
            Direction::ToGaussKruger => "gauss_kruger",
            Direction::ToWgs84 => "wgs84",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "wgs84-to-gk" | "to-gk" | "to-gauss-kruger" | "gk" => Ok(Direction::ToGaussKruger),
            "gk-to-wgs84" | "to-wgs84" | "to-gmaps" | "to-google-maps" | "wgs84" => {
                Ok(Direction::ToWgs84)
            }
            other => Err(format!(
                "unknown direction '{}' (expected wgs84_to_gk or gk_to_wgs84)",
                other
            )),
        }
    }
}

/// A converted input row: the original fields in input order plus the point
/// read from them and the point computed from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    line: usize,
    header: Arc<[String]>,
    fields: Vec<String>,
    source: ParsedPoint,
    converted: ParsedPoint,
}

impl Record {
    pub fn new(
        line: usize,
        header: Arc<[String]>,
        fields: Vec<String>,
        source: ParsedPoint,
        converted: ParsedPoint,
    ) -> Self {
        Self {
            line,
            header,
            fields,
            source,
            converted,
        }
    }

    /// 1-based data row number (the header is not counted).
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.header
            .iter()
            .position(|name| name == column)
            .and_then(|index| self.fields.get(index))
            .map(String::as_str)
    }

    pub fn source(&self) -> &ParsedPoint {
        &self.source
    }

    pub fn converted(&self) -> &ParsedPoint {
        &self.converted
    }

    /// The WGS84 side of the conversion, whichever direction it ran.
    pub fn geodetic(&self) -> Option<GeodeticPoint> {
        match (&self.source, &self.converted) {
            (ParsedPoint::Geodetic(point), _) | (_, ParsedPoint::Geodetic(point)) => Some(*point),
            _ => None,
        }
    }

    pub fn projected(&self) -> Option<ProjectedPoint> {
        match (&self.source, &self.converted) {
            (ParsedPoint::Projected(point), _) | (_, ParsedPoint::Projected(point)) => Some(*point),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Format,
    Range,
    ZoneEnvelope,
    Projection,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Format => "format",
            FailureKind::Range => "range",
            FailureKind::ZoneEnvelope => "zone envelope",
            FailureKind::Projection => "projection",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    pub line: usize,
    pub fields: Vec<String>,
    pub kind: FailureKind,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Outcome of a finished batch. Successes and failures both keep input order.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub direction: Direction,
    pub zone: ZoneId,
    pub header: Arc<[String]>,
    pub records: Vec<Record>,
    pub failures: Vec<RowFailure>,
}

impl BatchResult {
    pub fn output_header(&self) -> Vec<String> {
        self.header
            .iter()
            .cloned()
            .chain(self.direction.output_columns().iter().map(|c| c.to_string()))
            .collect()
    }

    pub fn total_rows(&self) -> usize {
        self.records.len() + self.failures.len()
    }

    pub fn is_total_failure(&self) -> bool {
        self.total_rows() > 0 && self.records.is_empty()
    }

    pub fn progress(&self) -> BatchProgress {
        BatchProgress {
            processed: self.total_rows(),
            succeeded: self.records.len(),
            failed: self.failures.len(),
        }
    }
}

/// An opened input, already checked to be UTF-8 and rewound to its start.
pub struct RawInput {
    pub source: String,
    /// Bytes scanned while checking the encoding.
    pub size: u64,
    pub reader: Box<dyn InputStream>,
}

impl fmt::Debug for RawInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawInput")
            .field("source", &self.source)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub direction: Direction,
    pub zone: String,
    pub total_rows: usize,
    pub converted: usize,
    pub failed: usize,
    pub outputs: Vec<String>,
    pub error_log: Option<String>,
    /// `Línea <n>: <reason>` for every failed row, in input order.
    pub row_errors: Vec<String>,
}

impl ConversionReport {
    pub fn is_total_failure(&self) -> bool {
        self.total_rows > 0 && self.converted == 0
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows with zone {}: {} converted, {} failed",
            self.total_rows, self.zone, self.converted, self.failed
        )?;
        if !self.outputs.is_empty() {
            write!(f, "; wrote {}", self.outputs.join(", "))?;
        }
        if let Some(log) = &self.error_log {
            write!(f, "; errors in {}", log)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parsing() {
        assert_eq!("wgs84_to_gk".parse::<Direction>(), Ok(Direction::ToGaussKruger));
        assert_eq!("TO-GK".parse::<Direction>(), Ok(Direction::ToGaussKruger));
        assert_eq!("gk_to_wgs84".parse::<Direction>(), Ok(Direction::ToWgs84));
        assert_eq!("to-gmaps".parse::<Direction>(), Ok(Direction::ToWgs84));
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_direction_output_columns() {
        assert_eq!(
            Direction::ToGaussKruger.output_columns(),
            [EASTING_COLUMN, NORTHING_COLUMN]
        );
        assert_eq!(Direction::ToWgs84.output_columns(), ["lat", "lng"]);
    }

    #[test]
    fn test_record_field_access() {
        let header: Arc<[String]> = vec!["nombre".to_string(), "lat".to_string(), "lng".to_string()].into();
        let source = GeodeticPoint::new(-34.6, -58.4);
        let converted = ProjectedPoint::new(5_650_000.0, 6_170_000.0, ZoneId::Gk5);
        let record = Record::new(
            1,
            header,
            vec!["obelisco".to_string(), "-34.6".to_string(), "-58.4".to_string()],
            ParsedPoint::Geodetic(source),
            ParsedPoint::Projected(converted),
        );

        assert_eq!(record.get("nombre"), Some("obelisco"));
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.geodetic(), Some(source));
        assert_eq!(record.projected(), Some(converted));
        assert_eq!(record.converted().values(), [5_650_000.0, 6_170_000.0]);
    }

    #[test]
    fn test_total_failure() {
        let result = BatchResult {
            direction: Direction::ToGaussKruger,
            zone: ZoneId::Gk5,
            header: vec!["lat".to_string(), "lng".to_string()].into(),
            records: vec![],
            failures: vec![RowFailure {
                line: 1,
                fields: vec!["abc".to_string(), "-58".to_string()],
                kind: FailureKind::Format,
                reason: "bad".to_string(),
            }],
        };
        assert!(result.is_total_failure());
        assert_eq!(result.output_header().len(), 4);
        assert_eq!(result.progress().failed, 1);
    }
}
