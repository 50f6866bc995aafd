// Adapters layer: storage backends and the file formats written by the load stage.

pub mod csv_output;
pub mod encoding;
pub mod error_report;
pub mod geojson;
pub mod kml;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::model::{BatchResult, Direction, GeodeticPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Kml,
    Kmz,
    #[serde(alias = "json")]
    Geojson,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Csv,
        OutputFormat::Kml,
        OutputFormat::Kmz,
        OutputFormat::Geojson,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Kml => "kml",
            OutputFormat::Kmz => "kmz",
            OutputFormat::Geojson => "geojson",
        }
    }

    /// Converting to WGS84 produces map files as well; the other direction
    /// only a table.
    pub fn defaults_for(direction: Direction) -> Vec<OutputFormat> {
        match direction {
            Direction::ToGaussKruger => vec![OutputFormat::Csv],
            Direction::ToWgs84 => OutputFormat::ALL.to_vec(),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "kml" => Ok(OutputFormat::Kml),
            "kmz" => Ok(OutputFormat::Kmz),
            "geojson" | "json" => Ok(OutputFormat::Geojson),
            other => Err(format!(
                "unsupported format '{}' (valid formats: csv, kml, kmz, geojson)",
                other
            )),
        }
    }
}

/// How KML and GeoJSON present the converted points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryMode {
    #[default]
    Points,
    /// A single closed ring through every point, in input order.
    Polygon,
}

impl FromStr for GeometryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "points" | "point" => Ok(GeometryMode::Points),
            "polygon" => Ok(GeometryMode::Polygon),
            other => Err(format!(
                "unsupported geometry '{}' (expected points or polygon)",
                other
            )),
        }
    }
}

/// A WGS84 point with the label shown on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedPoint {
    pub name: String,
    pub point: GeodeticPoint,
}

/// The WGS84 side of every converted record, labelled from `name_column`
/// or by row number when the column is absent or blank.
pub fn named_points(result: &BatchResult, name_column: &str) -> Vec<NamedPoint> {
    result
        .records
        .iter()
        .filter_map(|record| {
            let point = record.geodetic()?;
            let name = record
                .get(name_column)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Punto {}", record.line()));
            Some(NamedPoint { name, point })
        })
        .collect()
}
