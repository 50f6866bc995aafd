//! Per-row checks run before any projection: column layout, number syntax,
//! coordinate ranges and zone envelopes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::model::{
    Direction, FailureKind, GeodeticPoint, ParsedPoint, ProjectedPoint, COMBINED_COLUMN,
    COMBINED_COLUMN_ALT, EASTING_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN, NAME_COLUMN,
    NORTHING_COLUMN,
};
use crate::geodesy::{Zone, ZoneId};
use crate::utils::error::ConversionError;

const UTF8_BOM: char = '\u{feff}';

/// Header names the converter looks for. Matching ignores case and
/// surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub name: String,
    pub latitude: String,
    pub longitude: String,
    pub combined: String,
    pub easting: String,
    pub northing: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            name: NAME_COLUMN.to_string(),
            latitude: LATITUDE_COLUMN.to_string(),
            longitude: LONGITUDE_COLUMN.to_string(),
            combined: COMBINED_COLUMN.to_string(),
            easting: EASTING_COLUMN.to_string(),
            northing: NORTHING_COLUMN.to_string(),
        }
    }
}

fn clean_label(column: &str) -> &str {
    column.trim_start_matches(UTF8_BOM).trim()
}

fn find_column(header: &[String], name: &str) -> Option<usize> {
    header
        .iter()
        .position(|column| clean_label(column).eq_ignore_ascii_case(name.trim()))
}

/// Where the two coordinate values of a row live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLayout {
    /// Latitude/longitude or easting/northing in two columns.
    Separate { first: usize, second: usize },
    /// A single `"lat,lng"` column as copied from Google Maps.
    Combined { index: usize },
}

impl ColumnLayout {
    /// Checks the header once per batch. Missing columns are fatal.
    pub fn resolve(
        header: &[String],
        direction: Direction,
        names: &ColumnNames,
    ) -> Result<Self, ConversionError> {
        let (first_name, second_name) = match direction {
            Direction::ToGaussKruger => (&names.latitude, &names.longitude),
            Direction::ToWgs84 => (&names.easting, &names.northing),
        };
        let first = find_column(header, first_name);
        let second = find_column(header, second_name);

        if let (Some(first), Some(second)) = (first, second) {
            return Ok(ColumnLayout::Separate { first, second });
        }

        if direction == Direction::ToGaussKruger {
            let combined = find_column(header, &names.combined)
                .or_else(|| find_column(header, COMBINED_COLUMN_ALT));
            if let Some(index) = combined {
                return Ok(ColumnLayout::Combined { index });
            }
        }

        let missing = [(first, first_name), (second, second_name)]
            .into_iter()
            .filter(|(index, _)| index.is_none())
            .map(|(_, name)| name.clone())
            .collect();
        Err(ConversionError::MissingColumnsError {
            missing,
            found: header.to_vec(),
        })
    }

    pub fn name_column(header: &[String], names: &ColumnNames) -> Option<usize> {
        find_column(header, &names.name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{column}: {reason} ('{value}')")]
    Format {
        column: String,
        value: String,
        reason: String,
    },

    #[error("{column}: value {value} outside [{min}, {max}]")]
    Range {
        column: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{column}: value {value} outside zone {zone} (valid [{min}, {max}])")]
    ZoneEnvelope {
        column: String,
        value: f64,
        zone: ZoneId,
        min: f64,
        max: f64,
    },
}

impl ValidationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ValidationError::Format { .. } => FailureKind::Format,
            ValidationError::Range { .. } => FailureKind::Range,
            ValidationError::ZoneEnvelope { .. } => FailureKind::ZoneEnvelope,
        }
    }

    fn format(column: &str, value: &str, reason: &str) -> Self {
        ValidationError::Format {
            column: column.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Parses one coordinate token. Only `.` is accepted as decimal separator.
pub fn parse_coordinate(column: &str, raw: &str) -> Result<f64, ValidationError> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(ValidationError::format(column, raw, "missing value"));
    }
    if token.contains(',') {
        return Err(ValidationError::format(
            column,
            raw,
            "comma decimal separator is not accepted, use '.'",
        ));
    }

    let value = token
        .parse::<f64>()
        .map_err(|_| ValidationError::format(column, raw, "not a number"))?;
    if !value.is_finite() {
        return Err(ValidationError::format(column, raw, "not a finite number"));
    }
    Ok(value)
}

fn check_range(column: &str, value: f64, min: f64, max: f64) -> Result<f64, ValidationError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::Range {
            column: column.to_string(),
            value,
            min,
            max,
        })
    }
}

pub struct RecordValidator<'z> {
    direction: Direction,
    layout: ColumnLayout,
    /// Header labels the two values were read from; both name the same
    /// column for a combined layout.
    labels: (String, String),
    zone: &'z Zone,
}

impl<'z> RecordValidator<'z> {
    pub fn new(direction: Direction, layout: ColumnLayout, header: &[String], zone: &'z Zone) -> Self {
        let label = |index: usize| {
            header
                .get(index)
                .map(|column| clean_label(column).to_string())
                .unwrap_or_default()
        };
        let labels = match layout {
            ColumnLayout::Separate { first, second } => (label(first), label(second)),
            ColumnLayout::Combined { index } => (label(index), label(index)),
        };

        Self {
            direction,
            layout,
            labels,
            zone,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn validate(&self, fields: &[String]) -> Result<ParsedPoint, ValidationError> {
        let field = |index: usize| fields.get(index).map(String::as_str).unwrap_or("");

        let (first, second) = match self.layout {
            ColumnLayout::Separate { first, second } => (
                parse_coordinate(&self.labels.0, field(first))?,
                parse_coordinate(&self.labels.1, field(second))?,
            ),
            ColumnLayout::Combined { index } => self.parse_combined(field(index))?,
        };

        match self.direction {
            Direction::ToGaussKruger => self.validate_geodetic(first, second),
            Direction::ToWgs84 => self.validate_planar(first, second),
        }
    }

    fn parse_combined(&self, raw: &str) -> Result<(f64, f64), ValidationError> {
        let column = self.labels.0.as_str();
        let parts: Vec<&str> = raw.split(',').collect();
        match parts.as_slice() {
            [lat, lng] => Ok((
                parse_coordinate(column, lat)?,
                parse_coordinate(column, lng)?,
            )),
            [single] if single.trim().is_empty() => {
                Err(ValidationError::format(column, raw, "missing value"))
            }
            _ => Err(ValidationError::format(
                column,
                raw,
                "expected 'lat,lng' with '.' as decimal separator",
            )),
        }
    }

    fn validate_geodetic(&self, latitude: f64, longitude: f64) -> Result<ParsedPoint, ValidationError> {
        let latitude = check_range(&self.labels.0, latitude, -90.0, 90.0)?;
        let longitude = check_range(&self.labels.1, longitude, -180.0, 180.0)?;

        if !self.zone.contains_longitude(longitude) {
            let (min, max) = self.zone.valid_longitude_span();
            return Err(ValidationError::ZoneEnvelope {
                column: self.labels.1.clone(),
                value: longitude,
                zone: self.zone.id(),
                min,
                max,
            });
        }

        Ok(ParsedPoint::Geodetic(GeodeticPoint::new(latitude, longitude)))
    }

    fn validate_planar(&self, easting: f64, northing: f64) -> Result<ParsedPoint, ValidationError> {
        let (min_e, max_e) = self.zone.easting_envelope();
        let easting = check_range(&self.labels.0, easting, min_e, max_e)?;

        let (min_n, max_n) = self.zone.northing_envelope();
        if northing <= min_n || northing > max_n {
            return Err(ValidationError::Range {
                column: self.labels.1.clone(),
                value: northing,
                min: min_n,
                max: max_n,
            });
        }

        Ok(ParsedPoint::Projected(ProjectedPoint::new(
            easting,
            northing,
            self.zone.id(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::ZoneRegistry;

    fn header(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn to_gk_validator(registry: &ZoneRegistry) -> RecordValidator<'_> {
        let columns = header(&["nombre", "lat", "lng"]);
        let layout =
            ColumnLayout::resolve(&columns, Direction::ToGaussKruger, &ColumnNames::default()).unwrap();
        RecordValidator::new(Direction::ToGaussKruger, layout, &columns, registry.default_zone())
    }

    #[test]
    fn test_resolve_separate_columns() {
        let layout = ColumnLayout::resolve(
            &header(&["nombre", " LAT ", "lng"]),
            Direction::ToGaussKruger,
            &ColumnNames::default(),
        )
        .unwrap();
        assert_eq!(layout, ColumnLayout::Separate { first: 1, second: 2 });
    }

    #[test]
    fn test_resolve_ignores_byte_order_mark() {
        let layout = ColumnLayout::resolve(
            &header(&["\u{feff}lat", "lng"]),
            Direction::ToGaussKruger,
            &ColumnNames::default(),
        )
        .unwrap();
        assert_eq!(layout, ColumnLayout::Separate { first: 0, second: 1 });
    }

    #[test]
    fn test_resolve_combined_column() {
        let names = ColumnNames::default();
        let layout = ColumnLayout::resolve(
            &header(&["nombre", "coordenadas_google_maps"]),
            Direction::ToGaussKruger,
            &names,
        )
        .unwrap();
        assert_eq!(layout, ColumnLayout::Combined { index: 1 });
    }

    #[test]
    fn test_resolve_missing_columns_is_fatal() {
        let error = ColumnLayout::resolve(
            &header(&["nombre", "lng"]),
            Direction::ToGaussKruger,
            &ColumnNames::default(),
        )
        .unwrap_err();
        match error {
            ConversionError::MissingColumnsError { missing, found } => {
                assert_eq!(missing, vec!["lat".to_string()]);
                assert_eq!(found.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(ColumnLayout::resolve(
            &header(&["nombre", "lat", "lng"]),
            Direction::ToWgs84,
            &ColumnNames::default(),
        )
        .is_err());
    }

    #[test]
    fn test_non_numeric_latitude_is_format_error() {
        let registry = ZoneRegistry::standard();
        let validator = to_gk_validator(&registry);
        let error = validator.validate(&row(&["a", "abc", "-58.37"])).unwrap_err();
        assert_eq!(error.kind(), FailureKind::Format);
        assert!(error.to_string().contains("abc"));
    }

    #[test]
    fn test_out_of_range_latitude() {
        let registry = ZoneRegistry::standard();
        let validator = to_gk_validator(&registry);
        let error = validator.validate(&row(&["a", "95.0", "-58.37"])).unwrap_err();
        assert_eq!(error.kind(), FailureKind::Range);
        let message = error.to_string();
        assert!(message.contains("95"), "{message}");
        assert!(message.contains("[-90, 90]"), "{message}");
    }

    #[test]
    fn test_comma_decimal_is_rejected() {
        let registry = ZoneRegistry::standard();
        let validator = to_gk_validator(&registry);
        let error = validator.validate(&row(&["a", "-34,6083", "-58.37"])).unwrap_err();
        assert_eq!(error.kind(), FailureKind::Format);
    }

    #[test]
    fn test_non_finite_and_missing_values() {
        let registry = ZoneRegistry::standard();
        let validator = to_gk_validator(&registry);
        for bad in ["NaN", "inf", "", "   "] {
            let error = validator.validate(&row(&["a", bad, "-58.37"])).unwrap_err();
            assert_eq!(error.kind(), FailureKind::Format, "{bad:?}");
        }
        let error = validator.validate(&row(&["a"])).unwrap_err();
        assert_eq!(error.kind(), FailureKind::Format);
    }

    #[test]
    fn test_longitude_outside_zone() {
        let registry = ZoneRegistry::standard();
        let validator = to_gk_validator(&registry);
        let error = validator.validate(&row(&["a", "-31.4", "-64.18"])).unwrap_err();
        assert_eq!(error.kind(), FailureKind::ZoneEnvelope);

        let point = validator.validate(&row(&[" a ", " -34.6083 ", "-58.3712"])).unwrap();
        assert_eq!(
            point,
            ParsedPoint::Geodetic(GeodeticPoint::new(-34.6083, -58.3712))
        );
    }

    #[test]
    fn test_combined_values() {
        let registry = ZoneRegistry::standard();
        let validator = RecordValidator::new(
            Direction::ToGaussKruger,
            ColumnLayout::Combined { index: 1 },
            &header(&["nombre", "coordenadas"]),
            registry.default_zone(),
        );

        let point = validator.validate(&row(&["a", "-34.6083, -58.3712"])).unwrap();
        assert_eq!(
            point,
            ParsedPoint::Geodetic(GeodeticPoint::new(-34.6083, -58.3712))
        );

        let error = validator.validate(&row(&["a", "-34,6083,-58,3712"])).unwrap_err();
        assert_eq!(error.kind(), FailureKind::Format);
    }

    #[test]
    fn test_combined_errors_name_the_column_read() {
        let registry = ZoneRegistry::standard();
        let columns = header(&["nombre", "\u{feff}Coordenadas_Google_Maps"]);
        let layout =
            ColumnLayout::resolve(&columns, Direction::ToGaussKruger, &ColumnNames::default()).unwrap();
        let validator =
            RecordValidator::new(Direction::ToGaussKruger, layout, &columns, registry.default_zone());

        let error = validator.validate(&row(&["a", "95.0,-58.37"])).unwrap_err();
        match &error {
            ValidationError::Range { column, .. } => assert_eq!(column, "Coordenadas_Google_Maps"),
            other => panic!("unexpected error: {other}"),
        }

        let error = validator.validate(&row(&["a", "-34.6,-70.0"])).unwrap_err();
        assert_eq!(error.kind(), FailureKind::ZoneEnvelope);
        assert!(error.to_string().starts_with("Coordenadas_Google_Maps: value -70"), "{error}");
    }

    #[test]
    fn test_planar_envelope() {
        let registry = ZoneRegistry::standard();
        let columns = header(&["nombre", EASTING_COLUMN, NORTHING_COLUMN]);
        let layout = ColumnLayout::resolve(&columns, Direction::ToWgs84, &ColumnNames::default()).unwrap();
        let validator =
            RecordValidator::new(Direction::ToWgs84, layout, &columns, registry.get(ZoneId::Utm20S));

        assert!(validator.validate(&row(&["a", "500000", "6100000"])).is_ok());

        let error = validator.validate(&row(&["a", "950000", "6100000"])).unwrap_err();
        assert_eq!(error.kind(), FailureKind::Range);

        let error = validator.validate(&row(&["a", "500000", "-5"])).unwrap_err();
        assert_eq!(error.kind(), FailureKind::Range);
        assert!(error.to_string().starts_with(NORTHING_COLUMN), "{error}");
    }
}
