use super::{default_document_name, default_output_base, parse_formats};
use crate::adapters::{GeometryMode, OutputFormat};
use crate::core::validator::ColumnNames;
use crate::core::ConfigProvider;
use crate::domain::model::{
    Direction, COMBINED_COLUMN, EASTING_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN, NAME_COLUMN,
    NORTHING_COLUMN,
};
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "traductor-coordenadas")]
#[command(about = "Convert CSV coordinates between WGS84 and Gauss-Krüger (Campo Inchauspe)")]
pub struct CliConfig {
    /// wgs84_to_gk (alias to-gk) or gk_to_wgs84 (aliases to-wgs84, to-gmaps)
    pub direction: Direction,

    #[arg(short, long)]
    pub input: String,

    /// Output base path; defaults to <gauss_kruger|wgs84>_<input name> next to the input
    #[arg(short, long)]
    pub output: Option<String>,

    /// Zone identifier such as GK5, faja 4, EPSG:22195 or 20S
    #[arg(short, long)]
    pub zone: Option<String>,

    /// Comma-separated list of csv, kml, kmz, geojson
    #[arg(long, value_delimiter = ',')]
    pub formats: Vec<String>,

    #[arg(long, default_value = "points")]
    pub geometry: GeometryMode,

    /// Fixed decimals for computed values (full precision when omitted)
    #[arg(long)]
    pub decimals: Option<usize>,

    #[arg(long, default_value = ",")]
    pub delimiter: String,

    #[arg(long, default_value = NAME_COLUMN)]
    pub name_column: String,

    #[arg(long, default_value = LATITUDE_COLUMN)]
    pub lat_column: String,

    #[arg(long, default_value = LONGITUDE_COLUMN)]
    pub lng_column: String,

    #[arg(long, default_value = COMBINED_COLUMN)]
    pub combined_column: String,

    #[arg(long, default_value = EASTING_COLUMN)]
    pub easting_column: String,

    #[arg(long, default_value = NORTHING_COLUMN)]
    pub northing_column: String,

    /// Name of the KML/GeoJSON document; defaults to the input file name
    #[arg(long)]
    pub document_name: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    #[arg(long, help = "Log CPU and memory usage for each stage")]
    pub monitor: bool,
}

impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_base(&self) -> String {
        default_output_base(&self.input, self.direction, self.output.as_deref())
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    fn output_formats(&self) -> Vec<OutputFormat> {
        parse_formats("formats", &self.formats, self.direction)
            .unwrap_or_else(|_| OutputFormat::defaults_for(self.direction))
    }

    fn geometry(&self) -> GeometryMode {
        self.geometry
    }

    fn decimals(&self) -> Option<usize> {
        self.decimals
    }

    fn columns(&self) -> ColumnNames {
        ColumnNames {
            name: self.name_column.clone(),
            latitude: self.lat_column.clone(),
            longitude: self.lng_column.clone(),
            combined: self.combined_column.clone(),
            easting: self.easting_column.clone(),
            northing: self.northing_column.clone(),
        }
    }

    fn delimiter(&self) -> u8 {
        validation::validate_delimiter("delimiter", &self.delimiter).unwrap_or(b',')
    }

    fn document_name(&self) -> String {
        self.document_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| default_document_name(&self.input))
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input)?;
        validation::validate_file_extension("input", &self.input, &["csv", "txt"])?;

        if let Some(output) = &self.output {
            validation::validate_path("output", output)?;
        }

        validation::validate_zone(self.zone.as_deref())?;
        parse_formats("formats", &self.formats, self.direction)?;
        validation::validate_delimiter("delimiter", &self.delimiter)?;

        if let Some(decimals) = self.decimals {
            validation::validate_range("decimals", decimals, 0, 15)?;
        }

        for (field, value) in [
            ("name_column", &self.name_column),
            ("lat_column", &self.lat_column),
            ("lng_column", &self.lng_column),
            ("combined_column", &self.combined_column),
            ("easting_column", &self.easting_column),
            ("northing_column", &self.northing_column),
        ] {
            validation::validate_non_empty_string(field, value)?;
        }

        Ok(())
    }
}
