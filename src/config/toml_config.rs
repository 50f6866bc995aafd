use super::{default_document_name, default_output_base, parse_formats};
use crate::adapters::{GeometryMode, OutputFormat};
use crate::core::validator::ColumnNames;
use crate::core::ConfigProvider;
use crate::domain::model::Direction;
use crate::utils::error::{ConversionError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub conversion: ConversionConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    pub direction: Direction,
    pub zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    pub delimiter: Option<String>,
    pub columns: Option<ColumnNames>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub formats: Option<Vec<String>>,
    pub geometry: Option<GeometryMode>,
    pub decimals: Option<usize>,
    pub document_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_format: Option<LogFormat>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ConversionError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ConversionError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConversionError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("input.path", &self.input.path)?;
        validation::validate_file_extension("input.path", &self.input.path, &["csv", "txt"])?;

        if let Some(path) = &self.output.path {
            validation::validate_path("output.path", path)?;
        }

        validation::validate_zone(self.conversion.zone.as_deref())?;
        parse_formats("output.formats", self.format_names(), self.conversion.direction)?;

        if let Some(delimiter) = &self.input.delimiter {
            validation::validate_delimiter("input.delimiter", delimiter)?;
        }

        if let Some(decimals) = self.output.decimals {
            validation::validate_range("output.decimals", decimals, 0, 15)?;
        }

        if let Some(columns) = &self.input.columns {
            for (field, value) in [
                ("input.columns.name", &columns.name),
                ("input.columns.latitude", &columns.latitude),
                ("input.columns.longitude", &columns.longitude),
                ("input.columns.combined", &columns.combined),
                ("input.columns.easting", &columns.easting),
                ("input.columns.northing", &columns.northing),
            ] {
                validation::validate_non_empty_string(field, value)?;
            }
        }

        Ok(())
    }

    fn format_names(&self) -> &[String] {
        self.output.formats.as_deref().unwrap_or_default()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_format(&self) -> LogFormat {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format)
            .unwrap_or_default()
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_base(&self) -> String {
        default_output_base(
            &self.input.path,
            self.conversion.direction,
            self.output.path.as_deref(),
        )
    }

    fn direction(&self) -> Direction {
        self.conversion.direction
    }

    fn zone(&self) -> Option<&str> {
        self.conversion.zone.as_deref()
    }

    fn output_formats(&self) -> Vec<OutputFormat> {
        parse_formats("output.formats", self.format_names(), self.conversion.direction)
            .unwrap_or_else(|_| OutputFormat::defaults_for(self.conversion.direction))
    }

    fn geometry(&self) -> GeometryMode {
        self.output.geometry.unwrap_or_default()
    }

    fn decimals(&self) -> Option<usize> {
        self.output.decimals
    }

    fn columns(&self) -> ColumnNames {
        self.input.columns.clone().unwrap_or_default()
    }

    fn delimiter(&self) -> u8 {
        self.input
            .delimiter
            .as_deref()
            .and_then(|d| validation::validate_delimiter("input.delimiter", d).ok())
            .unwrap_or(b',')
    }

    fn document_name(&self) -> String {
        self.output
            .document_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| default_document_name(&self.input.path))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[conversion]
direction = "gk_to_wgs84"
zone = "GK4"

[input]
path = "datos/lotes.csv"
delimiter = ";"

[input.columns]
easting = "x"
northing = "y"

[output]
path = "salida/lotes"
formats = ["kml", "geojson"]
geometry = "polygon"
decimals = 7
document_name = "Lotes"

[monitoring]
enabled = true
log_format = "json"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.direction(), Direction::ToWgs84);
        assert_eq!(config.zone(), Some("GK4"));
        assert_eq!(config.delimiter(), b';');
        assert_eq!(config.columns().easting, "x");
        assert_eq!(config.columns().latitude, "lat");
        assert_eq!(
            config.output_formats(),
            vec![OutputFormat::Kml, OutputFormat::Geojson]
        );
        assert_eq!(config.geometry(), GeometryMode::Polygon);
        assert_eq!(config.decimals(), Some(7));
        assert_eq!(config.output_base(), "salida/lotes");
        assert_eq!(config.document_name(), "Lotes");
        assert!(config.monitoring_enabled());
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let toml_content = r#"
[conversion]
direction = "wgs84_to_gk"

[input]
path = "puntos.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.zone(), None);
        assert_eq!(config.output_formats(), vec![OutputFormat::Csv]);
        assert_eq!(config.geometry(), GeometryMode::Points);
        assert_eq!(config.output_base(), "gauss_kruger_puntos");
        assert_eq!(config.columns(), ColumnNames::default());
        assert!(!config.monitoring_enabled());
        assert_eq!(config.log_format(), LogFormat::Text);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TRADUCTOR_TEST_INPUT", "campo/relevamiento.csv");

        let toml_content = r#"
[conversion]
direction = "to_gk"

[input]
path = "${TRADUCTOR_TEST_INPUT}"

[output]
path = "${TRADUCTOR_TEST_UNSET_OUTPUT}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.input.path, "campo/relevamiento.csv");
        assert_eq!(
            config.output.path.as_deref(),
            Some("${TRADUCTOR_TEST_UNSET_OUTPUT}")
        );

        std::env::remove_var("TRADUCTOR_TEST_INPUT");
    }

    #[test]
    fn test_config_validation() {
        let unknown_zone = r#"
[conversion]
direction = "wgs84_to_gk"
zone = "99X"

[input]
path = "puntos.csv"
"#;
        let config = TomlConfig::from_toml_str(unknown_zone).unwrap();
        assert!(config.validate().is_err());

        let bad_format = r#"
[conversion]
direction = "wgs84_to_gk"

[input]
path = "puntos.csv"

[output]
formats = ["shp"]
"#;
        let config = TomlConfig::from_toml_str(bad_format).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        let error = TomlConfig::from_toml_str("[conversion]\ndirection = \"sideways\"\n").unwrap_err();
        assert!(matches!(error, ConversionError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[conversion]
direction = "gk_to_wgs84"

[input]
path = "archivo.csv"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.input_path(), "archivo.csv");
        assert_eq!(config.output_formats(), OutputFormat::ALL.to_vec());
    }
}
