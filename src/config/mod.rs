#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

use crate::adapters::OutputFormat;
use crate::domain::model::Direction;
use crate::utils::error::{ConversionError, Result};
use std::path::Path;

const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

/// Output base path without extension. An explicit output keeps its
/// directory and name, with `{timestamp}` expanded and a known output
/// extension dropped. Without one the base sits next to the input as
/// `<prefix>_<input stem>`.
pub fn default_output_base(input_path: &str, direction: Direction, output: Option<&str>) -> String {
    if let Some(output) = output.map(str::trim).filter(|o| !o.is_empty()) {
        let output = output.replace(
            TIMESTAMP_PLACEHOLDER,
            &chrono::Local::now().format("%Y%m%d_%H%M%S").to_string(),
        );
        let path = Path::new(&output);
        let known_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.parse::<OutputFormat>().is_ok());
        return if known_extension {
            path.with_extension("").to_string_lossy().into_owned()
        } else {
            output
        };
    }

    let input = Path::new(input_path);
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "salida".to_string());
    let name = format!("{}_{}", direction.output_prefix(), stem);
    match input.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => parent.join(name).to_string_lossy().into_owned(),
        None => name,
    }
}

/// Name shown inside KML and GeoJSON documents: the input file stem.
pub fn default_document_name(input_path: &str) -> String {
    Path::new(input_path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "coordenadas".to_string())
}

/// Parses format names, falling back to the direction's defaults when none
/// are given. Duplicates are written once.
pub fn parse_formats(field_name: &str, formats: &[String], direction: Direction) -> Result<Vec<OutputFormat>> {
    let mut parsed: Vec<OutputFormat> = Vec::new();
    for name in formats.iter().filter(|name| !name.trim().is_empty()) {
        let format = name
            .parse::<OutputFormat>()
            .map_err(|reason| ConversionError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: name.clone(),
                reason,
            })?;
        if !parsed.contains(&format) {
            parsed.push(format);
        }
    }

    if parsed.is_empty() {
        Ok(OutputFormat::defaults_for(direction))
    } else {
        Ok(parsed)
    }
}
