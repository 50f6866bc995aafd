use crate::geodesy::ZoneId;
use crate::utils::error::{ConversionError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(ConversionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ConversionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_extension(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    let extension = std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension {
        Some(ext) if allowed_extensions.contains(&ext.as_str()) => Ok(()),
        Some(ext) => Err(ConversionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                ext,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(ConversionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConversionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ConversionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// A CSV delimiter must be a single ASCII character other than the quote
/// character, the decimal point and line breaks.
pub fn validate_delimiter(field_name: &str, delimiter: &str) -> Result<u8> {
    let invalid = |reason: &str| ConversionError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: delimiter.to_string(),
        reason: reason.to_string(),
    };

    let delimiter = match delimiter {
        "\\t" | "tab" => "\t",
        other => other,
    };
    match delimiter.as_bytes() {
        [byte] if byte.is_ascii() && !matches!(byte, b'"' | b'.' | b'\n' | b'\r') => Ok(*byte),
        [_] => Err(invalid("Delimiter cannot be a quote, a dot or a line break")),
        _ => Err(invalid("Delimiter must be exactly one ASCII character")),
    }
}

/// An unknown zone is reported as such, the same error the registry raises.
pub fn validate_zone(zone: Option<&str>) -> Result<()> {
    match zone.map(str::trim) {
        None | Some("") => Ok(()),
        Some(identifier) => {
            identifier.parse::<ZoneId>()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("input", "puntos.csv").is_ok());
        assert!(validate_path("input", "").is_err());
        assert!(validate_path("input", "   ").is_err());
        assert!(validate_path("input", "a\0b").is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("input", "puntos.csv", &["csv", "txt"]).is_ok());
        assert!(validate_file_extension("input", "PUNTOS.CSV", &["csv", "txt"]).is_ok());
        assert!(validate_file_extension("input", "puntos.xlsx", &["csv", "txt"]).is_err());
        assert!(validate_file_extension("input", "puntos", &["csv", "txt"]).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("decimals", 3, 0, 15).is_ok());
        assert!(validate_range("decimals", 16, 0, 15).is_err());
    }

    #[test]
    fn test_validate_delimiter() {
        assert_eq!(validate_delimiter("delimiter", ",").unwrap(), b',');
        assert_eq!(validate_delimiter("delimiter", ";").unwrap(), b';');
        assert_eq!(validate_delimiter("delimiter", "\\t").unwrap(), b'\t');
        assert!(validate_delimiter("delimiter", ".").is_err());
        assert!(validate_delimiter("delimiter", ";;").is_err());
        assert!(validate_delimiter("delimiter", "").is_err());
    }

    #[test]
    fn test_validate_zone() {
        assert!(validate_zone(None).is_ok());
        assert!(validate_zone(Some("gk4")).is_ok());
        assert!(validate_zone(Some("EPSG:32720")).is_ok());

        match validate_zone(Some("99X")) {
            Err(ConversionError::UnknownZone(e)) => assert_eq!(e.identifier, "99X"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
