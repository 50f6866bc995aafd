use crate::geodesy::UnknownZoneError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error(transparent)]
    UnknownZone(#[from] UnknownZoneError),

    #[error("Cannot read input '{path}': {reason}")]
    InputUnreadableError { path: String, reason: String },

    #[error("Input '{source_name}' is empty: no header row found")]
    EmptyInputError { source_name: String },

    #[error("Input decoding error: {message}")]
    DecodingError { message: String },

    #[error("Missing required columns: {} (found: {})", .missing.join(", "), .found.join(", "))]
    MissingColumnsError {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("No rows converted: all {total} data rows failed")]
    NoRowsConverted { total: usize },

    #[error("Failed to write {format} output: {message}")]
    ExportError { format: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Processing,
    Output,
    System,
}

/// Ordered from least to most severe; binaries map it to the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl ConversionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConversionError::InputUnreadableError { .. }
            | ConversionError::EmptyInputError { .. }
            | ConversionError::DecodingError { .. }
            | ConversionError::MissingColumnsError { .. }
            | ConversionError::CsvError(_) => ErrorCategory::Input,
            ConversionError::UnknownZone(_)
            | ConversionError::ConfigError { .. }
            | ConversionError::ConfigValidationError { .. }
            | ConversionError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ConversionError::NoRowsConverted { .. } => ErrorCategory::Processing,
            ConversionError::ZipError(_)
            | ConversionError::SerializationError(_)
            | ConversionError::ExportError { .. } => ErrorCategory::Output,
            ConversionError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Processing => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Output | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ConversionError::UnknownZone(e) => {
                format!("Use one of the supported zones: {}", e.valid)
            }
            ConversionError::InputUnreadableError { path, .. } => {
                format!("Check that '{}' exists and is readable", path)
            }
            ConversionError::EmptyInputError { .. } => {
                "Provide a CSV file with a header row and at least one data row".to_string()
            }
            ConversionError::DecodingError { .. } => {
                "Save the input file as UTF-8 encoded CSV".to_string()
            }
            ConversionError::MissingColumnsError { missing, .. } => format!(
                "Add the columns {} to the header or map them with the column options",
                missing.join(", ")
            ),
            ConversionError::NoRowsConverted { .. } => {
                "Check the error log: values must use '.' as decimal separator and lie inside the selected zone".to_string()
            }
            ConversionError::CsvError(_) => {
                "Check the CSV delimiter and quoting of the input file".to_string()
            }
            ConversionError::ConfigError { .. }
            | ConversionError::ConfigValidationError { .. }
            | ConversionError::InvalidConfigValueError { .. } => {
                "Review the command line arguments or the TOML configuration file".to_string()
            }
            ConversionError::ZipError(_)
            | ConversionError::SerializationError(_)
            | ConversionError::ExportError { .. } => {
                "Check free disk space and permissions of the output directory".to_string()
            }
            ConversionError::IoError(_) => {
                "Check file permissions and available disk space".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("The input file could not be processed: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Processing => format!("Conversion failed: {}", self),
            ErrorCategory::Output => format!("Output files could not be written: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;
