pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod geodesy;
pub mod utils;

pub use adapters::storage::LocalStorage;
pub use adapters::{GeometryMode, OutputFormat};
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use core::{engine::ConversionEngine, pipeline::CsvPipeline};
pub use domain::model::{ConversionReport, Direction};
pub use geodesy::{ZoneId, ZoneRegistry};
pub use utils::error::{ConversionError, Result};
