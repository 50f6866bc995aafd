use crate::adapters::{csv_output, encoding, error_report, geojson, kml, named_points, OutputFormat};
use crate::core::batch::{run_batch_with, BatchOptions};
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{BatchResult, ConversionReport, RawInput};
use crate::geodesy::{Zone, ZoneId, ZoneRegistry};
use crate::utils::error::{ConversionError, Result};
use std::io::Seek;
use std::sync::Arc;

const PROGRESS_LOG_INTERVAL: usize = 10_000;

/// Reads a CSV file, converts every row with one zone and writes the
/// requested output files next to the configured output base.
pub struct CsvPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    registry: Arc<ZoneRegistry>,
    zone: ZoneId,
}

impl<S: Storage, C: ConfigProvider> CsvPipeline<S, C> {
    /// Resolves the configured zone up front so an unknown identifier fails
    /// before any input is read.
    pub fn new(storage: S, config: C, registry: Arc<ZoneRegistry>) -> Result<Self> {
        let zone = registry.resolve(config.zone())?.id();
        tracing::debug!("Using zone {}", registry.get(zone));
        Ok(Self {
            storage,
            config,
            registry,
            zone,
        })
    }

    pub fn zone(&self) -> &Zone {
        self.registry.get(self.zone)
    }

    fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            direction: self.config.direction(),
            columns: self.config.columns(),
            delimiter: self.config.delimiter(),
            source_name: self.config.input_path().to_string(),
        }
    }

    async fn write_output(&self, path: String, data: &[u8], outputs: &mut Vec<String>) -> Result<()> {
        tracing::debug!("Writing {} ({} bytes)", path, data.len());
        self.storage.write_file(&path, data).await?;
        outputs.push(path);
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for CsvPipeline<S, C> {
    /// Opens the input and checks its encoding before any row is read.
    async fn extract(&self) -> Result<RawInput> {
        let source = self.config.input_path().to_string();
        tracing::debug!("Opening input: {}", source);
        let mut reader = self.storage.open_file(&source).await?;

        let size = encoding::ensure_utf8(&mut reader, &source)?;
        reader
            .rewind()
            .map_err(|e| ConversionError::InputUnreadableError {
                path: source.clone(),
                reason: e.to_string(),
            })?;

        Ok(RawInput {
            source,
            size,
            reader,
        })
    }

    async fn transform(&self, input: RawInput) -> Result<BatchResult> {
        let options = self.batch_options();
        tracing::debug!(
            "Converting {} ({} bytes) {} with zone {}",
            input.source,
            input.size,
            options.direction,
            self.zone
        );

        run_batch_with(input.reader, &options, self.zone(), |progress| {
            if progress.processed % PROGRESS_LOG_INTERVAL == 0 {
                tracing::info!(
                    "Processed {} rows ({} converted, {} failed)",
                    progress.processed,
                    progress.succeeded,
                    progress.failed
                );
            }
        })
    }

    async fn load(&self, result: BatchResult) -> Result<ConversionReport> {
        let base = self.config.output_base();
        let formats = self.config.output_formats();
        let mut outputs = Vec::new();

        let needs_kml = formats
            .iter()
            .any(|format| matches!(format, OutputFormat::Kml | OutputFormat::Kmz));
        let points = named_points(&result, &self.config.columns().name);
        let document_name = self.config.document_name();
        let kml_document = if needs_kml {
            Some(kml::render_kml(&points, &document_name, self.config.geometry())?)
        } else {
            None
        };

        for format in &formats {
            let path = format!("{}.{}", base, format.extension());
            let data = match format {
                OutputFormat::Csv => csv_output::render_csv(
                    &result,
                    self.config.delimiter(),
                    self.config.decimals(),
                )?,
                OutputFormat::Kml => kml_document.clone().unwrap_or_default().into_bytes(),
                OutputFormat::Kmz => kml::package_kmz(kml_document.as_deref().unwrap_or_default())?,
                OutputFormat::Geojson => {
                    geojson::render_geojson(&points, &document_name, self.config.geometry())?
                        .into_bytes()
                }
            };
            self.write_output(path, &data, &mut outputs).await?;
        }

        let error_log = if result.failures.is_empty() {
            None
        } else {
            let path = format!("{}_errores.log", base);
            let log = error_report::render_error_log(&result.failures);
            tracing::debug!("Writing {} row errors to {}", result.failures.len(), path);
            self.storage.write_file(&path, log.as_bytes()).await?;
            Some(path)
        };

        Ok(ConversionReport {
            direction: result.direction,
            zone: result.zone.to_string(),
            total_rows: result.total_rows(),
            converted: result.records.len(),
            failed: result.failures.len(),
            outputs,
            error_log,
            row_errors: result
                .failures
                .iter()
                .map(|failure| format!("Línea {}: {}", failure.line, failure.reason))
                .collect(),
        })
    }
}
