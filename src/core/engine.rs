use crate::core::{ConversionReport, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives a pipeline through extract, transform and load.
pub struct ConversionEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ConversionEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<ConversionReport> {
        tracing::info!("Starting conversion...");
        self.monitor.log_stats("Start");

        tracing::info!("Reading input...");
        let input = self.pipeline.extract().await?;
        tracing::info!("Opened {} ({} bytes)", input.source, input.size);
        self.monitor.log_stats("Extract");

        tracing::info!("Converting rows...");
        let result = self.pipeline.transform(input).await?;
        tracing::info!(
            "Converted {} of {} rows ({} failed)",
            result.records.len(),
            result.total_rows(),
            result.failures.len()
        );
        self.monitor.log_stats("Transform");

        tracing::info!("Writing output...");
        let report = self.pipeline.load(result).await?;
        for output in &report.outputs {
            tracing::info!("Output saved to: {}", output);
        }
        if let Some(log) = &report.error_log {
            tracing::warn!("{} rows failed, see {}", report.failed, log);
        }
        self.monitor.log_final_stats(report.total_rows);

        Ok(report)
    }
}
