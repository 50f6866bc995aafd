use clap::Parser;
use std::sync::Arc;
use traductor_coordenadas::utils::{logger, validation::Validate};
use traductor_coordenadas::{
    CliConfig, ConversionEngine, ConversionError, ConversionReport, CsvPipeline, LocalStorage,
    ZoneRegistry,
};

const MAX_LISTED_ROW_ERRORS: usize = 20;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_logger(config.log_format, config.verbose);

    tracing::info!("Starting traductor-coordenadas");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.severity().exit_code());
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let registry = Arc::new(ZoneRegistry::standard());
    let pipeline = match CsvPipeline::new(LocalStorage::default(), config, registry) {
        Ok(pipeline) => pipeline,
        Err(e) => exit_with(e),
    };
    tracing::info!("Zone: {}", pipeline.zone());

    let engine = ConversionEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            print_report(&report);
            if report.is_total_failure() {
                exit_with(ConversionError::NoRowsConverted {
                    total: report.total_rows,
                });
            }
            tracing::info!("✅ Conversion completed: {}", report);
        }
        Err(e) => exit_with(e),
    }

    Ok(())
}

fn print_report(report: &ConversionReport) {
    println!(
        "Direction: {} | Zone: {}",
        report.direction, report.zone
    );
    println!(
        "Rows: {} | Converted: {} | Failed: {}",
        report.total_rows, report.converted, report.failed
    );

    for output in &report.outputs {
        println!("📁 {}", output);
    }

    if !report.row_errors.is_empty() {
        println!();
        println!("⚠️  Rows with errors:");
        for line in report.row_errors.iter().take(MAX_LISTED_ROW_ERRORS) {
            println!("  {}", line);
        }
        let hidden = report.row_errors.len().saturating_sub(MAX_LISTED_ROW_ERRORS);
        if hidden > 0 {
            println!("  ... and {} more", hidden);
        }
        if let Some(log) = &report.error_log {
            println!("  Full list in {}", log);
        }
    }
}

fn exit_with(e: ConversionError) -> ! {
    tracing::error!(
        "❌ Conversion failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(e.severity().exit_code())
}
