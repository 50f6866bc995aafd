use clap::Parser;
use std::io::Seek;
use std::sync::Arc;
use traductor_coordenadas::adapters::encoding;
use traductor_coordenadas::config::toml_config::TomlConfig;
use traductor_coordenadas::core::validator::ColumnLayout;
use traductor_coordenadas::core::ConfigProvider;
use traductor_coordenadas::utils::{logger, validation::Validate};
use traductor_coordenadas::{ConversionEngine, ConversionError, CsvPipeline, LocalStorage, ZoneRegistry};

#[derive(Parser)]
#[command(name = "toml-convert")]
#[command(about = "Coordinate conversion driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "conversion.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the zone from config
    #[arg(short, long)]
    zone: Option<String>,

    /// Dry run - check the input header and count rows without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            logger::init_cli_logger(args.verbose);
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_logger(config.log_format(), args.verbose);
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Some(zone) = &args.zone {
        config.conversion.zone = Some(zone.clone());
        tracing::info!("🔧 Zone overridden to: {}", zone);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.severity().exit_code());
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    let registry = Arc::new(ZoneRegistry::standard());
    display_config_summary(&config, &registry, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be written");
        if let Err(e) = perform_dry_run(&config) {
            exit_with(e);
        }
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = match CsvPipeline::new(LocalStorage::default(), config, registry) {
        Ok(pipeline) => pipeline,
        Err(e) => exit_with(e),
    };
    let engine = ConversionEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            println!("✅ {}", report);
            for line in &report.row_errors {
                println!("  {}", line);
            }
            if report.is_total_failure() {
                exit_with(ConversionError::NoRowsConverted {
                    total: report.total_rows,
                });
            }
        }
        Err(e) => exit_with(e),
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, registry: &ZoneRegistry, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Direction: {}", config.direction());
    match registry.resolve(config.zone()) {
        Ok(zone) => println!("  Zone: {}", zone),
        Err(e) => println!("  Zone: {}", e),
    }
    println!("  Input: {}", config.input_path());
    println!("  Output base: {}", config.output_base());
    let formats: Vec<String> = config
        .output_formats()
        .iter()
        .map(|format| format.to_string())
        .collect();
    println!("  Formats: {}", formats.join(", "));
    println!("  Geometry: {:?}", config.geometry());

    if let Some(decimals) = config.decimals() {
        println!("  Decimals: {}", decimals);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) -> Result<(), ConversionError> {
    println!("🔍 Dry Run Analysis:");

    let mut file = std::fs::File::open(config.input_path()).map_err(|e| {
        ConversionError::InputUnreadableError {
            path: config.input_path().to_string(),
            reason: e.to_string(),
        }
    })?;
    let size = encoding::ensure_utf8(&mut file, config.input_path())?;
    println!("  Size: {} bytes (UTF-8)", size);
    file.rewind().map_err(|e| ConversionError::InputUnreadableError {
        path: config.input_path().to_string(),
        reason: e.to_string(),
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter())
        .flexible(true)
        .from_reader(file);

    let header: Vec<String> = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect();
    let layout = ColumnLayout::resolve(&header, config.direction(), &config.columns())?;
    println!("  Columns: {}", header.join(", "));
    match layout {
        ColumnLayout::Separate { first, second } => {
            println!("  Coordinates: '{}' and '{}'", header[first], header[second])
        }
        ColumnLayout::Combined { index } => println!("  Coordinates: '{}' (combined)", header[index]),
    }

    let mut rows = 0usize;
    for record in reader.byte_records() {
        record?;
        rows += 1;
    }
    println!("  Data rows: {}", rows);
    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}

fn exit_with(e: ConversionError) -> ! {
    tracing::error!(
        "❌ Conversion failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.severity().exit_code())
}
