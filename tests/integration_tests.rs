use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use traductor_coordenadas::utils::validation::Validate;
use traductor_coordenadas::{
    CliConfig, ConversionEngine, ConversionError, ConversionReport, CsvPipeline, LocalStorage,
    ZoneRegistry,
};

const ROSARIO_CSV: &str = "nombre,lat,lng
Monumento a la Bandera,-32.9442,-60.6505
Parque Independencia,-32.9477,-60.6395
\"Terminal, Rosario\",-32.9398,-60.6278
Sin datos,abc,-60.6
";

fn write_input(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

fn cli(args: &[&str]) -> CliConfig {
    let mut argv = vec!["traductor-coordenadas"];
    argv.extend_from_slice(args);
    let config = CliConfig::try_parse_from(argv).unwrap();
    config.validate().unwrap();
    config
}

async fn convert(config: CliConfig) -> Result<ConversionReport, ConversionError> {
    let registry = Arc::new(ZoneRegistry::standard());
    let pipeline = CsvPipeline::new(LocalStorage::default(), config, registry)?;
    ConversionEngine::new(pipeline).run().await
}

fn read_rows(path: &str) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn test_end_to_end_round_trip_through_gauss_kruger() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let input = write_input(&dir, "puntos.csv", ROSARIO_CSV);

    let report = convert(cli(&["to-gk", "-i", &input])).await?;

    assert_eq!(report.total_rows, 4);
    assert_eq!(report.converted, 3);
    assert_eq!(report.failed, 1);
    assert!(!report.is_total_failure());

    let gk_csv = dir.path().join("gauss_kruger_puntos.csv");
    assert_eq!(report.outputs, vec![gk_csv.to_str().unwrap().to_string()]);

    let rows = read_rows(gk_csv.to_str().unwrap());
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2][0], "Terminal, Rosario");
    let easting: f64 = rows[0][3].parse()?;
    let northing: f64 = rows[0][4].parse()?;
    assert!((easting - 5_439_229.945_221).abs() < 1e-3);
    assert!((northing - 6_355_430.748_344).abs() < 1e-3);

    let back_base = dir.path().join("vuelta");
    let report = convert(cli(&[
        "to-wgs84",
        "-i",
        gk_csv.to_str().unwrap(),
        "-o",
        back_base.to_str().unwrap(),
        "--formats",
        "csv,kmz,geojson",
    ]))
    .await?;

    assert_eq!(report.converted, 3);
    assert_eq!(report.error_log, None);
    assert!(dir.path().join("vuelta.kmz").exists());
    assert!(dir.path().join("vuelta.geojson").exists());

    let originals = [(-32.9442, -60.6505), (-32.9477, -60.6395), (-32.9398, -60.6278)];
    let rows = read_rows(dir.path().join("vuelta.csv").to_str().unwrap());
    for (row, (lat, lng)) in rows.iter().zip(originals) {
        let n = row.len();
        let round_lat: f64 = row[n - 2].parse()?;
        let round_lng: f64 = row[n - 1].parse()?;
        assert!((round_lat - lat).abs() < 1e-7, "{} vs {}", round_lat, lat);
        assert!((round_lng - lng).abs() < 1e-7, "{} vs {}", round_lng, lng);
    }

    Ok(())
}

#[tokio::test]
async fn test_error_log_lists_failed_rows() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "puntos.csv", ROSARIO_CSV);

    let report = convert(cli(&["to-gk", "-i", &input])).await.unwrap();

    let log_path = report.error_log.clone().unwrap();
    assert!(log_path.ends_with("gauss_kruger_puntos_errores.log"));
    let log = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("Línea 4:"));
    assert!(lines[0].contains("abc"));

    assert_eq!(report.row_errors.len(), 1);
    assert!(report.row_errors[0].starts_with("Línea 4:"));
}

#[tokio::test]
async fn test_kml_outputs_for_google_maps() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "lotes.csv",
        "nombre,coordenadas_gauss_kruger_easting,coordenadas_gauss_kruger_northing
A,5439229.945221076,6355430.748343554
B,5440260.962679293,6355048.873110816
C,5441349.818855899,6355931.61509533
",
    );

    let report = convert(cli(&["to-gmaps", "-i", &input, "--geometry", "polygon"]))
        .await
        .unwrap();

    assert_eq!(report.outputs.len(), 4);
    let kml = std::fs::read_to_string(dir.path().join("wgs84_lotes.kml")).unwrap();
    assert!(kml.contains("<name>lotes</name>"));
    assert!(kml.contains("<Polygon>"));

    let kmz = std::fs::read(dir.path().join("wgs84_lotes.kmz")).unwrap();
    let archive = zip::ZipArchive::new(std::io::Cursor::new(kmz)).unwrap();
    assert_eq!(archive.len(), 1);
}

#[tokio::test]
async fn test_every_row_failing_is_a_total_failure() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "malo.csv", "lat,lng\n95.0,-58.0\nx,y\n");

    let report = convert(cli(&["to-gk", "-i", &input])).await.unwrap();

    assert!(report.is_total_failure());
    assert_eq!(report.failed, 2);
    assert!(report.row_errors[0].contains("95"));
}

#[tokio::test]
async fn test_unknown_zone_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "puntos.csv", ROSARIO_CSV);
    let config = CliConfig::try_parse_from(["traductor-coordenadas", "to-gk", "-i", &input, "-z", "99X"])
        .unwrap();

    let error = convert(config).await.unwrap_err();

    assert!(matches!(error, ConversionError::UnknownZone(_)));
    assert!(!dir.path().join("gauss_kruger_puntos.csv").exists());
}

#[tokio::test]
async fn test_missing_columns_write_nothing() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "sin_lng.csv", "nombre,lat\nA,-34.6\n");

    let error = convert(cli(&["to-gk", "-i", &input])).await.unwrap_err();

    assert!(matches!(error, ConversionError::MissingColumnsError { .. }));
    let written: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(written.len(), 1);
    assert!(!Path::new(&dir.path().join("gauss_kruger_sin_lng_errores.log")).exists());
}

#[tokio::test]
async fn test_missing_input_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("no_existe.csv");

    let error = convert(cli(&["to-gk", "-i", input.to_str().unwrap()]))
        .await
        .unwrap_err();

    assert!(matches!(error, ConversionError::InputUnreadableError { .. }));
}

#[tokio::test]
async fn test_latin1_input_is_fatal_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latin1.csv");
    std::fs::write(&path, b"nombre,lat,lng\nok,-34.6,-58.4\nJos\xe9,-34.6,-58.4\n").unwrap();

    let error = convert(cli(&["to-gk", "-i", path.to_str().unwrap()]))
        .await
        .unwrap_err();

    match &error {
        ConversionError::DecodingError { message } => assert!(message.contains("line 3"), "{message}"),
        other => panic!("unexpected error: {other}"),
    }
    let written: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(written, vec![std::ffi::OsString::from("latin1.csv")]);
}
