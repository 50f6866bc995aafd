use crate::domain::model::BatchResult;
use crate::utils::error::{ConversionError, Result};

/// Formats a computed value. Without a fixed decimal count the shortest
/// representation that parses back to the same `f64` is used.
pub fn format_number(value: f64, decimals: Option<usize>) -> String {
    match decimals {
        Some(decimals) => format!("{:.*}", decimals, value),
        None => value.to_string(),
    }
}

/// Header plus one line per converted record: original fields first, then
/// the two computed columns.
pub fn render_csv(result: &BatchResult, delimiter: u8, decimals: Option<usize>) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer.write_record(result.output_header())?;
    for record in &result.records {
        let computed = record
            .converted()
            .values()
            .map(|value| format_number(value, decimals));
        let fields = record.fields().iter().chain(computed.iter());
        writer.write_record(fields)?;
    }

    writer
        .into_inner()
        .map_err(|e| ConversionError::ExportError {
            format: "csv".to_string(),
            message: e.to_string(),
        })
}
