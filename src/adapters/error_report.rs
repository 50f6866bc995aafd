use crate::domain::model::RowFailure;

/// One line per rejected row: `Línea <n>: <reason> | <raw fields>`.
pub fn render_error_log(failures: &[RowFailure]) -> String {
    let mut log = String::new();
    for failure in failures {
        log.push_str(&format!(
            "Línea {}: {} | {}\n",
            failure.line,
            failure.reason,
            failure.fields.join(",")
        ));
    }
    log
}
