//! Fault-tolerant row loop: every data row ends up either converted or in the
//! failure list, in input order, and nothing is exposed before `finish`.

use std::io::Read;
use std::sync::Arc;

use crate::core::validator::{ColumnLayout, ColumnNames, RecordValidator};
use crate::domain::model::{
    BatchProgress, BatchResult, Direction, FailureKind, ParsedPoint, Record, RowFailure,
};
use crate::geodesy::{self, Zone};
use crate::utils::error::{ConversionError, Result};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub direction: Direction,
    pub columns: ColumnNames,
    pub delimiter: u8,
    /// Shown in fatal errors about the input.
    pub source_name: String,
}

impl BatchOptions {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            columns: ColumnNames::default(),
            delimiter: b',',
            source_name: "<input>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Pending,
    Validated,
    Transformed,
    Rejected,
}

impl RowState {
    /// `Pending → Validated → Transformed`, or `Rejected` from any
    /// non-terminal state.
    pub fn can_advance_to(self, next: RowState) -> bool {
        matches!(
            (self, next),
            (RowState::Pending, RowState::Validated)
                | (RowState::Validated, RowState::Transformed)
                | (RowState::Pending | RowState::Validated, RowState::Rejected)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RowState::Transformed | RowState::Rejected)
    }

    fn advance(self, next: RowState, line: usize) -> RowState {
        debug_assert!(
            self.can_advance_to(next),
            "row {line}: invalid transition {self:?} -> {next:?}"
        );
        tracing::trace!("Row {}: {:?} -> {:?}", line, self, next);
        next
    }
}

pub struct BatchPipeline<'z> {
    direction: Direction,
    zone: &'z Zone,
    validator: RecordValidator<'z>,
    header: Arc<[String]>,
    records: Vec<Record>,
    failures: Vec<RowFailure>,
    progress: BatchProgress,
}

impl<'z> BatchPipeline<'z> {
    /// Checks the header against the direction's required columns.
    pub fn open(header: Vec<String>, options: &BatchOptions, zone: &'z Zone) -> Result<Self> {
        let layout = ColumnLayout::resolve(&header, options.direction, &options.columns)?;
        tracing::debug!("Column layout for {}: {:?}", options.direction, layout);

        Ok(Self {
            direction: options.direction,
            zone,
            validator: RecordValidator::new(options.direction, layout, &header, zone),
            header: header.into(),
            records: Vec::new(),
            failures: Vec::new(),
            progress: BatchProgress::default(),
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Runs one data row to a terminal state. Coordinates are checked before
    /// the row width, so a row missing a coordinate fails as `Format`.
    pub fn process_row(&mut self, fields: Vec<String>) -> RowState {
        let line = self.progress.processed + 1;
        let state = RowState::Pending;

        let source = match self.validator.validate(&fields) {
            Ok(point) => point,
            Err(e) => return self.reject(state, line, fields, e.kind(), e.to_string()),
        };
        let state = state.advance(RowState::Validated, line);

        let converted = match self.convert(&source) {
            Ok(point) => point,
            Err(e) => {
                tracing::error!("Row {}: projection failed: {}", line, e);
                return self.reject(state, line, fields, FailureKind::Projection, e.to_string());
            }
        };

        let fields = self.fit_to_header(line, fields);
        self.records.push(Record::new(
            line,
            Arc::clone(&self.header),
            fields,
            source,
            converted,
        ));
        self.progress.processed += 1;
        self.progress.succeeded += 1;
        state.advance(RowState::Transformed, line)
    }

    pub fn progress(&self) -> BatchProgress {
        self.progress
    }

    /// Closes the batch; the pipeline cannot be reused.
    pub fn finish(self) -> BatchResult {
        tracing::debug!(
            "Batch closed: {} processed, {} converted, {} failed",
            self.progress.processed,
            self.progress.succeeded,
            self.progress.failed
        );
        BatchResult {
            direction: self.direction,
            zone: self.zone.id(),
            header: self.header,
            records: self.records,
            failures: self.failures,
        }
    }

    fn convert(&self, source: &ParsedPoint) -> std::result::Result<ParsedPoint, geodesy::ProjectionError> {
        match source {
            ParsedPoint::Geodetic(point) => {
                geodesy::to_projected(*point, self.zone).map(ParsedPoint::Projected)
            }
            ParsedPoint::Projected(point) => {
                geodesy::to_geodetic(point, self.zone).map(ParsedPoint::Geodetic)
            }
        }
    }

    /// Missing trailing fields are written empty and extra ones are dropped,
    /// keeping the output columns aligned with the header.
    fn fit_to_header(&self, line: usize, mut fields: Vec<String>) -> Vec<String> {
        let width = self.header.len();
        if fields.len() > width {
            let extra = fields.split_off(width);
            tracing::warn!(
                "Row {}: ignoring {} field(s) beyond the header: {}",
                line,
                extra.len(),
                extra.join(",")
            );
        } else if fields.len() < width {
            tracing::debug!("Row {}: {} of {} fields, rest left empty", line, fields.len(), width);
            fields.resize(width, String::new());
        }
        fields
    }

    fn reject(
        &mut self,
        from: RowState,
        line: usize,
        fields: Vec<String>,
        kind: FailureKind,
        reason: String,
    ) -> RowState {
        tracing::warn!("Row {} rejected ({}): {}", line, kind, reason);
        self.failures.push(RowFailure {
            line,
            fields,
            kind,
            reason,
        });
        self.progress.processed += 1;
        self.progress.failed += 1;
        from.advance(RowState::Rejected, line)
    }
}

pub fn run_batch<R: Read>(reader: R, options: &BatchOptions, zone: &Zone) -> Result<BatchResult> {
    run_batch_with(reader, options, zone, |_| {})
}

/// Streams `reader` through a [`BatchPipeline`], calling `on_progress` after
/// every row.
pub fn run_batch_with<R, F>(
    reader: R,
    options: &BatchOptions,
    zone: &Zone,
    mut on_progress: F,
) -> Result<BatchResult>
where
    R: Read,
    F: FnMut(BatchProgress),
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut raw = csv::ByteRecord::new();

    let unreadable = |e: csv::Error| ConversionError::InputUnreadableError {
        path: options.source_name.clone(),
        reason: e.to_string(),
    };

    if !csv_reader.read_byte_record(&mut raw).map_err(unreadable)? {
        return Err(ConversionError::EmptyInputError {
            source_name: options.source_name.clone(),
        });
    }
    let header = decode_fields(&raw).map_err(|_| ConversionError::DecodingError {
        message: format!("header of '{}' is not valid UTF-8", options.source_name),
    })?;

    let mut batch = BatchPipeline::open(header, options, zone)?;

    // An undecodable row aborts the whole batch; no partial result escapes.
    while csv_reader.read_byte_record(&mut raw).map_err(unreadable)? {
        let fields = decode_fields(&raw).map_err(|_| ConversionError::DecodingError {
            message: format!(
                "data row {} of '{}' is not valid UTF-8",
                batch.progress().processed + 1,
                options.source_name
            ),
        })?;
        batch.process_row(fields);
        on_progress(batch.progress());
    }

    Ok(batch.finish())
}

fn decode_fields(raw: &csv::ByteRecord) -> std::result::Result<Vec<String>, std::str::Utf8Error> {
    raw.iter()
        .map(|field| std::str::from_utf8(field).map(str::to_string))
        .collect()
}
