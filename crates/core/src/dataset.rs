//! CSV reader for the labeled news dataset

use crate::models::RawRecord;
use crate::{DefraudError, Result};
use csv::{ReaderBuilder, StringRecord};
use defraud_config::DatasetConfig;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy)]
struct Columns {
    title: usize,
    body: usize,
    label: usize,
    source: Option<usize>,
}

/// Read every data row of a CSV file.
///
/// Records without a source column get `"<file-stem>#<row>"` as source.
pub fn read_records(path: &Path, config: &DatasetConfig) -> Result<Vec<RawRecord>> {
    let file = File::open(path)?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");
    let records = read_records_from(file, stem, config)?;
    info!("read {} records from {}", records.len(), path.display());
    Ok(records)
}

pub fn read_records_from<R: Read>(
    reader: R,
    stem: &str,
    config: &DatasetConfig,
) -> Result<Vec<RawRecord>> {
    let mut csv = ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = csv
        .headers()
        .map_err(|e| DefraudError::ingestion("header", e.to_string()))?
        .clone();
    let columns = resolve_columns(&headers, config)?;
    debug!(?columns, "resolved dataset columns");

    let mut records = Vec::new();
    for (i, row) in csv.records().enumerate() {
        let row_num = i + 1;
        let row = row.map_err(|e| DefraudError::ingestion(format!("row {row_num}"), e.to_string()))?;

        let source = columns
            .source
            .and_then(|idx| cell(&row, idx))
            .unwrap_or_else(|| format!("{stem}#{row_num}"));

        records.push(RawRecord {
            row: row_num,
            title: cell(&row, columns.title),
            body: cell(&row, columns.body),
            label: cell(&row, columns.label),
            source: Some(source),
        });
    }

    Ok(records)
}

fn resolve_columns(headers: &StringRecord, config: &DatasetConfig) -> Result<Columns> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
    };
    let find_any = |names: &[String]| names.iter().find_map(|n| find(n));

    let title = find(&config.title_column);
    let body = find_any(&config.text_columns);
    let label = find(&config.label_column);

    let mut missing = Vec::new();
    if title.is_none() {
        missing.push(config.title_column.clone());
    }
    if body.is_none() {
        missing.push(config.text_columns.join("|"));
    }
    if label.is_none() {
        missing.push(config.label_column.clone());
    }

    match (title, body, label) {
        (Some(title), Some(body), Some(label)) => Ok(Columns {
            title,
            body,
            label,
            source: find_any(&config.source_columns),
        }),
        _ => Err(DefraudError::ingestion(
            "header",
            format!("missing required column(s): {}", missing.join(", ")),
        )),
    }
}

fn cell(row: &StringRecord, idx: usize) -> Option<String> {
    row.get(idx)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
