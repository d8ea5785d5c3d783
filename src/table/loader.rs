//! Table loader for the companies and taxonomy inputs

use csv::{Reader, ReaderBuilder, StringRecord};
use std::fs::File;
use std::path::Path;

use super::{present, CompanyTable, BUSINESS_TAGS_COLUMN, DESCRIPTION_COLUMN, LABEL_COLUMN};
use crate::error::{LabelError, Result};

fn open_reader(path: &Path, delimiter: u8) -> Result<Reader<File>> {
    let file = File::open(path).map_err(|e| LabelError::from_io(path, e))?;
    Ok(ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}

/// Read every record, padding short rows with empty (missing) fields.
///
/// A row with more fields than the header is rejected.
fn read_records(
    reader: &mut Reader<File>,
    path: &Path,
    width: usize,
) -> Result<Vec<StringRecord>> {
    let mut records = Vec::new();
    for record in reader.records() {
        let mut record = record.map_err(|e| LabelError::from_csv(path, e))?;
        if record.len() > width {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(LabelError::Parse {
                path: path.to_path_buf(),
                message: format!(
                    "line {}: expected at most {} fields, found {}",
                    line,
                    width,
                    record.len()
                ),
            });
        }
        while record.len() < width {
            record.push_field("");
        }
        records.push(record);
    }
    Ok(records)
}

fn read_headers(reader: &mut Reader<File>, path: &Path) -> Result<StringRecord> {
    reader
        .headers()
        .cloned()
        .map_err(|e| LabelError::from_csv(path, e))
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn require_column(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    find_column(headers, name).ok_or_else(|| LabelError::MissingColumn {
        path: path.to_path_buf(),
        column: name.to_string(),
    })
}

/// Load the companies table.
///
/// `description` is required; `business_tags` is optional and reads as empty
/// when absent. All other columns are kept as-is for the writer.
pub fn load_companies(path: &Path, delimiter: u8) -> Result<CompanyTable> {
    let mut reader = open_reader(path, delimiter)?;
    let headers = read_headers(&mut reader, path)?;

    let description_idx = require_column(&headers, DESCRIPTION_COLUMN, path)?;
    let business_tags_idx = find_column(&headers, BUSINESS_TAGS_COLUMN);
    if business_tags_idx.is_none() {
        tracing::warn!(
            path = %path.display(),
            "no '{}' column, composing from description only",
            BUSINESS_TAGS_COLUMN
        );
    }

    let records = read_records(&mut reader, path, headers.len())?;

    tracing::info!(path = %path.display(), rows = records.len(), "loaded companies");

    Ok(CompanyTable::new(
        headers,
        records,
        description_idx,
        business_tags_idx,
    ))
}

/// Load the raw `label` column of the taxonomy table, nulls as `None`.
pub fn load_taxonomy(path: &Path, delimiter: u8) -> Result<Vec<Option<String>>> {
    let mut reader = open_reader(path, delimiter)?;
    let headers = read_headers(&mut reader, path)?;
    let label_idx = require_column(&headers, LABEL_COLUMN, path)?;

    let labels: Vec<Option<String>> = read_records(&mut reader, path, headers.len())?
        .iter()
        .map(|record| present(record.get(label_idx)).map(String::from))
        .collect();

    tracing::info!(path = %path.display(), rows = labels.len(), "loaded taxonomy");

    Ok(labels)
}
