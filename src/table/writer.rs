//! Writer for the labeled companies table
//!
//! The output replaces the companies file through a temporary file in the
//! same directory, so a failed write never leaves a truncated table behind.

use csv::{StringRecord, WriterBuilder};
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

use super::{CompanyTable, OUTPUT_COLUMN};
use crate::error::{LabelError, Result};
use crate::labels::serialize::format_label_list;

/// Records with `insurance_label` set, replacing a column from a previous run
pub fn labeled_records(
    table: &CompanyTable,
    assignments: &[Vec<String>],
) -> (StringRecord, Vec<StringRecord>) {
    let output_idx = table.output_column();

    let headers = match output_idx {
        Some(_) => table.headers.clone(),
        None => {
            let mut headers = table.headers.clone();
            headers.push_field(OUTPUT_COLUMN);
            headers
        }
    };

    let records = table
        .records
        .iter()
        .zip(assignments)
        .map(|(record, labels)| {
            let value = format_label_list(labels);
            match output_idx {
                Some(idx) => record
                    .iter()
                    .enumerate()
                    .map(|(i, field)| if i == idx { value.as_str() } else { field })
                    .collect(),
                None => {
                    let mut record = record.clone();
                    record.push_field(&value);
                    record
                }
            }
        })
        .collect();

    (headers, records)
}

/// Write `table` plus its assignments to `path`, atomically replacing it.
///
/// This overwrites the destination; there is no backup.
pub fn write_labeled(
    table: &CompanyTable,
    assignments: &[Vec<String>],
    path: &Path,
    delimiter: u8,
) -> Result<()> {
    if assignments.len() != table.len() {
        return Err(LabelError::Parse {
            path: path.to_path_buf(),
            message: format!(
                "{} assignments for {} company rows",
                assignments.len(),
                table.len()
            ),
        });
    }

    let (headers, records) = labeled_records(table, assignments);

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(|e| LabelError::from_io(dir, e))?;

    {
        let mut writer = WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(tmp.as_file());
        writer
            .write_record(&headers)
            .map_err(|e| LabelError::from_csv(path, e))?;
        for record in &records {
            writer
                .write_record(record)
                .map_err(|e| LabelError::from_csv(path, e))?;
        }
        writer.flush().map_err(|e| LabelError::from_io(path, e))?;
    }

    // The temp file is created 0600; carry the destination's mode over the rename
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| LabelError::from_io(path, e))?;
    }

    tmp.as_file()
        .sync_all()
        .map_err(|e| LabelError::from_io(path, e))?;
    tmp.persist(path)
        .map_err(|e| LabelError::from_io(path, e.error))?;

    tracing::info!(
        path = %path.display(),
        rows = records.len(),
        column = OUTPUT_COLUMN,
        "wrote labeled companies"
    );

    Ok(())
}
