//! Delimited-text tables for companies and taxonomy
//!
//! # Components
//!
//! - `loader`: read both input tables and locate the required columns
//! - `writer`: attach `insurance_label` and atomically replace the companies file

pub mod loader;
pub mod writer;

pub use loader::{load_companies, load_taxonomy};
pub use writer::write_labeled;

use csv::StringRecord;

pub const DESCRIPTION_COLUMN: &str = "description";
pub const BUSINESS_TAGS_COLUMN: &str = "business_tags";
pub const LABEL_COLUMN: &str = "label";
pub const OUTPUT_COLUMN: &str = "insurance_label";

/// Field values a dataframe reader treats as null
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a raw field counts as an absent value
pub fn is_missing(field: &str) -> bool {
    MISSING_MARKERS.contains(&field)
}

/// Read a field, mapping null markers to `None`
pub fn present(field: Option<&str>) -> Option<&str> {
    field.filter(|f| !is_missing(f))
}

/// Companies table with every column carried through untouched
#[derive(Debug, Clone)]
pub struct CompanyTable {
    pub headers: StringRecord,
    pub records: Vec<StringRecord>,
    description_idx: usize,
    business_tags_idx: Option<usize>,
    output_idx: Option<usize>,
}

impl CompanyTable {
    pub(crate) fn new(
        headers: StringRecord,
        records: Vec<StringRecord>,
        description_idx: usize,
        business_tags_idx: Option<usize>,
    ) -> Self {
        let output_idx = headers.iter().position(|h| h == OUTPUT_COLUMN);
        Self {
            headers,
            records,
            description_idx,
            business_tags_idx,
            output_idx,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Description of row `row`, `None` when null
    pub fn description(&self, row: usize) -> Option<&str> {
        present(self.records.get(row)?.get(self.description_idx))
    }

    /// Business tags of row `row`, `None` when null or the column is absent
    pub fn business_tags(&self, row: usize) -> Option<&str> {
        let idx = self.business_tags_idx?;
        present(self.records.get(row)?.get(idx))
    }

    pub fn has_business_tags(&self) -> bool {
        self.business_tags_idx.is_some()
    }

    /// Column index of a label column left by a previous run
    pub fn output_column(&self) -> Option<usize> {
        self.output_idx
    }

    /// Previously written labels of row `row`, if the column exists
    pub fn existing_labels(&self, row: usize) -> Option<&str> {
        let idx = self.output_idx?;
        self.records.get(row)?.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_markers() {
        assert!(is_missing(""));
        assert!(is_missing("NaN"));
        assert!(is_missing("null"));
        assert!(is_missing("None"));
        assert!(!is_missing(" "));
        assert!(!is_missing("none of the above"));
        assert!(!is_missing("Auto"));
    }

    #[test]
    fn test_table_accessors() {
        let headers = StringRecord::from(vec!["name", "description", "business_tags"]);
        let records = vec![
            StringRecord::from(vec!["Acme", "We sell cars", "automotive"]),
            StringRecord::from(vec!["Blank", "", "NaN"]),
        ];
        let table = CompanyTable::new(headers, records, 1, Some(2));

        assert_eq!(table.len(), 2);
        assert_eq!(table.description(0), Some("We sell cars"));
        assert_eq!(table.business_tags(0), Some("automotive"));
        assert_eq!(table.description(1), None);
        assert_eq!(table.business_tags(1), None);
        assert_eq!(table.output_column(), None);
    }
}
