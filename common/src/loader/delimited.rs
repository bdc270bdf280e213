use crate::error::Result;
use crate::loader::DataLoader;
use crate::table::{Cell, Table};
use std::path::Path;

/// markers read as missing values, matching what spreadsheet exports and
/// pandas-produced files commonly contain
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// comma or tab separated text with a header row
#[derive(Debug, Clone)]
pub struct DelimitedLoader {
    delimiter: u8,
}

impl DelimitedLoader {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    fn parse_field(field: &str) -> Cell {
        if MISSING_MARKERS.contains(&field) {
            Cell::Null
        } else {
            Cell::text(field)
        }
    }
}

impl DataLoader for DelimitedLoader {
    fn load(&self, path: &Path) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_path(path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut rows: Vec<Vec<Cell>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(Self::parse_field).collect());
        }

        tracing::debug!(
            delimiter = %(self.delimiter as char).escape_default(),
            rows = rows.len(),
            "parsed delimited file"
        );

        Table::new(headers, rows)
    }
}
