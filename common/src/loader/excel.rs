use crate::error::{Result, Text2SqlError};
use crate::loader::DataLoader;
use crate::table::{Cell, Table};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDateTime;
use std::path::Path;

/// first worksheet of an .xlsx or .xls workbook, first row as headers
#[derive(Debug, Clone, Default)]
pub struct ExcelLoader;

impl DataLoader for ExcelLoader {
    fn load(&self, path: &Path) -> Result<Table> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| Text2SqlError::Load(format!("failed to open workbook: {}", e)))?;

        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| Text2SqlError::Load("workbook has no worksheets".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| Text2SqlError::Load(format!("failed to read sheet '{}': {}", sheet, e)))?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(|c| c.to_string()).collect(),
            None => Vec::new(),
        };

        let rows: Vec<Vec<Cell>> = rows
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();

        tracing::debug!(sheet = %sheet, "parsed worksheet");

        Table::new(headers, rows)
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Null,
        Data::Int(v) => Cell::Integer(*v),
        Data::Float(v) => Cell::Float(*v),
        Data::Bool(v) => Cell::Boolean(*v),
        Data::String(s) => Cell::text(s.as_str()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Cell::Timestamp)
            .unwrap_or(Cell::Float(dt.as_f64())),
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(Cell::Timestamp)
            .unwrap_or_else(|| Cell::text(s.as_str())),
        Data::DurationIso(s) => Cell::text(s.as_str()),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cell_from_data() {
        assert_eq!(cell_from_data(&Data::Empty), Cell::Null);
        assert_eq!(cell_from_data(&Data::Int(4)), Cell::Integer(4));
        assert_eq!(cell_from_data(&Data::Float(2.5)), Cell::Float(2.5));
        assert_eq!(cell_from_data(&Data::Bool(true)), Cell::Boolean(true));
        assert_eq!(cell_from_data(&Data::String("x".to_string())), Cell::text("x"));
    }

    #[test]
    fn test_iso_datetime_cells() {
        let cell = cell_from_data(&Data::DateTimeIso("2024-05-01T12:30:00".to_string()));
        assert!(matches!(cell, Cell::Timestamp(_)));
    }

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("src/loader/testdata")
            .join(name)
    }

    #[test]
    fn test_load_first_sheet_with_header_row() {
        let table = ExcelLoader.load(&fixture("members.xlsx")).unwrap();

        assert_eq!(table.columns(), ["Name", "Age", "Joined"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0][0], Cell::text("Ana"));
        assert_eq!(table.rows()[1][1], Cell::Float(25.0));
    }

    #[test]
    fn test_date_cells_become_timestamps() {
        let table = ExcelLoader.load(&fixture("members.xlsx")).unwrap();
        let expected = NaiveDateTime::parse_from_str("2024-05-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();

        assert_eq!(table.rows()[0][2], Cell::Timestamp(expected));
        assert!(matches!(table.rows()[1][2], Cell::Timestamp(_)));
    }

    #[test]
    fn test_garbage_workbook_is_load_error() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        file.write_all(b"not a workbook").unwrap();

        let result = ExcelLoader.load(file.path());
        assert!(matches!(result, Err(Text2SqlError::Load(_))));
    }
}
