pub mod delimited;
pub mod excel;

pub use delimited::DelimitedLoader;
pub use excel::ExcelLoader;

use crate::error::{Result, Text2SqlError};
use crate::table::Table;
use std::path::Path;

/// reads a file into a raw, uncleaned table
pub trait DataLoader {
    fn load(&self, path: &Path) -> Result<Table>;
}

/// loader variants, selected by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    Csv,
    Tsv,
    Excel,
}

impl LoaderKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(LoaderKind::Csv),
            "tsv" => Ok(LoaderKind::Tsv),
            "xlsx" | "xls" => Ok(LoaderKind::Excel),
            _ => Err(Text2SqlError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn loader(&self) -> Box<dyn DataLoader> {
        match self {
            LoaderKind::Csv => Box::new(DelimitedLoader::new(b',')),
            LoaderKind::Tsv => Box::new(DelimitedLoader::new(b'\t')),
            LoaderKind::Excel => Box::new(ExcelLoader),
        }
    }
}

/// pick a loader by extension and read the file
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_table(path: &Path) -> Result<Table> {
    let kind = LoaderKind::from_path(path)?;

    if !path.is_file() {
        return Err(Text2SqlError::Load(format!("file not found: {}", path.display())));
    }

    tracing::info!("loading {:?} file {}", kind, path.display());
    let table = kind.loader().load(path)?;
    tracing::info!(
        columns = table.columns().len(),
        rows = table.row_count(),
        "file loaded"
    );

    Ok(table)
}
