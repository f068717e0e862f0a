//! Invoice record intake: JSON batches and spreadsheets.
//!
//! ## Formats
//!
//! - `.json`: `{"invoiceSamples": [...]}` or a bare array of records
//! - `.csv`, `.xlsx`, `.xlsm`, `.xls`, `.ods`: one row per service line, header
//!   row of dotted field paths (see [`sheet`])

pub mod json;
pub mod sheet;

use std::path::{Path, PathBuf};

use thiserror::Error;

use invoicegen_invoicing::InvoiceRecord;

/// Errors raised while reading an input batch.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("sheet {0:?} not found")]
    SheetNotFound(String),

    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("required column {0:?} is missing")]
    MissingColumn(String),

    #[error("row {row}: {message}")]
    Row { row: usize, message: String },
}

/// Input file flavours.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Csv,
    Workbook,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self, IntakeError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(InputFormat::Json),
            "csv" => Ok(InputFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(InputFormat::Workbook),
            _ => Err(IntakeError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Intake options.
#[derive(Debug, Clone, Default)]
pub struct IntakeOptions {
    /// Worksheet to read; the first sheet when unset.
    pub sheet: Option<String>,
}

/// Load every invoice record from `path`, dispatching on its extension.
pub fn load_batch(path: &Path, options: &IntakeOptions) -> Result<Vec<InvoiceRecord>, IntakeError> {
    let records = match InputFormat::from_path(path)? {
        InputFormat::Json => json::load(path)?,
        InputFormat::Csv => sheet::load_csv(path)?,
        InputFormat::Workbook => sheet::load_workbook(path, options.sheet.as_deref())?,
    };

    tracing::info!(path = %path.display(), invoices = records.len(), "loaded invoice batch");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a/b.JSON")).unwrap(), InputFormat::Json);
        assert_eq!(InputFormat::from_path(Path::new("b.csv")).unwrap(), InputFormat::Csv);
        assert_eq!(InputFormat::from_path(Path::new("b.xlsx")).unwrap(), InputFormat::Workbook);
        assert!(matches!(
            InputFormat::from_path(Path::new("b.txt")),
            Err(IntakeError::UnsupportedFormat(_))
        ));
        assert!(InputFormat::from_path(Path::new("noext")).is_err());
    }
}
