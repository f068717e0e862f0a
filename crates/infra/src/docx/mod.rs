//! DOCX template filling.
//!
//! ## Steps
//!
//! 1. Open the template package and read the main document, headers and footers
//! 2. Repair tags Word split across runs
//! 3. Collapse `{%p ... %}` / `{%tr ... %}` onto their paragraph / table row
//! 4. Fill `{{ ... }}` and `{% if %}` tags from the context
//! 5. Replace the sample row of the services table with one row per service
//! 6. Save under the output path

pub mod fill;
pub mod markup;
pub mod package;
pub mod table;

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

pub use package::DocxPackage;
pub use table::{TableFill, SERVICE_COLUMNS};

/// Errors raised while filling a template.
#[derive(Debug, Error)]
pub enum DocxError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid DOCX archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("DOCX part {0} is missing")]
    MissingPart(String),

    #[error("DOCX part {0} is not valid UTF-8")]
    Encoding(String),

    #[error("template error in {part}: {message}")]
    Template { part: String, message: String },

    #[error("services table: {0}")]
    ServicesTable(String),
}

/// Fill the DOCX at `template` and write it to `out`.
///
/// `services` holds the services table rows, `SERVICE_COLUMNS` cells each.
/// Returns [`TableFill::NotFound`] when the template has no services table;
/// reporting that is left to the caller.
pub fn render_docx(
    template: &Path,
    context: &Value,
    services: &[Vec<String>],
    out: &Path,
) -> Result<TableFill, DocxError> {
    let mut package = DocxPackage::open(template)?;
    let mut table_fill = TableFill::NotFound;

    for part in package.text_parts() {
        let xml = package.part_text(&part)?;
        let xml = markup::repair_split_tags(&xml);
        let xml = markup::collapse_scoped_tags(&xml, "p", "w:p");
        let xml = markup::collapse_scoped_tags(&xml, "tr", "w:tr");
        let mut xml = fill::fill(&xml, context).map_err(|message| DocxError::Template {
            part: part.clone(),
            message,
        })?;

        if part == package::MAIN_PART {
            let (filled, fill) =
                table::fill_services_table(&xml, services).map_err(DocxError::ServicesTable)?;
            xml = filled;
            table_fill = fill;
        }

        package.set_part_text(&part, xml)?;
    }

    package.save(out)?;
    Ok(table_fill)
}
