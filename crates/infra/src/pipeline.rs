//! Batch run: records in, filled documents and PDFs out.
//!
//! Each invoice is processed independently; one bad record is logged and
//! reported without stopping the batch. Conversion runs once for the whole
//! output folder at the end.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use invoicegen_core::DomainError;
use invoicegen_invoicing::{InvoiceRecord, PreparedInvoice, TaxPolicy, TemplateKind, TemplateSet};

use crate::convert::{self, Converter};
use crate::docx::{self, DocxError, TableFill};

/// Fatal errors: the batch cannot run at all.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to create output folder {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-invoice failure.
#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Docx(#[from] DocxError),
}

/// What the pipeline does after rendering.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PdfMode {
    /// Convert, then delete the DOCX files.
    Convert,
    /// Convert and keep the DOCX files alongside the PDFs.
    ConvertKeepDocx,
    /// Leave DOCX output only.
    Skip,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    pub templates: TemplateSet,
    pub policy: TaxPolicy,
    pub pdf: PdfMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedInvoice {
    pub number: String,
    pub template: TemplateKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceFailure {
    /// Position in the batch (0-based).
    pub index: usize,
    pub number: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    Skipped,
    Converted {
        pdfs: Vec<PathBuf>,
        docx_removed: usize,
    },
    Failed {
        reason: String,
    },
}

/// Summary of one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rendered: Vec<RenderedInvoice>,
    pub failures: Vec<InvoiceFailure>,
    pub conversion: ConversionOutcome,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Batch invoice pipeline.
pub struct Pipeline<C: Converter> {
    config: PipelineConfig,
    converter: C,
}

impl<C: Converter> Pipeline<C> {
    pub fn new(config: PipelineConfig, converter: C) -> Self {
        Self { config, converter }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Render every record, then convert the output folder.
    pub fn run(&self, records: &[InvoiceRecord]) -> Result<RunReport, PipelineError> {
        let started_at = Utc::now();
        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir).map_err(|source| PipelineError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let mut rendered = Vec::new();
        let mut failures = Vec::new();

        for (index, record) in records.iter().enumerate() {
            match self.render_one(record) {
                Ok(done) => {
                    info!(
                        invoice = %done.number,
                        template = %done.template,
                        path = %done.path.display(),
                        "rendered invoice"
                    );
                    rendered.push(done);
                }
                Err(err) => {
                    let number = record.number().ok().map(str::to_string);
                    error!(index, invoice = number.as_deref().unwrap_or("<none>"), error = %err, "invoice failed");
                    failures.push(InvoiceFailure {
                        index,
                        number,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let conversion = self.convert(output_dir);

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            rendered,
            failures,
            conversion,
        };
        info!(
            rendered = report.rendered.len(),
            failed = report.failures.len(),
            "all invoices processed"
        );
        Ok(report)
    }

    /// Derive, select and fill one invoice.
    pub fn render_one(&self, record: &InvoiceRecord) -> Result<RenderedInvoice, InvoiceError> {
        let prepared = PreparedInvoice::prepare(record, &self.config.policy)?;
        let template = self.config.templates.path_for(prepared.template);
        let path = self
            .config
            .output_dir
            .join(format!("{}.docx", prepared.output_stem()));

        let rows = service_rows(&prepared);
        let fill = docx::render_docx(&template, &prepared.document.to_context(), &rows, &path)?;
        if fill == TableFill::NotFound && !rows.is_empty() {
            warn!(invoice = %prepared.number, template = %template.display(), "no services table in template");
        }

        Ok(RenderedInvoice {
            number: prepared.number,
            template: prepared.template,
            path,
        })
    }

    fn convert(&self, dir: &Path) -> ConversionOutcome {
        if self.config.pdf == PdfMode::Skip {
            return ConversionOutcome::Skipped;
        }

        info!(dir = %dir.display(), "starting batch conversion");
        let pdfs = match self.converter.convert_dir(dir) {
            Ok(pdfs) => pdfs,
            Err(err) => {
                error!(error = %err, "batch conversion failed; keeping DOCX files");
                return ConversionOutcome::Failed {
                    reason: err.to_string(),
                };
            }
        };

        let docx_removed = if self.config.pdf == PdfMode::Convert {
            info!(pdfs = pdfs.len(), "batch conversion completed; cleaning up DOCX files");
            match convert::remove_docx(dir) {
                Ok(cleanup) => cleanup.removed,
                Err(err) => {
                    warn!(error = %err, "failed to clean up DOCX files");
                    0
                }
            }
        } else {
            0
        };

        ConversionOutcome::Converted { pdfs, docx_removed }
    }
}

fn service_rows(prepared: &PreparedInvoice) -> Vec<Vec<String>> {
    prepared
        .document
        .services
        .iter()
        .enumerate()
        .map(|(i, service)| {
            std::iter::once((i + 1).to_string())
                .chain(service.table_cells().iter().map(|c| c.to_string()))
                .collect()
        })
        .collect()
}
