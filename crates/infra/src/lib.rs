//! Infrastructure layer: record intake, DOCX templates, PDF conversion and
//! the batch pipeline that ties them to the invoicing domain.

pub mod convert;
pub mod docx;
pub mod intake;
pub mod pipeline;

mod integration_tests;

pub use convert::{ConvertError, Converter, OfficeConverter};
pub use docx::{render_docx, DocxError};
pub use intake::{load_batch, IntakeError, IntakeOptions};
pub use pipeline::{
    ConversionOutcome, InvoiceError, PdfMode, Pipeline, PipelineConfig, PipelineError, RunReport,
};
