//! Invoicing domain module.
//!
//! Business rules for GST invoices, implemented purely as deterministic
//! domain logic (no IO, no templates on disk, no conversion): the record
//! model, the tax derivation engine, the formatted render model and the
//! template selection policy.

mod de;

pub mod document;
pub mod invoice;
pub mod record;
pub mod tax;
pub mod template;

pub use document::{output_stem, InvoiceDocument, ServiceView, TaxDetailsView, TdsDetailsView};
pub use invoice::PreparedInvoice;
pub use record::{
    DisplayRequest, InvoiceBatch, InvoiceHeader, InvoiceRecord, Party, RawTaxDetails, ServiceLine,
};
pub use tax::{derive, DisplayFlags, GstBreakdown, TaxComputation, TaxPolicy, TdsComputation};
pub use template::{select, TemplateKind, TemplateSet};
