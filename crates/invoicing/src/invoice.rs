use invoicegen_core::DomainResult;

use crate::document::{output_stem, InvoiceDocument};
use crate::record::InvoiceRecord;
use crate::tax::{derive, TaxComputation, TaxPolicy};
use crate::template::{select, TemplateKind};

/// An invoice with every derivation done, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedInvoice {
    pub number: String,
    pub template: TemplateKind,
    pub tax: TaxComputation,
    pub document: InvoiceDocument,
}

impl PreparedInvoice {
    /// Derive taxes, format the document and pick its template.
    pub fn prepare(record: &InvoiceRecord, policy: &TaxPolicy) -> DomainResult<Self> {
        let number = record.number()?.to_string();
        let tax = derive(record, policy)?;
        let document = InvoiceDocument::build(record, &tax)?;
        let template = select(record.invoice.kind.as_deref(), &tax);

        Ok(Self {
            number,
            template,
            tax,
            document,
        })
    }

    /// Output file name without extension.
    pub fn output_stem(&self) -> String {
        output_stem(&self.number)
    }
}
