//! Template selection: Tax Invoice or Bill of Supply.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use invoicegen_core::{Amount, Registration};

use crate::tax::TaxComputation;

pub const DEFAULT_TAX_INVOICE_TEMPLATE: &str = "Invoice_Template_AllPlaceholders.docx";
pub const DEFAULT_BILL_OF_SUPPLY_TEMPLATE: &str = "BOS_AllPlaceholders.docx";

/// Document variant an invoice is rendered as.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    TaxInvoice,
    BillOfSupply,
}

impl TemplateKind {
    /// Interpret an explicitly declared invoice type, if it names one.
    pub fn from_declared(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "BOS" | "BILL_OF_SUPPLY" => Some(TemplateKind::BillOfSupply),
            "TAX" | "TAX_INVOICE" => Some(TemplateKind::TaxInvoice),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::TaxInvoice => "tax_invoice",
            TemplateKind::BillOfSupply => "bill_of_supply",
        }
    }
}

impl core::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the template for an invoice.
///
/// A declared type wins. Otherwise unregistered suppliers and invoices whose
/// printed GST (each component in whole rupees) sums to zero get a Bill of
/// Supply.
pub fn select(declared: Option<&str>, tax: &TaxComputation) -> TemplateKind {
    if let Some(kind) = declared.and_then(TemplateKind::from_declared) {
        return kind;
    }

    if tax.registration == Registration::Unregistered || printed_gst_is_zero(tax) {
        TemplateKind::BillOfSupply
    } else {
        TemplateKind::TaxInvoice
    }
}

fn printed_gst_is_zero(tax: &TaxComputation) -> bool {
    let gst = &tax.gst;
    Amount::checked_sum(
        [gst.cgst.amount, gst.sgst.amount, gst.igst.amount].map(|a| a.round_rupees()),
    )
    .is_ok_and(|total| total.is_zero())
}

/// Template files on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    folder: PathBuf,
    tax_invoice: String,
    bill_of_supply: String,
}

impl TemplateSet {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            tax_invoice: DEFAULT_TAX_INVOICE_TEMPLATE.to_string(),
            bill_of_supply: DEFAULT_BILL_OF_SUPPLY_TEMPLATE.to_string(),
        }
    }

    pub fn with_tax_invoice(mut self, file_name: impl Into<String>) -> Self {
        self.tax_invoice = file_name.into();
        self
    }

    pub fn with_bill_of_supply(mut self, file_name: impl Into<String>) -> Self {
        self.bill_of_supply = file_name.into();
        self
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn path_for(&self, kind: TemplateKind) -> PathBuf {
        match kind {
            TemplateKind::TaxInvoice => self.folder.join(&self.tax_invoice),
            TemplateKind::BillOfSupply => self.folder.join(&self.bill_of_supply),
        }
    }
}
