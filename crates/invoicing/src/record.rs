//! Invoice record model, as read from the input batch.
//!
//! Field names follow the camelCase keys of the invoice data files. Every
//! section keeps keys it does not know about in `extra` so that template
//! fields (addresses, bank details, dates, ...) reach the document untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use invoicegen_core::{DomainError, DomainResult, Gstin};

use crate::de;

/// Invoice header: number, declared type and free-form fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceHeader {
    #[serde(default, deserialize_with = "de::opt_text", skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,

    /// Declared invoice type (`TAX`, `BOS`, ...); free text.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "de::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Supplier or buyer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(default, deserialize_with = "de::opt_text", skip_serializing_if = "Option::is_none")]
    pub gstin: Option<String>,

    #[serde(default, deserialize_with = "de::opt_text", skip_serializing_if = "Option::is_none")]
    pub state_code: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Party {
    pub fn gstin(&self) -> Option<Gstin> {
        self.gstin.as_deref().map(Gstin::new)
    }

    /// State code with surrounding whitespace removed.
    pub fn state(&self) -> Option<&str> {
        self.state_code.as_deref().map(str::trim)
    }
}

/// Tax figures exactly as supplied (numbers or formatted strings).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTaxDetails {
    #[serde(default)]
    pub taxable_amount: Option<Value>,
    #[serde(default)]
    pub cgst_rate: Option<Value>,
    #[serde(default)]
    pub cgst_amount: Option<Value>,
    #[serde(default)]
    pub sgst_rate: Option<Value>,
    #[serde(default)]
    pub sgst_amount: Option<Value>,
    #[serde(default)]
    pub igst_rate: Option<Value>,
    #[serde(default)]
    pub igst_amount: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One billed service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLine {
    #[serde(default, deserialize_with = "de::opt_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub sac_code: Option<String>,
    #[serde(default)]
    pub qty: Option<Value>,
    #[serde(default)]
    pub rate: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Display switches the record author controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRequest {
    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub show_tds: bool,
}

/// A single invoice record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    #[serde(default)]
    pub invoice: InvoiceHeader,
    #[serde(default)]
    pub supplier: Party,
    #[serde(default)]
    pub buyer: Party,
    #[serde(default)]
    pub tax_details: RawTaxDetails,
    #[serde(default)]
    pub services: Vec<ServiceLine>,
    #[serde(default)]
    pub display: DisplayRequest,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InvoiceRecord {
    /// Invoice number; required to name the output document.
    pub fn number(&self) -> DomainResult<&str> {
        match self.invoice.number.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => Ok(n),
            _ => Err(DomainError::missing("invoice.number")),
        }
    }

    /// Supplier and buyer are in the same state.
    ///
    /// Two absent state codes compare equal.
    pub fn is_intra_state(&self) -> bool {
        self.supplier.state() == self.buyer.state()
    }
}

/// A batch of invoices: `{"invoiceSamples": [...]}` or a bare array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InvoiceBatch {
    Samples {
        #[serde(rename = "invoiceSamples")]
        invoice_samples: Vec<InvoiceRecord>,
    },
    List(Vec<InvoiceRecord>),
}

impl InvoiceBatch {
    pub fn into_records(self) -> Vec<InvoiceRecord> {
        match self {
            InvoiceBatch::Samples { invoice_samples } => invoice_samples,
            InvoiceBatch::List(records) => records,
        }
    }
}
