//! GST split, display flags and TDS withholding.
//!
//! The engine is a pure function of the record: it never mutates the input,
//! it returns a [`TaxComputation`] that the document builder formats.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use invoicegen_core::{Amount, DomainError, DomainResult, Registration};

use crate::record::InvoiceRecord;

/// Default income-tax TDS rate, in percent.
pub const DEFAULT_TDS_RATE: u32 = 10;

/// Tunables for the derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxPolicy {
    /// TDS rate in percent (`10` = 10%).
    pub tds_rate: Decimal,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            tds_rate: Decimal::from(DEFAULT_TDS_RATE),
        }
    }
}

impl TaxPolicy {
    pub fn with_tds_rate(mut self, rate: Decimal) -> Self {
        self.tds_rate = rate;
        self
    }
}

/// One GST component after the intra/inter-state split.
///
/// The rate is carried through as supplied (number or text) and replaced
/// by `0` when the component does not apply.
#[derive(Debug, Clone, PartialEq)]
pub struct GstComponent {
    pub rate: Value,
    pub amount: Amount,
}

impl GstComponent {
    fn given(rate: Option<&Value>, amount: Amount) -> Self {
        Self {
            rate: rate.cloned().unwrap_or(Value::Null),
            amount,
        }
    }

    fn zero() -> Self {
        Self {
            rate: Value::from(0),
            amount: Amount::ZERO,
        }
    }
}

/// GST figures after the split.
#[derive(Debug, Clone, PartialEq)]
pub struct GstBreakdown {
    pub taxable: Amount,
    pub cgst: GstComponent,
    pub sgst: GstComponent,
    pub igst: GstComponent,
    pub total_tax: Amount,
    pub grand_total: Amount,
}

impl GstBreakdown {
    /// CGST + SGST + IGST after the split.
    pub fn total_gst(&self) -> Amount {
        self.total_tax
    }
}

/// Which tax sections the document shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DisplayFlags {
    pub show_gst_section: bool,
    pub show_cgst: bool,
    pub show_sgst: bool,
    pub show_igst: bool,
    pub show_tds: bool,
}

/// Income-tax withholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TdsComputation {
    /// Rate in percent; reported even when no TDS is deducted.
    pub rate: Decimal,
    pub amount: Amount,
    pub total_deducted: Amount,
    pub net_payable: Amount,
}

/// Everything the engine derives for one invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxComputation {
    pub registration: Registration,
    pub intra_state: bool,
    pub gst: GstBreakdown,
    pub display: DisplayFlags,
    pub tds: TdsComputation,
}

impl TaxComputation {
    pub fn total_gst(&self) -> Amount {
        self.gst.total_gst()
    }
}

/// Run the tax derivation for one record.
pub fn derive(record: &InvoiceRecord, policy: &TaxPolicy) -> DomainResult<TaxComputation> {
    let raw = &record.tax_details;
    let taxable = field_amount("taxableAmount", raw.taxable_amount.as_ref())?;
    let cgst = field_amount("cgstAmount", raw.cgst_amount.as_ref())?;
    let sgst = field_amount("sgstAmount", raw.sgst_amount.as_ref())?;
    let igst = field_amount("igstAmount", raw.igst_amount.as_ref())?;

    let registration = Registration::of(record.supplier.gstin().as_ref());
    let intra_state = record.is_intra_state();

    let (cgst, sgst, igst) = match (registration, intra_state) {
        (Registration::Unregistered, _) => {
            (GstComponent::zero(), GstComponent::zero(), GstComponent::zero())
        }
        (Registration::Registered, true) => (
            GstComponent::given(raw.cgst_rate.as_ref(), cgst),
            GstComponent::given(raw.sgst_rate.as_ref(), sgst),
            GstComponent::zero(),
        ),
        (Registration::Registered, false) => (
            GstComponent::zero(),
            GstComponent::zero(),
            GstComponent::given(raw.igst_rate.as_ref(), igst),
        ),
    };

    let total_tax = Amount::checked_sum([cgst.amount, sgst.amount, igst.amount])?;
    let gst = GstBreakdown {
        taxable,
        grand_total: taxable.checked_add(total_tax)?,
        total_tax,
        cgst,
        sgst,
        igst,
    };

    let registered = registration.is_registered();
    let display = DisplayFlags {
        show_gst_section: registered && gst.total_gst().is_positive(),
        show_cgst: registered && intra_state && gst.cgst.amount.is_positive(),
        show_sgst: registered && intra_state && gst.sgst.amount.is_positive(),
        show_igst: registered && !intra_state && gst.igst.amount.is_positive(),
        show_tds: record.display.show_tds,
    };

    let tds = withhold(&gst, display.show_tds, policy.tds_rate)?;

    Ok(TaxComputation {
        registration,
        intra_state,
        gst,
        display,
        tds,
    })
}

fn field_amount(field: &str, raw: Option<&Value>) -> DomainResult<Amount> {
    Amount::parse_lenient(raw).map_err(|err| match err {
        DomainError::Validation(msg) => DomainError::validation(format!("taxDetails.{field}: {msg}")),
        other => other,
    })
}

fn withhold(gst: &GstBreakdown, show_tds: bool, rate: Decimal) -> DomainResult<TdsComputation> {
    let amount = if show_tds {
        gst.taxable.percent_of(rate)?.round_rupees()
    } else {
        Amount::ZERO
    };

    Ok(TdsComputation {
        rate,
        amount,
        total_deducted: amount,
        net_payable: gst.grand_total.checked_sub(amount)?,
    })
}
