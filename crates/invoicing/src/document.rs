//! The formatted view of an invoice that templates are filled with.
//!
//! The document mirrors the record's shape (`invoice`, `supplier`, `buyer`,
//! `taxDetails`, `services`, ...) with every money figure replaced by its
//! Indian-locale display string, plus the derived `display` flags and
//! `tdsDetails`.

use serde::Serialize;
use serde_json::{Map, Value};

use invoicegen_core::{format_inr, Amount, DomainResult};

use crate::record::{InvoiceHeader, InvoiceRecord, Party, ServiceLine};
use crate::tax::{DisplayFlags, TaxComputation};

/// Tax figures, formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxDetailsView {
    pub taxable_amount: String,
    pub cgst_rate: Value,
    pub cgst_amount: String,
    pub sgst_rate: Value,
    pub sgst_amount: String,
    pub igst_rate: Value,
    pub igst_amount: String,
    pub total_tax: String,
    pub grand_total: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A service line with its display columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceView {
    pub description: String,
    #[serde(rename = "sacCode")]
    pub sac_code: String,
    pub qty: Value,
    pub rate: Value,
    pub qty_disp: String,
    pub rate_disp: String,
    pub amount_disp: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceView {
    fn build(line: &ServiceLine) -> DomainResult<Self> {
        let qty = Amount::parse_lenient(line.qty.as_ref())?;
        let rate = Amount::parse_lenient(line.rate.as_ref())?;

        Ok(Self {
            description: line.description.clone().unwrap_or_default(),
            sac_code: line.sac_code.clone().unwrap_or_default(),
            qty: line.qty.clone().unwrap_or(Value::Null),
            rate: line.rate.clone().unwrap_or(Value::Null),
            qty_disp: format_inr(qty),
            rate_disp: format_inr(rate),
            amount_disp: format_inr(qty.checked_mul(rate)?),
            extra: line.extra.clone(),
        })
    }

    /// Cell texts for the services table, after the serial number column.
    pub fn table_cells(&self) -> [&str; 5] {
        [
            &self.description,
            &self.sac_code,
            &self.qty_disp,
            &self.rate_disp,
            &self.amount_disp,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TdsLineView {
    pub rate: String,
    pub amount: String,
}

/// Withholding figures, formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TdsDetailsView {
    pub tds_income_tax: TdsLineView,
    pub total_tds_deducted: String,
    pub net_payable: String,
}

/// Render model for one invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDocument {
    pub invoice: InvoiceHeader,
    pub supplier: Party,
    pub buyer: Party,
    pub tax_details: TaxDetailsView,
    pub services: Vec<ServiceView>,
    pub display: DisplayFlags,
    pub tds_details: TdsDetailsView,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InvoiceDocument {
    pub fn build(record: &InvoiceRecord, tax: &TaxComputation) -> DomainResult<Self> {
        let services = record
            .services
            .iter()
            .map(ServiceView::build)
            .collect::<DomainResult<Vec<_>>>()?;

        let gst = &tax.gst;
        let tax_details = TaxDetailsView {
            taxable_amount: format_inr(gst.taxable),
            cgst_rate: gst.cgst.rate.clone(),
            cgst_amount: format_inr(gst.cgst.amount),
            sgst_rate: gst.sgst.rate.clone(),
            sgst_amount: format_inr(gst.sgst.amount),
            igst_rate: gst.igst.rate.clone(),
            igst_amount: format_inr(gst.igst.amount),
            total_tax: format_inr(gst.total_tax),
            grand_total: format_inr(gst.grand_total),
            extra: record.tax_details.extra.clone(),
        };

        let tds_details = TdsDetailsView {
            tds_income_tax: TdsLineView {
                rate: tax.tds.rate.normalize().to_string(),
                amount: format_inr(tax.tds.amount),
            },
            total_tds_deducted: format_inr(tax.tds.total_deducted),
            net_payable: format_inr(tax.tds.net_payable),
        };

        Ok(Self {
            invoice: record.invoice.clone(),
            supplier: record.supplier.clone(),
            buyer: record.buyer.clone(),
            tax_details,
            services,
            display: tax.display,
            tds_details,
            extra: record.extra.clone(),
        })
    }

    /// Template context: the document as a JSON tree.
    pub fn to_context(&self) -> Value {
        // Only strings, maps and JSON values inside; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// File name stem for an invoice number (`INV/24/7` -> `INV-24-7`).
pub fn output_stem(number: &str) -> String {
    number.trim().replace(['/', '\\'], "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::{derive, TaxPolicy};
    use invoicegen_core::DomainError;
    use serde_json::json;

    fn build(value: Value) -> InvoiceDocument {
        let record: InvoiceRecord = serde_json::from_value(value).unwrap();
        let tax = derive(&record, &TaxPolicy::default()).unwrap();
        InvoiceDocument::build(&record, &tax).unwrap()
    }

    #[test]
    fn formats_services_and_totals() {
        let doc = build(json!({
            "invoice": { "number": "INV/1", "date": "01-04-2024" },
            "supplier": { "gstin": "29ABCDE1234F1Z5", "stateCode": "29" },
            "buyer": { "stateCode": "27" },
            "taxDetails": { "taxableAmount": 1234567, "igstRate": 18, "igstAmount": "2,22,222" },
            "services": [
                { "description": "Consulting", "sacCode": "998311", "qty": "2", "rate": "6,17,283.5" }
            ],
            "display": { "show_tds": true }
        }));

        let service = &doc.services[0];
        assert_eq!(service.qty_disp, "2");
        assert_eq!(service.rate_disp, "6,17,284");
        assert_eq!(service.amount_disp, "12,34,567");
        assert_eq!(service.qty, json!("2"));

        assert_eq!(doc.tax_details.taxable_amount, "12,34,567");
        assert_eq!(doc.tax_details.igst_amount, "2,22,222");
        assert_eq!(doc.tax_details.cgst_amount, "0");
        assert_eq!(doc.tax_details.cgst_rate, json!(0));
        assert_eq!(doc.tax_details.grand_total, "14,56,789");

        assert_eq!(doc.tds_details.tds_income_tax.rate, "10");
        assert_eq!(doc.tds_details.tds_income_tax.amount, "1,23,457");
        assert_eq!(doc.tds_details.net_payable, "13,33,332");
    }

    #[test]
    fn context_uses_template_key_names() {
        let doc = build(json!({
            "invoice": { "number": "INV/2", "type": "TAX" },
            "supplier": { "gstin": "Unregistered", "name": "Solo Trader" },
            "taxDetails": { "taxableAmount": 900, "notes": "exempt" },
            "services": [{ "description": "Design", "qty": 1, "rate": 900 }],
            "terms": "Net 30"
        }));

        let ctx = doc.to_context();
        assert_eq!(ctx["invoice"]["type"], json!("TAX"));
        assert_eq!(ctx["supplier"]["name"], json!("Solo Trader"));
        assert_eq!(ctx["taxDetails"]["grandTotal"], json!("900"));
        assert_eq!(ctx["taxDetails"]["notes"], json!("exempt"));
        assert_eq!(ctx["services"][0]["amount_disp"], json!("900"));
        assert_eq!(ctx["services"][0]["sacCode"], json!(""));
        assert_eq!(ctx["display"]["show_gst_section"], json!(false));
        assert_eq!(ctx["tdsDetails"]["totalTdsDeducted"], json!("0"));
        assert_eq!(ctx["terms"], json!("Net 30"));
    }

    #[test]
    fn bad_service_quantity_fails_the_invoice() {
        let record: InvoiceRecord = serde_json::from_value(json!({
            "services": [{ "description": "x", "qty": "two", "rate": 5 }]
        }))
        .unwrap();
        let tax = derive(&record, &TaxPolicy::default()).unwrap();
        assert!(InvoiceDocument::build(&record, &tax).is_err());
    }

    #[test]
    fn service_amount_past_decimal_range_fails_the_invoice() {
        let record: InvoiceRecord = serde_json::from_value(json!({
            "invoice": { "number": "INV/9" },
            "services": [{
                "description": "Bulk",
                "qty": "1000000000000000",
                "rate": "1000000000000000"
            }]
        }))
        .unwrap();
        let tax = derive(&record, &TaxPolicy::default()).unwrap();

        match InvoiceDocument::build(&record, &tax) {
            Err(DomainError::InvariantViolation(msg)) => assert!(msg.contains("overflow")),
            other => panic!("Expected overflow error, got {other:?}"),
        }
    }

    #[test]
    fn output_stem_replaces_path_separators() {
        assert_eq!(output_stem("INV/2024-25/007"), "INV-2024-25-007");
        assert_eq!(output_stem(r"A\B"), "A-B");
    }
}
