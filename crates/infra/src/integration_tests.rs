//! Integration tests for the full batch pipeline.
//!
//! Tests: InvoiceRecord → PreparedInvoice → DOCX template → conversion
//!
//! Verifies:
//! - Template selection per invoice
//! - Placeholders, conditional paragraphs, conditional rows and the services table are filled
//! - One bad record does not stop the batch
//! - Templates without a services table still render
//! - DOCX files are removed only after a successful conversion

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use serde_json::json;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use invoicegen_invoicing::{InvoiceRecord, TaxPolicy, TemplateKind, TemplateSet};

    use crate::convert::{self, ConvertError, Converter};
    use crate::docx::{DocxPackage, package::MAIN_PART};
    use crate::pipeline::{ConversionOutcome, PdfMode, Pipeline, PipelineConfig};

    const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    /// Writes a PDF stub next to every DOCX.
    #[derive(Default)]
    struct FakeConverter {
        calls: RefCell<Vec<PathBuf>>,
    }

    impl Converter for FakeConverter {
        fn convert_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
            self.calls.borrow_mut().push(dir.to_path_buf());
            let mut pdfs = Vec::new();
            for doc in convert::docx_files(dir)? {
                let pdf = doc.with_extension("pdf");
                fs::write(&pdf, b"%PDF-1.7").unwrap();
                pdfs.push(pdf);
            }
            Ok(pdfs)
        }
    }

    struct BrokenConverter;

    impl Converter for BrokenConverter {
        fn convert_dir(&self, _dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
            Err(ConvertError::Failed {
                program: "soffice".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "source file could not be loaded".to_string(),
            })
        }
    }

    fn para(text: &str) -> String {
        format!("<w:p><w:r><w:t xml:space=\"preserve\">{text}</w:t></w:r></w:p>")
    }

    fn table_row(cells: &[&str]) -> String {
        let cells: String = cells
            .iter()
            .map(|c| format!("<w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>{c}</w:t></w:r></w:p></w:tc>"))
            .collect();
        format!("<w:tr>{cells}</w:tr>")
    }

    fn cell_para(text: &str) -> String {
        format!("<w:tc>{}</w:tc>", para(text))
    }

    /// Totals table whose TDS row only shows when `display.show_tds` is set.
    fn summary_table() -> String {
        format!(
            r#"<w:tbl>{}<w:tr w:rsidR="00A1"><w:trPr><w:cantSplit/></w:trPr>{}</w:tr>{}<w:tr><w:trPr/>{}</w:tr></w:tbl>"#,
            table_row(&["Summary", "Value"]),
            cell_para("{%tr if display.show_tds %}"),
            table_row(&["TDS deducted", "{{ tdsDetails.totalTdsDeducted }}"]),
            cell_para("{%tr endif %}"),
        )
    }

    fn write_template(path: &Path, title: &str) {
        write_template_with(path, title, true);
    }

    fn write_template_with(path: &Path, title: &str, services_table: bool) {
        let mut body = [
            para(title),
            // Word split this placeholder over two runs.
            "<w:p><w:r><w:t>Invoice {{ invoice.</w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t>number }}</w:t></w:r></w:p>".to_string(),
            para("{%p if display.show_cgst %}"),
            para("CGST @ {{ taxDetails.cgstRate }}%: {{ taxDetails.cgstAmount }}"),
            para("{%p endif %}"),
            para("{%p if display.show_igst %}"),
            para("IGST @ {{ taxDetails.igstRate }}%: {{ taxDetails.igstAmount }}"),
            para("{%p endif %}"),
            para("Grand total {{ taxDetails.grandTotal }}"),
            para("{%p if display.show_tds %}"),
            para("TDS {{ tdsDetails.tdsIncomeTax.rate }}%: {{ tdsDetails.totalTdsDeducted }}"),
            para("{%p endif %}"),
            para("Net payable {{ tdsDetails.netPayable }}"),
            summary_table(),
        ]
        .concat();
        if services_table {
            body.push_str(&format!(
                "<w:tbl>{}{}</w:tbl>",
                table_row(&["S.No", "Description", "SAC", "Qty", "Rate", "Amount"]),
                table_row(&["1", "sample", "0", "0", "0", "0"])
            ));
        }

        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}"><w:body>{body}</w:body></w:document>"#
        );
        let header = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:hdr xmlns:w="{W_NS}">{}</w:hdr>"#,
            para("{{ supplier.name }} | GSTIN {{ supplier.gstin }}")
        );

        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(br#"<?xml version="1.0"?><Types/>"#).unwrap();
        zip.add_directory("word/", options).unwrap();
        zip.start_file(MAIN_PART, options).unwrap();
        zip.write_all(document.as_bytes()).unwrap();
        zip.start_file("word/header1.xml", options).unwrap();
        zip.write_all(header.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    struct Fixture {
        _root: tempfile::TempDir,
        templates: TemplateSet,
        output: PathBuf,
    }

    fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let template_dir = root.path().join("templates");
        fs::create_dir(&template_dir).unwrap();

        let templates = TemplateSet::new(&template_dir);
        write_template(&templates.path_for(TemplateKind::TaxInvoice), "TAX INVOICE");
        write_template(&templates.path_for(TemplateKind::BillOfSupply), "BILL OF SUPPLY");

        let output = root.path().join("out");
        Fixture {
            _root: root,
            templates,
            output,
        }
    }

    fn config(fixture: &Fixture, pdf: PdfMode) -> PipelineConfig {
        PipelineConfig {
            output_dir: fixture.output.clone(),
            templates: fixture.templates.clone(),
            policy: TaxPolicy::default(),
            pdf,
        }
    }

    fn records() -> Vec<InvoiceRecord> {
        serde_json::from_value(json!([
            {
                "invoice": { "number": "INV/1" },
                "supplier": { "name": "Acme & Co", "gstin": "29ABCDE1234F1Z5", "stateCode": "29" },
                "buyer": { "stateCode": "29" },
                "taxDetails": {
                    "taxableAmount": "10,000",
                    "cgstRate": 9, "cgstAmount": 900, "sgstRate": 9, "sgstAmount": 900,
                    "igstRate": 18, "igstAmount": 1800
                },
                "services": [
                    { "description": "Audit", "sacCode": "998222", "qty": 1, "rate": "6,000" },
                    { "description": "Filing", "sacCode": "998222", "qty": 2, "rate": 2000 }
                ]
            },
            {
                "invoice": { "number": "INV/2" },
                "supplier": { "name": "Solo", "gstin": "Unregistered" },
                "taxDetails": { "taxableAmount": 5000, "cgstAmount": 450 },
                "services": [{ "description": "Design", "qty": 1, "rate": 5000 }]
            },
            {
                "invoice": { "number": "INV/3" },
                "supplier": { "name": "Acme & Co", "gstin": "29ABCDE1234F1Z5", "stateCode": "29" },
                "buyer": { "stateCode": "27" },
                "taxDetails": { "taxableAmount": 123456, "igstRate": 18, "igstAmount": 22222 },
                "services": [{ "description": "Hosting", "qty": 12, "rate": 10288 }],
                "display": { "show_tds": true }
            },
            {
                "supplier": { "gstin": "" },
                "services": []
            }
        ]))
        .unwrap()
    }

    fn document_xml(path: &Path) -> String {
        DocxPackage::open(path).unwrap().part_text(MAIN_PART).unwrap()
    }

    #[test]
    fn renders_each_invoice_with_its_template() {
        let fx = fixture();
        let pipeline = Pipeline::new(config(&fx, PdfMode::Skip), FakeConverter::default());

        let report = pipeline.run(&records()).unwrap();

        assert_eq!(report.rendered.len(), 3);
        assert_eq!(report.conversion, ConversionOutcome::Skipped);
        let kinds: Vec<_> = report.rendered.iter().map(|r| r.template).collect();
        assert_eq!(
            kinds,
            vec![TemplateKind::TaxInvoice, TemplateKind::BillOfSupply, TemplateKind::TaxInvoice]
        );
        assert_eq!(report.rendered[0].path, fx.output.join("INV-1.docx"));

        // Registered, intra-state.
        let xml = document_xml(&fx.output.join("INV-1.docx"));
        assert!(xml.contains("TAX INVOICE"));
        assert!(xml.contains("Invoice INV/1"));
        assert!(xml.contains("CGST @ 9%: 900"));
        assert!(!xml.contains("IGST @"));
        assert!(!xml.contains("TDS "));
        assert!(!xml.contains("TDS deducted"));
        assert!(xml.contains(">Summary<"));
        assert!(xml.contains("Grand total 11,800"));
        assert!(xml.contains("Net payable 11,800"));
        assert!(xml.contains(">Audit<") && xml.contains(">6,000<") && xml.contains(">Filing<") && xml.contains(">4,000<"));
        assert!(!xml.contains("sample"));
        assert!(!xml.contains("{{") && !xml.contains("{%"));

        let header = DocxPackage::open(&fx.output.join("INV-1.docx"))
            .unwrap()
            .part_text("word/header1.xml")
            .unwrap();
        assert!(header.contains("Acme &amp; Co | GSTIN 29ABCDE1234F1Z5"));

        // Unregistered supplier: GST dropped.
        let xml = document_xml(&fx.output.join("INV-2.docx"));
        assert!(xml.contains("BILL OF SUPPLY"));
        assert!(!xml.contains("CGST @"));
        assert!(xml.contains("Grand total 5,000"));

        // Inter-state with TDS.
        let xml = document_xml(&fx.output.join("INV-3.docx"));
        assert!(xml.contains("IGST @ 18%: 22,222"));
        assert!(!xml.contains("CGST @"));
        assert!(xml.contains("Grand total 1,45,678"));
        assert!(xml.contains("TDS 10%: 12,346"));
        assert!(xml.contains(">TDS deducted<") && xml.contains(">12,346<"));
        assert!(!xml.contains("{%"));
        assert!(xml.contains("Net payable 1,33,332"));
        assert!(xml.contains(">1,23,456<"));
    }

    #[test]
    fn bad_record_is_reported_and_batch_continues() {
        let fx = fixture();
        let pipeline = Pipeline::new(config(&fx, PdfMode::Skip), FakeConverter::default());

        let report = pipeline.run(&records()).unwrap();

        assert!(!report.is_success());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 3);
        assert_eq!(report.failures[0].number, None);
        assert!(report.failures[0].reason.contains("invoice.number"));
    }

    #[test]
    fn overflowing_amounts_fail_only_that_invoice() {
        let fx = fixture();
        let pipeline = Pipeline::new(config(&fx, PdfMode::Skip), FakeConverter::default());
        let huge = "70000000000000000000000000000";
        let records: Vec<InvoiceRecord> = serde_json::from_value(json!([
            {
                "invoice": { "number": "BIG/1" },
                "supplier": { "gstin": "29ABCDE1234F1Z5", "stateCode": "29" },
                "buyer": { "stateCode": "29" },
                "taxDetails": { "taxableAmount": huge, "cgstRate": 9, "cgstAmount": huge },
                "services": [{ "description": "Audit", "qty": 1, "rate": 1 }]
            },
            {
                "invoice": { "number": "BIG/2" },
                "supplier": { "gstin": "Unregistered" },
                "services": [{ "description": "Bulk", "qty": "1000000000000000", "rate": "1000000000000000" }]
            },
            {
                "invoice": { "number": "OK/1" },
                "supplier": { "gstin": "Unregistered" },
                "taxDetails": { "taxableAmount": 5000 },
                "services": [{ "description": "Design", "qty": 1, "rate": 5000 }]
            }
        ]))
        .unwrap();

        let report = pipeline.run(&records).unwrap();

        assert_eq!(report.rendered.len(), 1);
        assert_eq!(report.rendered[0].path, fx.output.join("OK-1.docx"));
        let numbers: Vec<_> = report.failures.iter().map(|f| f.number.clone()).collect();
        assert_eq!(numbers, vec![Some("BIG/1".to_string()), Some("BIG/2".to_string())]);
        assert!(report.failures.iter().all(|f| f.reason.contains("overflow")), "{:?}", report.failures);
    }

    #[test]
    fn template_without_services_table_still_renders() {
        let fx = fixture();
        write_template_with(&fx.templates.path_for(TemplateKind::TaxInvoice), "TAX INVOICE", false);
        let pipeline = Pipeline::new(config(&fx, PdfMode::Skip), FakeConverter::default());

        let report = pipeline.run(&records()).unwrap();

        assert_eq!(report.rendered.len(), 3);
        let xml = document_xml(&fx.output.join("INV-1.docx"));
        assert!(xml.contains("Grand total 11,800"));
        assert!(!xml.contains(">Audit<"));
        assert!(!xml.contains("{{") && !xml.contains("{%"));
    }

    #[test]
    fn converts_and_removes_docx() {
        let fx = fixture();
        let converter = FakeConverter::default();
        let pipeline = Pipeline::new(config(&fx, PdfMode::Convert), &converter);

        let report = pipeline.run(&records()).unwrap();

        assert_eq!(converter.calls.borrow().as_slice(), &[fx.output.clone()]);
        match &report.conversion {
            ConversionOutcome::Converted { pdfs, docx_removed } => {
                assert_eq!(pdfs.len(), 3);
                assert_eq!(*docx_removed, 3);
            }
            other => panic!("Expected Converted, got {other:?}"),
        }
        assert!(fx.output.join("INV-2.pdf").exists());
        assert!(convert::docx_files(&fx.output).unwrap().is_empty());
    }

    #[test]
    fn keep_docx_mode_leaves_both_formats() {
        let fx = fixture();
        let pipeline = Pipeline::new(config(&fx, PdfMode::ConvertKeepDocx), FakeConverter::default());

        pipeline.run(&records()).unwrap();

        assert!(fx.output.join("INV-1.pdf").exists());
        assert!(fx.output.join("INV-1.docx").exists());
    }

    #[test]
    fn failed_conversion_keeps_docx() {
        let fx = fixture();
        let pipeline = Pipeline::new(config(&fx, PdfMode::Convert), BrokenConverter);

        let report = pipeline.run(&records()).unwrap();

        match &report.conversion {
            ConversionOutcome::Failed { reason } => assert!(reason.contains("could not be loaded")),
            other => panic!("Expected Failed, got {other:?}"),
        }
        assert_eq!(convert::docx_files(&fx.output).unwrap().len(), 3);
        assert_eq!(report.rendered.len(), 3);
    }

    #[test]
    fn missing_template_fails_only_that_invoice() {
        let fx = fixture();
        fs::remove_file(fx.templates.path_for(TemplateKind::BillOfSupply)).unwrap();
        let pipeline = Pipeline::new(config(&fx, PdfMode::Skip), FakeConverter::default());

        let report = pipeline.run(&records()).unwrap();

        assert_eq!(report.rendered.len(), 2);
        let numbers: Vec<_> = report.failures.iter().map(|f| f.number.clone()).collect();
        assert_eq!(numbers, vec![Some("INV/2".to_string()), None]);
    }
}
