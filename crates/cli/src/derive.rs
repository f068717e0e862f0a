//! # Derive Subcommand
//!
//! Compute the render context of every invoice and print it, without
//! templates or conversion. Useful to check tax figures before a run.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Args;
use serde_json::{json, Value};

use invoicegen_infra::load_batch;
use invoicegen_invoicing::{InvoiceRecord, PreparedInvoice, TaxPolicy};

use crate::config::{SourceArgs, SourceSettings};

/// Arguments for the derive subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct DeriveArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

pub fn execute(args: &DeriveArgs) -> anyhow::Result<ExitCode> {
    let file = args.source.file_config()?;
    let source = SourceSettings::resolve(&args.source, &file)?;

    let records = load_batch(&source.input, &source.intake)
        .with_context(|| format!("failed to load invoices from {}", source.input.display()))?;

    let (entries, failed) = derive_all(&records, &source.policy);

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &entries).context("failed to write contexts")?;
    writeln!(stdout).context("failed to write contexts")?;

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// One JSON entry per record, plus the number of records that failed.
pub fn derive_all(records: &[InvoiceRecord], policy: &TaxPolicy) -> (Vec<Value>, usize) {
    let mut failed = 0;
    let entries = records
        .iter()
        .enumerate()
        .map(|(index, record)| match PreparedInvoice::prepare(record, policy) {
            Ok(prepared) => json!({
                "index": index,
                "number": prepared.number,
                "template": prepared.template,
                "outputStem": prepared.output_stem(),
                "context": prepared.document.to_context(),
            }),
            Err(err) => {
                failed += 1;
                tracing::error!(index, error = %err, "invoice derivation failed");
                json!({
                    "index": index,
                    "number": record.number().ok(),
                    "error": err.to_string(),
                })
            }
        })
        .collect();
    (entries, failed)
}
