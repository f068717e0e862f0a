//! # Run Subcommand
//!
//! Load the batch, render every invoice, convert the output folder to PDF.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Args;

use invoicegen_infra::{load_batch, OfficeConverter, Pipeline};

use crate::config::{OutputArgs, OutputSettings, SourceArgs, SourceSettings};

/// Arguments for the run subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Execute a batch run and print its report as JSON on stdout.
///
/// Exit status is a failure when any invoice could not be rendered.
/// Conversion failures are logged and reported but do not fail the run.
pub fn execute(args: &RunArgs) -> anyhow::Result<ExitCode> {
    let file = args.source.file_config()?;
    let source = SourceSettings::resolve(&args.source, &file)?;
    let output = OutputSettings::resolve(&args.output, &file);

    let records = load_batch(&source.input, &source.intake)
        .with_context(|| format!("failed to load invoices from {}", source.input.display()))?;

    tracing::info!(
        input = %source.input.display(),
        output = %output.output_folder.display(),
        templates = %output.templates.folder().display(),
        invoices = records.len(),
        "starting invoice run"
    );

    let pipeline = Pipeline::new(
        output.pipeline_config(source.policy),
        OfficeConverter::new(output.converter.clone()),
    );
    let report = pipeline.run(&records)?;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report).context("failed to write run report")?;
    writeln!(stdout).context("failed to write run report")?;

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
