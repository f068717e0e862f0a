//! # invoicegen-cli
//!
//! Command-line entrypoint of the invoice pipeline.
//!
//! ## Subcommands
//!
//! - `run`: load a batch, render every invoice, convert to PDF
//! - `derive`: print the computed render contexts without touching templates
//!
//! Argument parsing and configuration live here; every business rule is in
//! `invoicegen-invoicing` and every file format in `invoicegen-infra`.

pub mod config;
pub mod derive;
pub mod run;

use clap::{Parser, Subcommand};

use invoicegen_observability::LogFormat;

/// Generate GST invoices from structured records.
#[derive(Parser, Debug)]
#[command(name = "invoicegen", version, about)]
pub struct Cli {
    /// Log line format.
    #[arg(long, global = true, env = "INVOICEGEN_LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render every invoice of a batch and convert the output to PDF.
    Run(run::RunArgs),
    /// Print the derived render context of every invoice as JSON.
    Derive(derive::DeriveArgs),
}
