use std::process::ExitCode;

use clap::Parser;

use invoicegen_cli::{derive, run, Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    invoicegen_observability::init(cli.log_format);

    let result = match &cli.command {
        Command::Run(args) => run::execute(args),
        Command::Derive(args) => derive::execute(args),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "invoicegen failed");
            ExitCode::FAILURE
        }
    }
}
