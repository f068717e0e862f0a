//! Run configuration.
//!
//! Values are resolved per key with the precedence
//! flag > `INVOICEGEN_*` environment variable > JSON config file > default.
//! Flags and environment are merged by clap before they reach this module.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use invoicegen_infra::convert::DEFAULT_CONVERTER;
use invoicegen_infra::{IntakeOptions, PdfMode, PipelineConfig};
use invoicegen_invoicing::{TaxPolicy, TemplateSet};

pub const DEFAULT_INPUT_FOLDER: &str = "input";
pub const DEFAULT_OUTPUT_FOLDER: &str = "output";
pub const DEFAULT_TEMPLATE_FOLDER: &str = "templates";
/// Batch file looked up inside the input folder when no input is given.
pub const DEFAULT_INPUT_FILE: &str = "invoice_data_all_scenario.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("TDS rate must be between 0 and 100 percent, got {0}")]
    TdsRate(Decimal),
}

/// Where the batch comes from and how it is derived.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// JSON configuration file.
    #[arg(long, env = "INVOICEGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Input batch (.json, .csv, .xlsx, .xls, .ods).
    #[arg(long, env = "INVOICEGEN_INPUT")]
    pub input: Option<PathBuf>,

    /// Folder holding the default input batch.
    #[arg(long, env = "INVOICEGEN_INPUT_FOLDER")]
    pub input_folder: Option<PathBuf>,

    /// Worksheet to read from a workbook input.
    #[arg(long, env = "INVOICEGEN_SHEET")]
    pub sheet: Option<String>,

    /// Income-tax TDS rate in percent.
    #[arg(long, env = "INVOICEGEN_TDS_RATE")]
    pub tds_rate: Option<Decimal>,
}

impl SourceArgs {
    /// Load the config file named by `--config`, or an empty one.
    pub fn file_config(&self) -> Result<FileConfig, ConfigError> {
        match &self.config {
            Some(path) => FileConfig::load(path),
            None => Ok(FileConfig::default()),
        }
    }
}

/// Where the rendered documents go.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Folder receiving the DOCX/PDF files.
    #[arg(long, env = "INVOICEGEN_OUTPUT_FOLDER")]
    pub output_folder: Option<PathBuf>,

    /// Folder holding the DOCX templates.
    #[arg(long, env = "INVOICEGEN_TEMPLATE_FOLDER")]
    pub template_folder: Option<PathBuf>,

    /// Office program used for PDF conversion.
    #[arg(long, env = "INVOICEGEN_CONVERTER")]
    pub converter: Option<String>,

    /// Leave the DOCX files and skip PDF conversion.
    #[arg(long, conflicts_with = "keep_docx")]
    pub no_pdf: bool,

    /// Keep the DOCX files next to the PDFs.
    #[arg(long)]
    pub keep_docx: bool,
}

/// Template file names inside the template folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TemplateNames {
    pub tax_invoice: Option<String>,
    pub bill_of_supply: Option<String>,
}

/// JSON config file contents. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileConfig {
    pub input_folder: Option<PathBuf>,
    pub output_folder: Option<PathBuf>,
    pub template_folder: Option<PathBuf>,
    pub input_file: Option<PathBuf>,
    pub converter: Option<String>,
    pub tds_rate_percent: Option<Decimal>,
    pub sheet: Option<String>,
    #[serde(default)]
    pub templates: TemplateNames,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolved input side of a run.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub input: PathBuf,
    pub intake: IntakeOptions,
    pub policy: TaxPolicy,
}

impl SourceSettings {
    pub fn resolve(args: &SourceArgs, file: &FileConfig) -> Result<Self, ConfigError> {
        let input = match args.input.clone().or_else(|| file.input_file.clone()) {
            Some(input) => input,
            None => args
                .input_folder
                .clone()
                .or_else(|| file.input_folder.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_FOLDER))
                .join(DEFAULT_INPUT_FILE),
        };

        let mut policy = TaxPolicy::default();
        if let Some(rate) = args.tds_rate.or(file.tds_rate_percent) {
            if rate.is_sign_negative() || rate > Decimal::ONE_HUNDRED {
                return Err(ConfigError::TdsRate(rate));
            }
            policy = policy.with_tds_rate(rate);
        }

        Ok(Self {
            input,
            intake: IntakeOptions {
                sheet: args.sheet.clone().or_else(|| file.sheet.clone()),
            },
            policy,
        })
    }
}

/// Resolved output side of a run.
#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub output_folder: PathBuf,
    pub templates: TemplateSet,
    pub converter: String,
    pub pdf: PdfMode,
}

impl OutputSettings {
    pub fn resolve(args: &OutputArgs, file: &FileConfig) -> Self {
        let template_folder = args
            .template_folder
            .clone()
            .or_else(|| file.template_folder.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_FOLDER));

        let mut templates = TemplateSet::new(template_folder);
        if let Some(name) = &file.templates.tax_invoice {
            templates = templates.with_tax_invoice(name.clone());
        }
        if let Some(name) = &file.templates.bill_of_supply {
            templates = templates.with_bill_of_supply(name.clone());
        }

        let pdf = if args.no_pdf {
            PdfMode::Skip
        } else if args.keep_docx {
            PdfMode::ConvertKeepDocx
        } else {
            PdfMode::Convert
        };

        Self {
            output_folder: args
                .output_folder
                .clone()
                .or_else(|| file.output_folder.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FOLDER)),
            templates,
            converter: args
                .converter
                .clone()
                .or_else(|| file.converter.clone())
                .unwrap_or_else(|| DEFAULT_CONVERTER.to_string()),
            pdf,
        }
    }

    pub fn pipeline_config(&self, policy: TaxPolicy) -> PipelineConfig {
        PipelineConfig {
            output_dir: self.output_folder.clone(),
            templates: self.templates.clone(),
            policy,
            pdf: self.pdf,
        }
    }
}
