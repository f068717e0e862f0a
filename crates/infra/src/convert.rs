//! DOCX → PDF conversion through an external office suite.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

pub const DEFAULT_CONVERTER: &str = "soffice";

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to list {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("no PDF produced for {0:?}")]
    MissingOutput(Vec<PathBuf>),
}

/// Converts every DOCX in a directory to PDF next to it.
pub trait Converter {
    /// Returns the PDFs written.
    fn convert_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, ConvertError>;
}

impl<C: Converter + ?Sized> Converter for &C {
    fn convert_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
        (**self).convert_dir(dir)
    }
}

/// LibreOffice/OpenOffice headless conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficeConverter {
    program: String,
}

impl Default for OfficeConverter {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERTER)
    }
}

impl OfficeConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Converter for OfficeConverter {
    fn convert_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
        let docs = docx_files(dir)?;
        if docs.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(program = %self.program, files = docs.len(), "invoking converter");
        let output = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(dir)
            .args(&docs)
            .output()
            .map_err(|source| ConvertError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ConvertError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let (written, missing): (Vec<PathBuf>, Vec<PathBuf>) = docs
            .iter()
            .map(|doc| doc.with_extension("pdf"))
            .partition(|pdf| pdf.exists());

        if !missing.is_empty() {
            return Err(ConvertError::MissingOutput(missing));
        }
        Ok(written)
    }
}

/// `.docx` files directly inside `dir`, sorted by name.
pub fn docx_files(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let list_err = |source| ConvertError::ListDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        let is_docx = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("docx"));
        if is_docx && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Outcome of removing intermediate DOCX files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cleanup {
    pub removed: usize,
    pub failed: Vec<PathBuf>,
}

/// Delete the DOCX files in `dir`; failures are logged and collected.
pub fn remove_docx(dir: &Path) -> Result<Cleanup, ConvertError> {
    let mut cleanup = Cleanup::default();
    for path in docx_files(dir)? {
        match fs::remove_file(&path) {
            Ok(()) => cleanup.removed += 1,
            Err(error) => {
                tracing::warn!(file = %path.display(), %error, "failed to delete intermediate DOCX");
                cleanup.failed.push(path);
            }
        }
    }
    Ok(cleanup)
}
