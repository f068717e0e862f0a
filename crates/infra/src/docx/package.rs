//! DOCX container access: the zip entries of a Word document.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::DocxError;

pub const MAIN_PART: &str = "word/document.xml";

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    is_dir: bool,
    data: Vec<u8>,
}

/// A Word document held in memory, entry by entry.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<Entry>,
}

impl DocxPackage {
    pub fn open(path: &Path) -> Result<Self, DocxError> {
        let file = File::open(path).map_err(|source| DocxError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data).map_err(|source| DocxError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            entries.push(Entry {
                name: entry.name().to_string(),
                is_dir: entry.is_dir(),
                data,
            });
        }

        if !entries.iter().any(|e| e.name == MAIN_PART) {
            return Err(DocxError::MissingPart(MAIN_PART.to_string()));
        }
        Ok(Self { entries })
    }

    /// Parts carrying body text: the document, headers and footers.
    pub fn text_parts(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.name.as_str())
            .filter(|name| {
                *name == MAIN_PART
                    || (name.starts_with("word/header") && name.ends_with(".xml"))
                    || (name.starts_with("word/footer") && name.ends_with(".xml"))
            })
            .map(str::to_string)
            .collect()
    }

    pub fn part_text(&self, name: &str) -> Result<String, DocxError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| DocxError::MissingPart(name.to_string()))?;
        String::from_utf8(entry.data.clone()).map_err(|_| DocxError::Encoding(name.to_string()))
    }

    pub fn set_part_text(&mut self, name: &str, text: String) -> Result<(), DocxError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| DocxError::MissingPart(name.to_string()))?;
        entry.data = text.into_bytes();
        Ok(())
    }

    /// Write the package to `path`, keeping entry order.
    pub fn save(&self, path: &Path) -> Result<(), DocxError> {
        let io_err = |source| DocxError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_err)?;
        let mut writer = ZipWriter::new(BufWriter::new(file));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in &self.entries {
            if entry.is_dir {
                writer.add_directory(entry.name.as_str(), options)?;
            } else {
                writer.start_file(entry.name.as_str(), options)?;
                writer.write_all(&entry.data).map_err(io_err)?;
            }
        }

        let mut inner = writer.finish()?;
        inner.flush().map_err(io_err)?;
        Ok(())
    }
}
