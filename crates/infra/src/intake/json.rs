use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use invoicegen_invoicing::{InvoiceBatch, InvoiceRecord};

use super::IntakeError;

/// Read a JSON invoice batch.
pub fn load(path: &Path) -> Result<Vec<InvoiceRecord>, IntakeError> {
    let file = File::open(path).map_err(|source| IntakeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let batch: InvoiceBatch =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| IntakeError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(batch.into_records())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_invoice_samples_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"invoiceSamples": [
                {{"invoice": {{"number": "A/1"}}, "services": []}},
                {{"invoice": {{"number": "A/2"}}}}
            ]}}"#
        )
        .unwrap();

        let records = load(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].number().unwrap(), "A/2");
    }

    #[test]
    fn reports_malformed_json_with_path() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{ not json").unwrap();

        match load(file.path()).unwrap_err() {
            IntakeError::Json { path, .. } => assert_eq!(path, file.path()),
            other => panic!("Expected Json error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, IntakeError::Io { .. }));
    }
}
