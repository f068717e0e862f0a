//! Spreadsheet intake (CSV and Excel/ODS workbooks).
//!
//! The header row names record fields by dotted path:
//!
//! ```text
//! invoice.number | supplier.gstin  | taxDetails.taxableAmount | services.description | services.qty | services.rate
//! INV/1          | 29ABCDE1234F1Z5 | 15000                    | Audit                | 1            | 10000
//! INV/1          |                 |                          | Filing               | 1            | 5000
//! ```
//!
//! Rows with the same `invoice.number` (or a blank one, continuing the
//! previous invoice) are one invoice. `services.*` columns add one service
//! line per row; every other column is read from the first row that fills it.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde_json::{Map, Number, Value};

use invoicegen_invoicing::InvoiceRecord;

use super::IntakeError;

const NUMBER_COLUMN: &str = "invoice.number";
const SERVICE_PREFIX: &str = "services.";
const DATE_FORMAT: &str = "%d-%m-%Y";

type Cell = Option<Value>;

/// A data row with its 1-based line number in the source.
#[derive(Debug, Clone)]
struct SheetRow {
    line: usize,
    cells: Vec<Cell>,
}

/// Read invoices from a CSV file.
pub fn load_csv(path: &Path) -> Result<Vec<InvoiceRecord>, IntakeError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let cells = record
            .iter()
            .map(|c| (!c.is_empty()).then(|| Value::String(c.to_string())))
            .collect();
        rows.push(SheetRow {
            line: idx + 2,
            cells,
        });
    }

    assemble(&headers, rows)
}

/// Read invoices from a workbook; `sheet` defaults to the first worksheet.
pub fn load_workbook(path: &Path, sheet: Option<&str>) -> Result<Vec<InvoiceRecord>, IntakeError> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names();

    let name = match sheet {
        Some(requested) if names.iter().any(|n| n == requested) => requested.to_string(),
        Some(requested) => return Err(IntakeError::SheetNotFound(requested.to_string())),
        None => names
            .first()
            .cloned()
            .ok_or_else(|| IntakeError::SheetNotFound("<first sheet>".to_string()))?,
    };

    let range = workbook.worksheet_range(&name)?;
    let first_line = range.start().map_or(0, |(row, _)| row as usize) + 1;

    let mut lines = range.rows();
    let Some(header_row) = lines.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row.iter().map(|c| c.to_string()).collect();

    let mut rows = Vec::new();
    for (idx, row) in lines.enumerate() {
        let line = first_line + idx + 1;
        let cells = row
            .iter()
            .map(|c| workbook_cell(c, line))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(SheetRow { line, cells });
    }

    tracing::debug!(sheet = %name, rows = rows.len(), "read worksheet");
    assemble(&headers, rows)
}

fn workbook_cell(cell: &Data, line: usize) -> Result<Cell, IntakeError> {
    let value = match cell {
        Data::Empty => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(Value::String(s.trim().to_string())),
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => Some(float_value(*f)),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTime(dt) => Some(match dt.as_datetime() {
            Some(at) => Value::String(at.format(DATE_FORMAT).to_string()),
            None => float_value(dt.as_f64()),
        }),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::String(s.clone())),
        Data::Error(e) => {
            return Err(IntakeError::Row {
                row: line,
                message: format!("cell error {e:?}"),
            });
        }
    };
    Ok(value)
}

/// Whole floats become integers so invoice numbers and codes read `1001`, not `1001.0`.
fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

#[derive(Debug, Default)]
struct Group {
    first_line: usize,
    fields: Map<String, Value>,
    services: Vec<Value>,
}

fn assemble(headers: &[String], rows: Vec<SheetRow>) -> Result<Vec<InvoiceRecord>, IntakeError> {
    let headers: Vec<&str> = headers.iter().map(|h| h.trim()).collect();
    let number_col = headers
        .iter()
        .position(|h| *h == NUMBER_COLUMN)
        .ok_or_else(|| IntakeError::MissingColumn(NUMBER_COLUMN.to_string()))?;

    let mut groups: Vec<Group> = Vec::new();
    let mut by_number: HashMap<String, usize> = HashMap::new();

    for row in rows {
        if row.cells.iter().all(Option::is_none) {
            continue;
        }

        let number = row.cells.get(number_col).cloned().flatten().map(|v| cell_text(&v));
        let slot = match number {
            Some(number) => *by_number.entry(number).or_insert_with(|| {
                groups.push(Group {
                    first_line: row.line,
                    ..Group::default()
                });
                groups.len() - 1
            }),
            None => groups.len().checked_sub(1).ok_or_else(|| IntakeError::Row {
                row: row.line,
                message: format!("{NUMBER_COLUMN} is blank and no invoice precedes it"),
            })?,
        };
        let group = &mut groups[slot];

        let mut service = Map::new();
        for (col, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let Some(value) = row.cells.get(col).cloned().flatten() else {
                continue;
            };

            let placed = match header.strip_prefix(SERVICE_PREFIX) {
                Some(field) => insert_path(&mut service, field, value),
                None => insert_path(&mut group.fields, header, value),
            };
            placed.map_err(|message| IntakeError::Row {
                row: row.line,
                message,
            })?;
        }

        if !service.is_empty() {
            group.services.push(Value::Object(service));
        }
    }

    groups
        .into_iter()
        .map(|group| {
            let mut fields = group.fields;
            fields.insert("services".to_string(), Value::Array(group.services));
            serde_json::from_value(Value::Object(fields)).map_err(|e| IntakeError::Row {
                row: group.first_line,
                message: e.to_string(),
            })
        })
        .collect()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Set `a.b.c` in `map` unless a value is already there.
fn insert_path(map: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), String> {
    let mut segments = path.split('.').map(str::trim).peekable();
    let mut current = map;

    while let Some(segment) = segments.next() {
        if segment.is_empty() {
            return Err(format!("invalid column name {path:?}"));
        }

        if segments.peek().is_none() {
            current.entry(segment.to_string()).or_insert(value);
            return Ok(());
        }

        let next = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match next {
            Value::Object(inner) => inner,
            _ => return Err(format!("column {path:?} conflicts with a value column")),
        };
    }

    Err(format!("invalid column name {path:?}"))
}
