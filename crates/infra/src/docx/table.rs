//! Services table filling.
//!
//! The services table is the first table whose header row mentions both
//! "description" and "amount". Its second row is a sample row: it is removed
//! and used as the formatting prototype for one appended row per service.

use super::markup::{elements, escape, first_element, opening_tag, plain_text};

/// Columns written per service row: serial, description, SAC, qty, rate, amount.
pub const SERVICE_COLUMNS: usize = 6;

/// Result of looking for the services table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableFill {
    Filled { rows: usize },
    NotFound,
}

/// Fill the services table in `xml` with `rows` (each `SERVICE_COLUMNS` wide).
pub fn fill_services_table(xml: &str, rows: &[Vec<String>]) -> Result<(String, TableFill), String> {
    for table in elements(xml, "w:tbl") {
        let table_xml = &xml[table.clone()];
        let table_rows = elements(table_xml, "w:tr");
        let Some(header) = table_rows.first() else {
            continue;
        };

        let header_text = plain_text(&table_xml[header.clone()]).to_lowercase();
        if !(header_text.contains("description") && header_text.contains("amount")) {
            continue;
        }

        let prototype = table_rows.get(1).unwrap_or(header).clone();
        let prototype_xml = &table_xml[prototype.clone()];
        let cell_count = elements(prototype_xml, "w:tc").len();
        if cell_count < SERVICE_COLUMNS {
            return Err(format!(
                "services table has {cell_count} columns, {SERVICE_COLUMNS} are needed"
            ));
        }

        let new_rows: String = rows.iter().map(|cells| build_row(prototype_xml, cells)).collect();

        // Rebuild: drop the sample row, append the service rows after the last row.
        let mut filled = String::with_capacity(table_xml.len() + new_rows.len());
        let last_row_end = table_rows.last().map_or(0, |r| r.end);
        match table_rows.get(1) {
            Some(sample) => {
                filled.push_str(&table_xml[..sample.start]);
                filled.push_str(&table_xml[sample.end..last_row_end]);
            }
            None => filled.push_str(&table_xml[..last_row_end]),
        }
        filled.push_str(&new_rows);
        filled.push_str(&table_xml[last_row_end..]);

        let mut out = String::with_capacity(xml.len() + new_rows.len());
        out.push_str(&xml[..table.start]);
        out.push_str(&filled);
        out.push_str(&xml[table.end..]);
        return Ok((out, TableFill::Filled { rows: rows.len() }));
    }

    Ok((xml.to_string(), TableFill::NotFound))
}

/// Copy the prototype row's row/cell/paragraph/run properties around new text.
fn build_row(prototype: &str, cells: &[String]) -> String {
    let mut row = String::from(opening_tag(prototype));
    if let Some(tr_pr) = first_element(prototype, "w:trPr") {
        row.push_str(tr_pr);
    }

    for (i, cell_range) in elements(prototype, "w:tc").into_iter().enumerate() {
        let cell = &prototype[cell_range];
        let text = cells.get(i).map(String::as_str).unwrap_or("");
        row.push_str(&build_cell(cell, text));
    }

    row.push_str("</w:tr>");
    row
}

fn build_cell(cell: &str, text: &str) -> String {
    let paragraph = first_element(cell, "w:p").unwrap_or("<w:p>");
    let run = first_element(paragraph, "w:r").unwrap_or("<w:r>");

    let mut out = String::from("<w:tc>");
    if let Some(tc_pr) = first_element(cell, "w:tcPr") {
        out.push_str(tc_pr);
    }
    out.push_str(opening_tag(paragraph).trim_end_matches("/>").trim_end_matches('>'));
    out.push('>');
    if let Some(p_pr) = first_element(paragraph, "w:pPr") {
        out.push_str(p_pr);
    }
    out.push_str("<w:r>");
    if let Some(r_pr) = first_element(run, "w:rPr") {
        out.push_str(r_pr);
    }
    out.push_str(r#"<w:t xml:space="preserve">"#);
    out.push_str(&escape(text));
    out.push_str("</w:t></w:r></w:p></w:tc>");
    out
}
