//! Reads input rows from a spreadsheet (`.xlsx`, `.xls`, `.ods`) or a CSV file.
//!
//! Only column presence is checked. Required columns missing from the header
//! are a hard error; optional ones are skipped with a warning.

use std::collections::HashSet;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::{info, warn};

use cnpj_common::config::InputConfig;
use cnpj_common::{name_key, Cnpj, EnrichError, InputRow};

const CNPJ_DIGITS: usize = 14;

pub fn read_rows(path: &Path, columns: &InputConfig) -> Result<Vec<InputRow>, EnrichError> {
    let table = read_table(path, columns.sheet.as_deref())?;
    let rows = rows_from_table(table, columns, &path.display().to_string())?;
    info!(path = %path.display(), rows = rows.len(), "Input read");
    Ok(rows)
}

/// Keep the first row for every normalized CNPJ. Rows whose identifier has no
/// digits at all are kept as-is; the enricher reports them as malformed.
pub fn dedup_by_cnpj(rows: Vec<InputRow>) -> Vec<InputRow> {
    let before = rows.len();
    let mut seen = HashSet::new();
    let unique: Vec<InputRow> = rows
        .into_iter()
        .filter(|row| {
            let cnpj = Cnpj::normalize(&row.identifier);
            cnpj.is_empty() || seen.insert(cnpj)
        })
        .collect();
    if unique.len() < before {
        info!(before, after = unique.len(), "Dropped duplicate CNPJs");
    }
    unique
}

fn read_table(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<String>>, EnrichError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv") | Some("txt") => read_csv(path),
        _ => read_workbook(path, sheet),
    }
}

fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<String>>, EnrichError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| EnrichError::Input(format!("cannot open {}: {e}", path.display())))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| EnrichError::Input(format!("{} has no worksheets", path.display())))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| EnrichError::Input(format!("cannot read sheet '{sheet_name}': {e}")))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        // Numeric CNPJ cells come back as floats; drop the ".0".
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

fn read_csv(path: &Path) -> Result<Vec<Vec<String>>, EnrichError> {
    let bytes = std::fs::read(path)?;
    let header = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let count = |needle: u8| header.iter().filter(|b| **b == needle).count();
    let delimiter = if count(b';') > count(b',') { b';' } else { b',' };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes.as_slice());

    let mut table = Vec::new();
    for record in reader.byte_records() {
        let record = record
            .map_err(|e| EnrichError::Input(format!("{}: {e}", path.display())))?;
        table.push(
            record
                .iter()
                .map(|field| decode_field(field).trim().to_string())
                .collect(),
        );
    }
    Ok(table)
}

/// UTF-8 when valid, otherwise Latin-1 (what Excel exports as "CSV" on
/// Brazilian Windows installs).
fn decode_field(field: &[u8]) -> String {
    match std::str::from_utf8(field) {
        Ok(text) => text.to_string(),
        Err(_) => field.iter().map(|b| *b as char).collect(),
    }
}

fn rows_from_table(
    table: Vec<Vec<String>>,
    columns: &InputConfig,
    source_name: &str,
) -> Result<Vec<InputRow>, EnrichError> {
    let mut lines = table.into_iter();
    let header = lines.next().unwrap_or_default();

    let find = |name: &str| {
        header
            .iter()
            .position(|h| name_key(h) == name_key(name))
    };
    let require = |name: &str| {
        find(name).ok_or_else(|| EnrichError::MissingColumn {
            column: name.to_string(),
            source_name: source_name.to_string(),
        })
    };
    let optional = |name: Option<&str>| {
        let name = name?;
        let index = find(name);
        if index.is_none() {
            warn!(column = name, source = source_name, "Optional column not found");
        }
        index
    };

    let identifier_idx = require(&columns.identifier_column)?;
    let state_idx = require(&columns.state_column)?;
    let municipality_idx = optional(columns.municipality_column.as_deref());
    let label_idx = optional(columns.label_column.as_deref());

    let mut rows = Vec::new();
    for line in lines {
        let identifier = cell(&line, identifier_idx);
        if identifier.is_empty() {
            continue;
        }
        rows.push(InputRow {
            identifier: restore_leading_zeros(identifier),
            origin_state: cell(&line, state_idx),
            origin_municipality: optional_cell(&line, municipality_idx),
            origin_label: optional_cell(&line, label_idx),
        });
    }
    Ok(rows)
}

fn cell(line: &[String], idx: usize) -> String {
    line.get(idx).map(|v| v.trim()).unwrap_or_default().to_string()
}

fn optional_cell(line: &[String], idx: Option<usize>) -> Option<String> {
    idx.map(|i| cell(line, i)).filter(|v| !v.is_empty())
}

/// Spreadsheets that stored the CNPJ as a number lost its leading zeros.
fn restore_leading_zeros(identifier: String) -> String {
    if identifier.chars().all(|c| c.is_ascii_digit()) && identifier.len() < CNPJ_DIGITS {
        format!("{identifier:0>width$}", width = CNPJ_DIGITS)
    } else {
        identifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn table(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn maps_configured_columns() {
        let columns = InputConfig::default();
        let rows = rows_from_table(
            table(&[
                &["Empresa", "CNPJ", "UF do preço", "Cidade"],
                &["Acme", "11.222.333/0001-81", "SP", "São Paulo"],
                &["Beta", "22.333.444/0001-55", "RJ", ""],
            ]),
            &columns,
            "test",
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].identifier, "11.222.333/0001-81");
        assert_eq!(rows[0].origin_state, "SP");
        assert_eq!(rows[0].origin_municipality.as_deref(), Some("São Paulo"));
        assert_eq!(rows[0].origin_label.as_deref(), Some("Acme"));
        assert!(rows[1].origin_municipality.is_none());
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let err = rows_from_table(
            table(&[&["CNPJ", "Cidade"], &["11222333000181", "Recife"]]),
            &InputConfig::default(),
            "test.xlsx",
        )
        .unwrap_err();

        assert!(matches!(err, EnrichError::MissingColumn { ref column, .. } if column == "UF do preço"));
    }

    #[test]
    fn missing_optional_columns_are_absent() {
        let rows = rows_from_table(
            table(&[&["cnpj", "uf do preço"], &["11222333000181", "PE"]]),
            &InputConfig::default(),
            "test",
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert!(rows[0].origin_municipality.is_none());
        assert!(rows[0].origin_label.is_none());
    }

    #[test]
    fn blank_identifiers_are_dropped() {
        let rows = rows_from_table(
            table(&[&["CNPJ", "UF do preço"], &["", "SP"], &["  ", "RJ"], &["11222333000181", "MG"]]),
            &InputConfig::default(),
            "test",
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].origin_state, "MG");
    }

    #[test]
    fn numeric_identifiers_get_leading_zeros_back() {
        assert_eq!(restore_leading_zeros("1234567000189".into()), "01234567000189");
        assert_eq!(restore_leading_zeros("11.222.333/0001-81".into()), "11.222.333/0001-81");
        assert_eq!(restore_leading_zeros("11222333000181".into()), "11222333000181");
    }

    #[test]
    fn float_cells_render_without_fraction() {
        assert_eq!(cell_to_string(&Data::Float(11222333000181.0)), "11222333000181");
        assert_eq!(cell_to_string(&Data::String(" SP ".into())), "SP");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let rows = vec![
            InputRow::new("11.222.333/0001-81", "SP").with_label("first"),
            InputRow::new("11222333000181", "RJ").with_label("second"),
            InputRow::new("n/a", "SP"),
            InputRow::new("n/a", "RJ"),
        ];

        let unique = dedup_by_cnpj(rows);

        assert_eq!(unique.len(), 3);
        assert_eq!(unique[0].origin_label.as_deref(), Some("first"));
    }

    #[test]
    fn reads_semicolon_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "CNPJ;UF do preço;Cidade;Empresa").unwrap();
        writeln!(file, "11.222.333/0001-81;SP;São Paulo;Acme").unwrap();

        let rows = read_rows(file.path(), &InputConfig::default()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].origin_municipality.as_deref(), Some("São Paulo"));
    }

    #[test]
    fn reads_latin1_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"CNPJ;UF do pre\xe7o;Cidade\n11222333000181;SP;S\xe3o Paulo\n")
            .unwrap();

        let rows = read_rows(file.path(), &InputConfig::default()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].origin_state, "SP");
        assert_eq!(rows[0].origin_municipality.as_deref(), Some("São Paulo"));
    }

    #[test]
    fn header_match_ignores_case_beyond_ascii() {
        let rows = rows_from_table(
            table(&[&["cnpj", "UF DO PREÇO"], &["11222333000181", "BA"]]),
            &InputConfig::default(),
            "test",
        )
        .unwrap();

        assert_eq!(rows[0].origin_state, "BA");
    }

    #[test]
    fn unreadable_workbook_is_input_error() {
        let err = read_rows(Path::new("/nonexistent/input.xlsx"), &InputConfig::default())
            .unwrap_err();
        assert!(matches!(err, EnrichError::Input(_)));
    }
}
