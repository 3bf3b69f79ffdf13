//! Parse functions - turn the SIC workbook into normalized rows

use crate::error::{Error, Result};
use crate::sic::types::SicSheetRow;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{debug, info};

const LEVEL_HEADINGS: &str = "level_headings";
const REQUIRED_COLUMNS: [&str; 6] = [
    LEVEL_HEADINGS,
    "section",
    "division",
    "group",
    "most_disaggregated_level",
    "description",
];

/// Read the first worksheet of an XLSX/XLS workbook held in memory
pub fn read_first_sheet(bytes: Vec<u8>) -> Result<Range<Data>> {
    info!("Parsing SIC workbook ({} bytes)", bytes.len());

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let sheet_names = workbook.sheet_names();
    let Some(sheet_name) = sheet_names.first() else {
        return Err(Error::UnexpectedShape("no sheets found in workbook".to_string()));
    };

    info!("Reading sheet: {}", sheet_name);
    Ok(workbook.worksheet_range(sheet_name)?)
}

/// "Most disaggregated level " -> "most_disaggregated_level"
pub fn normalize_column_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Cell as stripped text; blank cells are `None`
pub fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            (*f as i64).to_string()
        }
        other => other.to_string().trim().to_string(),
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Find the header row, map the required columns and read every row below it
pub fn parse_sheet(range: &Range<Data>) -> Result<Vec<SicSheetRow>> {
    let mut rows = range.rows();

    let mut columns: Option<HashMap<String, usize>> = None;
    for row in rows.by_ref() {
        let names: HashMap<String, usize> = row
            .iter()
            .enumerate()
            .filter_map(|(idx, cell)| cell_text(cell).map(|t| (normalize_column_name(&t), idx)))
            .collect();
        if names.contains_key(LEVEL_HEADINGS) {
            columns = Some(names);
            break;
        }
    }
    let columns = columns.ok_or_else(|| Error::MissingColumn(LEVEL_HEADINGS.to_string()))?;

    let mut indices = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = *columns
            .get(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))?;
    }
    debug!("SIC worksheet column positions: {:?}", indices);

    let cell = |row: &[Data], idx: usize| row.get(idx).and_then(cell_text);

    let parsed: Vec<SicSheetRow> = rows
        .map(|row| SicSheetRow {
            level_headings: cell(row, indices[0]),
            section: cell(row, indices[1]),
            division: cell(row, indices[2]),
            group: cell(row, indices[3]),
            most_disaggregated_level: cell(row, indices[4]),
            description: cell(row, indices[5]),
        })
        .filter(|row| *row != SicSheetRow::default())
        .collect();

    info!("Parsed {} rows from SIC worksheet", parsed.len());
    Ok(parsed)
}
