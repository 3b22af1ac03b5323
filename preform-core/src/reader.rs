//! Spreadsheet loading via calamine

use crate::error::PipelineError;
use crate::table::{Cell, Table};
use anyhow::{Context, Result};
use calamine::{Data, Reader, Xlsx, open_workbook};
use std::path::Path;

fn convert(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        // Formula errors read back as blanks, like NaN in the source
        // reports.
        Data::Error(_) => Cell::Empty,
    }
}

/// Load the first worksheet of an xlsx file as a positional table:
/// row 0 of the sheet is row 0 of the table, no header interpretation.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Err(PipelineError::MissingFile(path_ref.to_path_buf()).into());
    }

    let mut workbook: Xlsx<_> = open_workbook(path_ref)
        .with_context(|| format!("failed to open {}", path_ref.display()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .with_context(|| format!("{} has no worksheets", path_ref.display()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet '{}' of {}", sheet_name, path_ref.display()))?;

    // calamine trims to the used range; pad back to A1 so positional
    // column offsets stay aligned with the template.
    let (row_offset, col_offset) = match range.start() {
        Some((r, c)) => (r as usize, c as usize),
        None => return Ok(Table::new()),
    };

    let mut table = Table::new();
    for _ in 0..row_offset {
        table.push_row(Vec::new());
    }
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col_offset];
        cells.extend(row.iter().map(convert));
        table.push_row(cells);
    }
    Ok(table)
}

/// Load a table and split its first row off as column titles. An empty
/// sheet yields an empty header and no data rows.
pub fn load_table_with_header<P: AsRef<Path>>(path: P) -> Result<(Vec<Cell>, Table)> {
    Ok(load_table(path)?.split_header())
}
