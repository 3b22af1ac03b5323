//! Spreadsheet persistence via rust_xlsxwriter

use crate::error::PipelineError;
use crate::table::{Cell, Table};
use anyhow::Result;
use rust_xlsxwriter::{Color, Format, Workbook};
use std::path::Path;

/// Write a table to an xlsx file, row 0 first. Blank cells are left
/// unwritten.
pub fn write_table<P: AsRef<Path>>(path: P, table: &Table) -> Result<()> {
    write_table_highlighted(path, table, &[])
}

/// Write a table with the given (row, col) cells rendered in red.
pub fn write_table_highlighted<P: AsRef<Path>>(
    path: P,
    table: &Table,
    highlights: &[(usize, usize)],
) -> Result<()> {
    let path_ref = path.as_ref();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let red = Format::new().set_font_color(Color::Red);

    for (r, row) in table.rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let row_idx = r as u32;
            let col_idx = c as u16;
            let marked = highlights.contains(&(r, c));
            match cell {
                Cell::Empty => {}
                Cell::Number(n) => {
                    if marked {
                        worksheet.write_number_with_format(row_idx, col_idx, *n, &red)?;
                    } else {
                        worksheet.write_number(row_idx, col_idx, *n)?;
                    }
                }
                Cell::Text(s) => {
                    if s.is_empty() {
                        continue;
                    }
                    if marked {
                        worksheet.write_string_with_format(row_idx, col_idx, s, &red)?;
                    } else {
                        worksheet.write_string(row_idx, col_idx, s)?;
                    }
                }
                Cell::Bool(b) => {
                    if marked {
                        worksheet.write_boolean_with_format(row_idx, col_idx, *b, &red)?;
                    } else {
                        worksheet.write_boolean(row_idx, col_idx, *b)?;
                    }
                }
            }
        }
    }

    workbook
        .save(path_ref)
        .map_err(|e| PipelineError::PersistFailure {
            path: path_ref.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(())
}
