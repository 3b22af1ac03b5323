//! zero: blank out zero values in the raw measurement file

use super::PipelineStep;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::prefix;
use crate::reader;
use crate::table::Cell;
use crate::writer;
use anyhow::Result;

pub struct ZeroStep;

/// Blank a single cell when it holds zero: numeric 0, a zero-like
/// string, or a string that parses to zero after comma repair.
/// Booleans are left alone. Idempotent.
pub(crate) fn blank_zero(cell: &Cell) -> Cell {
    match cell {
        Cell::Number(n) if *n == 0.0 => Cell::Empty,
        Cell::Text(s) if prefix::is_zero_like(s) => Cell::Empty,
        other => other.clone(),
    }
}

impl PipelineStep for ZeroStep {
    fn key(&self) -> &'static str {
        "zero"
    }

    fn title(&self) -> &'static str {
        "Blank zero values (alls.xlsx -> alls_cleaned.xlsx)"
    }

    fn run(&self, config: &PipelineConfig) -> Result<()> {
        println!("[zero] converting zeros to blanks");
        if !config.excel_alls.exists() {
            return Err(PipelineError::MissingFile(config.excel_alls.clone()).into());
        }

        let mut table = reader::load_table(&config.excel_alls)?;

        // Row 0 is the header; data rows only.
        for row in table.rows.iter_mut().skip(1) {
            for cell in row.iter_mut() {
                *cell = blank_zero(cell);
            }
        }

        writer::write_table(&config.excel_alls_cleaned, &table)?;
        println!("[zero] done -> {}", config.excel_alls_cleaned.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_blank_zero_variants() {
        assert_eq!(blank_zero(&Cell::Number(0.0)), Cell::Empty);
        assert_eq!(blank_zero(&text("0")), Cell::Empty);
        assert_eq!(blank_zero(&text("0.00")), Cell::Empty);
        assert_eq!(blank_zero(&text("-0,0")), Cell::Empty);
        assert_eq!(blank_zero(&Cell::Number(0.5)), Cell::Number(0.5));
        assert_eq!(blank_zero(&text("10")), text("10"));
        assert_eq!(blank_zero(&Cell::Bool(false)), Cell::Bool(false));
    }

    #[test]
    fn test_blank_zero_idempotent() {
        let cells = [
            Cell::Number(0.0),
            text("0,0"),
            Cell::Number(3.25),
            text("abc"),
            Cell::Empty,
        ];
        for cell in &cells {
            let once = blank_zero(cell);
            assert_eq!(blank_zero(&once), once);
        }
    }
}
