//! reports: project each group's combined table onto the fixed report
//! column layout, with derived delta/mac/scaled columns

use super::{PipelineStep, sorted_subdirs};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::reader;
use crate::table::{Cell, Table};
use crate::writer;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub struct ReportStep;

/// Derived-column formulas. Delta and Mac read from already-projected
/// output columns, so they run in a second pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Formula {
    /// Output column 19 minus output column 20, 4 decimals.
    Delta,
    /// Output column 11 / output column 18 * 1000, 2 decimals.
    Mac,
    /// Source column times a factor, 4 decimals.
    Scale,
}

/// One output column of the report: title, source column offset,
/// derivation formula and scale factor. A blank title with no source
/// is a spacer column kept for the external template's layout.
pub struct ReportColumn {
    pub title: &'static str,
    pub source: Option<usize>,
    pub formula: Option<Formula>,
    pub factor: Option<f64>,
}

const fn copy(title: &'static str, source: usize) -> ReportColumn {
    ReportColumn {
        title,
        source: Some(source),
        formula: None,
        factor: None,
    }
}

const fn spacer() -> ReportColumn {
    ReportColumn {
        title: "",
        source: None,
        formula: None,
        factor: None,
    }
}

const fn derived(title: &'static str, formula: Formula) -> ReportColumn {
    ReportColumn {
        title,
        source: None,
        formula: Some(formula),
        factor: None,
    }
}

const fn scaled(title: &'static str, source: usize, factor: f64) -> ReportColumn {
    ReportColumn {
        title,
        source: Some(source),
        formula: Some(Formula::Scale),
        factor: Some(factor),
    }
}

/// Fixed report layout matching the external template. Offsets are
/// into the group's combined source table.
pub const REPORT_COLUMNS: &[ReportColumn] = &[
    copy("spoolno2", 1),
    copy("OTDR length", 9),
    copy("Attenuation 1310 I/E", 5),
    copy("Attenuation 1310 O/E", 6),
    copy("Attenuation 1383 I/E", 73),
    copy("Attenuation 1383 O/E", 74),
    copy("Attenuation 1550 I/E", 7),
    copy("Attenuation 1550 O/E", 8),
    copy("Attenuation 1625 I/E", 75),
    copy("Attenuation 1625 O/E", 76),
    copy("MFD 1310nm I/E", 12),
    copy("MFD 1310nm O/E", 13),
    spacer(),
    spacer(),
    spacer(),
    spacer(),
    spacer(),
    spacer(),
    copy("Cutoff 2m I/E", 14),
    copy("Cutoff 2m O/E", 15),
    copy("Cutoff 22m", 24),
    derived("delta 2m-22m", Formula::Delta),
    derived("Mac value", Formula::Mac),
    copy("Clad Dia. I/E", 16),
    copy("Clad Dia. O/E", 17),
    copy("Clad Ovality I/E", 18),
    copy("Clad Ovality O/E", 19),
    copy("Core Ovality I/E", 20),
    copy("Core Ovality O/E", 21),
    copy("ECC I/E", 22),
    copy("ECC O/E", 23),
    copy("Zero Dispersion Wave.", 30),
    copy("dispslope at ZDW", 31),
    copy("Dispersion 1285", 32),
    copy("Dispersion 1290", 33),
    copy("Dispersion 1330", 34),
    copy("Dispersion 1550", 35),
    spacer(),
    copy("PMD", 37),
    scaled("R7.5mm 1t 1550", 26, 0.1),
    scaled("R7.5mm 1t 1625", 69, 0.1),
    scaled("R10mm 1t 1550", 70, 0.1),
    scaled("R10mm 1t 1625", 71, 0.1),
    scaled("R15mm 10t 1550", 81, 0.5),
    scaled("R15mm 10t 1625", 82, 0.5),
];

/// Title row plus these two are the template's leading rows; data
/// starts below them.
const SOURCE_SKIP_ROWS: usize = 2;

const DELTA_LHS_COL: usize = 19;
const DELTA_RHS_COL: usize = 20;
const MAC_NUM_COL: usize = 11;
const MAC_DEN_COL: usize = 18;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Build the report table from a positionally-loaded group source.
/// Row 0 of the output holds the column titles. Copy and scale columns
/// are populated first; delta and mac run in a second pass over the
/// already-built output.
pub fn build_report(source: &Table) -> Result<Table> {
    let required = REPORT_COLUMNS
        .iter()
        .filter_map(|c| c.source)
        .max()
        .map(|m| m + 1)
        .unwrap_or(0);
    if source.column_count() < required {
        return Err(PipelineError::MalformedTable {
            found: source.column_count(),
            required,
        }
        .into());
    }

    let data_rows = source.row_count().saturating_sub(SOURCE_SKIP_ROWS);
    let mut out = Table::new();

    // Pass 1: titles, verbatim copies and scaled columns.
    for (out_idx, column) in REPORT_COLUMNS.iter().enumerate() {
        out.set_cell(0, out_idx, Cell::Text(column.title.to_string()));
        match column.formula {
            None => {
                if let Some(src_col) = column.source {
                    for r in 0..data_rows {
                        let value = source.cell(r + SOURCE_SKIP_ROWS, src_col).clone();
                        out.set_cell(r + 1, out_idx, value);
                    }
                }
            }
            Some(Formula::Scale) => {
                let factor = column.factor.unwrap_or(1.0);
                if let Some(src_col) = column.source {
                    for r in 0..data_rows {
                        let cell = match source.cell(r + SOURCE_SKIP_ROWS, src_col).as_number() {
                            Some(n) => Cell::Number(round_to(n * factor, 4)),
                            None => Cell::Empty,
                        };
                        out.set_cell(r + 1, out_idx, cell);
                    }
                }
            }
            Some(Formula::Delta) | Some(Formula::Mac) => {}
        }
    }

    // Pass 2: derived columns over the projected output.
    for (out_idx, column) in REPORT_COLUMNS.iter().enumerate() {
        match column.formula {
            Some(Formula::Delta) => {
                for r in 1..=data_rows {
                    let lhs = out.cell(r, DELTA_LHS_COL).as_number();
                    let rhs = out.cell(r, DELTA_RHS_COL).as_number();
                    let cell = match (lhs, rhs) {
                        (Some(a), Some(b)) => Cell::Number(round_to(a - b, 4)),
                        _ => Cell::Empty,
                    };
                    out.set_cell(r, out_idx, cell);
                }
            }
            Some(Formula::Mac) => {
                for r in 1..=data_rows {
                    let num = out.cell(r, MAC_NUM_COL).as_number();
                    let den = out.cell(r, MAC_DEN_COL).as_number();
                    let cell = match (num, den) {
                        (Some(n), Some(d)) => {
                            let mac = round_to(n / d * 1000.0, 2);
                            if mac.is_finite() {
                                Cell::Number(mac)
                            } else {
                                Cell::Empty
                            }
                        }
                        _ => Cell::Empty,
                    };
                    out.set_cell(r, out_idx, cell);
                }
            }
            _ => {}
        }
    }

    Ok(out)
}

/// Preferred input inside a group folder: `<folder>.xlsx`, then
/// `final.xlsx`.
fn pick_input_file(subfolder: &Path) -> Option<PathBuf> {
    let name = subfolder.file_name()?.to_string_lossy().to_string();
    let own = subfolder.join(format!("{}.xlsx", name));
    if own.exists() {
        return Some(own);
    }
    let fallback = subfolder.join("final.xlsx");
    if fallback.exists() {
        return Some(fallback);
    }
    None
}

impl PipelineStep for ReportStep {
    fn key(&self) -> &'static str {
        "reports"
    }

    fn title(&self) -> &'static str {
        "Build *_final_result_report.xlsx per group folder"
    }

    fn run(&self, config: &PipelineConfig) -> Result<()> {
        println!("[reports] building per-folder report files");
        let root = &config.out_grouped_by_col4;
        if !root.exists() {
            return Err(PipelineError::MissingFile(root.clone()).into());
        }

        let subfolders = sorted_subdirs(root)?;
        if subfolders.is_empty() {
            println!("[reports] no group folders to process");
            return Ok(());
        }

        for subfolder in subfolders {
            let name = subfolder
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let Some(src) = pick_input_file(&subfolder) else {
                println!("[reports] no input for {}", name);
                continue;
            };

            let source = match reader::load_table(&src) {
                Ok(table) => table,
                Err(e) => {
                    println!("[reports] failed to read {}: {:#}", src.display(), e);
                    continue;
                }
            };

            let report = match build_report(&source) {
                Ok(report) => report,
                Err(e) => {
                    println!("[reports] {}: {:#}", name, e);
                    continue;
                }
            };

            let dst = subfolder.join(format!("{}_final_result_report.xlsx", name));
            match writer::write_table(&dst, &report) {
                Ok(()) => println!("[reports] saved {}", dst.display()),
                Err(e) => println!("[reports] failed to save {}: {:#}", dst.display(), e),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A source wide enough for every referenced offset, with two
    // leading template rows.
    fn wide_source(data: &[(usize, f64)]) -> Table {
        let mut table = Table::new();
        table.set_cell(0, 82, Cell::Text("title".to_string()));
        table.set_cell(1, 82, Cell::Text("header".to_string()));
        for (col, value) in data {
            table.set_cell(2, *col, Cell::Number(*value));
        }
        table.set_cell(2, 82, Cell::Number(0.0));
        table
    }

    #[test]
    fn test_report_layout_and_titles() {
        assert_eq!(REPORT_COLUMNS.len(), 46);
        assert_eq!(REPORT_COLUMNS[21].title, "delta 2m-22m");
        assert_eq!(REPORT_COLUMNS[22].title, "Mac value");
        // Spacer columns carry an empty title and no source.
        assert_eq!(REPORT_COLUMNS[12].title, "");
        assert!(REPORT_COLUMNS[12].source.is_none());
    }

    #[test]
    fn test_delta_from_projected_columns() {
        // Cutoff 2m O/E (source 15 -> out 19) minus Cutoff 22m
        // (source 24 -> out 20).
        let source = wide_source(&[(15, 10.0), (24, 3.5)]);
        let report = build_report(&source).unwrap();
        assert_eq!(report.cell(1, 19), &Cell::Number(10.0));
        assert_eq!(report.cell(1, 20), &Cell::Number(3.5));
        assert_eq!(report.cell(1, 21), &Cell::Number(6.5));
    }

    #[test]
    fn test_mac_from_projected_columns() {
        // MFD 1310 O/E (source 13 -> out 11) over Cutoff 2m I/E
        // (source 14 -> out 18), times 1000.
        let source = wide_source(&[(13, 9.0), (14, 3.0)]);
        let report = build_report(&source).unwrap();
        assert_eq!(report.cell(1, 22), &Cell::Number(3000.0));
    }

    #[test]
    fn test_mac_blank_on_missing_or_zero_denominator() {
        let source = wide_source(&[(13, 9.0)]);
        let report = build_report(&source).unwrap();
        assert_eq!(report.cell(1, 22), &Cell::Empty);

        let source = wide_source(&[(13, 9.0), (14, 0.0)]);
        let report = build_report(&source).unwrap();
        assert_eq!(report.cell(1, 22), &Cell::Empty);
    }

    #[test]
    fn test_scale_column_rounds_to_four_decimals() {
        // R7.5mm 1t 1550: source 26 scaled by 0.1 -> out 39.
        let source = wide_source(&[(26, 1.23456)]);
        let report = build_report(&source).unwrap();
        assert_eq!(report.cell(1, 39), &Cell::Number(0.1235));
    }

    #[test]
    fn test_first_two_source_rows_are_skipped() {
        let mut source = wide_source(&[(1, 111.0)]);
        source.set_cell(3, 1, Cell::Number(222.0));
        let report = build_report(&source).unwrap();
        // Row 0 carries titles; data rows map source rows 2 and 3.
        assert_eq!(report.cell(0, 0), &Cell::Text("spoolno2".to_string()));
        assert_eq!(report.cell(1, 0), &Cell::Number(111.0));
        assert_eq!(report.cell(2, 0), &Cell::Number(222.0));
    }

    #[test]
    fn test_narrow_source_is_rejected() {
        let mut source = Table::new();
        source.set_cell(0, 40, Cell::Number(1.0));
        let err = build_report(&source).unwrap_err();
        assert!(err.to_string().contains("83"));
    }
}
