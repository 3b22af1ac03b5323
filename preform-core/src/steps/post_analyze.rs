//! post-analyze: flag delta extremes and out-of-band clad diameters in
//! the merged total report

use super::{PipelineStep, collect_total::TOTAL_FILE};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::reader;
use crate::table::Table;
use crate::writer;
use anyhow::Result;

pub struct PostAnalyzeStep;

const ANNOTATED_FILE: &str = "total_final_result_annotated.xlsx";

/// Strictly outside the closed band. Values on the boundary pass.
pub(crate) fn out_of_band(value: f64, low: f64, high: f64) -> bool {
    value < low || value > high
}

/// Rows attaining the column minimum and maximum, as
/// (row, value, is_max) triples. Non-numeric cells are ignored.
pub(crate) fn extremum_rows(data: &Table, col: usize) -> Vec<(usize, f64, bool)> {
    let mut min: Option<f64> = None;
    let mut max: Option<f64> = None;
    for r in 0..data.row_count() {
        if let Some(v) = data.cell(r, col).as_number() {
            min = Some(min.map_or(v, |m| m.min(v)));
            max = Some(max.map_or(v, |m| m.max(v)));
        }
    }
    let (Some(min), Some(max)) = (min, max) else {
        return Vec::new();
    };

    let mut hits = Vec::new();
    for r in 0..data.row_count() {
        if let Some(v) = data.cell(r, col).as_number() {
            if v == min {
                hits.push((r, v, false));
            }
            if v == max && max != min {
                hits.push((r, v, true));
            }
        }
    }
    hits
}

impl PipelineStep for PostAnalyzeStep {
    fn key(&self) -> &'static str {
        "post-analyze"
    }

    fn title(&self) -> &'static str {
        "Flag delta extremes and out-of-band clad diameters"
    }

    fn run(&self, config: &PipelineConfig) -> Result<()> {
        println!("[post-analyze] analyzing merged total report");
        let total_path = config.out_grouped_by_col4.join(TOTAL_FILE);
        if !total_path.exists() {
            return Err(PipelineError::MissingFile(total_path).into());
        }

        let (header, data) = reader::load_table_with_header(&total_path)?;
        let width = data.column_count().max(header.len());
        let required = config
            .report_delta_col
            .max(config.report_clad_ie_col)
            .max(config.report_clad_oe_col)
            .max(config.report_id_col)
            + 1;
        if width < required {
            return Err(PipelineError::MalformedTable {
                found: width,
                required,
            }
            .into());
        }

        // Highlight coordinates are in the written file, so data rows
        // shift down one for the header.
        let mut highlights: Vec<(usize, usize)> = Vec::new();

        for (row, value, is_max) in extremum_rows(&data, config.report_delta_col) {
            let which = if is_max { "max" } else { "min" };
            println!(
                "[post-analyze] delta {}: {} at {}",
                which,
                value,
                data.cell(row, config.report_id_col).display()
            );
            highlights.push((row + 1, config.report_delta_col));
        }

        let mut out_of_range = 0usize;
        for col in [config.report_clad_ie_col, config.report_clad_oe_col] {
            for r in 0..data.row_count() {
                if let Some(v) = data.cell(r, col).as_number() {
                    if out_of_band(v, config.clad_low, config.clad_high) {
                        out_of_range += 1;
                        println!(
                            "[post-analyze] clad diameter {} out of [{}, {}] at {}",
                            v,
                            config.clad_low,
                            config.clad_high,
                            data.cell(r, config.report_id_col).display()
                        );
                        highlights.push((r + 1, col));
                    }
                }
            }
        }
        if out_of_range == 0 {
            println!("[post-analyze] all clad diameters within band");
        }

        let mut out = Table::new();
        out.push_row(header);
        out.rows.extend(data.rows);

        let annotated_path = config.out_grouped_by_col4.join(ANNOTATED_FILE);
        match writer::write_table_highlighted(&annotated_path, &out, &highlights) {
            Ok(()) => println!("[post-analyze] saved {}", annotated_path.display()),
            Err(e) => {
                println!(
                    "[post-analyze] warning: highlighted save failed ({:#}), writing plain copy",
                    e
                );
                writer::write_table(&annotated_path, &out)?;
                println!("[post-analyze] saved {} (no highlights)", annotated_path.display());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    #[test]
    fn test_out_of_band_boundaries() {
        assert!(out_of_band(124.2, 124.3, 125.7));
        assert!(!out_of_band(124.3, 124.3, 125.7));
        assert!(!out_of_band(125.0, 124.3, 125.7));
        assert!(!out_of_band(125.7, 124.3, 125.7));
        assert!(out_of_band(125.71, 124.3, 125.7));
    }

    #[test]
    fn test_extremum_rows_reports_all_attaining_rows() {
        let mut data = Table::new();
        data.set_cell(0, 0, Cell::Number(3.0));
        data.set_cell(1, 0, Cell::Number(1.0));
        data.set_cell(2, 0, Cell::Number(3.0));
        data.set_cell(3, 0, Cell::Text("n/a".to_string()));
        let hits = extremum_rows(&data, 0);
        assert_eq!(hits, vec![(0, 3.0, true), (1, 1.0, false), (2, 3.0, true)]);
    }

    #[test]
    fn test_extremum_rows_single_value_counts_once() {
        let mut data = Table::new();
        data.set_cell(0, 0, Cell::Number(2.0));
        data.set_cell(1, 0, Cell::Number(2.0));
        let hits = extremum_rows(&data, 0);
        // min == max: each row is listed once, as the minimum.
        assert_eq!(hits, vec![(0, 2.0, false), (1, 2.0, false)]);
    }

    #[test]
    fn test_extremum_rows_empty_column() {
        let mut data = Table::new();
        data.set_cell(0, 0, Cell::Text("x".to_string()));
        assert!(extremum_rows(&data, 0).is_empty());
    }
}
