//! collect-total: merge every per-group report into one workbook with
//! a leading GROUP column

use super::{PipelineStep, sorted_subdirs};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::reader;
use crate::table::{Cell, Table};
use crate::writer;
use anyhow::{Result, anyhow};

pub struct CollectTotalStep;

pub(crate) const REPORT_SUFFIX: &str = "_final_result_report.xlsx";
pub(crate) const TOTAL_FILE: &str = "total_final_result.xlsx";

impl PipelineStep for CollectTotalStep {
    fn key(&self) -> &'static str {
        "collect-total"
    }

    fn title(&self) -> &'static str {
        "Merge per-group reports into total_final_result.xlsx"
    }

    fn run(&self, config: &PipelineConfig) -> Result<()> {
        println!("[collect-total] merging per-group report files");
        let root = &config.out_grouped_by_col4;
        if !root.exists() {
            return Err(PipelineError::MissingFile(root.clone()).into());
        }

        let mut titles: Option<Vec<Cell>> = None;
        let mut merged_rows: Vec<Vec<Cell>> = Vec::new();
        let mut files_read = 0usize;

        for subfolder in sorted_subdirs(root)? {
            let folder_name = subfolder
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            let mut report_files: Vec<_> = std::fs::read_dir(&subfolder)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.is_file()
                        && p.file_name()
                            .and_then(|n| n.to_str())
                            .is_some_and(|n| n.ends_with(REPORT_SUFFIX))
                })
                .collect();
            report_files.sort();

            for path in report_files {
                let table = match reader::load_table(&path) {
                    Ok(table) => table,
                    Err(e) => {
                        println!(
                            "[collect-total] warning: failed to read {}: {:#}",
                            path.display(),
                            e
                        );
                        continue;
                    }
                };
                if table.is_empty() {
                    println!("[collect-total] skipping empty report: {}", path.display());
                    continue;
                }
                files_read += 1;

                let mut rows = table.rows.into_iter();
                let header = rows.next().unwrap_or_default();
                if titles.is_none() {
                    titles = Some(header);
                }
                for row in rows {
                    let mut tagged = Vec::with_capacity(row.len() + 1);
                    tagged.push(Cell::Text(folder_name.clone()));
                    tagged.extend(row);
                    merged_rows.push(tagged);
                }
            }
        }

        if files_read == 0 {
            return Err(anyhow!(
                "no readable report files under {}",
                root.display()
            ));
        }

        let mut header = vec![Cell::Text("GROUP".to_string())];
        header.extend(titles.unwrap_or_default());

        let mut total = Table::new();
        total.push_row(header);
        let data_rows = merged_rows.len();
        total.rows.extend(merged_rows);

        let out_path = root.join(TOTAL_FILE);
        writer::write_table(&out_path, &total)?;
        println!(
            "[collect-total] saved {} ({} report files, {} rows)",
            out_path.display(),
            files_read,
            data_rows
        );
        Ok(())
    }
}
