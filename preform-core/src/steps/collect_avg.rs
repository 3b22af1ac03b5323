//! collect-avg: gather each group file's trailing average row into one
//! combined table per prefix folder

use super::{PipelineStep, candidate_files, sorted_subdirs};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::prefix;
use crate::reader;
use crate::table::{Cell, Table};
use crate::writer;
use anyhow::Result;

pub struct CollectAvgStep;

impl PipelineStep for CollectAvgStep {
    fn key(&self) -> &'static str {
        "collect-avg"
    }

    fn title(&self) -> &'static str {
        "Collect average rows into one file per prefix folder"
    }

    fn run(&self, config: &PipelineConfig) -> Result<()> {
        println!("[collect-avg] collecting average rows per prefix folder");
        let base = &config.out_grouped_by_col4;
        if !base.exists() {
            return Err(PipelineError::MissingFile(base.clone()).into());
        }

        let prefix_dirs = sorted_subdirs(base)?;
        if prefix_dirs.is_empty() {
            println!("[collect-avg] no prefix folders to process");
            return Ok(());
        }

        for prefix_dir in prefix_dirs {
            let dir_name = prefix_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let out_file = prefix_dir.join(format!("{}.xlsx", dir_name));

            let files = candidate_files(&prefix_dir)?;
            if files.is_empty() {
                println!("[collect-avg] {}: nothing to collect", dir_name);
                continue;
            }

            let mut combined_header: Option<Vec<Cell>> = None;
            let mut collected: Vec<Vec<Cell>> = Vec::new();

            for path in files {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let (header, mut data) = match reader::load_table_with_header(&path) {
                    Ok(loaded) => loaded,
                    Err(e) => {
                        println!("[collect-avg] warning: failed to read {}: {:#}", file_name, e);
                        continue;
                    }
                };
                if data.is_empty() {
                    println!("[collect-avg] skipping empty file: {}", file_name);
                    continue;
                }

                let last = data.row_count() - 1;
                let id_col = config.group_key_col;

                // The average row's identifier is usually blank (text
                // column); repair it from the row above.
                if data.column_count() > id_col
                    && last >= 1
                    && data.cell(last, id_col).is_blank()
                {
                    let above = data.cell(last - 1, id_col).clone();
                    data.set_cell(last, id_col, above);
                }

                // Prefer the identifier encoded in the filename when it
                // matches the preform shape.
                if data.column_count() > id_col {
                    if let Some(preform) = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .and_then(prefix::preform_from_filename)
                    {
                        data.set_cell(last, id_col, Cell::Text(preform));
                    }
                }

                if combined_header.is_none() {
                    combined_header = Some(header);
                }
                collected.push(data.rows.swap_remove(last));
            }

            if collected.is_empty() {
                println!("[collect-avg] {}: no average rows found", dir_name);
                continue;
            }

            let mut combined = Table::new();
            combined.push_row(combined_header.unwrap_or_default());
            let total = collected.len();
            combined.rows.extend(collected);

            match writer::write_table(&out_file, &combined) {
                Ok(()) => println!(
                    "[collect-avg] saved {} ({} rows)",
                    out_file.display(),
                    total
                ),
                Err(e) => println!(
                    "[collect-avg] failed to save {}: {:#}",
                    out_file.display(),
                    e
                ),
            }
        }

        Ok(())
    }
}
