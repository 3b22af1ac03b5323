//! copy-42: overwrite column 1 of each prefix book with the text form
//! of column 3

use super::{PipelineStep, sorted_subdirs};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::reader;
use crate::table::{Cell, Table};
use crate::writer;
use anyhow::Result;

pub struct CopyCol4ToCol2Step;

const DST_COL: usize = 1;
const SRC_COL: usize = 3;

/// Text-normalize a cell for the identifier column: trailing ".0" is
/// stripped so numeric read-backs of codes stay literal.
pub(crate) fn normalize_as_text(cell: &Cell) -> Cell {
    let s = cell.display();
    let s = s.strip_suffix(".0").unwrap_or(&s);
    if s.trim().is_empty() {
        Cell::Empty
    } else {
        Cell::Text(s.to_string())
    }
}

impl PipelineStep for CopyCol4ToCol2Step {
    fn key(&self) -> &'static str {
        "copy-42"
    }

    fn title(&self) -> &'static str {
        "Copy column 4 into column 2 (as text) in each prefix book"
    }

    fn run(&self, config: &PipelineConfig) -> Result<()> {
        println!("[copy-42] copying column {} to column {} as text", SRC_COL, DST_COL);
        let root = &config.out_grouped_by_col4;
        if !root.exists() {
            return Err(PipelineError::MissingFile(root.clone()).into());
        }

        let prefix_dirs = sorted_subdirs(root)?;
        if prefix_dirs.is_empty() {
            println!("[copy-42] no prefix folders to process");
            return Ok(());
        }

        for prefix_dir in prefix_dirs {
            let dir_name = prefix_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let target = prefix_dir.join(format!("{}.xlsx", dir_name));
            if !target.exists() {
                println!("[copy-42] skipping, no target file: {}", target.display());
                continue;
            }

            let (header, mut data) = match reader::load_table_with_header(&target) {
                Ok(loaded) => loaded,
                Err(e) => {
                    println!("[copy-42] failed to read {}: {:#}", target.display(), e);
                    continue;
                }
            };
            if data.is_empty() {
                println!("[copy-42] skipping empty file: {}", target.display());
                continue;
            }

            let needed = DST_COL.max(SRC_COL) + 1;
            let width = data.column_count().max(header.len());
            if width < needed {
                println!(
                    "[copy-42] warning: {} has {} columns, need {}; skipped",
                    target.display(),
                    width,
                    needed
                );
                continue;
            }

            for row in data.rows.iter_mut() {
                let src = row.get(SRC_COL).cloned().unwrap_or(Cell::Empty);
                while row.len() <= DST_COL {
                    row.push(Cell::Empty);
                }
                row[DST_COL] = normalize_as_text(&src);
            }

            let mut out = Table::new();
            out.push_row(header);
            out.rows.extend(data.rows);

            match writer::write_table(&target, &out) {
                Ok(()) => println!("[copy-42] done: {}", target.display()),
                Err(e) => println!("[copy-42] failed to save {}: {:#}", target.display(), e),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_as_text() {
        assert_eq!(
            normalize_as_text(&Cell::Text("W0012345B".to_string())),
            Cell::Text("W0012345B".to_string())
        );
        assert_eq!(
            normalize_as_text(&Cell::Text("123.0".to_string())),
            Cell::Text("123".to_string())
        );
        assert_eq!(
            normalize_as_text(&Cell::Number(123.0)),
            Cell::Text("123".to_string())
        );
        assert_eq!(
            normalize_as_text(&Cell::Number(1.5)),
            Cell::Text("1.5".to_string())
        );
        assert_eq!(normalize_as_text(&Cell::Empty), Cell::Empty);
    }
}
