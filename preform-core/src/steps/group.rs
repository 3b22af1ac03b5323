//! group: partition cleaned rows by classified key, dedup, append
//! average rows and persist one file per group

use super::{PipelineStep, second_last_is_zero};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::prefix::{self, PrefixClassifier};
use crate::reader;
use crate::table::{Cell, Table};
use crate::writer;
use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use std::fs;

pub struct GroupStep;

/// Partition rows by classified grouping key, preserving insertion
/// order of both keys and rows. Rows whose key comes back blank are
/// dropped.
pub(crate) fn partition_rows(
    rows: Vec<Vec<Cell>>,
    key_col: usize,
    classifier: &PrefixClassifier,
) -> Vec<(String, Table)> {
    let mut order: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Table> = Vec::new();

    for row in rows {
        let raw = row.get(key_col).map(Cell::display).unwrap_or_default();
        let key = classifier.group_key(&raw);
        if key.trim().is_empty() {
            continue;
        }
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            groups.push(Table::new());
            groups.len() - 1
        });
        groups[slot].push_row(row);
    }

    order.into_iter().zip(groups).collect()
}

/// Top-level folder for a grouping key: its first three characters, or
/// "UNK" for keys shorter than that.
pub(crate) fn prefix_folder(key: &str) -> String {
    if key.chars().count() >= 3 {
        key.chars().take(3).collect()
    } else {
        "UNK".to_string()
    }
}

impl PipelineStep for GroupStep {
    fn key(&self) -> &'static str {
        "group"
    }

    fn title(&self) -> &'static str {
        "Group rows by classified key with dedup and average row"
    }

    fn run(&self, config: &PipelineConfig) -> Result<()> {
        println!("[group] grouping rows with dedup and average rows");
        if !config.excel_alls_cleaned.exists() {
            return Err(PipelineError::MissingFile(config.excel_alls_cleaned.clone()).into());
        }

        let (header, data) = reader::load_table_with_header(&config.excel_alls_cleaned)?;
        let width = data.column_count().max(header.len());
        let required = config.filter_col.max(config.group_key_col) + 1;
        if width < required {
            return Err(PipelineError::MalformedTable {
                found: width,
                required,
            }
            .into());
        }

        // Row filter: optional '0'-second-from-last check on column C,
        // always-on non-blank check on column D.
        let filtered: Vec<Vec<Cell>> = data
            .rows
            .into_iter()
            .filter(|row| {
                if config.filter_second_last_zero
                    && !second_last_is_zero(row.get(config.filter_col).unwrap_or(&Cell::Empty))
                {
                    return false;
                }
                !row.get(config.group_key_col)
                    .unwrap_or(&Cell::Empty)
                    .is_blank()
            })
            .collect();

        if filtered.is_empty() {
            println!("[group] no rows left after filtering");
            return Ok(());
        }

        let classifier = PrefixClassifier::new(config.use_w_pattern_first);
        let groups = partition_rows(filtered, config.group_key_col, &classifier);
        if groups.is_empty() {
            println!("[group] no valid grouping keys");
            return Ok(());
        }

        fs::create_dir_all(&config.out_grouped_by_col4)?;
        let mut prefix_counts: BTreeMap<String, usize> = BTreeMap::new();

        for (key, mut group) in groups {
            let folder = prefix_folder(&key);
            let dest_dir = config.out_grouped_by_col4.join(&folder);
            if let Err(e) = fs::create_dir_all(&dest_dir) {
                println!("[group] failed to create {}: {}", dest_dir.display(), e);
                continue;
            }

            if group.column_count() > config.dedup_col {
                let removed = group.dedup_by_column(config.dedup_col);
                if removed > 0 {
                    println!(
                        "[group] {}: removed {} duplicate rows (column {})",
                        key, removed, config.dedup_col
                    );
                }
            } else {
                println!("[group] {}: too few columns, dedup skipped", key);
            }

            let avg = group.average_row();
            let mut out = Table::new();
            out.push_row(header.clone());
            out.rows.extend(group.rows);
            out.push_row(avg);

            let out_path = dest_dir.join(format!("{}.xlsx", prefix::safe_filename(&key)));
            match writer::write_table(&out_path, &out) {
                Ok(()) => {
                    *prefix_counts.entry(folder).or_insert(0) += 1;
                }
                Err(e) => {
                    println!("[group] failed to persist {}: {:#}", out_path.display(), e);
                }
            }
        }

        for (folder, count) in &prefix_counts {
            println!("[group] {}: {} files written", folder, count);
        }
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
    fn test_partition_preserves_insertion_order() {
        let classifier = PrefixClassifier::new(false);
        let rows = vec![
            vec![text("C3D4x")],
            vec![text("A1B2y")],
            vec![text("C3D4z")],
        ];
        let groups = partition_rows(rows, 0, &classifier);
        // "C3D4x" -> key "C3D", "A1B2y" -> "A1B"
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "C3D");
        assert_eq!(groups[0].1.row_count(), 2);
        assert_eq!(groups[1].0, "A1B");
    }

    #[test]
    fn test_partition_drops_blank_keys() {
        let classifier = PrefixClassifier::new(false);
        let rows = vec![vec![Cell::Empty], vec![text("  ")], vec![text("A1B2")]];
        let groups = partition_rows(rows, 0, &classifier);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].0, "A1B");
    }

    #[test]
    fn test_prefix_folder_fallback() {
        assert_eq!(prefix_folder("W0012345A"), "W00");
        assert_eq!(prefix_folder("AB"), "UNK");
        assert_eq!(prefix_folder("ABC"), "ABC");
    }
}
