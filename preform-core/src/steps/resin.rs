//! resin: resin-type summary and draw-no folder skeleton from ab.xlsx

use super::PipelineStep;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::prefix;
use crate::reader;
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;

pub struct ResinStep;

impl PipelineStep for ResinStep {
    fn key(&self) -> &'static str {
        "resin"
    }

    fn title(&self) -> &'static str {
        "Resin summary and draw-no folder skeleton (ab.xlsx)"
    }

    fn run(&self, config: &PipelineConfig) -> Result<()> {
        println!("[resin] analyzing resin types and draw-no prefixes");
        if !config.excel_ab.exists() {
            return Err(PipelineError::MissingFile(config.excel_ab.clone()).into());
        }

        let (header, data) = reader::load_table_with_header(&config.excel_ab)?;
        let width = data.column_count().max(header.len());

        // Resin-type tally
        if width <= config.resin_col {
            return Err(PipelineError::MalformedTable {
                found: width,
                required: config.resin_col + 1,
            }
            .into());
        }

        let mut resin_counts: BTreeMap<String, usize> = BTreeMap::new();
        for row in &data.rows {
            if let Some(value) = row
                .get(config.resin_col)
                .and_then(|c| c.normalized())
                .map(|s| s.to_uppercase())
            {
                *resin_counts.entry(value).or_insert(0) += 1;
            }
        }

        if resin_counts.is_empty() {
            println!("[resin] no valid resin types found");
        } else {
            let names: Vec<&str> = resin_counts.keys().map(String::as_str).collect();
            println!("[resin] resin types: {}", names.join(","));
            for (name, count) in &resin_counts {
                println!("[resin] {}: {} records", name, count);
            }
        }

        // Draw-no prefix folders
        if width <= config.drawno_col {
            return Err(PipelineError::MalformedTable {
                found: width,
                required: config.drawno_col + 1,
            }
            .into());
        }

        let mut prefix_map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for row in &data.rows {
            let Some(value) = row.get(config.drawno_col).and_then(|c| c.normalized()) else {
                continue;
            };
            if value.chars().count() < 3 || !prefix::is_safe_name(&value) {
                continue;
            }
            let prefix: String = value.chars().take(3).collect();
            prefix_map.entry(prefix).or_default().insert(value);
        }

        fs::create_dir_all(&config.out_grouped_by_prefix)?;
        for (prefix, draw_nos) in &prefix_map {
            let prefix_dir = config.out_grouped_by_prefix.join(prefix);
            fs::create_dir_all(&prefix_dir)?;
            for draw_no in draw_nos {
                fs::create_dir_all(prefix_dir.join(draw_no))?;
            }
        }

        if prefix_map.is_empty() {
            println!("[resin] no draw-no prefixes to create folders for");
        } else {
            let prefixes: Vec<&str> = prefix_map.keys().map(String::as_str).collect();
            println!("[resin] prefixes found: {}", prefixes.join(","));
            for (prefix, draw_nos) in &prefix_map {
                println!("[resin] {}: {} draw numbers", prefix, draw_nos.len());
            }
        }

        // Summary CSVs next to ab.xlsx; failures here are warnings only
        if let Err(e) = write_summaries(config, &resin_counts, &prefix_map) {
            println!("[resin] warning: failed to write summary CSVs: {:#}", e);
        }

        Ok(())
    }
}

fn write_summaries(
    config: &PipelineConfig,
    resin_counts: &BTreeMap<String, usize>,
    prefix_map: &BTreeMap<String, BTreeSet<String>>,
) -> Result<()> {
    if !resin_counts.is_empty() {
        let mut csv = String::from("resin_type,count\n");
        for (name, count) in resin_counts {
            let _ = writeln!(csv, "{},{}", name, count);
        }
        fs::write(config.excel_ab.with_file_name("resin_type_counts.csv"), csv)?;
    }
    if !prefix_map.is_empty() {
        let mut csv = String::from("prefix,draw_no_count\n");
        for (prefix, draw_nos) in prefix_map {
            let _ = writeln!(csv, "{},{}", prefix, draw_nos.len());
        }
        fs::write(
            config.excel_ab.with_file_name("prefix_drawno_counts.csv"),
            csv,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, Table};
    use crate::writer;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_resin_builds_prefix_folders_and_csvs() {
        let dir = tempfile::tempdir().unwrap();
        let ab = dir.path().join("ab.xlsx");

        let table = Table::from_rows(vec![
            vec![text("draw_no"), text("b"), text("c"), text("d"), text("resin")],
            vec![text("W0012345"), text(""), text(""), text(""), text("uv9100")],
            vec![text("W0012399"), text(""), text(""), text(""), text("UV9100")],
            vec![text("L0E00001"), text(""), text(""), text(""), text("uv7")],
            // Too short and unsafe values are skipped.
            vec![text("AB"), text(""), text(""), text(""), Cell::Empty],
            vec![text("W00/bad"), text(""), text(""), text(""), Cell::Empty],
        ]);
        writer::write_table(&ab, &table).unwrap();

        let config = PipelineConfig {
            excel_ab: ab.clone(),
            out_grouped_by_prefix: dir.path().join("grouped_by_prefix"),
            ..PipelineConfig::default()
        };
        ResinStep.run(&config).unwrap();

        assert!(dir.path().join("grouped_by_prefix/W00/W0012345").is_dir());
        assert!(dir.path().join("grouped_by_prefix/W00/W0012399").is_dir());
        assert!(dir.path().join("grouped_by_prefix/L0E/L0E00001").is_dir());
        assert!(!dir.path().join("grouped_by_prefix/AB").exists());

        let csv = fs::read_to_string(dir.path().join("resin_type_counts.csv")).unwrap();
        assert!(csv.contains("UV9100,2"));
        assert!(csv.contains("UV7,1"));
        let csv = fs::read_to_string(dir.path().join("prefix_drawno_counts.csv")).unwrap();
        assert!(csv.contains("W00,2"));
    }

    #[test]
    fn test_resin_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            excel_ab: dir.path().join("nope.xlsx"),
            ..PipelineConfig::default()
        };
        assert!(ResinStep.run(&config).is_err());
    }
}
