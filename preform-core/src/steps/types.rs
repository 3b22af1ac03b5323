//! types: summarize which type/vendor prefix codes are on hand

use super::{PipelineStep, sorted_subdirs};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use anyhow::Result;
use std::collections::BTreeSet;

pub struct TypeSummaryStep;

impl PipelineStep for TypeSummaryStep {
    fn key(&self) -> &'static str {
        "types"
    }

    fn title(&self) -> &'static str {
        "Type/vendor holdings summary"
    }

    fn run(&self, config: &PipelineConfig) -> Result<()> {
        println!("[types] summarizing type/vendor holdings");
        let base = &config.out_grouped_by_col4;
        if !base.exists() {
            return Err(PipelineError::MissingFile(base.clone()).into());
        }

        let folder_names: BTreeSet<String> = sorted_subdirs(base)?
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().trim().to_uppercase()))
            .filter(|n| !n.is_empty())
            .collect();

        if folder_names.is_empty() {
            println!("[types] prefix codes on hand: (none)");
        } else {
            let list: Vec<&str> = folder_names.iter().map(String::as_str).collect();
            println!("[types] prefix codes on hand: {}", list.join(", "));
        }

        let defined: BTreeSet<String> = config
            .type_map
            .values()
            .flat_map(|vendors| vendors.values())
            .flatten()
            .map(|c| c.to_uppercase())
            .collect();

        let mut any_printed = false;
        for (type_name, vendors) in &config.type_map {
            let mut vendor_parts: Vec<String> = Vec::new();
            for (vendor, codes) in vendors {
                if codes.is_empty() {
                    continue;
                }
                let present: Vec<&str> = codes
                    .iter()
                    .filter(|c| folder_names.contains(&c.to_uppercase()))
                    .map(String::as_str)
                    .collect();
                if !present.is_empty() {
                    vendor_parts.push(format!("{}={}", vendor, present.join(", ")));
                }
            }
            if !vendor_parts.is_empty() {
                any_printed = true;
                println!("[types] type {}: {} on hand", type_name, vendor_parts.join(" / "));
            }
        }

        let others: Vec<&str> = folder_names
            .iter()
            .filter(|n| !defined.contains(*n))
            .map(String::as_str)
            .collect();
        if !others.is_empty() {
            println!("[types] other codes: {}", others.join(", "));
        }
        if !any_printed && others.is_empty() {
            println!("[types] no matching type codes on hand yet");
        }

        Ok(())
    }
}
