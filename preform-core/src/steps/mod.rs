//! Pipeline stage system

pub mod registry;

// Stage implementations, in default execution order
pub mod resin;
pub mod zero;
pub mod group;
pub mod collect_avg;
pub mod copy42;
pub mod types;
pub mod report;
pub mod collect_total;
pub mod post_analyze;

use crate::config::PipelineConfig;
use crate::table::Cell;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Trait implemented by every pipeline stage.
pub trait PipelineStep: Send + Sync {
    /// Stable step key used on the command line (e.g. "collect-avg").
    fn key(&self) -> &'static str;

    /// One-line description shown in the run frame.
    fn title(&self) -> &'static str;

    /// Execute the stage. Per-item problems are reported and skipped
    /// inside; an `Err` means the stage itself failed.
    fn run(&self, config: &PipelineConfig) -> Result<()>;
}

/// Filter predicate: second-from-last character of the cell's trimmed
/// text is '0'. Requires at least two characters.
pub(crate) fn second_last_is_zero(cell: &Cell) -> bool {
    let text = cell.display();
    let trimmed = text.trim();
    let chars: Vec<char> = trimmed.chars().collect();
    chars.len() >= 2 && chars[chars.len() - 2] == '0'
}

/// Excel lock files, dotfiles and editor temp files are never pipeline
/// inputs.
pub(crate) fn is_temp_or_hidden(name: &str) -> bool {
    name.starts_with("~$") || name.starts_with('.') || name.ends_with(".tmp")
}

/// Subdirectories of `root`, sorted by name, temp/hidden excluded.
pub(crate) fn sorted_subdirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if path.is_dir() && !is_temp_or_hidden(&name) {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// `.xlsx` member files of a prefix folder, sorted by name, excluding
/// the folder's own aggregate output and temp/hidden files.
pub(crate) fn candidate_files(prefix_dir: &Path) -> Result<Vec<PathBuf>> {
    let own_output = format!(
        "{}.xlsx",
        prefix_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    );
    let mut files = Vec::new();
    for entry in fs::read_dir(prefix_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if is_temp_or_hidden(&name) {
            continue;
        }
        if !name.to_lowercase().ends_with(".xlsx") {
            continue;
        }
        if name.eq_ignore_ascii_case(&own_output) {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_last_is_zero() {
        assert!(second_last_is_zero(&Cell::Text("SP0301".to_string())));
        assert!(second_last_is_zero(&Cell::Text(" X01 ".to_string())));
        assert!(!second_last_is_zero(&Cell::Text("SP0311".to_string())));
        assert!(!second_last_is_zero(&Cell::Text("7".to_string())));
        assert!(!second_last_is_zero(&Cell::Empty));
        // Numeric cells go through their text form.
        assert!(second_last_is_zero(&Cell::Number(101.0)));
        assert!(!second_last_is_zero(&Cell::Number(110.0)));
    }

    #[test]
    fn test_is_temp_or_hidden() {
        assert!(is_temp_or_hidden("~$book.xlsx"));
        assert!(is_temp_or_hidden(".hidden"));
        assert!(is_temp_or_hidden("scratch.tmp"));
        assert!(!is_temp_or_hidden("W00.xlsx"));
    }
}
