//! Pipeline configuration: paths, fixed column offsets, toggles and
//! thresholds matching the external spreadsheet template

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Vendor name -> list of prefix codes, per fiber type.
pub type TypeMap = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// All pipeline settings, passed explicitly to every stage so stages
/// stay pure functions of (input files, config).
///
/// Column indexes are 0-based offsets into the source spreadsheets.
/// They mirror a fixed external template; header titles in the source
/// files are inconsistent, so positions are authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Production draw records (resin column + draw identifiers).
    pub excel_ab: PathBuf,
    /// Raw measurement records.
    pub excel_alls: PathBuf,
    /// Measurement records with zeros blanked out.
    pub excel_alls_cleaned: PathBuf,
    /// Folder skeleton keyed by draw-no prefix.
    pub out_grouped_by_prefix: PathBuf,
    /// Root for grouped files, reports and totals.
    pub out_grouped_by_col4: PathBuf,

    /// Resin-type column in ab.xlsx (column E).
    pub resin_col: usize,
    /// Draw-identifier column in ab.xlsx (column A).
    pub drawno_col: usize,
    /// Column C of alls_cleaned.xlsx, filtered on its second-from-last
    /// character.
    pub filter_col: usize,
    /// Column D of alls_cleaned.xlsx: grouping key source, and the
    /// identifier column repaired by the collector.
    pub group_key_col: usize,
    /// Dedup key column inside each group.
    pub dedup_col: usize,

    /// Identifier column of the combined report (after the GROUP
    /// prefix column).
    pub report_id_col: usize,
    /// delta 2m-22m column of the combined report.
    pub report_delta_col: usize,
    /// Clad Dia. I/E column of the combined report.
    pub report_clad_ie_col: usize,
    /// Clad Dia. O/E column of the combined report.
    pub report_clad_oe_col: usize,

    /// Try the W-pattern rule before the generic rule.
    pub use_w_pattern_first: bool,
    /// Keep only rows whose filter column has '0' second from last.
    pub filter_second_last_zero: bool,
    /// Abort the run on the first failed step.
    pub stop_on_error: bool,

    /// Inclusive clad-diameter tolerance band.
    pub clad_low: f64,
    pub clad_high: f64,

    /// Fiber type -> vendor -> prefix codes, for the holdings summary.
    pub type_map: TypeMap,
}

impl PipelineConfig {
    /// Load configuration from a TOML file. Missing keys fall back to
    /// the defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            excel_ab: PathBuf::from("ab.xlsx"),
            excel_alls: PathBuf::from("alls.xlsx"),
            excel_alls_cleaned: PathBuf::from("alls_cleaned.xlsx"),
            out_grouped_by_prefix: PathBuf::from("grouped_by_prefix"),
            out_grouped_by_col4: PathBuf::from("grouped_by_col4"),
            resin_col: 4,
            drawno_col: 0,
            filter_col: 2,
            group_key_col: 3,
            dedup_col: 2,
            report_id_col: 1,
            report_delta_col: 22,
            report_clad_ie_col: 24,
            report_clad_oe_col: 25,
            use_w_pattern_first: false,
            filter_second_last_zero: true,
            stop_on_error: true,
            clad_low: 124.3,
            clad_high: 125.7,
            type_map: default_type_map(),
        }
    }
}

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn vendors(sec: &[&str], sumitomo: &[&str]) -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();
    map.insert("SEC".to_string(), codes(sec));
    map.insert("Sumitomo".to_string(), codes(sumitomo));
    map
}

/// Production mapping of fiber types to vendor prefix codes.
pub fn default_type_map() -> TypeMap {
    let mut map = BTreeMap::new();
    map.insert("LWPF(90)".to_string(), vendors(&["W00", "W0J"], &["20M"]));
    map.insert("LWPF(150)".to_string(), vendors(&["L0E"], &["L0M"]));
    map.insert("LWPF(180)".to_string(), vendors(&["S0E"], &["S0M"]));
    map.insert("A1(90)".to_string(), vendors(&[], &["Z0M"]));
    map.insert("A1(150)".to_string(), vendors(&[], &["Z0L"]));
    map.insert("A2(90)".to_string(), vendors(&["AJW", "AJF", "AJB"], &[]));
    map.insert("A2(150)".to_string(), vendors(&["AL"], &[]));
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_offsets_match_template() {
        let config = PipelineConfig::default();
        assert_eq!(config.filter_col, 2);
        assert_eq!(config.group_key_col, 3);
        assert_eq!(config.dedup_col, 2);
        assert_eq!(config.report_delta_col, 22);
        assert_eq!(config.clad_low, 124.3);
        assert_eq!(config.clad_high, 125.7);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config: PipelineConfig = toml::from_str(
            r#"
            excel_alls = "measurements.xlsx"
            use_w_pattern_first = true
            stop_on_error = false
            "#,
        )
        .unwrap();
        assert_eq!(config.excel_alls, PathBuf::from("measurements.xlsx"));
        assert!(config.use_w_pattern_first);
        assert!(!config.stop_on_error);
        // Untouched keys keep their defaults.
        assert_eq!(config.excel_ab, PathBuf::from("ab.xlsx"));
        assert!(config.filter_second_last_zero);
    }

    #[test]
    fn test_default_type_map_has_lwpf_codes() {
        let map = default_type_map();
        let lwpf = map.get("LWPF(90)").unwrap();
        assert_eq!(lwpf.get("SEC").unwrap(), &vec!["W00", "W0J"]);
        assert_eq!(lwpf.get("Sumitomo").unwrap(), &vec!["20M"]);
    }
}
