//! Step registry: creation, lookup and default ordering

use super::*;

/// Default full-pipeline order. Later stages consume files the earlier
/// ones leave on disk.
pub const DEFAULT_ORDER: [&str; 9] = [
    "resin",
    "zero",
    "group",
    "collect-avg",
    "copy-42",
    "types",
    "reports",
    "collect-total",
    "post-analyze",
];

/// Create instances of all available steps, in default order.
pub fn create_all_steps() -> Vec<Box<dyn PipelineStep>> {
    vec![
        Box::new(resin::ResinStep),
        Box::new(zero::ZeroStep),
        Box::new(group::GroupStep),
        Box::new(collect_avg::CollectAvgStep),
        Box::new(copy42::CopyCol4ToCol2Step),
        Box::new(types::TypeSummaryStep),
        Box::new(report::ReportStep),
        Box::new(collect_total::CollectTotalStep),
        Box::new(post_analyze::PostAnalyzeStep),
    ]
}

/// Look up a step by its key.
pub fn find_step(key: &str) -> Option<Box<dyn PipelineStep>> {
    create_all_steps().into_iter().find(|s| s.key() == key)
}

/// All valid step keys.
pub fn valid_keys() -> Vec<&'static str> {
    create_all_steps().iter().map(|s| s.key()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order_keys_all_exist() {
        for key in DEFAULT_ORDER {
            assert!(find_step(key).is_some(), "missing step {}", key);
        }
    }

    #[test]
    fn test_registry_matches_default_order() {
        let keys: Vec<_> = create_all_steps().iter().map(|s| s.key()).collect();
        assert_eq!(keys, DEFAULT_ORDER.to_vec());
    }
}
