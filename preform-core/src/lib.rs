//! preform-core: staged analysis pipeline for preform draw spreadsheets
//!
//! The pipeline reads raw xlsx measurement exports, cleans and groups
//! them by preform identifier, and derives per-group report workbooks
//! plus a merged, annotated total.

pub mod config;
pub mod error;
pub mod prefix;
pub mod reader;
pub mod steps;
pub mod table;
pub mod writer;

use anyhow::{Result, anyhow};
use std::time::Instant;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use steps::PipelineStep;
pub use steps::registry;
pub use table::{Cell, Table};

/// Outcome of one executed step.
#[derive(Debug)]
pub struct StepReport {
    pub key: String,
    pub title: String,
    pub elapsed: f64,
    pub error: Option<String>,
}

impl StepReport {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a whole pipeline run.
#[derive(Debug)]
pub struct RunSummary {
    pub reports: Vec<StepReport>,
}

impl RunSummary {
    pub fn success(&self) -> bool {
        self.reports.iter().all(StepReport::success)
    }

    pub fn failed(&self) -> Vec<&StepReport> {
        self.reports.iter().filter(|r| !r.success()).collect()
    }
}

/// Main pipeline interface: runs stages by key against one config.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run all stages in default order.
    pub fn run_all(&self) -> Result<RunSummary> {
        self.run(&registry::DEFAULT_ORDER)
    }

    /// Run the named stages, in the given order. Unknown keys fail
    /// before anything executes.
    pub fn run<S: AsRef<str>>(&self, keys: &[S]) -> Result<RunSummary> {
        let mut steps = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key.as_ref();
            let step = registry::find_step(key).ok_or_else(|| {
                anyhow!(
                    "unknown step '{}' (valid: {})",
                    key,
                    registry::valid_keys().join(", ")
                )
            })?;
            steps.push(step);
        }

        let total = steps.len();
        let mut reports = Vec::with_capacity(total);

        for (i, step) in steps.iter().enumerate() {
            println!("{}", "-".repeat(100));
            println!("[{}/{}] {} started | {}", i + 1, total, step.key(), step.title());

            let started = Instant::now();
            let outcome = step.run(&self.config);
            let elapsed = started.elapsed().as_secs_f64();

            let error = outcome.as_ref().err().map(|e| format!("{:#}", e));
            let status = if error.is_none() { "success" } else { "failed" };
            println!(
                "[{}/{}] {} finished | {} | {:.2}s",
                i + 1,
                total,
                step.key(),
                status,
                elapsed
            );
            if let Some(msg) = &error {
                println!("[{}/{}] {} error: {}", i + 1, total, step.key(), msg);
            }

            let failed = error.is_some();
            reports.push(StepReport {
                key: step.key().to_string(),
                title: step.title().to_string(),
                elapsed,
                error,
            });

            if failed && self.config.stop_on_error {
                println!("aborting: stop_on_error is set");
                break;
            }
        }
        println!("{}", "-".repeat(100));

        Ok(RunSummary { reports })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_step_key_is_rejected_up_front() {
        let pipeline = Pipeline::new();
        let err = pipeline.run(&["resin", "no-such-step"]).unwrap_err();
        assert!(err.to_string().contains("no-such-step"));
    }

    #[test]
    fn test_run_summary_failed_filter() {
        let summary = RunSummary {
            reports: vec![
                StepReport {
                    key: "a".to_string(),
                    title: "A".to_string(),
                    elapsed: 0.1,
                    error: None,
                },
                StepReport {
                    key: "b".to_string(),
                    title: "B".to_string(),
                    elapsed: 0.2,
                    error: Some("boom".to_string()),
                },
            ],
        };
        assert!(!summary.success());
        let failed = summary.failed();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].key, "b");
    }
}
