use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use preform_core::{Pipeline, PipelineConfig, RunSummary, registry};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "preformcli")]
#[command(about = "Staged analysis pipeline for preform draw spreadsheets", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the AB source workbook path
    #[arg(long, value_name = "FILE", global = true)]
    ab: Option<PathBuf>,

    /// Override the raw alls workbook path
    #[arg(long, value_name = "FILE", global = true)]
    alls: Option<PathBuf>,

    /// Override the cleaned alls workbook path
    #[arg(long, value_name = "FILE", global = true)]
    alls_cleaned: Option<PathBuf>,

    /// Override the resin/drawno output folder
    #[arg(long, value_name = "DIR", global = true)]
    out_prefix: Option<PathBuf>,

    /// Override the grouped output folder
    #[arg(long, value_name = "DIR", global = true)]
    out_col4: Option<PathBuf>,

    /// Try the W-shaped identifier pattern before the generic one
    #[arg(long, global = true)]
    use_wpattern_first: bool,

    /// Keep rows whose filter column is not '0'-second-from-last
    #[arg(long, global = true)]
    no_second_last_zero_filter: bool,

    /// Keep going after a failed step
    #[arg(long, global = true)]
    no_stop_on_error: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run every pipeline step in default order
    RunAll,
    /// Run selected steps, in the given order
    Run {
        /// Step keys to run (see `run --help` output of valid keys)
        #[arg(value_name = "STEP", required = true)]
        steps: Vec<String>,
    },
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = if let Some(config_path) = &cli.config {
        PipelineConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        // Try to load default config from current directory if it exists
        let default_config_path = PathBuf::from("preform.toml");
        if default_config_path.exists() {
            PipelineConfig::from_file(&default_config_path).with_context(|| {
                format!(
                    "Failed to load config from {}",
                    default_config_path.display()
                )
            })?
        } else {
            PipelineConfig::default()
        }
    };

    if let Some(path) = &cli.ab {
        config.excel_ab = path.clone();
    }
    if let Some(path) = &cli.alls {
        config.excel_alls = path.clone();
    }
    if let Some(path) = &cli.alls_cleaned {
        config.excel_alls_cleaned = path.clone();
    }
    if let Some(path) = &cli.out_prefix {
        config.out_grouped_by_prefix = path.clone();
    }
    if let Some(path) = &cli.out_col4 {
        config.out_grouped_by_col4 = path.clone();
    }
    if cli.use_wpattern_first {
        config.use_w_pattern_first = true;
    }
    if cli.no_second_last_zero_filter {
        config.filter_second_last_zero = false;
    }
    if cli.no_stop_on_error {
        config.stop_on_error = false;
    }
    Ok(config)
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "=== Run summary ===".bold());
    for report in &summary.reports {
        let status = if report.success() {
            "ok".green()
        } else {
            "failed".red()
        };
        println!("  {:<14} {} ({:.2}s)", report.key, status, report.elapsed);
    }
    for report in summary.failed() {
        if let Some(msg) = &report.error {
            println!("  {} {}: {}", "error".red().bold(), report.key, msg);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    println!("{}", "preformcli - preform draw-data pipeline".bold());
    println!("steps: {}", registry::valid_keys().join(", "));

    let pipeline = Pipeline::with_config(config);
    let summary = match &cli.command {
        Some(Command::Run { steps }) => pipeline.run(steps)?,
        Some(Command::RunAll) | None => pipeline.run_all()?,
    };

    print_summary(&summary);
    std::process::exit(if summary.success() { 0 } else { 1 });
}
