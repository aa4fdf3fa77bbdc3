//! Insight Studio command line.
//!
//! # Usage
//!
//! ```bash
//! # Rank the drivers of a target column
//! insight-studio investigate --csv loans.csv --target approved
//!
//! # Run an analysis plan and stream progress events to stderr
//! insight-studio execute --csv loans.csv --plan plan.json
//!
//! # Profile a dataset
//! insight-studio profile --csv loans.csv
//! ```
//!
//! # Environment Variables
//!
//! - `STUDIO_CONFIG`: Path to a TOML config file (overridden by `--config`)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{bail, Context, Result};
use clap::Parser;
use insight_studio::config::{self, StudioConfig};
use insight_studio::execution::ChannelSink;
use insight_studio::{
    AnalysisPlan, DataFrame, DatasetProfiler, ExecutionEngine, InvestigationEngine,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "insight-studio")]
#[command(about = "Goal-driven driver discovery for tabular data")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Rank the drivers of one target column and print the answer
    Investigate {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        target: String,
        #[arg(long, default_value = "What drives this outcome?")]
        question: String,
    },

    /// Execute a JSON analysis plan against a dataset
    Execute {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        plan: PathBuf,
        /// Also run driver analysis for this target after the plan
        #[arg(long)]
        target: Option<String>,
    },

    /// Print the dataset profile
    Profile {
        #[arg(long)]
        csv: PathBuf,
    },
}

// ============================================================================
// CSV Reading
// ============================================================================

/// Splits CSV text into records.
///
/// Quote state carries across line breaks, so a quoted field may contain newlines and
/// delimiters. A quote only opens at the start of a field; `""` inside quotes is a literal
/// quote. Blank lines are skipped and `\r\n` endings are accepted.
fn parse_csv_records(text: &str) -> Vec<Vec<String>> {
    fn finish_record(record: &mut Vec<String>, records: &mut Vec<Vec<String>>) {
        let record = std::mem::take(record);
        let blank = record.len() == 1 && record[0].trim().is_empty();
        if !blank {
            records.push(record);
        }
    }

    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                finish_record(&mut record, &mut records);
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        finish_record(&mut record, &mut records);
    }
    records
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut records = parse_csv_records(&text).into_iter();
    let Some(header) = records.next() else {
        bail!("{} is empty", path.display());
    };
    let headers: Vec<String> = header.into_iter().map(|h| h.trim().to_string()).collect();
    let rows: Vec<Vec<String>> = records.collect();

    let frame = DataFrame::from_records(&headers, &rows)
        .with_context(|| format!("Malformed CSV {}", path.display()))?;
    info!(
        path = %path.display(),
        rows = frame.row_count(),
        columns = frame.column_count(),
        "Dataset loaded"
    );
    Ok(frame)
}

// ============================================================================
// Commands
// ============================================================================

fn load_config(path: Option<&Path>) -> Result<StudioConfig> {
    let cfg = match path {
        Some(path) => StudioConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => StudioConfig::load(),
    };
    cfg.validate().context("Invalid studio config")?;
    Ok(cfg)
}

fn investigate(csv: &Path, target: &str, question: &str) -> Result<()> {
    let frame = read_csv(csv)?;
    let profile = DatasetProfiler::new().profile(&frame);
    let report = InvestigationEngine::from_global().investigate(&frame, &profile, target, question)?;

    let out = json!({
        "statistical_results": report.bundle,
        "driver_ranking": report.drivers,
        "final_answer": report.answer,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn execute(csv: &Path, plan_path: &Path, target: Option<String>) -> Result<()> {
    let frame = read_csv(csv)?;
    let raw = std::fs::read_to_string(plan_path)
        .with_context(|| format!("Failed to read {}", plan_path.display()))?;
    let plan: AnalysisPlan = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid plan {}", plan_path.display()))?;

    let request = target.map(|target_column| insight_studio::InvestigationRequest {
        profile: DatasetProfiler::new().profile(&frame),
        target_column,
        question: format!("What drives this outcome ({})?", plan.intent_type),
    });

    let (sink, mut rx) = ChannelSink::channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => eprintln!("{line}"),
                Err(e) => warn!(error = %e, "Failed to encode progress event"),
            }
        }
    });

    let outcome = ExecutionEngine::from_global()
        .execute(&plan, &frame, &sink, request.as_ref())
        .await;
    drop(sink);
    if let Err(e) = printer.await {
        warn!(error = %e, "Progress printer stopped");
    }
    let outcome = outcome?;

    let out = json!({
        "execution_results": outcome.results,
        "driver_ranking": outcome.investigation.as_ref().map(|r| &r.drivers),
        "final_answer": outcome.investigation.as_ref().map(|r| &r.answer),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn profile(csv: &Path) -> Result<()> {
    let frame = read_csv(csv)?;
    let profile = DatasetProfiler::new().profile(&frame);
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if args.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    config::init(load_config(args.config.as_deref())?);

    match args.command {
        SubCommand::Investigate {
            csv,
            target,
            question,
        } => investigate(&csv, &target, &question),
        SubCommand::Execute { csv, plan, target } => execute(&csv, &plan, target).await,
        SubCommand::Profile { csv } => profile(&csv),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_records_quotes() {
        assert_eq!(
            parse_csv_records(r#"a,"b,c","say ""hi""",,"#),
            vec![vec!["a", "b,c", "say \"hi\"", "", ""]]
        );
    }

    #[test]
    fn test_quoted_newline_stays_in_field() {
        let text = "id,note\r\n1,\"line one\nline two\"\n\n2,plain\n";
        assert_eq!(
            parse_csv_records(text),
            vec![
                vec!["id", "note"],
                vec!["1", "line one\nline two"],
                vec!["2", "plain"],
            ]
        );
    }
}
