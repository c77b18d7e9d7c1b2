//! CLI definition and the top-level run sequence

use crate::config::load_project_config;
use crate::progress::ProgressConsumer;
use crate::report::Reporter;
use crate::reporters::OutputFormat;
use crate::strategies::default_strategies;
use crate::sync::TOTAL_PROGRESS_UNITS;
use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

/// Parse and validate a tool timeout (1-600 seconds)
fn parse_timeout(s: &str) -> Result<u64, String> {
    let n: u64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("timeout must be at least 1 second".to_string())
    } else if n > 600 {
        Err("timeout cannot exceed 600 seconds".to_string())
    } else {
        Ok(n)
    }
}

/// Appraise - weighted code-quality appraisal
///
/// Runs a set of analyzers over a source tree and folds their findings
/// into one weighted score.
#[derive(Parser, Debug)]
#[command(name = "appraise")]
#[command(
    version,
    about = "Weighted code-quality appraisal — score a source tree across tests, complexity, duplication, dead code, spelling, formatting, and dependency structure",
    after_help = "\
Examples:
  appraise .                         Appraise the current directory
  appraise . --format json           JSON output for scripting
  appraise . --format html -o report.html   Standalone HTML report
  appraise . --except vendor,gen     Skip matching packages
  appraise . --disable SpellCheck    Skip one analyzer"
)]
pub struct Cli {
    /// Path to project (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format: text, json, html
    #[arg(long, short = 'f', value_parser = ["text", "json", "html"])]
    pub format: Option<String>,

    /// Output file path (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Comma-separated package-name substrings to exclude
    #[arg(long, default_value = "")]
    pub except: String,

    /// Strategies to skip (repeatable)
    #[arg(long = "disable")]
    pub disabled: Vec<String>,

    /// Per-tool timeout in seconds (1-600; default from appraise.toml, else 60)
    #[arg(long, value_parser = parse_timeout)]
    pub timeout: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Suppress the progress bar
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

/// Run the full appraisal: discovery, every strategy, scoring, rendering.
pub fn run(cli: Cli) -> Result<()> {
    let config = load_project_config(&cli.path);

    let format_name = cli
        .format
        .clone()
        .or_else(|| config.defaults.format.clone())
        .unwrap_or_else(|| "text".to_string());
    let format = OutputFormat::from_str(&format_name)?;

    let except = config.except_spec(&cli.except);
    let timeout = cli.timeout.unwrap_or(config.strategies.timeout_secs);
    let mut disabled = cli.disabled.clone();
    disabled.extend(config.strategies.disabled.iter().cloned());

    let project = cli
        .path
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| cli.path.to_string_lossy().into_owned());

    let mut reporter = Reporter::new(project);
    reporter.register_all(default_strategies(&disabled, timeout));

    let consumer = if cli.quiet {
        None
    } else {
        Some(ProgressConsumer::spawn(
            reporter.synchronizer().progress_receiver(),
            reporter.synchronizer().finished_receiver(),
            TOTAL_PROGRESS_UNITS,
        ))
    };

    let start = Instant::now();
    let result = reporter.run(&cli.path, &except);
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            // Unblock the consumer before surfacing the fatal error.
            reporter.close();
            if let Some(consumer) = consumer {
                consumer.join();
            }
            return Err(e.into());
        }
    };

    let rendered = reporter.render(&report, format)?;
    reporter.close();
    if let Some(consumer) = consumer {
        consumer.join();
    }

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("failed to write {path:?}"))?;
            eprintln!("report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    if !cli.quiet {
        eprintln!(
            "{} {} scored {} ({}) in {:.2}s",
            style("done:").green().bold(),
            report.project,
            style(format!("{}/100", report.score)).bold(),
            report.grade_letter(),
            start.elapsed().as_secs_f64()
        );
    }

    Ok(())
}
