//! Formatting strategy (rustfmt wrapper)
//!
//! Runs `rustfmt --check` over each package's files and turns every
//! reported diff into a finding. When rustfmt is not installed the
//! strategy degrades to empty summaries; formatting then simply does not
//! move the score.

use crate::discover::{rust_files, StrategyParameter};
use crate::models::{Issue, Summaries, Summary, SummaryMap};
use crate::scoring::percentage_from_issue_count;
use crate::strategies::base::{compute_units, Strategy};
use crate::strategies::external::{run_tool, tool_available};
use crate::sync::ProgressMeter;
use regex::Regex;
use std::path::Path;
use std::time::Duration;

/// Default per-package rustfmt timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct FormatStrategy {
    weight: f64,
    timeout: Duration,
    diff_line: Regex,
}

impl FormatStrategy {
    pub fn new() -> Self {
        Self {
            weight: 0.15,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            // rustfmt --check reports: "Diff in <path>:<line>:" (older
            // releases: "Diff in <path> at line <line>:")
            diff_line: Regex::new(r"Diff in (.+?)(?: at line |:)(\d+):?")
                .expect("hard-coded pattern compiles"),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn survey_package(&self, name: &str, dir: &Path) -> Summary {
        let mut summary = Summary::new(name);
        let files = rust_files(dir);
        if files.is_empty() {
            return summary;
        }

        let mut args: Vec<&str> = vec!["--check", "--edition", "2021"];
        let file_args: Vec<String> = files
            .iter()
            .map(|f| f.to_string_lossy().into_owned())
            .collect();
        args.extend(file_args.iter().map(String::as_str));

        let output = run_tool("rustfmt", &args, Some(dir), self.timeout);
        if !output.success {
            // Tool missing or timed out: degrade to an empty summary.
            summary.description = output
                .error
                .unwrap_or_else(|| "rustfmt unavailable".to_string());
            return summary;
        }

        for caps in self.diff_line.captures_iter(&output.stdout) {
            let file = Path::new(&caps[1])
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| caps[1].to_string());
            let line = caps[2].parse::<u32>().unwrap_or(0);
            summary.push(Issue::new(
                line,
                format!("{file}: not rustfmt-formatted"),
            ));
        }
        summary.description = format!("{} formatting diffs", summary.issues.len());
        summary
    }
}

impl Default for FormatStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for FormatStrategy {
    fn compute(&self, params: &StrategyParameter, progress: &ProgressMeter) -> Summaries {
        if !tool_available("rustfmt") {
            // One cheap probe instead of one failed spawn per package.
            progress.expect(0);
            return Summaries::new();
        }
        compute_units(&params.all_dirs, progress, |name, dir| {
            self.survey_package(name, dir)
        })
    }

    fn percentage(&self, summaries: &SummaryMap) -> f64 {
        let issues: usize = summaries.values().map(|s| s.issues.len()).sum();
        percentage_from_issue_count(issues)
    }

    fn name(&self) -> &'static str {
        "Format"
    }

    fn description(&self) -> &'static str {
        "Files that deviate from rustfmt formatting"
    }

    fn weight(&self) -> f64 {
        self.weight
    }
}
