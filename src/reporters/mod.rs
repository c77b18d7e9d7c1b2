//! Output reporters for appraisal results
//!
//! Supports multiple output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON
//! - `html` - Standalone HTML report

mod html;
mod json;
mod text;

use crate::models::Report;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, html",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Html => write!(f, "html"),
        }
    }
}

/// Render a frozen report in the specified format
pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Json => json::render(report),
        OutputFormat::Html => html::render(report),
    }
}

/// Get the recommended file extension for a format
pub fn file_extension(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Html => "html",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Issue, Metric, Summary, SummaryMap};
    use std::collections::BTreeMap;

    /// Create a minimal Report for testing
    pub(crate) fn test_report() -> Report {
        let mut summaries = SummaryMap::new();
        let mut summary = Summary::new("src/core");
        summary.push(Issue::new(12, "function `tangle` has estimated cyclomatic complexity 19"));
        summary.description = "average complexity 4.2".to_string();
        summaries.insert(summary.name.clone(), summary);

        let mut metrics = BTreeMap::new();
        metrics.insert(
            "Cyclomatic".to_string(),
            Metric {
                name: "Cyclomatic".into(),
                description: "Functions whose estimated cyclomatic complexity exceeds the threshold"
                    .into(),
                summaries,
                weight: 0.2,
                percentage: 98.0,
                error: None,
            },
        );
        metrics.insert(
            "UnitTest".to_string(),
            Metric {
                name: "UnitTest".into(),
                description: "Share of source files exercised by unit tests".into(),
                summaries: SummaryMap::new(),
                weight: 0.25,
                percentage: 64.0,
                error: None,
            },
        );

        Report {
            project: "demo".into(),
            score: 85,
            grade: 3,
            metrics,
            issues: 1,
            time_stamp: "2026-08-08 12:00:00".into(),
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("html").unwrap(), OutputFormat::Html);
        assert!(OutputFormat::from_str("invalid").is_err());
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension(OutputFormat::Json), "json");
        assert_eq!(file_extension(OutputFormat::Html), "html");
        assert_eq!(file_extension(OutputFormat::Text), "txt");
    }
}
