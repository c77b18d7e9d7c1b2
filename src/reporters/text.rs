//! Text (terminal) reporter with colors and formatting

use crate::models::Report;
use anyhow::Result;

/// Grade colors (ANSI escape codes)
fn grade_color(grade: u8) -> &'static str {
    match grade {
        1 | 2 => "\x1b[32m", // Green
        3 => "\x1b[92m",     // Light green
        4 => "\x1b[33m",     // Yellow
        5 => "\x1b[91m",     // Light red
        _ => "\x1b[31m",     // Red
    }
}

/// Percentage band colors
fn percentage_color(percentage: f64) -> &'static str {
    if percentage >= 90.0 {
        "\x1b[32m" // Green
    } else if percentage >= 70.0 {
        "\x1b[33m" // Yellow
    } else {
        "\x1b[31m" // Red
    }
}

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Maximum issues shown per metric before truncating
const MAX_ISSUES_SHOWN: usize = 10;

/// Render report as formatted terminal output
pub fn render(report: &Report) -> Result<String> {
    let mut out = String::new();

    // Header
    let grade_c = grade_color(report.grade);
    out.push_str(&format!("\n{BOLD}Appraise Report{RESET}\n"));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Project: {BOLD}{}{RESET}  Score: {BOLD}{}/100{RESET}  Grade: {grade_c}{BOLD}{}{RESET}  Issues: {}\n\n",
        report.project,
        report.score,
        report.grade_letter(),
        report.issues
    ));

    // Per-metric lines
    out.push_str(&format!("{BOLD}METRICS{RESET}\n"));
    for metric in report.metrics.values() {
        let pct_c = percentage_color(metric.percentage);
        out.push_str(&format!(
            "  {:<16} {pct_c}{:>6.1}%{RESET}  weight {:.2}  {} findings",
            metric.name,
            metric.percentage,
            metric.weight,
            metric.issue_count(),
        ));
        if let Some(error) = &metric.error {
            out.push_str(&format!("  {DIM}({error}){RESET}"));
        }
        out.push('\n');
    }
    out.push('\n');

    // Findings per metric, worst offenders first
    for metric in report.metrics.values() {
        let total = metric.issue_count();
        if total == 0 {
            continue;
        }
        out.push_str(&format!("{BOLD}{}{RESET}\n", metric.name.to_uppercase()));
        let mut shown = 0usize;
        'outer: for summary in metric.summaries.values() {
            for issue in &summary.issues {
                if shown >= MAX_ISSUES_SHOWN {
                    out.push_str(&format!(
                        "  {DIM}... and {} more{RESET}\n",
                        total - shown
                    ));
                    break 'outer;
                }
                if issue.line > 0 {
                    out.push_str(&format!(
                        "  {}:{}  {}\n",
                        summary.name, issue.line, issue.message
                    ));
                } else {
                    out.push_str(&format!("  {}  {}\n", summary.name, issue.message));
                }
                shown += 1;
            }
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "{DIM}Generated {}{RESET}\n",
        report.time_stamp
    ));

    Ok(out)
}
