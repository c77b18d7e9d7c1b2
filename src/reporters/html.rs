//! HTML reporter with embedded styles
//!
//! Generates a standalone HTML report that can be viewed in any browser.
//! Includes:
//! - Overall grade and score visualization
//! - Per-metric percentage bars with weights
//! - Findings grouped by metric and package

use crate::models::{Metric, Report};
use anyhow::Result;

/// Render report as standalone HTML
pub fn render(report: &Report) -> Result<String> {
    let mut html = String::new();

    html.push_str(&render_head(report));
    html.push_str("<body>\n<div class=\"container\">\n");
    html.push_str(&render_header(report));
    html.push_str("<div class=\"content\">\n");
    html.push_str(&render_metric_table(report));
    for metric in report.metrics.values() {
        html.push_str(&render_findings(metric));
    }
    html.push_str("</div>\n");
    html.push_str(&render_footer(report));
    html.push_str("</div>\n</body>\n</html>\n");

    Ok(html)
}

/// Escape HTML special characters
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn grade_class(grade: u8) -> &'static str {
    match grade {
        1 | 2 => "grade-a",
        3 => "grade-b",
        4 => "grade-c",
        5 => "grade-d",
        _ => "grade-f",
    }
}

fn render_head(report: &Report) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Appraise Report - {project}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
               margin: 0; background: #f5f6f8; color: #1f2430; }}
        .container {{ max-width: 960px; margin: 0 auto; padding: 24px; }}
        .header {{ display: flex; align-items: baseline; gap: 16px; }}
        .score {{ font-size: 48px; font-weight: 700; }}
        .grade {{ font-size: 32px; font-weight: 700; padding: 4px 16px; border-radius: 8px; color: #fff; }}
        .grade-a {{ background: #2da44e; }}
        .grade-b {{ background: #6fb344; }}
        .grade-c {{ background: #d4a72c; }}
        .grade-d {{ background: #e16f24; }}
        .grade-f {{ background: #cf222e; }}
        table {{ width: 100%; border-collapse: collapse; background: #fff; border-radius: 8px; }}
        th, td {{ text-align: left; padding: 10px 14px; border-bottom: 1px solid #e4e7ec; }}
        .bar {{ background: #e4e7ec; border-radius: 4px; height: 8px; width: 160px; }}
        .bar > div {{ background: #2da44e; border-radius: 4px; height: 8px; }}
        .findings {{ background: #fff; border-radius: 8px; padding: 12px 16px; margin-top: 16px; }}
        .findings h3 {{ margin: 4px 0 8px; }}
        .finding {{ font-family: ui-monospace, monospace; font-size: 13px; padding: 2px 0; }}
        .location {{ color: #57606a; }}
        .footer {{ color: #57606a; font-size: 13px; margin-top: 24px; }}
    </style>
</head>
"#,
        project = escape(&report.project)
    )
}

fn render_header(report: &Report) -> String {
    format!(
        r#"<div class="header">
    <h1>{}</h1>
    <span class="score">{}/100</span>
    <span class="grade {}">{}</span>
    <span>{} issues</span>
</div>
"#,
        escape(&report.project),
        report.score,
        grade_class(report.grade),
        report.grade_letter(),
        report.issues
    )
}

fn render_metric_table(report: &Report) -> String {
    let mut out = String::from(
        "<table>\n<tr><th>Metric</th><th>Percentage</th><th></th><th>Weight</th><th>Findings</th></tr>\n",
    );
    for metric in report.metrics.values() {
        out.push_str(&format!(
            "<tr><td title=\"{}\">{}</td><td>{:.1}%</td>\
             <td><div class=\"bar\"><div style=\"width: {:.0}%\"></div></div></td>\
             <td>{:.2}</td><td>{}</td></tr>\n",
            escape(&metric.description),
            escape(&metric.name),
            metric.percentage,
            metric.percentage.clamp(0.0, 100.0),
            metric.weight,
            metric.issue_count()
        ));
    }
    out.push_str("</table>\n");
    out
}

fn render_findings(metric: &Metric) -> String {
    if metric.issue_count() == 0 {
        return String::new();
    }
    let mut out = format!(
        "<div class=\"findings\">\n<h3>{}</h3>\n",
        escape(&metric.name)
    );
    for summary in metric.summaries.values() {
        for issue in &summary.issues {
            let location = if issue.line > 0 {
                format!("{}:{}", summary.name, issue.line)
            } else {
                summary.name.clone()
            };
            out.push_str(&format!(
                "<div class=\"finding\"><span class=\"location\">{}</span> {}</div>\n",
                escape(&location),
                escape(&issue.message)
            ));
        }
    }
    out.push_str("</div>\n");
    out
}

fn render_footer(report: &Report) -> String {
    format!(
        "<div class=\"footer\">Generated by appraise on {}</div>\n",
        escape(&report.time_stamp)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_html_structure() {
        let report = test_report();
        let out = render(&report).expect("render html");
        assert!(out.starts_with("<!DOCTYPE html>"));
        assert!(out.contains("85/100"));
        assert!(out.contains("Cyclomatic"));
        assert!(out.ends_with("</html>\n"));
    }

    #[test]
    fn test_html_escapes_content() {
        let mut report = test_report();
        report.project = "<script>alert(1)</script>".into();
        let out = render(&report).expect("render html");
        assert!(!out.contains("<script>alert"));
        assert!(out.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_html_findings_include_location() {
        let report = test_report();
        let out = render(&report).expect("render html");
        assert!(out.contains("src/core:12"));
    }
}
