//! Cyclomatic complexity strategy
//!
//! Line-based decision-point estimate, no AST: a function's complexity is
//! 1 plus the number of branch keywords between its `fn` line and the next
//! one. Coarse, but stable across formatting styles, and good enough to
//! flag the outliers a reviewer would also flag.

use crate::discover::{rust_files, StrategyParameter};
use crate::models::{Issue, Summaries, Summary, SummaryMap};
use crate::scoring::percentage_from_issue_count;
use crate::strategies::base::{compute_units, Strategy};
use crate::sync::ProgressMeter;
use regex::Regex;
use std::path::Path;

/// Flag functions whose estimated complexity exceeds this.
const COMPLEXITY_THRESHOLD: u32 = 15;

/// Branch keywords, matched on word boundaries.
const BRANCH_KEYWORDS: &[&str] = &["if", "while", "for", "match", "loop"];

pub struct CyclomaticComplexityStrategy {
    weight: f64,
    threshold: u32,
    fn_pattern: Regex,
    branch_pattern: Regex,
}

struct FunctionSpan {
    name: String,
    line: u32,
    complexity: u32,
}

impl CyclomaticComplexityStrategy {
    pub fn new() -> Self {
        Self {
            weight: 0.2,
            threshold: COMPLEXITY_THRESHOLD,
            fn_pattern: Regex::new(r"^\s*(?:pub\s+(?:\([^)]*\)\s+)?)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+\S+\s+)?fn\s+([A-Za-z_][A-Za-z0-9_]*)")
                .expect("hard-coded pattern compiles"),
            branch_pattern: Regex::new(&format!(r"\b(?:{})\b", BRANCH_KEYWORDS.join("|")))
                .expect("hard-coded pattern compiles"),
        }
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Estimate per-function complexity for one file.
    fn scan_file(&self, content: &str) -> Vec<FunctionSpan> {
        let mut spans: Vec<FunctionSpan> = Vec::new();
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim_start();
            if line.starts_with("//") {
                continue;
            }
            if let Some(caps) = self.fn_pattern.captures(raw) {
                spans.push(FunctionSpan {
                    name: caps[1].to_string(),
                    line: idx as u32 + 1,
                    complexity: 1,
                });
                continue;
            }
            if let Some(span) = spans.last_mut() {
                span.complexity += self.branch_pattern.find_iter(line).count() as u32;
            }
        }
        spans
    }

    fn survey_package(&self, name: &str, dir: &Path) -> Summary {
        let mut summary = Summary::new(name);
        for file in rust_files(dir) {
            let Ok(content) = std::fs::read_to_string(&file) else {
                continue;
            };
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            for span in self.scan_file(&content) {
                summary.accumulate(f64::from(span.complexity));
                if span.complexity > self.threshold {
                    summary.push(Issue::new(
                        span.line,
                        format!(
                            "{file_name}: function `{}` has estimated cyclomatic complexity {}",
                            span.name, span.complexity
                        ),
                    ));
                }
            }
        }
        summary.description = format!("average complexity {:.1}", summary.average());
        summary
    }
}

impl Default for CyclomaticComplexityStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for CyclomaticComplexityStrategy {
    fn compute(&self, params: &StrategyParameter, progress: &ProgressMeter) -> Summaries {
        compute_units(&params.all_dirs, progress, |name, dir| {
            self.survey_package(name, dir)
        })
    }

    fn percentage(&self, summaries: &SummaryMap) -> f64 {
        let issues: usize = summaries.values().map(|s| s.issues.len()).sum();
        percentage_from_issue_count(issues)
    }

    fn name(&self) -> &'static str {
        "Cyclomatic"
    }

    fn description(&self) -> &'static str {
        "Functions whose estimated cyclomatic complexity exceeds the threshold"
    }

    fn weight(&self) -> f64 {
        self.weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_attributes_branches_to_functions() {
        let strategy = CyclomaticComplexityStrategy::new();
        let src = "\
fn simple() -> u32 {
    1
}

pub fn busy(n: u32) -> u32 {
    if n > 1 {
        for i in 0..n {
            if i % 2 == 0 {
                // if this comment mentioned a branch it would not count
                continue;
            }
        }
    }
    match n {
        0 => 0,
        _ => n,
    }
}
";
        let spans = strategy.scan_file(src);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, "simple");
        assert_eq!(spans[0].complexity, 1);
        assert_eq!(spans[1].name, "busy");
        // if + for + if + match = 4 branches on top of the base 1
        assert_eq!(spans[1].complexity, 5);
    }

    #[test]
    fn test_threshold_flags_only_outliers() {
        let strategy = CyclomaticComplexityStrategy::new().with_threshold(2);
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            tmp.path().join("lib.rs"),
            "fn tame() { }\nfn wild(n: u32) {\n    if n > 0 { }\n    if n > 1 { }\n    if n > 2 { }\n}\n",
        )
        .expect("write");

        let summary = strategy.survey_package("pkg", tmp.path());
        assert_eq!(summary.issues.len(), 1);
        assert!(summary.issues[0].message.contains("wild"));
        assert_eq!(summary.issues[0].line, 2);
    }

    #[test]
    fn test_percentage_uses_issue_curve() {
        let strategy = CyclomaticComplexityStrategy::new();
        let mut map = SummaryMap::new();
        let mut s = Summary::new("pkg");
        for i in 0..3 {
            s.push(Issue::new(i, "too complex"));
        }
        map.insert("pkg".into(), s);
        assert_eq!(strategy.percentage(&map), 94.0);
        assert_eq!(strategy.percentage(&SummaryMap::new()), 100.0);
    }
}
