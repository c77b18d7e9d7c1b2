//! Duplicate-code strategy
//!
//! Windowed-hash duplicate detection within each package: normalized
//! non-blank, non-comment lines are hashed in fixed-size sliding windows,
//! and a window whose hash was already seen becomes a finding pointing at
//! the first occurrence. Runs of consecutive matching windows collapse
//! into one finding.

use crate::discover::{rust_files, StrategyParameter};
use crate::models::{Issue, Summaries, Summary, SummaryMap};
use crate::scoring::percentage_from_issue_count;
use crate::strategies::base::{compute_units, Strategy};
use crate::sync::ProgressMeter;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Number of normalized lines per comparison window.
const WINDOW: usize = 8;

pub struct DuplicateCodeStrategy {
    weight: f64,
    window: usize,
}

/// One normalized line with its origin.
struct CodeLine<'a> {
    file: &'a str,
    line: u32,
    text: String,
}

impl DuplicateCodeStrategy {
    pub fn new() -> Self {
        Self {
            weight: 0.15,
            window: WINDOW,
        }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(2);
        self
    }

    fn normalized_lines<'a>(file: &'a str, content: &str, out: &mut Vec<CodeLine<'a>>) {
        for (idx, raw) in content.lines().enumerate() {
            let text = raw.trim();
            if text.is_empty() || text.starts_with("//") || text == "}" || text == "{" {
                continue;
            }
            out.push(CodeLine {
                file,
                line: idx as u32 + 1,
                text: text.to_string(),
            });
        }
    }

    fn window_hash(lines: &[CodeLine<'_>]) -> u64 {
        let mut hasher = rustc_hash::FxHasher::default();
        for line in lines {
            line.text.hash(&mut hasher);
        }
        hasher.finish()
    }

    fn survey_package(&self, name: &str, dir: &Path) -> Summary {
        let mut summary = Summary::new(name);

        let files = rust_files(dir);
        let contents: Vec<(String, String)> = files
            .iter()
            .filter_map(|path| {
                let file = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())?;
                let content = std::fs::read_to_string(path).ok()?;
                Some((file, content))
            })
            .collect();

        // Per-file line streams; windows never straddle file boundaries.
        let mut seen: FxHashMap<u64, (String, u32)> = FxHashMap::default();
        for (file, content) in &contents {
            let mut lines = Vec::new();
            Self::normalized_lines(file, content, &mut lines);
            if lines.len() < self.window {
                continue;
            }

            let mut last_match_end = 0usize;
            for start in 0..=(lines.len() - self.window) {
                let slice = &lines[start..start + self.window];
                let hash = Self::window_hash(slice);
                match seen.entry(hash) {
                    Entry::Occupied(entry) => {
                        let (first_file, first_line) = entry.get();
                        // Collapse runs of overlapping matches.
                        if start >= last_match_end {
                            summary.push(Issue::new(
                                slice[0].line,
                                format!(
                                    "{file}: {}-line block duplicates {first_file}:{first_line}",
                                    self.window
                                ),
                            ));
                        }
                        last_match_end = start + self.window;
                    }
                    Entry::Vacant(entry) => {
                        entry.insert((slice[0].file.to_string(), slice[0].line));
                    }
                }
            }
        }

        summary.description = format!("{} duplicated blocks", summary.issues.len());
        summary
    }
}

impl Default for DuplicateCodeStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for DuplicateCodeStrategy {
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
        "DuplicateCode"
    }

    fn description(&self) -> &'static str {
        "Blocks of code repeated within a package"
    }

    fn weight(&self) -> f64 {
        self.weight
    }
}
