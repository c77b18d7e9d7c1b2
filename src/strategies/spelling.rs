//! Spelling strategy
//!
//! Scans source lines for a fixed table of common misspellings, matched on
//! word boundaries and case-insensitively. The table covers the mistakes
//! that survive review most often in identifiers, comments, and doc text.

use crate::discover::{rust_files, StrategyParameter};
use crate::models::{Issue, Summaries, Summary, SummaryMap};
use crate::scoring::percentage_from_issue_count;
use crate::strategies::base::{compute_units, Strategy};
use crate::sync::ProgressMeter;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// (misspelling, correction)
const MISSPELLINGS: &[(&str, &str)] = &[
    ("recieve", "receive"),
    ("seperate", "separate"),
    ("occured", "occurred"),
    ("occurence", "occurrence"),
    ("definately", "definitely"),
    ("propogate", "propagate"),
    ("lenght", "length"),
    ("widht", "width"),
    ("heigth", "height"),
    ("verison", "version"),
    ("enviroment", "environment"),
    ("paramter", "parameter"),
    ("arguement", "argument"),
    ("dependancy", "dependency"),
    ("existance", "existence"),
    ("persistant", "persistent"),
    ("succesful", "successful"),
    ("transfered", "transferred"),
    ("retreive", "retrieve"),
    ("calender", "calendar"),
    ("compatability", "compatibility"),
    ("explicitely", "explicitly"),
    ("garantee", "guarantee"),
    ("recuring", "recurring"),
    ("teh", "the"),
];

pub struct SpellCheckStrategy {
    weight: f64,
    pattern: Regex,
    corrections: HashMap<&'static str, &'static str>,
}

impl SpellCheckStrategy {
    pub fn new() -> Self {
        let alternation = MISSPELLINGS
            .iter()
            .map(|(wrong, _)| *wrong)
            .collect::<Vec<_>>()
            .join("|");
        Self {
            weight: 0.1,
            pattern: Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
                .expect("hard-coded pattern compiles"),
            corrections: MISSPELLINGS.iter().copied().collect(),
        }
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
            for (idx, line) in content.lines().enumerate() {
                for found in self.pattern.find_iter(line) {
                    let word = found.as_str();
                    let key = word.to_ascii_lowercase();
                    let Some(correction) = self.corrections.get(key.as_str()) else {
                        continue;
                    };
                    summary.push(Issue::new(
                        idx as u32 + 1,
                        format!("{file_name}: `{word}` is a misspelling of `{correction}`"),
                    ));
                }
            }
        }
        summary.description = format!("{} misspellings", summary.issues.len());
        summary
    }
}

impl Default for SpellCheckStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for SpellCheckStrategy {
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
        "SpellCheck"
    }

    fn description(&self) -> &'static str {
        "Common misspellings in identifiers, comments, and strings"
    }

    fn weight(&self) -> f64 {
        self.weight
    }
}
