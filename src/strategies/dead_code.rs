//! Dead-code strategy
//!
//! Flags private functions that are defined in a package but never
//! referenced anywhere else in that package. Visibility keeps the check
//! honest: `pub` items may have callers in other packages or downstream
//! crates, so only private `fn`s are candidates.

use crate::discover::{rust_files, StrategyParameter};
use crate::models::{Issue, Summaries, Summary, SummaryMap};
use crate::scoring::percentage_from_issue_count;
use crate::strategies::base::{compute_units, Strategy};
use crate::sync::ProgressMeter;
use regex::Regex;
use std::path::Path;

pub struct DeadCodeStrategy {
    weight: f64,
    private_fn: Regex,
    word: Regex,
}

struct Definition {
    name: String,
    file: String,
    line: u32,
}

impl DeadCodeStrategy {
    pub fn new() -> Self {
        Self {
            weight: 0.15,
            private_fn: Regex::new(r"^\s*(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+([A-Za-z_][A-Za-z0-9_]*)")
                .expect("hard-coded pattern compiles"),
            word: Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("hard-coded pattern compiles"),
        }
    }

    /// Names that are entry points or conventionally unreferenced.
    fn is_exempt(name: &str) -> bool {
        name == "main" || name.starts_with('_')
    }

    fn survey_package(&self, name: &str, dir: &Path) -> Summary {
        let mut summary = Summary::new(name);

        let contents: Vec<(String, String)> = rust_files(dir)
            .iter()
            .filter_map(|path| {
                let file = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())?;
                let content = std::fs::read_to_string(path).ok()?;
                Some((file, content))
            })
            .collect();

        let mut definitions: Vec<Definition> = Vec::new();
        for (file, content) in &contents {
            let mut in_test_module = false;
            for (idx, line) in content.lines().enumerate() {
                if line.contains("#[cfg(test)]") {
                    in_test_module = true;
                }
                if in_test_module {
                    continue;
                }
                if let Some(caps) = self.private_fn.captures(line) {
                    let fn_name = caps[1].to_string();
                    if !Self::is_exempt(&fn_name) {
                        definitions.push(Definition {
                            name: fn_name,
                            file: file.clone(),
                            line: idx as u32 + 1,
                        });
                    }
                }
            }
        }

        for def in &definitions {
            let mut referenced = false;
            'files: for (file, content) in &contents {
                for (idx, line) in content.lines().enumerate() {
                    // The definition line itself does not count as a use.
                    if *file == def.file && idx as u32 + 1 == def.line {
                        continue;
                    }
                    if self
                        .word
                        .find_iter(line)
                        .any(|m| m.as_str() == def.name)
                    {
                        referenced = true;
                        break 'files;
                    }
                }
            }
            if !referenced {
                summary.push(Issue::new(
                    def.line,
                    format!("{}: function `{}` appears unused", def.file, def.name),
                ));
            }
        }

        summary.description = format!("{} unreferenced private functions", summary.issues.len());
        summary
    }
}

impl Default for DeadCodeStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for DeadCodeStrategy {
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
        "DeadCode"
    }

    fn description(&self) -> &'static str {
        "Private functions never referenced in their package"
    }

    fn weight(&self) -> f64 {
        self.weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_unreferenced_private_fn_is_flagged() {
        let strategy = DeadCodeStrategy::new();
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(
            tmp.path().join("lib.rs"),
            "fn used() -> u32 { 1 }\nfn orphan() -> u32 { 2 }\npub fn api() -> u32 { used() }\n",
        )
        .expect("write");

        let summary = strategy.survey_package("pkg", tmp.path());
        assert_eq!(summary.issues.len(), 1);
        assert!(summary.issues[0].message.contains("orphan"));
        assert_eq!(summary.issues[0].line, 2);
    }

    #[test]
    fn test_pub_main_and_underscore_are_exempt() {
        let strategy = DeadCodeStrategy::new();
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(
            tmp.path().join("main.rs"),
            "fn main() {}\nfn _scratch() {}\npub fn exported() {}\n",
        )
        .expect("write");

        let summary = strategy.survey_package("pkg", tmp.path());
        assert!(summary.issues.is_empty());
    }

    #[test]
    fn test_cross_file_reference_counts() {
        let strategy = DeadCodeStrategy::new();
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(tmp.path().join("a.rs"), "fn helper() -> u32 { 7 }\n").expect("write");
        fs::write(tmp.path().join("b.rs"), "pub fn go() -> u32 { super::helper() }\n")
            .expect("write");

        let summary = strategy.survey_package("pkg", tmp.path());
        assert!(summary.issues.is_empty());
    }
}
