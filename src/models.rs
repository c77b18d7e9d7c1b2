//! Core data models for Appraise
//!
//! These models are used throughout the codebase for representing
//! analyzer findings, per-package summaries, and the aggregate report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// One located finding produced by a strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// 1-based line number; 0 when the finding has no specific location
    pub line: u32,
    pub message: String,
}

impl Issue {
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// The result record for one analysis unit (typically one source package).
///
/// `description` is free-form; the dependency-graph strategy stores a
/// serialized sub-record there. `sum`/`count` are running accumulators some
/// strategies fill in during compute and read back in `percentage`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default, skip_serializing_if = "f64_is_zero")]
    pub sum: f64,
    #[serde(default, skip_serializing_if = "u64_is_zero")]
    pub count: u64,
}

fn f64_is_zero(v: &f64) -> bool {
    *v == 0.0
}

fn u64_is_zero(v: &u64) -> bool {
    *v == 0
}

impl Summary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    /// Feed one observation into the running accumulators.
    pub fn accumulate(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Frozen form of a strategy's results: unit name -> Summary.
pub type SummaryMap = BTreeMap<String, Summary>;

/// Mutable, lock-protected mapping from unit name to [`Summary`], owned by
/// one strategy invocation during `compute`.
///
/// Concurrent sub-tasks insert or update entries under the lock; the
/// container is frozen into a plain [`SummaryMap`] when `compute` returns.
/// Deliberately not `Clone`: the lock-bearing container is only ever shared
/// by reference, never copied.
#[derive(Debug, Default)]
pub struct Summaries {
    inner: Mutex<SummaryMap>,
}

impl Summaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a completed summary under its own name.
    pub fn insert(&self, summary: Summary) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.insert(summary.name.clone(), summary);
    }

    /// Update (or create) the entry for `name` in place.
    pub fn update<F>(&self, name: &str, f: F)
    where
        F: FnOnce(&mut Summary),
    {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = map
            .entry(name.to_string())
            .or_insert_with(|| Summary::new(name));
        f(entry);
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freeze the container, handing off the accumulated map.
    pub fn into_map(self) -> SummaryMap {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<SummaryMap> for Summaries {
    fn from(map: SummaryMap) -> Self {
        Self {
            inner: Mutex::new(map),
        }
    }
}

/// One completed strategy's contribution to the aggregate report.
///
/// Created once per run, written once by the reporter after the strategy
/// completes, read-only thereafter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub summaries: SummaryMap,
    pub weight: f64,
    pub percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Metric {
    /// Total number of issues across all summaries.
    pub fn issue_count(&self) -> usize {
        self.summaries.values().map(|s| s.issues.len()).sum()
    }
}

/// The frozen aggregate handed to a renderer after a complete run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub project: String,
    pub score: i64,
    pub grade: u8,
    pub metrics: BTreeMap<String, Metric>,
    pub issues: usize,
    pub time_stamp: String,
}

impl Report {
    /// Letter form of the numeric grade.
    pub fn grade_letter(&self) -> &'static str {
        crate::scoring::grade_letter(self.grade)
    }
}
