//! Base strategy trait and the per-unit fan-out helper
//!
//! A strategy is one pluggable analyzer. The contract is deliberately
//! small: `compute` produces lock-protected per-unit summaries, reporting
//! progress as it goes; `percentage` maps the frozen summaries onto 0-100;
//! the metadata methods are constant for the strategy's lifetime.

use crate::discover::StrategyParameter;
use crate::models::{Summaries, Summary, SummaryMap};
use crate::sync::ProgressMeter;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Trait for all analyzers.
///
/// Contract guarantees, relied on by implementations:
/// - `compute` is called at most once per run per instance
/// - `percentage` is called exactly once, after `compute`, on the frozen
///   form of the same summaries value
/// - the reporter flushes any leftover progress budget after `compute`
///   returns, so the meter's budget is conserved even if a strategy
///   under-reports
///
/// On an unrecoverable error for one unit, implementations degrade to an
/// empty summary for that unit rather than aborting the whole strategy.
pub trait Strategy: Send + Sync {
    /// Run the analysis over the shared parameter bundle, reporting
    /// progress proportional to real work done.
    fn compute(&self, params: &StrategyParameter, progress: &ProgressMeter) -> Summaries;

    /// Deterministic score in `[0, 100]` for the completed summaries.
    fn percentage(&self, summaries: &SummaryMap) -> f64;

    /// Unique identifier, used as the metric key in the aggregate report.
    fn name(&self) -> &'static str;

    /// Human-readable description of what this strategy measures.
    fn description(&self) -> &'static str;

    /// Contribution weight in `[0, 1]`; fixed at registration. Weight 0
    /// marks an informational strategy that appears in the report without
    /// affecting the score.
    fn weight(&self) -> f64;
}

/// Fan out one sub-task per unit and gather the summaries.
///
/// Each unit gets its own scoped thread; the join barrier at the end of the
/// scope guarantees every summary is in place before the container is
/// returned. Sub-task bodies run under `catch_unwind` so one panicking
/// analyzer degrades to an empty summary for that unit instead of taking
/// down the run. Sub-tasks only ever touch their own map entry, so the
/// container's lock is contended only for the insert itself.
pub fn compute_units<F>(
    units: &BTreeMap<String, PathBuf>,
    progress: &ProgressMeter,
    task: F,
) -> Summaries
where
    F: Fn(&str, &Path) -> Summary + Sync,
{
    let summaries = Summaries::new();
    progress.expect(units.len());

    std::thread::scope(|scope| {
        for (name, dir) in units {
            let summaries = &summaries;
            let task = &task;
            scope.spawn(move || {
                let summary = panic::catch_unwind(AssertUnwindSafe(|| task(name, dir)))
                    .unwrap_or_else(|payload| {
                        warn!(
                            "sub-task for unit {} panicked: {}",
                            name,
                            panic_message(payload.as_ref())
                        );
                        Summary::new(name.clone())
                    });
                summaries.insert(summary);
                progress.tick();
            });
        }
    });

    summaries
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
