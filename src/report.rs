//! Reporter: run loop, aggregation, and scoring
//!
//! The reporter owns the registered strategy list, the aggregate metric
//! map, and the run-wide synchronizer. A run walks a fixed state machine:
//!
//! ```text
//! Idle -> Discovering -> Running(1..=N) -> Scoring -> Rendered -> Closed
//! ```
//!
//! Strategies execute in registration order, one at a time; each strategy
//! parallelizes its own sub-tasks internally. Serializing the top level
//! keeps progress/finished consumption order predictable and bounds
//! contention on the aggregation lock, while per-strategy fan-out still
//! saturates the machine. Discovery failure is the only fatal path; a
//! failing strategy degrades to an empty metric and the run continues.

use crate::discover::{discover, DiscoveryError, StrategyParameter};
use crate::models::{Metric, Report};
use crate::reporters::{self, OutputFormat};
use crate::scoring::{grade_from_score, weighted_score};
use crate::strategies::{panic_message, Strategy};
use crate::sync::{split_budget, Synchronizer, TOTAL_PROGRESS_UNITS};
use chrono::Local;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tracing::{error, info};

/// Where the reporter currently is in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Discovering,
    /// 1-based index of the strategy currently executing.
    Running(usize),
    Scoring,
    Rendered,
    Closed,
}

/// Orchestrates strategy execution and owns the aggregate result.
pub struct Reporter {
    project: String,
    strategies: Vec<Arc<dyn Strategy>>,
    /// Aggregate metric map; the write lock is held only to install one
    /// completed metric at a time.
    metrics: RwLock<BTreeMap<String, Metric>>,
    sync: Synchronizer,
    phase: RunPhase,
}

impl Reporter {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            strategies: Vec::new(),
            metrics: RwLock::new(BTreeMap::new()),
            sync: Synchronizer::new(),
            phase: RunPhase::Idle,
        }
    }

    /// Register a strategy. Execution order is registration order; the
    /// strategy's weight is fixed from here on.
    pub fn register(&mut self, strategy: Arc<dyn Strategy>) {
        self.strategies.push(strategy);
    }

    pub fn register_all(&mut self, strategies: impl IntoIterator<Item = Arc<dyn Strategy>>) {
        for strategy in strategies {
            self.register(strategy);
        }
    }

    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Access to the synchronizer, for wiring up a progress consumer
    /// before the run starts.
    pub fn synchronizer(&self) -> &Synchronizer {
        &self.sync
    }

    /// Execute the full run: discovery, every registered strategy in
    /// order, then scoring. Returns the frozen aggregate.
    pub fn run(
        &mut self,
        project_path: &std::path::Path,
        except: &str,
    ) -> Result<Report, DiscoveryError> {
        self.phase = RunPhase::Discovering;
        let params = discover(project_path, except)?;
        info!(
            "analyzing {} packages in {:?}",
            params.all_dirs.len(),
            params.project_path
        );

        let budgets = split_budget(TOTAL_PROGRESS_UNITS, self.strategies.len());
        let strategies = self.strategies.clone();
        for (i, strategy) in strategies.iter().enumerate() {
            self.phase = RunPhase::Running(i + 1);
            let start = Instant::now();
            let metric = self.execute_strategy(strategy.as_ref(), &params, budgets[i]);
            self.install_metric(metric);
            self.sync.notify_finished(format!(
                "{} finished in {:.2}s",
                strategy.name(),
                start.elapsed().as_secs_f64()
            ));
        }

        self.phase = RunPhase::Scoring;
        Ok(self.freeze())
    }

    /// Run one strategy to completion and shape its metric.
    ///
    /// The compute/percentage pair runs under `catch_unwind`: a strategy
    /// that escapes its own sub-task guard still only costs its own
    /// metric, never the run. The meter is flushed here, after the
    /// strategy returns, so budget conservation does not depend on
    /// strategy discipline.
    fn execute_strategy(
        &self,
        strategy: &dyn Strategy,
        params: &StrategyParameter,
        budget: u32,
    ) -> Metric {
        let meter = self.sync.meter(budget);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let summaries = strategy.compute(params, &meter).into_map();
            let percentage = strategy.percentage(&summaries);
            (summaries, percentage)
        }));
        meter.flush();

        match outcome {
            Ok((summaries, percentage)) => Metric {
                name: strategy.name().to_string(),
                description: strategy.description().to_string(),
                summaries,
                weight: strategy.weight(),
                percentage: percentage.clamp(0.0, 100.0),
                error: None,
            },
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("strategy {} panicked: {message}", strategy.name());
                Metric {
                    name: strategy.name().to_string(),
                    description: strategy.description().to_string(),
                    summaries: BTreeMap::new(),
                    weight: strategy.weight(),
                    percentage: 0.0,
                    error: Some(message),
                }
            }
        }
    }

    /// Atomically install one completed metric into the aggregate map.
    fn install_metric(&self, metric: Metric) {
        let mut metrics = self
            .metrics
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        metrics.insert(metric.name.clone(), metric);
    }

    /// Compute the final score and freeze the aggregate.
    fn freeze(&self) -> Report {
        let metrics = self
            .metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let score = weighted_score(metrics.values());
        let issues = metrics.values().map(|m| m.summaries.len()).sum();

        Report {
            project: self.project.clone(),
            score: score as i64,
            grade: grade_from_score(score),
            metrics: metrics.clone(),
            issues,
            time_stamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Hand the frozen aggregate to the renderer for the chosen format.
    pub fn render(&mut self, report: &Report, format: OutputFormat) -> anyhow::Result<String> {
        let rendered = reporters::render(report, format)?;
        self.phase = RunPhase::Rendered;
        Ok(rendered)
    }

    /// Release the synchronizer's channels; no further progress or
    /// finished messages are accepted, and the consumer loop unblocks.
    pub fn close(mut self) {
        self.phase = RunPhase::Closed;
        // Dropping self drops the synchronizer and with it the only
        // senders, which disconnects both channels.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::StrategyParameter;
    use crate::models::{Issue, Summaries, Summary, SummaryMap};
    use crate::sync::ProgressMeter;
    use std::fs;

    struct FixedStrategy {
        name: &'static str,
        weight: f64,
        percentage: f64,
        units: usize,
        panic_in_compute: bool,
    }

    impl FixedStrategy {
        fn new(name: &'static str, weight: f64, percentage: f64, units: usize) -> Self {
            Self {
                name,
                weight,
                percentage,
                units,
                panic_in_compute: false,
            }
        }
    }

    impl Strategy for FixedStrategy {
        fn compute(&self, _params: &StrategyParameter, progress: &ProgressMeter) -> Summaries {
            if self.panic_in_compute {
                panic!("synthetic failure");
            }
            progress.expect(self.units);
            let summaries = Summaries::new();
            for i in 0..self.units {
                let mut s = Summary::new(format!("unit{i}"));
                s.push(Issue::new(1, "finding"));
                summaries.insert(s);
                progress.tick();
            }
            summaries
        }

        fn percentage(&self, _summaries: &SummaryMap) -> f64 {
            self.percentage
        }

        fn name(&self) -> &'static str {
            self.name
        }

        fn description(&self) -> &'static str {
            "fixed strategy for tests"
        }

        fn weight(&self) -> f64 {
            self.weight
        }
    }

    fn project_fixture() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(tmp.path().join("lib.rs"), "pub fn f() {}\n").expect("write");
        tmp
    }

    #[test]
    fn test_weighted_scenario_scores_78() {
        let tmp = project_fixture();
        let mut reporter = Reporter::new("demo");
        reporter.register(Arc::new(FixedStrategy::new("A", 0.5, 80.0, 1)));
        reporter.register(Arc::new(FixedStrategy::new("B", 0.3, 60.0, 1)));
        reporter.register(Arc::new(FixedStrategy::new("C", 0.2, 100.0, 1)));

        let report = reporter.run(tmp.path(), "").expect("run");
        assert_eq!(report.score, 78);
        assert_eq!(report.metrics.len(), 3);
        assert_eq!(report.grade, 4);
        reporter.close();
    }

    #[test]
    fn test_progress_sums_to_total_across_run() {
        let tmp = project_fixture();
        let mut reporter = Reporter::new("demo");
        reporter.register(Arc::new(FixedStrategy::new("A", 0.5, 80.0, 3)));
        reporter.register(Arc::new(FixedStrategy::new("B", 0.3, 60.0, 0)));
        reporter.register(Arc::new(FixedStrategy::new("C", 0.2, 100.0, 7)));

        let progress = reporter.synchronizer().progress_receiver();
        let finished = reporter.synchronizer().finished_receiver();
        let drained = std::thread::spawn(move || {
            let total: u32 = progress.iter().sum();
            let messages: Vec<String> = finished.iter().collect();
            (total, messages)
        });

        let report = reporter.run(tmp.path(), "").expect("run");
        assert_eq!(report.metrics.len(), 3);
        reporter.close();

        let (total, messages) = drained.join().expect("consumer");
        assert_eq!(total, TOTAL_PROGRESS_UNITS);
        assert_eq!(messages.len(), 3);
        assert!(messages[0].starts_with("A finished in"));
        assert!(messages[2].starts_with("C finished in"));
    }

    #[test]
    fn test_empty_compute_still_yields_metric() {
        let tmp = project_fixture();
        let mut reporter = Reporter::new("demo");
        reporter.register(Arc::new(FixedStrategy::new("Empty", 0.4, 90.0, 0)));

        let report = reporter.run(tmp.path(), "").expect("run");
        let metric = &report.metrics["Empty"];
        assert!(metric.summaries.is_empty());
        assert_eq!(metric.percentage, 90.0);
        assert_eq!(report.score, 36);
        reporter.close();
    }

    #[test]
    fn test_panicking_strategy_degrades_not_fatal() {
        let tmp = project_fixture();
        let mut reporter = Reporter::new("demo");
        let mut broken = FixedStrategy::new("Broken", 0.5, 80.0, 1);
        broken.panic_in_compute = true;
        reporter.register(Arc::new(broken));
        reporter.register(Arc::new(FixedStrategy::new("Healthy", 0.5, 100.0, 2)));

        let report = reporter.run(tmp.path(), "").expect("run");
        assert_eq!(report.metrics.len(), 2);
        let broken = &report.metrics["Broken"];
        assert_eq!(broken.percentage, 0.0);
        assert!(broken.error.as_deref().is_some_and(|e| e.contains("synthetic")));
        assert_eq!(report.score, 50);
        reporter.close();
    }

    #[test]
    fn test_discovery_failure_is_fatal() {
        let mut reporter = Reporter::new("demo");
        reporter.register(Arc::new(FixedStrategy::new("A", 0.5, 80.0, 1)));
        let err = reporter
            .run(std::path::Path::new("/definitely/not/here"), "")
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingRoot(_)));
        // Nothing ran, nothing was installed.
        assert_eq!(reporter.phase(), RunPhase::Discovering);
    }

    #[test]
    fn test_issue_count_sums_summary_entries() {
        let tmp = project_fixture();
        let mut reporter = Reporter::new("demo");
        reporter.register(Arc::new(FixedStrategy::new("A", 0.0, 100.0, 4)));
        reporter.register(Arc::new(FixedStrategy::new("B", 0.0, 100.0, 2)));
        reporter.register(Arc::new(FixedStrategy::new("C", 0.0, 100.0, 0)));

        let report = reporter.run(tmp.path(), "").expect("run");
        assert_eq!(report.issues, 6);
        reporter.close();
    }

    #[test]
    fn test_report_serde_round_trip() {
        let tmp = project_fixture();
        let mut reporter = Reporter::new("roundtrip");
        reporter.register(Arc::new(FixedStrategy::new("A", 0.5, 80.0, 2)));
        reporter.register(Arc::new(FixedStrategy::new("B", 0.3, 61.5, 1)));

        let report = reporter.run(tmp.path(), "").expect("run");
        reporter.close();

        let json = serde_json::to_string(&report).expect("serialize");
        let decoded: Report = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded.project, report.project);
        assert_eq!(decoded.score, report.score);
        assert_eq!(
            decoded.metrics.keys().collect::<Vec<_>>(),
            report.metrics.keys().collect::<Vec<_>>()
        );
        for (key, metric) in &report.metrics {
            let d = &decoded.metrics[key];
            assert!((d.weight - metric.weight).abs() < 1e-6);
            assert!((d.percentage - metric.percentage).abs() < 1e-6);
        }
    }
}
