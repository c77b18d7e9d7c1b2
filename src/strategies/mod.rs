//! Pluggable analyzers ("strategies")
//!
//! Every analyzer implements the [`Strategy`] trait from `base` and is
//! registered on the reporter as a trait object; adding an analyzer means
//! implementing the trait and adding it to [`default_strategies`], never
//! touching the run loop.
//!
//! Two families exist:
//!
//! - heuristic strategies that scan source text themselves (unit tests,
//!   complexity, duplication, dead code, spelling, dependency graph)
//! - tool-wrapping strategies that shell out through `external` with a
//!   hard per-invocation timeout (formatting via rustfmt)

mod base;
mod complexity;
mod dead_code;
mod depgraph;
mod duplication;
mod external;
mod format;
mod spelling;

pub use base::{compute_units, panic_message, Strategy};
pub use complexity::CyclomaticComplexityStrategy;
pub use dead_code::DeadCodeStrategy;
pub use depgraph::DependencyGraphStrategy;
pub use duplication::DuplicateCodeStrategy;
pub use external::{run_tool, tool_available, ToolOutput};
pub use format::FormatStrategy;
pub use spelling::SpellCheckStrategy;
pub use unit_test::UnitTestStrategy;

use std::sync::Arc;
use std::time::Duration;

/// The standard strategy set, in registration (and therefore execution)
/// order. `disabled` filters by strategy name; `timeout_secs` applies to
/// tool-wrapping strategies.
pub fn default_strategies(disabled: &[String], timeout_secs: u64) -> Vec<Arc<dyn Strategy>> {
    let all: Vec<Arc<dyn Strategy>> = vec![
        Arc::new(UnitTestStrategy::new()),
        Arc::new(CyclomaticComplexityStrategy::new()),
        Arc::new(DuplicateCodeStrategy::new()),
        Arc::new(DeadCodeStrategy::new()),
        Arc::new(SpellCheckStrategy::new()),
        Arc::new(FormatStrategy::new().with_timeout(Duration::from_secs(timeout_secs))),
        Arc::new(DependencyGraphStrategy::new()),
    ];

    all.into_iter()
        .filter(|s| !disabled.iter().any(|d| d.eq_ignore_ascii_case(s.name())))
        .collect()
}
