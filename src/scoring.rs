//! Scoring system
//!
//! Turns per-strategy issue counts into percentages and folds completed
//! metrics into the final weighted score.
//!
//! # Scoring Formula
//!
//! ```text
//! Final score = Σ over all metrics of (metric.percentage × metric.weight)
//! ```
//!
//! Weights need not sum to 1: informational metrics carry weight 0 and
//! appear in the report without affecting the score.
//!
//! Most strategies map their issue count onto a percentage through a fixed
//! penalty-tiered curve: each tier boundary causes a deliberate downward
//! jump (n=9 -> 74, n=10 -> 70), so crossing into the next tier always
//! costs more than one extra issue within the current tier.

use crate::models::Metric;

/// Map an issue count onto a 0-100 percentage.
///
/// Piecewise-linear and monotonically non-increasing; 0 for any count of
/// 40 or more.
pub fn percentage_from_issue_count(n: usize) -> f64 {
    match n {
        0..=4 => 100.0 - 2.0 * n as f64,
        5..=9 => 90.0 - 4.0 * (n - 5) as f64,
        10..=19 => 70.0 - 5.0 * (n - 10) as f64,
        20..=39 => 20.0 - (n - 20) as f64,
        _ => 0.0,
    }
}

/// Weighted sum over completed metrics. Empty input scores 0.
pub fn weighted_score<'a, I>(metrics: I) -> f64
where
    I: IntoIterator<Item = &'a Metric>,
{
    metrics
        .into_iter()
        .map(|m| m.percentage * m.weight)
        .sum()
}

/// Numeric grade bands: 1 = A+ down to 6 = F.
pub fn grade_from_score(score: f64) -> u8 {
    match score {
        s if s >= 95.0 => 1,
        s if s >= 90.0 => 2,
        s if s >= 80.0 => 3,
        s if s >= 70.0 => 4,
        s if s >= 60.0 => 5,
        _ => 6,
    }
}

/// Letter form of a numeric grade.
pub fn grade_letter(grade: u8) -> &'static str {
    match grade {
        1 => "A+",
        2 => "A",
        3 => "B",
        4 => "C",
        5 => "D",
        _ => "F",
    }
}
