//! Run-wide coordination: progress and finished-signal channels
//!
//! One [`Synchronizer`] exists per run. It owns two bounded channels:
//!
//! - **progress**: integer progress units whose sum over a complete run is
//!   exactly [`TOTAL_PROGRESS_UNITS`]
//! - **finished**: human-readable "strategy X finished in Ys" messages,
//!   decoupled from progress so logging never blocks rendering
//!
//! Bounded capacities are the only flow control: a slow consumer
//! back-pressures analysis through the channel, never through a lock.
//!
//! Each strategy execution gets a [`ProgressMeter`] carved out of the total:
//! sub-tasks call `tick()` as they complete, and the reporter calls
//! `flush()` afterwards so the **budget-conservation invariant** holds
//! exactly - the units sent on behalf of one strategy always sum to its
//! allocated budget, no matter how many sub-tasks ran or how the integer
//! division rounded.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::{Mutex, PoisonError};

/// Fixed total of progress units emitted over one complete run.
pub const TOTAL_PROGRESS_UNITS: u32 = 100;

/// Progress channel capacity.
const PROGRESS_CAPACITY: usize = 64;

/// Finished-signal channel capacity.
const FINISHED_CAPACITY: usize = 16;

/// Shared coordination object for one run.
///
/// Holds the send side of both channels; consumers clone the receivers via
/// [`Synchronizer::progress_receiver`] / [`Synchronizer::finished_receiver`].
/// Dropping the synchronizer closes both channels, which is how the
/// consumer loop learns the run is over.
#[derive(Debug)]
pub struct Synchronizer {
    progress_tx: Sender<u32>,
    progress_rx: Receiver<u32>,
    finished_tx: Sender<String>,
    finished_rx: Receiver<String>,
}

impl Synchronizer {
    pub fn new() -> Self {
        let (progress_tx, progress_rx) = bounded(PROGRESS_CAPACITY);
        let (finished_tx, finished_rx) = bounded(FINISHED_CAPACITY);
        Self {
            progress_tx,
            progress_rx,
            finished_tx,
            finished_rx,
        }
    }

    /// Carve a progress budget out of the run total for one strategy
    /// execution.
    pub fn meter(&self, budget: u32) -> ProgressMeter {
        ProgressMeter::new(self.progress_tx.clone(), budget)
    }

    /// Emit a completion message. Blocks only on channel capacity; a
    /// vanished consumer is ignored.
    pub fn notify_finished(&self, message: String) {
        let _ = self.finished_tx.send(message);
    }

    pub fn progress_receiver(&self) -> Receiver<u32> {
        self.progress_rx.clone()
    }

    pub fn finished_receiver(&self) -> Receiver<String> {
        self.finished_rx.clone()
    }
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Split the run total into per-strategy budgets: an equal share each, with
/// the remainder spread over the earliest registrations. The returned
/// budgets always sum to `total`.
pub fn split_budget(total: u32, strategies: usize) -> Vec<u32> {
    if strategies == 0 {
        return Vec::new();
    }
    let n = strategies as u32;
    let share = total / n;
    let remainder = total % n;
    (0..n)
        .map(|i| if i < remainder { share + 1 } else { share })
        .collect()
}

struct MeterState {
    budget_left: u32,
    tasks_left: u32,
}

/// One strategy execution's slice of the progress budget.
///
/// The meter is shared by reference across that strategy's sub-tasks; the
/// interior mutex covers only the unit arithmetic, and the channel send
/// happens outside it so a slow consumer serializes progress reporting, not
/// summary insertion.
pub struct ProgressMeter {
    tx: Sender<u32>,
    budget: u32,
    state: Mutex<MeterState>,
}

impl ProgressMeter {
    fn new(tx: Sender<u32>, budget: u32) -> Self {
        Self {
            tx,
            budget,
            state: Mutex::new(MeterState {
                budget_left: budget,
                tasks_left: 0,
            }),
        }
    }

    /// Allocated budget for this execution.
    pub fn budget(&self) -> u32 {
        self.budget
    }

    /// Declare how many sub-tasks will tick. Called once, before fan-out.
    pub fn expect(&self, tasks: usize) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.tasks_left = tasks.min(u32::MAX as usize) as u32;
    }

    /// Record one completed sub-task: sends
    /// `max(1, budget_left / tasks_left)` units, capped at the remaining
    /// budget.
    pub fn tick(&self) {
        let unit = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let unit = (state.budget_left / state.tasks_left.max(1))
                .max(1)
                .min(state.budget_left);
            state.budget_left -= unit;
            state.tasks_left = state.tasks_left.saturating_sub(1);
            unit
        };
        if unit > 0 {
            let _ = self.tx.send(unit);
        }
    }

    /// Emit whatever budget integer rounding left behind. With zero
    /// sub-tasks this sends the whole budget in one shot.
    pub fn flush(&self) {
        let leftover = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut state.budget_left)
        };
        if leftover > 0 {
            let _ = self.tx.send(leftover);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive a meter through `tasks` ticks plus a flush and return the sum
    /// of units observed on the channel.
    fn drain_budget(budget: u32, tasks: usize) -> u32 {
        let sync = Synchronizer::new();
        let rx = sync.progress_receiver();
        let meter = sync.meter(budget);
        meter.expect(tasks);

        // Consume concurrently so bounded capacity never deadlocks the test.
        let consumer = std::thread::spawn(move || {
            let mut total = 0u32;
            for unit in rx {
                assert!(unit > 0, "zero-size progress unit");
                total += unit;
            }
            total
        });

        std::thread::scope(|scope| {
            for _ in 0..tasks {
                scope.spawn(|| meter.tick());
            }
        });
        meter.flush();
        drop(meter);
        drop(sync);

        consumer.join().expect("consumer panicked")
    }

    #[test]
    fn test_budget_conserved_exactly() {
        for (budget, tasks) in [
            (100u32, 0usize),
            (100, 1),
            (100, 7),
            (14, 14),
            (14, 100), // more tasks than units
            (33, 5),
            (1, 3),
        ] {
            assert_eq!(
                drain_budget(budget, tasks),
                budget,
                "budget {budget} with {tasks} tasks"
            );
        }
    }

    #[test]
    fn test_zero_tasks_flushes_in_one_shot() {
        let sync = Synchronizer::new();
        let rx = sync.progress_receiver();
        let meter = sync.meter(25);
        meter.expect(0);
        meter.flush();
        assert_eq!(rx.try_recv().ok(), Some(25));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_split_budget_sums_to_total() {
        for n in 1..=20 {
            let budgets = split_budget(TOTAL_PROGRESS_UNITS, n);
            assert_eq!(budgets.len(), n);
            assert_eq!(budgets.iter().sum::<u32>(), TOTAL_PROGRESS_UNITS);
            // Equal split: shares differ by at most one unit.
            let max = budgets.iter().max().unwrap_or(&0);
            let min = budgets.iter().min().unwrap_or(&0);
            assert!(max - min <= 1);
        }
        assert!(split_budget(TOTAL_PROGRESS_UNITS, 0).is_empty());
    }

    #[test]
    fn test_finished_channel_decoupled() {
        let sync = Synchronizer::new();
        let finished = sync.finished_receiver();
        sync.notify_finished("UnitTest finished in 1.20s".to_string());
        assert_eq!(
            finished.try_recv().ok().as_deref(),
            Some("UnitTest finished in 1.20s")
        );
        // Nothing leaked onto the progress channel.
        assert!(sync.progress_receiver().try_recv().is_err());
    }
}
