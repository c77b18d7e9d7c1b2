//! Progress rendering
//!
//! An independent consumer loop that drains the synchronizer's progress and
//! finished channels into an indicatif status bar. The loop runs on its own
//! thread so rendering never blocks analysis beyond the channels' bounded
//! capacities, and it exits when both channels disconnect (the reporter
//! dropping the synchronizer is the close signal).

use crossbeam_channel::{never, select, Receiver};
use indicatif::{ProgressBar, ProgressStyle};
use std::thread::{self, JoinHandle};

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

/// Handle to the consumer thread.
pub struct ProgressConsumer {
    handle: JoinHandle<()>,
}

impl ProgressConsumer {
    /// Spawn the consumer loop over the two channel receivers.
    ///
    /// `total` is the number of progress units expected over the run
    /// (conventionally [`crate::sync::TOTAL_PROGRESS_UNITS`]).
    pub fn spawn(progress: Receiver<u32>, finished: Receiver<String>, total: u32) -> Self {
        let handle = thread::spawn(move || consume(progress, finished, total));
        Self { handle }
    }

    /// Wait for the loop to drain both channels and finish the bar.
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

fn consume(progress: Receiver<u32>, finished: Receiver<String>, total: u32) {
    let bar = ProgressBar::new(u64::from(total));
    bar.set_style(bar_style());

    let mut progress = progress;
    let mut finished = finished;
    let mut progress_open = true;
    let mut finished_open = true;

    while progress_open || finished_open {
        select! {
            recv(progress) -> unit => match unit {
                Ok(unit) => bar.inc(u64::from(unit)),
                Err(_) => {
                    progress_open = false;
                    progress = never();
                }
            },
            recv(finished) -> message => match message {
                Ok(message) => {
                    bar.set_message(message.clone());
                    bar.println(format!("  {message}"));
                }
                Err(_) => {
                    finished_open = false;
                    finished = never();
                }
            },
        }
    }

    bar.finish_and_clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::Synchronizer;

    #[test]
    fn test_consumer_drains_and_exits() {
        let sync = Synchronizer::new();
        let consumer =
            ProgressConsumer::spawn(sync.progress_receiver(), sync.finished_receiver(), 100);

        let meter = sync.meter(100);
        meter.expect(4);
        for _ in 0..4 {
            meter.tick();
        }
        meter.flush();
        sync.notify_finished("Complexity finished in 0.01s".to_string());

        drop(meter);
        drop(sync);
        // Join returns only once both channels disconnected; hanging here
        // would fail the test by timeout.
        consumer.join();
    }

    #[test]
    fn test_consumer_survives_more_units_than_capacity() {
        let sync = Synchronizer::new();
        let consumer =
            ProgressConsumer::spawn(sync.progress_receiver(), sync.finished_receiver(), 100);

        // 100 one-unit sends exceed the channel capacity; the consumer must
        // keep the producer unblocked.
        let meter = sync.meter(100);
        meter.expect(200);
        for _ in 0..200 {
            meter.tick();
        }
        meter.flush();

        drop(meter);
        drop(sync);
        consumer.join();
    }
}
