//! Test utilities for Gridlock development.
//!
//! [`Recorder`] turns asynchronous completions into something a test can
//! wait on with a timeout; [`fixtures`] builds the lattices the tests share.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

/// How long tests wait for a completion before declaring it lost.
pub const WAIT: Duration = Duration::from_secs(5);

/// How long tests wait to be confident nothing else is coming.
pub const QUIET: Duration = Duration::from_millis(50);

/// Collects labelled completion values in arrival order.
///
/// Each [`sink`](Recorder::sink) is a one-shot callback that forwards its
/// argument, tagged with a label, to the recorder's channel.
pub struct Recorder<T> {
    tx: Sender<(usize, T)>,
    rx: Receiver<(usize, T)>,
}

impl<T: Send + 'static> Recorder<T> {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    /// A callback that records its argument under `label`.
    pub fn sink(&self, label: usize) -> impl FnOnce(T) + Send + 'static {
        let tx = self.tx.clone();
        move |value| {
            // The recorder may already be gone at the end of a test.
            let _ = tx.send((label, value));
        }
    }

    /// Next recorded value, or `None` after `timeout`.
    pub fn next(&self, timeout: Duration) -> Option<(usize, T)> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Wait for exactly `n` values, panicking if they do not arrive in
    /// time.
    pub fn take(&self, n: usize) -> Vec<(usize, T)> {
        (0..n)
            .map(|i| {
                self.next(WAIT)
                    .unwrap_or_else(|| panic!("completion {i} of {n} not delivered within {WAIT:?}"))
            })
            .collect()
    }

    /// Labels of the next `n` values.
    pub fn labels(&self, n: usize) -> Vec<usize> {
        self.take(n).into_iter().map(|(label, _)| label).collect()
    }

    /// Whether nothing arrives within [`QUIET`].
    pub fn is_quiet(&self) -> bool {
        self.rx.recv_timeout(QUIET).is_err()
    }

    /// Values already recorded, without waiting.
    pub fn drain(&self) -> Vec<(usize, T)> {
        self.rx.try_iter().collect()
    }
}

impl<T: Send + 'static> Default for Recorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sinks_record_in_arrival_order() {
        let rec = Recorder::new();
        let a = rec.sink(1);
        let b = rec.sink(2);
        b("second-label-first");
        a("first-label-second");
        assert_eq!(rec.labels(2), vec![2, 1]);
        assert!(rec.is_quiet());
    }

    #[test]
    fn sink_outlives_recorder() {
        let rec = Recorder::<u8>::new();
        let s = rec.sink(0);
        drop(rec);
        s(7);
    }
}
