//! Throughput estimation from cumulative byte counters
//!
//! Computes an instantaneous rate from the two most recent samples of a
//! monotonically growing byte counter. No smoothing beyond that pair.

use std::time::Instant;

/// Two-sample rate estimator.
///
/// Feed it the cumulative bytes-done figure once per poll; it returns the
/// rate since the previous sample. The first sample has nothing to compare
/// against and reports 0 B/s instead of a spurious figure.
#[derive(Debug, Default)]
pub struct RateEstimator {
    last: Option<(Instant, u64)>,
}

impl RateEstimator {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Record a sample taken at `now` and return bytes per second since
    /// the previous sample.
    pub fn sample(&mut self, now: Instant, bytes_done: u64) -> f64 {
        let rate = match self.last {
            Some((prev_time, prev_bytes)) => {
                let elapsed = now.duration_since(prev_time).as_secs_f64();
                if elapsed > 0.0 {
                    (bytes_done as f64 - prev_bytes as f64) / elapsed
                } else {
                    0.0
                }
            }
            None => 0.0,
        };
        self.last = Some((now, bytes_done));
        rate
    }
}
