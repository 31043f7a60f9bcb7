use std::time::Duration;

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::Serialize;

// ─── Configuration ───────────────────────────────────────────────

/// HdrHistogram range: 1 μs → 60 s, 3 significant figures
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 60_000_000;
const HIST_SIGFIG: u8 = 3;

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe metrics engine.
/// The driver loop records, the exporter calls `snapshot()`.
pub struct MetricsCollector {
    inner: Mutex<Inner>,
}

/// Latency distribution summary in microseconds. The sum is tracked
/// exactly alongside the histogram so the exposition `_sum` never drifts.
#[derive(Debug, Clone, Serialize)]
pub struct LatencySummary {
    pub count: u64,
    pub sum_us: u64,
    pub min_us: u64,
    pub max_us: u64,
    pub mean_us: f64,
    pub p50_us: u64,
    pub p90_us: u64,
    pub p99_us: u64,
}

/// Point-in-time view of every series the exporter serves. Owned data —
/// rendering or serializing it never holds the collector lock.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Successful submissions (endpoint accepted for broadcast).
    pub txn_count: u64,
    /// Failed submissions.
    pub txn_errors: u64,
    /// Tasks submitted but not yet resolved.
    pub in_flight: u64,
    pub latency: LatencySummary,
}

// ─── Internal state ──────────────────────────────────────────────

struct Inner {
    hist: Histogram<u64>,
    latency_sum_us: u64,
    txn_count: u64,
    txn_errors: u64,
    in_flight: u64,
}

// ─── MetricsCollector impl ───────────────────────────────────────

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
        }
    }

    /// A task left the scheduler and is now in flight.
    pub fn task_started(&self) {
        self.inner.lock().in_flight += 1;
    }

    /// Exactly one of `record_success` / `record_failure` is called per
    /// started task, once its completion has been observed.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.txn_count += 1;
        inner.in_flight = inner.in_flight.saturating_sub(1);
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.txn_errors += 1;
        inner.in_flight = inner.in_flight.saturating_sub(1);
    }

    /// Folds one completed task's wall time into the distribution.
    pub fn observe_latency(&self, latency: Duration) {
        let us = latency.as_micros().min(u128::from(u64::MAX)) as u64;
        let mut inner = self.inner.lock();
        inner.latency_sum_us = inner.latency_sum_us.saturating_add(us);
        // Clamp to the histogram floor; saturates at the ceiling.
        let _ = inner.hist.saturating_record(us.max(HIST_LOW));
    }

    /// Produce a read-only snapshot for the exporter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().snapshot()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Inner impl ──────────────────────────────────────────────────

impl Inner {
    fn new() -> Self {
        Self {
            hist: Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
                .expect("histogram creation"),
            latency_sum_us: 0,
            txn_count: 0,
            txn_errors: 0,
            in_flight: 0,
        }
    }

    fn snapshot(&self) -> MetricsSnapshot {
        let latency = if self.hist.is_empty() {
            LatencySummary::empty()
        } else {
            LatencySummary {
                count: self.hist.len(),
                sum_us: self.latency_sum_us,
                min_us: self.hist.min(),
                max_us: self.hist.max(),
                mean_us: self.hist.mean(),
                p50_us: self.hist.value_at_percentile(50.0),
                p90_us: self.hist.value_at_percentile(90.0),
                p99_us: self.hist.value_at_percentile(99.0),
            }
        };

        MetricsSnapshot {
            txn_count: self.txn_count,
            txn_errors: self.txn_errors,
            in_flight: self.in_flight,
            latency,
        }
    }
}

impl LatencySummary {
    /// All-zero placeholder used before any completions are observed.
    pub fn empty() -> Self {
        Self {
            count: 0,
            sum_us: 0,
            min_us: 0,
            max_us: 0,
            mean_us: 0.0,
            p50_us: 0,
            p90_us: 0,
            p99_us: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn empty_snapshot_is_all_zero() {
        let snap = MetricsCollector::new().snapshot();
        assert_eq!(snap.txn_count, 0);
        assert_eq!(snap.txn_errors, 0);
        assert_eq!(snap.in_flight, 0);
        assert_eq!(snap.latency.count, 0);
        assert_eq!(snap.latency.sum_us, 0);
    }

    #[test]
    fn counters_and_gauge_follow_task_lifecycle() {
        let metrics = MetricsCollector::new();

        metrics.task_started();
        metrics.task_started();
        assert_eq!(metrics.snapshot().in_flight, 2);

        metrics.observe_latency(Duration::from_millis(5));
        metrics.record_success();
        metrics.observe_latency(Duration::from_millis(7));
        metrics.record_failure();

        let snap = metrics.snapshot();
        assert_eq!(snap.txn_count, 1);
        assert_eq!(snap.txn_errors, 1);
        assert_eq!(snap.in_flight, 0);
        assert_eq!(snap.latency.count, 2);
        assert_eq!(snap.latency.sum_us, 12_000);
        assert!(snap.latency.min_us >= 4_000 && snap.latency.min_us <= 5_100);
    }

    #[test]
    fn concurrent_completions_lose_no_updates() {
        let metrics = Arc::new(MetricsCollector::new());
        let threads = 8;
        let per_thread = 1_000u64;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for i in 0..per_thread {
                        metrics.task_started();
                        metrics.observe_latency(Duration::from_micros(100 + i));
                        if (t + i) % 2 == 0 {
                            metrics.record_success();
                        } else {
                            metrics.record_failure();
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = metrics.snapshot();
        let total = threads as u64 * per_thread;
        assert_eq!(snap.txn_count + snap.txn_errors, total);
        assert_eq!(snap.in_flight, 0);
        assert_eq!(snap.latency.count, total);
    }

    #[test]
    fn sub_microsecond_latency_is_clamped_not_dropped() {
        let metrics = MetricsCollector::new();
        metrics.observe_latency(Duration::from_nanos(10));
        let snap = metrics.snapshot();
        assert_eq!(snap.latency.count, 1);
        assert_eq!(snap.latency.min_us, 1);
    }
}
