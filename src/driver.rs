use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::B256;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::metrics::push::PushClient;
use crate::metrics::MetricsCollector;
use crate::submitter::{SubmitError, TxnSubmitter};

/// One finished submission attempt, reported back to the driver loop.
struct Completion {
    id: u64,
    result: Result<B256, SubmitError>,
}

/// Fixed-cadence transaction driver.
///
/// Every `interval` a fresh submission is spawned; the loop never waits for
/// earlier attempts, so several may be in flight at once. Completions come
/// home over a channel and are folded into the collector by this same loop,
/// which keeps the in-flight map under a single owner.
pub struct Driver<S: TxnSubmitter> {
    submitter: Arc<S>,
    metrics: Arc<MetricsCollector>,
    interval: Duration,
    push: Option<PushClient>,
    shutdown: CancellationToken,
}

impl<S: TxnSubmitter> Driver<S> {
    pub fn new(submitter: S, metrics: Arc<MetricsCollector>, interval: Duration) -> Self {
        Self {
            submitter: Arc::new(submitter),
            metrics,
            interval,
            push: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Enables a best-effort snapshot push after every tick.
    pub fn with_push(mut self, push: PushClient) -> Self {
        self.push = Some(push);
        self
    }

    /// Token that stops the loop when cancelled. Without one the driver
    /// runs until the process is terminated.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Runs the tick loop. On shutdown, in-flight attempts are drained so
    /// every started task is recorded exactly once.
    pub async fn run(self) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
        let mut in_flight: HashMap<u64, Instant> = HashMap::new();
        let mut next_id: u64 = 0;

        // The first transaction goes out one full interval after startup,
        // matching the pause-then-send shape of the original loop.
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => break,

                Some(completion) = done_rx.recv() => {
                    self.record(&mut in_flight, completion);
                }

                _ = ticker.tick() => {
                    let id = next_id;
                    next_id += 1;
                    in_flight.insert(id, Instant::now());
                    self.metrics.task_started();

                    let submitter = Arc::clone(&self.submitter);
                    let done = done_tx.clone();
                    tokio::spawn(async move {
                        let result = submitter.submit().await;
                        // Only fails once the loop itself is gone.
                        let _ = done.send(Completion { id, result });
                    });

                    if let Some(push) = &self.push {
                        push.spawn_push(Arc::clone(&self.metrics));
                    }
                }
            }
        }

        // Drop our sender so the channel closes once every spawned task has
        // reported, then drain the stragglers.
        drop(done_tx);
        while let Some(completion) = done_rx.recv().await {
            self.record(&mut in_flight, completion);
        }
    }

    fn record(&self, in_flight: &mut HashMap<u64, Instant>, completion: Completion) {
        let Some(started) = in_flight.remove(&completion.id) else {
            debug!(id = completion.id, "completion for unknown task");
            return;
        };
        self.metrics.observe_latency(started.elapsed());
        match completion.result {
            Ok(hash) => {
                self.metrics.record_success();
                debug!(tx = %hash, "transaction accepted");
            }
            Err(err) => {
                self.metrics.record_failure();
                warn!(error = %err, "transaction failed");
            }
        }
    }
}
