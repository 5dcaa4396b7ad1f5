//! Bounded-concurrency driver for a [`Prober`].
//!
//! Workers pull candidates from one shared iterator under a mutex, so each
//! candidate is probed exactly once. Results land in a [`ResultCollector`]
//! whose lock only covers the push itself.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;
use tracing::{debug, error};

use edgeprobe_common::network::candidate::Candidate;
use edgeprobe_common::network::result::ProbeResult;

use super::{Prober, StopSignal};

/// Called after every completed probe with the running completion count.
pub type ProgressFn = Arc<dyn Fn(usize, &ProbeResult) + Send + Sync>;

#[derive(Default)]
struct ResultCollector {
    results: Mutex<Vec<ProbeResult>>,
    completed: AtomicUsize,
}

impl ResultCollector {
    fn insert(&self, result: ProbeResult, progress: Option<&ProgressFn>) {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(progress) = progress {
            progress(completed, &result);
        }
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result);
    }

    fn drain(&self) -> Vec<ProbeResult> {
        std::mem::take(&mut *self.results.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[derive(Debug, Default)]
pub struct PoolOutcome {
    /// In completion order.
    pub results: Vec<ProbeResult>,
    pub cancelled: bool,
}

pub struct WorkerPool {
    workers: usize,
    stop: StopSignal,
    progress: Option<ProgressFn>,
}

impl WorkerPool {
    pub fn new(workers: usize, stop: StopSignal) -> Self {
        Self {
            workers: workers.max(1),
            stop,
            progress: None,
        }
    }

    pub fn on_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Probes candidates until the sequence runs dry or the stop signal
    /// fires. Workers finish the probe in hand before exiting, so whatever
    /// completed is returned.
    ///
    /// The run only counts as cancelled when the stop left candidates unprobed.
    pub async fn run<I>(&self, candidates: I, prober: Arc<dyn Prober>) -> PoolOutcome
    where
        I: Iterator<Item = Candidate> + Send + 'static,
    {
        let queue = Arc::new(Mutex::new(candidates));
        let collector = Arc::new(ResultCollector::default());
        let mut workers = JoinSet::new();

        for id in 0..self.workers {
            let queue = Arc::clone(&queue);
            let collector = Arc::clone(&collector);
            let prober = Arc::clone(&prober);
            let stop = self.stop.clone();
            let progress = self.progress.clone();

            workers.spawn(async move {
                let mut probed: usize = 0;
                while !stop.is_stopped() {
                    let next = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
                    let Some(candidate) = next else {
                        break;
                    };
                    let result = prober.probe(&candidate, &stop).await;
                    collector.insert(result, progress.as_ref());
                    probed += 1;
                }
                debug!("worker {id} exiting after {probed} probes");
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("probe worker failed: {e}");
            }
        }

        let unprobed = self.stop.is_stopped()
            && queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .next()
                .is_some();

        PoolOutcome {
            results: collector.drain(),
            cancelled: unprobed,
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    /// Connects every candidate after 10ms, tracking peak parallelism.
    #[derive(Default)]
    struct Recorder {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Prober for Recorder {
        async fn probe(&self, candidate: &Candidate, _stop: &StopSignal) -> ProbeResult {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            ProbeResult::reachable(candidate, 10.0, 0)
        }
    }

    fn candidates(count: u8) -> impl Iterator<Item = Candidate> + Send + 'static {
        (1..=count).map(|last| Candidate::new(Ipv4Addr::new(10, 0, 0, last), 443))
    }

    #[tokio::test(start_paused = true)]
    async fn every_candidate_is_probed_exactly_once() {
        let pool = WorkerPool::new(4, StopSignal::new());
        let outcome = pool.run(candidates(50), Arc::new(Recorder::default())).await;

        assert!(!outcome.cancelled);
        assert_eq!(outcome.results.len(), 50);
        let unique: HashSet<Ipv4Addr> = outcome.results.iter().map(|r| r.addr).collect();
        assert_eq!(unique.len(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn parallelism_never_exceeds_the_worker_count() {
        let recorder = Arc::new(Recorder::default());
        let pool = WorkerPool::new(3, StopSignal::new());
        pool.run(candidates(20), recorder.clone()).await;

        assert_eq!(recorder.peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_counts_every_completion() {
        let seen = Arc::new(AtomicUsize::new(0));
        let last = Arc::clone(&seen);
        let pool = WorkerPool::new(2, StopSignal::new()).on_progress(Arc::new(move |done: usize, _: &ProbeResult| {
            last.fetch_max(done, Ordering::SeqCst);
        }));
        pool.run(candidates(12), Arc::new(Recorder::default())).await;

        assert_eq!(seen.load(Ordering::SeqCst), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_keeps_completed_results() {
        let stop = StopSignal::new();
        let trigger = stop.clone();
        let pool = WorkerPool::new(1, stop).on_progress(Arc::new(move |done: usize, _: &ProbeResult| {
            if done == 5 {
                trigger.stop();
            }
        }));
        let outcome = pool.run(candidates(40), Arc::new(Recorder::default())).await;

        assert!(outcome.cancelled);
        assert_eq!(outcome.results.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_after_the_last_candidate_is_not_a_cancellation() {
        let stop = StopSignal::new();
        let trigger = stop.clone();
        let pool = WorkerPool::new(2, stop).on_progress(Arc::new(move |done: usize, _: &ProbeResult| {
            if done == 6 {
                trigger.stop();
            }
        }));
        let outcome = pool.run(candidates(6), Arc::new(Recorder::default())).await;

        assert!(!outcome.cancelled);
        assert_eq!(outcome.results.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_sequence_completes_immediately() {
        let pool = WorkerPool::new(8, StopSignal::new());
        let outcome = pool.run(candidates(0), Arc::new(Recorder::default())).await;

        assert!(outcome.results.is_empty());
        assert!(!outcome.cancelled);
    }
}
