use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::FeedError;

pub type PollJob<T> = Arc<dyn Fn() -> Result<T, FeedError> + Send + Sync>;

/// Runs a job on a background thread every `interval`.
///
/// At most one job is in flight; a poll that comes due while the previous
/// one is still running is skipped, so results arrive in start order.
pub struct Poller<T> {
    name: &'static str,
    job: PollJob<T>,
    interval: Duration,
    last_started: Option<Instant>,
    in_flight: Option<Receiver<Result<T, FeedError>>>,
    forced: bool,
}

impl<T: Send + 'static> Poller<T> {
    pub fn new(name: &'static str, interval: Duration, job: PollJob<T>) -> Self {
        Self {
            name,
            job,
            interval,
            last_started: None,
            in_flight: None,
            forced: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Makes the next [`Poller::tick`] start a job regardless of the interval.
    pub fn request_now(&mut self) {
        self.forced = true;
    }

    /// Collects a finished job, then starts the next one if it is due.
    pub fn tick(&mut self, now: Instant) -> Option<Result<T, FeedError>> {
        let finished = self.collect();

        if self.in_flight.is_none() && self.is_due(now) {
            self.start(now);
        } else if self.forced && self.in_flight.is_some() {
            debug!(poller = self.name, "poll requested while a job is running; skipping");
            self.forced = false;
        }

        finished
    }

    /// Time until the next poll comes due, for scheduling a repaint.
    pub fn time_until_due(&self, now: Instant) -> Duration {
        match self.last_started {
            Some(last) => self.interval.saturating_sub(now.duration_since(last)),
            None => Duration::ZERO,
        }
    }

    fn is_due(&self, now: Instant) -> bool {
        self.forced
            || self
                .last_started
                .is_none_or(|last| now.duration_since(last) >= self.interval)
    }

    fn start(&mut self, now: Instant) {
        let (tx, rx) = mpsc::channel();
        let job = Arc::clone(&self.job);

        thread::spawn(move || {
            let _ = tx.send(job());
        });

        debug!(poller = self.name, "poll started");
        self.last_started = Some(now);
        self.in_flight = Some(rx);
        self.forced = false;
    }

    fn collect(&mut self) -> Option<Result<T, FeedError>> {
        let rx = self.in_flight.take()?;
        match rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => {
                self.in_flight = Some(rx);
                None
            }
            Err(TryRecvError::Disconnected) => Some(Err(FeedError::WorkerGone)),
        }
    }

    #[cfg(test)]
    pub(crate) fn wait(&mut self, timeout: Duration) -> Option<Result<T, FeedError>> {
        let rx = self.in_flight.take()?;
        match rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                self.in_flight = Some(rx);
                None
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Some(Err(FeedError::WorkerGone)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_poller(interval: Duration) -> (Poller<usize>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let job: PollJob<usize> =
            Arc::new(move || Ok(counter.fetch_add(1, Ordering::SeqCst) + 1));
        (Poller::new("test", interval, job), calls)
    }

    #[test]
    fn first_tick_starts_immediately() {
        let (mut poller, calls) = counting_poller(Duration::from_secs(60));
        let now = Instant::now();
        assert!(poller.tick(now).is_none());
        assert!(poller.is_loading());

        let result = poller.wait(Duration::from_secs(5)).expect("job finished");
        assert_eq!(result.expect("job succeeded"), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!poller.is_loading());
    }

    #[test]
    fn respects_interval_and_manual_requests() {
        let (mut poller, calls) = counting_poller(Duration::from_secs(60));
        let start = Instant::now();
        poller.tick(start);
        let first = poller.wait(Duration::from_secs(5)).expect("job finished");
        assert_eq!(first.expect("job succeeded"), 1);

        assert!(poller.tick(start + Duration::from_secs(1)).is_none());
        assert!(!poller.is_loading());
        assert_eq!(poller.time_until_due(start + Duration::from_secs(1)), Duration::from_secs(59));

        poller.request_now();
        poller.tick(start + Duration::from_secs(2));
        assert!(poller.is_loading());
        let second = poller.wait(Duration::from_secs(5)).expect("job finished");
        assert_eq!(second.expect("job succeeded"), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        poller.tick(start + Duration::from_secs(62));
        assert!(poller.is_loading());
    }

    #[test]
    fn overlapping_polls_are_skipped() {
        let gate = Arc::new(std::sync::Mutex::new(()));
        let guard = gate.lock().expect("gate lock");
        let calls = Arc::new(AtomicUsize::new(0));
        let job_gate = Arc::clone(&gate);
        let job_calls = Arc::clone(&calls);
        let job: PollJob<()> = Arc::new(move || {
            job_calls.fetch_add(1, Ordering::SeqCst);
            let _held = job_gate.lock();
            Ok(())
        });
        let mut poller = Poller::new("gated", Duration::ZERO, job);

        let now = Instant::now();
        poller.tick(now);
        poller.request_now();
        poller.tick(now + Duration::from_secs(1));
        poller.tick(now + Duration::from_secs(2));
        drop(guard);

        let result = poller.wait(Duration::from_secs(5)).expect("job finished");
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
