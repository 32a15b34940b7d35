use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::error::FeedError;
use crate::util::unix_now;

use super::graph::Snapshot;
use super::mock_snapshot;
use super::poller::{PollJob, Poller};
use super::source::SnapshotSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Loading,
    Error,
    Mock,
    Disconnected,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Loading => "loading",
            Self::Error => "error",
            Self::Mock => "mock",
            Self::Disconnected => "disconnected",
        }
    }
}

/// Polls a [`SnapshotSource`] and tracks what the UI should show.
pub struct SnapshotFeed {
    description: String,
    poller: Option<Poller<Snapshot>>,
    dev_mode: bool,
    status: ConnectionStatus,
    latest: Option<Snapshot>,
    last_error: Option<String>,
    revision: u64,
    rng: StdRng,
}

impl SnapshotFeed {
    pub fn new(
        source: Option<Arc<dyn SnapshotSource>>,
        interval: Duration,
        dev_mode: bool,
    ) -> Self {
        let description = source
            .as_ref()
            .map_or_else(|| "no source".to_owned(), |source| source.describe());
        let poller = source.map(|source| {
            let job: PollJob<Snapshot> = Arc::new(move || source.fetch());
            Poller::new("snapshot", interval, job)
        });

        let mut feed = Self {
            description,
            poller,
            dev_mode,
            status: ConnectionStatus::Disconnected,
            latest: None,
            last_error: None,
            revision: 0,
            rng: StdRng::from_entropy(),
        };
        if feed.poller.is_none() && dev_mode {
            feed.install_mock();
        }
        feed
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.poller.as_ref().is_some_and(Poller::is_loading)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Bumped whenever [`SnapshotFeed::latest`] changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn request_refresh(&mut self) {
        match &mut self.poller {
            Some(poller) => poller.request_now(),
            None if self.dev_mode => self.install_mock(),
            None => {}
        }
    }

    pub fn time_until_poll(&self, now: Instant) -> Option<Duration> {
        self.poller.as_ref().map(|poller| poller.time_until_due(now))
    }

    /// Drives polling; returns `true` when a new snapshot was installed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(poller) = &mut self.poller else {
            return false;
        };
        let finished = poller.tick(now);
        let loading = poller.is_loading();

        let changed = match finished {
            Some(result) => self.apply(result),
            None => false,
        };
        if loading && self.latest.is_none() && self.status != ConnectionStatus::Error {
            self.status = ConnectionStatus::Loading;
        }
        changed
    }

    fn apply(&mut self, result: Result<Snapshot, FeedError>) -> bool {
        match result {
            Ok(snapshot) => {
                info!(
                    source = %self.description,
                    nodes = snapshot.metadata.node_count,
                    edges = snapshot.metadata.edge_count,
                    "snapshot loaded"
                );
                self.latest = Some(snapshot);
                self.status = ConnectionStatus::Connected;
                self.last_error = None;
                self.revision += 1;
                true
            }
            Err(error) => {
                warn!(
                    source = %self.description,
                    kind = error.kind(),
                    %error,
                    "snapshot poll failed"
                );
                self.last_error = Some(error.to_string());
                if self.dev_mode {
                    self.install_mock();
                    true
                } else {
                    self.status = ConnectionStatus::Error;
                    false
                }
            }
        }
    }

    fn install_mock(&mut self) {
        let snapshot = mock_snapshot(&mut self.rng, unix_now());
        warn!(nodes = snapshot.metadata.node_count, "showing mock snapshot");
        self.latest = Some(snapshot);
        self.status = ConnectionStatus::Mock;
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::graph::{GraphNode, NodeKind, SnapshotOrigin};

    struct Failing;

    impl SnapshotSource for Failing {
        fn fetch(&self) -> Result<Snapshot, FeedError> {
            Err(FeedError::Parse("broken".to_owned()))
        }

        fn describe(&self) -> String {
            "failing".to_owned()
        }
    }

    struct Fixed;

    impl SnapshotSource for Fixed {
        fn fetch(&self) -> Result<Snapshot, FeedError> {
            Ok(Snapshot::new(
                vec![GraphNode::new("a", NodeKind::Hub)],
                Vec::new(),
                SnapshotOrigin::Live,
                1.0,
            ))
        }

        fn describe(&self) -> String {
            "fixed".to_owned()
        }
    }

    fn settle(feed: &mut SnapshotFeed) -> bool {
        let now = Instant::now();
        feed.tick(now);
        assert_eq!(feed.status(), ConnectionStatus::Loading);
        let result = feed
            .poller
            .as_mut()
            .and_then(|poller| poller.wait(Duration::from_secs(5)))
            .expect("poll finished");
        feed.apply(result)
    }

    #[test]
    fn failure_outside_dev_mode_reports_error_without_data() {
        let mut feed = SnapshotFeed::new(Some(Arc::new(Failing)), Duration::from_secs(5), false);
        assert!(!settle(&mut feed));
        assert_eq!(feed.status(), ConnectionStatus::Error);
        assert!(feed.latest().is_none());
        assert!(feed.last_error().is_some_and(|error| error.contains("broken")));
    }

    #[test]
    fn failure_in_dev_mode_falls_back_to_mock() {
        let mut feed = SnapshotFeed::new(Some(Arc::new(Failing)), Duration::from_secs(5), true);
        assert!(settle(&mut feed));
        assert_eq!(feed.status(), ConnectionStatus::Mock);
        let snapshot = feed.latest().expect("mock snapshot");
        assert_eq!(snapshot.metadata.source, SnapshotOrigin::Mock);
    }

    #[test]
    fn success_connects_and_failure_keeps_last_good() {
        let mut feed = SnapshotFeed::new(Some(Arc::new(Fixed)), Duration::from_secs(5), false);
        assert!(settle(&mut feed));
        assert_eq!(feed.status(), ConnectionStatus::Connected);
        assert_eq!(feed.revision(), 1);

        assert!(!feed.apply(Err(FeedError::WorkerGone)));
        assert_eq!(feed.status(), ConnectionStatus::Error);
        assert_eq!(feed.latest().map(|snapshot| snapshot.nodes.len()), Some(1));
        assert_eq!(feed.revision(), 1);
    }

    #[test]
    fn no_source_is_disconnected_unless_dev() {
        let feed = SnapshotFeed::new(None, Duration::from_secs(5), false);
        assert_eq!(feed.status(), ConnectionStatus::Disconnected);
        assert!(feed.latest().is_none());

        let feed = SnapshotFeed::new(None, Duration::from_secs(5), true);
        assert_eq!(feed.status(), ConnectionStatus::Mock);
        assert!(feed.latest().is_some());
    }
}
