use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::FeedError;
use crate::lineage::LineageGraph;
use crate::logs::{LogReader, RebloomParser, parse_lines};
use crate::util::unix_now;

use super::graph::{Snapshot, SnapshotOrigin};
use super::parse_snapshot;
use super::viewport::Viewport;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const REBLOOM_TAIL_LINES: usize = 2_000;

/// Something that can produce a fresh graph snapshot on demand.
///
/// Called from a background worker, never from the UI thread.
pub trait SnapshotSource: Send + Sync {
    fn fetch(&self) -> Result<Snapshot, FeedError>;

    fn describe(&self) -> String;
}

pub struct HttpSource {
    url: String,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            agent: ureq::AgentBuilder::new().timeout(HTTP_TIMEOUT).build(),
        }
    }
}

pub(crate) fn http_get(agent: &ureq::Agent, url: &str) -> Result<String, FeedError> {
    match agent.get(url).call() {
        Ok(response) => response.into_string().map_err(|error| FeedError::Transport {
            url: url.to_owned(),
            message: format!("failed to read body: {error}"),
        }),
        Err(ureq::Error::Status(code, _response)) => Err(FeedError::Status {
            url: url.to_owned(),
            code,
        }),
        Err(ureq::Error::Transport(transport)) => Err(FeedError::Transport {
            url: url.to_owned(),
            message: transport.to_string(),
        }),
    }
}

impl SnapshotSource for HttpSource {
    fn fetch(&self) -> Result<Snapshot, FeedError> {
        let body = http_get(&self.agent, &self.url)?;
        parse_snapshot(&body, SnapshotOrigin::Live, unix_now())
            .map_err(|error| FeedError::Parse(format!("{error:#}")))
    }

    fn describe(&self) -> String {
        format!("GET {}", self.url)
    }
}

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for FileSource {
    fn fetch(&self) -> Result<Snapshot, FeedError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| FeedError::Read {
            path: self.path.clone(),
            source,
        })?;
        parse_snapshot(&raw, SnapshotOrigin::File, unix_now())
            .map_err(|error| FeedError::Parse(format!("{error:#}")))
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Builds a laid-out ancestry tree from a rebloom log, sized to the live canvas.
pub struct LineageSource {
    reader: LogReader,
    path: PathBuf,
    viewport: Viewport,
}

impl LineageSource {
    pub fn new(reader: LogReader, path: impl Into<PathBuf>, viewport: Viewport) -> Self {
        Self {
            reader,
            path: path.into(),
            viewport,
        }
    }
}

impl SnapshotSource for LineageSource {
    fn fetch(&self) -> Result<Snapshot, FeedError> {
        let lines = self.reader.read_tail(&self.path, REBLOOM_TAIL_LINES)?;
        let parsed = parse_lines(&RebloomParser, lines);
        if parsed.skipped > 0 {
            tracing::debug!(skipped = parsed.skipped, "skipped unrecognised rebloom lines");
        }

        let graph = LineageGraph::from_events(&parsed.entries);
        let (width, height) = self.viewport.size();
        let layout = graph.layout(width, height);
        if layout.truncated > 0 {
            tracing::debug!(truncated = layout.truncated, "lineage layout truncated");
        }
        Ok(graph.to_snapshot(&layout, unix_now()))
    }

    fn describe(&self) -> String {
        format!(
            "rebloom lineage {}",
            self.reader.root().join(&self.path).display()
        )
    }
}
