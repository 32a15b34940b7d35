use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui::{Context, Vec2};
use rand::rngs::StdRng;
use tracing::warn;

use crate::config::{GraphSource, InitialPlacement, ViewerConfig};
use crate::feed::{
    EdgeKind, FileSource, GraphNode, HttpSource, LineageSource, NodeKind, PollJob, Poller,
    SnapshotFeed, SnapshotOrigin, SnapshotSource, Viewport,
};
use crate::lineage::LineageGraph;
use crate::logs::{LogDigest, LogPaths, LogReader, read_digest};
use crate::provider::{EngineState, MockStateProvider, PolledStateProvider, StateProvider};

mod export;
mod graph;
mod physics;
mod render_utils;
mod ui;

use physics::{PhysicsScratch, SimulationParams};

const LOG_TAIL_LINES: usize = 200;
const LOADING_REPAINT: Duration = Duration::from_millis(100);

pub struct MyceliumApp {
    feed: SnapshotFeed,
    log_poller: Option<Poller<LogDigest>>,
    provider: Option<Box<dyn StateProvider>>,
    poll_interval: Duration,
    applied_revision: u64,
    model: ViewModel,
}

struct ViewModel {
    graph: RenderGraph,
    graph_revision: u64,
    params: SimulationParams,
    placement: InitialPlacement,
    live_physics: bool,
    physics_moving: bool,
    show_labels: bool,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    hovered: Option<usize>,
    selected: Option<String>,
    rng: StdRng,
    digest: LogDigest,
    lineage: LineageGraph,
    engine: Option<EngineState>,
    export_dir: PathBuf,
    /// Canvas size published to background layout sources.
    viewport: Viewport,
    status_line: Option<String>,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<usize>>,
}

/// Live layout state for the current snapshot.
#[derive(Default)]
struct RenderGraph {
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    index_by_id: HashMap<String, usize>,
    degree: Vec<usize>,
    origin: SnapshotOrigin,
    physics_scratch: PhysicsScratch,
}

struct RenderNode {
    id: String,
    label: String,
    kind: NodeKind,
    created_at_tick: Option<u64>,
    created_at_time: Option<f64>,
    pos: Vec2,
    velocity: Vec2,
    radius: f32,
}

struct RenderEdge {
    id: String,
    from_id: String,
    to_id: String,
    /// Node indices; `None` when the endpoint is not in the snapshot.
    from: Option<usize>,
    to: Option<usize>,
    kind: EdgeKind,
    weight: f32,
    created_at_time: Option<f64>,
}

impl RenderNode {
    fn from_graph_node(node: &GraphNode, pos: Vec2) -> Self {
        let mut render_node = Self {
            id: node.id.clone(),
            label: String::new(),
            kind: node.kind,
            created_at_tick: None,
            created_at_time: None,
            pos,
            velocity: Vec2::ZERO,
            radius: 0.0,
        };
        render_node.refresh_from(node);
        render_node
    }

    /// Takes every field except position and velocity from `node`.
    fn refresh_from(&mut self, node: &GraphNode) {
        self.label = if node.label.is_empty() {
            node.id.clone()
        } else {
            node.label.clone()
        };
        self.kind = node.kind;
        self.created_at_tick = node.created_at_tick;
        self.created_at_time = node.created_at_time;
        self.radius = render_utils::kind_radius(node.kind);
    }
}

impl RenderGraph {
    fn from_parts(nodes: Vec<RenderNode>, mut edges: Vec<RenderEdge>) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect::<HashMap<_, _>>();

        let mut degree = vec![0usize; nodes.len()];
        for edge in &mut edges {
            edge.from = index_by_id.get(&edge.from_id).copied();
            edge.to = index_by_id.get(&edge.to_id).copied();
            if let (Some(from), Some(to)) = (edge.from, edge.to) {
                degree[from] += 1;
                if from != to {
                    degree[to] += 1;
                }
            }
        }

        Self {
            nodes,
            edges,
            index_by_id,
            degree,
            origin: SnapshotOrigin::default(),
            physics_scratch: PhysicsScratch::default(),
        }
    }

    fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn dangling_edge_count(&self) -> usize {
        self.edges
            .iter()
            .filter(|edge| edge.from.is_none() || edge.to.is_none())
            .count()
    }
}

fn snapshot_source(
    config: &ViewerConfig,
    reader: &LogReader,
    viewport: &Viewport,
) -> Option<Arc<dyn SnapshotSource>> {
    match &config.graph_source {
        GraphSource::Url(url) => Some(Arc::new(HttpSource::new(url.clone()))),
        GraphSource::File(path) => Some(Arc::new(FileSource::new(path.clone()))),
        GraphSource::Lineage(path) => Some(Arc::new(LineageSource::new(
            reader.clone(),
            path.clone(),
            viewport.clone(),
        ))),
        GraphSource::None => None,
    }
}

fn log_poller(config: &ViewerConfig, reader: LogReader) -> Option<Poller<LogDigest>> {
    let paths = LogPaths {
        reflection: config.reflection_log.clone(),
        sigil: config.sigil_log.clone(),
        rebloom: config.rebloom_log.clone(),
        thought: config.thought_log.clone(),
    };
    if paths.is_empty() {
        return None;
    }

    let job: PollJob<LogDigest> = Arc::new(move || read_digest(&reader, &paths, LOG_TAIL_LINES));
    Some(Poller::new("logs", config.poll_interval, job))
}

fn state_provider(config: &ViewerConfig) -> Option<Box<dyn StateProvider>> {
    if let Some(url) = &config.metrics_url {
        return Some(Box::new(PolledStateProvider::new(url.clone(), config.poll_interval)));
    }
    if config.dev_mode {
        return Some(Box::new(MockStateProvider::new(rand::random())));
    }
    None
}

impl MyceliumApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: ViewerConfig) -> Self {
        let reader = LogReader::new(config.log_root.clone());
        let defaults = SimulationParams::default();
        let viewport = Viewport::new(defaults.width, defaults.height);
        let feed = SnapshotFeed::new(
            snapshot_source(&config, &reader, &viewport),
            config.poll_interval,
            config.dev_mode,
        );

        Self {
            feed,
            log_poller: log_poller(&config, reader),
            provider: state_provider(&config),
            poll_interval: config.poll_interval,
            applied_revision: 0,
            model: ViewModel::new(&config, viewport),
        }
    }

    fn poll_sources(&mut self, now: Instant) {
        self.feed.tick(now);
        if self.feed.revision() != self.applied_revision
            && let Some(snapshot) = self.feed.latest()
        {
            self.model.apply_snapshot(snapshot);
            self.applied_revision = self.feed.revision();
        }

        if let Some(poller) = &mut self.log_poller {
            match poller.tick(now) {
                Some(Ok(digest)) => self.model.set_digest(digest),
                Some(Err(error)) => warn!(kind = error.kind(), %error, "log poll failed"),
                None => {}
            }
        }

        if let Some(provider) = &mut self.provider
            && let Some(state) = provider.current()
        {
            self.model.engine = Some(state);
        }
    }

    fn next_repaint(&self, now: Instant) -> Duration {
        let loading = self.feed.is_loading()
            || self.log_poller.as_ref().is_some_and(Poller::is_loading);
        if loading {
            return LOADING_REPAINT;
        }

        let mut wait = self.feed.time_until_poll(now).unwrap_or(self.poll_interval);
        if let Some(poller) = &self.log_poller {
            wait = wait.min(poller.time_until_due(now));
        }
        if self.provider.is_some() {
            wait = wait.min(Duration::from_secs(1));
        }
        wait.max(LOADING_REPAINT)
    }
}

impl eframe::App for MyceliumApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.poll_sources(now);

        let mut refresh_requested = false;
        self.model.show(ctx, &self.feed, &mut refresh_requested);

        if refresh_requested {
            self.feed.request_refresh();
            if let Some(poller) = &mut self.log_poller {
                poller.request_now();
            }
            ctx.request_repaint();
        }

        ctx.request_repaint_after(self.next_repaint(now));
    }
}
