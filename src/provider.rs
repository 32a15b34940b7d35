//! Engine state (tick, entropy, heat, SCUP, mood) for the top bar.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::warn;

use crate::error::FeedError;
use crate::feed::{PollJob, Poller, http_get};
use crate::util::unix_now;

const MOCK_MOODS: [&str; 5] = ["calm", "focused", "energetic", "contemplative", "anxious"];
const MOCK_STEP: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, PartialEq)]
pub struct EngineState {
    pub tick: u64,
    pub entropy: f32,
    pub heat: f32,
    pub scup: f32,
    pub mood: String,
    pub timestamp: f64,
}

pub trait StateProvider {
    /// Latest known engine state, if any has arrived yet.
    fn current(&mut self) -> Option<EngineState>;
}

/// Random walk used in development mode.
pub struct MockStateProvider {
    rng: StdRng,
    state: EngineState,
    last_step: Option<Instant>,
}

impl MockStateProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            state: EngineState {
                tick: 0,
                entropy: 0.5,
                heat: 0.3,
                scup: 0.6,
                mood: MOCK_MOODS[0].to_owned(),
                timestamp: unix_now(),
            },
            last_step: None,
        }
    }

    fn step(&mut self) {
        fn walk(value: f32, rng: &mut StdRng) -> f32 {
            (value + rng.gen_range(-0.05..0.05)).clamp(0.0, 1.0)
        }

        self.state.tick += 1;
        self.state.entropy = walk(self.state.entropy, &mut self.rng);
        self.state.heat = walk(self.state.heat, &mut self.rng);
        self.state.scup = walk(self.state.scup, &mut self.rng);
        if self.rng.gen_bool(0.1) {
            self.state.mood = MOCK_MOODS[self.rng.gen_range(0..MOCK_MOODS.len())].to_owned();
        }
        self.state.timestamp = unix_now();
    }

    fn advance(&mut self, now: Instant) {
        let due = self
            .last_step
            .is_none_or(|last| now.duration_since(last) >= MOCK_STEP);
        if due {
            self.step();
            self.last_step = Some(now);
        }
    }
}

impl StateProvider for MockStateProvider {
    fn current(&mut self) -> Option<EngineState> {
        self.advance(Instant::now());
        Some(self.state.clone())
    }
}

#[derive(Debug, Deserialize)]
struct RawMetrics {
    #[serde(default)]
    scup: f64,
    #[serde(default)]
    entropy: f64,
    #[serde(default)]
    heat: f64,
    #[serde(default)]
    mood: Option<String>,
    #[serde(default)]
    timestamp: Option<f64>,
    #[serde(default)]
    tick_count: i64,
}

fn parse_metrics(body: &str) -> Result<EngineState, FeedError> {
    let raw: RawMetrics =
        serde_json::from_str(body).map_err(|error| FeedError::Metrics(error.to_string()))?;
    Ok(EngineState {
        tick: raw.tick_count.max(0) as u64,
        entropy: raw.entropy as f32,
        heat: raw.heat as f32,
        scup: raw.scup as f32,
        mood: raw.mood.unwrap_or_else(|| "unknown".to_owned()),
        timestamp: raw.timestamp.unwrap_or_else(unix_now),
    })
}

/// Polls an HTTP metrics endpoint in the background.
pub struct PolledStateProvider {
    url: String,
    poller: Poller<EngineState>,
    latest: Option<EngineState>,
}

impl PolledStateProvider {
    pub fn new(url: impl Into<String>, interval: Duration) -> Self {
        let url = url.into();
        let agent = ureq::AgentBuilder::new().timeout(Duration::from_secs(5)).build();
        let job_url = url.clone();
        let job: PollJob<EngineState> =
            Arc::new(move || http_get(&agent, &job_url).and_then(|body| parse_metrics(&body)));

        Self {
            url,
            poller: Poller::new("metrics", interval, job),
            latest: None,
        }
    }
}

impl StateProvider for PolledStateProvider {
    fn current(&mut self) -> Option<EngineState> {
        match self.poller.tick(Instant::now()) {
            Some(Ok(state)) => self.latest = Some(state),
            Some(Err(error)) => warn!(url = %self.url, %error, "metrics poll failed"),
            None => {}
        }
        self.latest.clone()
    }
}
