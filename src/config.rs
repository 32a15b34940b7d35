use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

pub const MIN_POLL_SECS: u64 = 1;
pub const MAX_POLL_SECS: u64 = 60;
pub const DEFAULT_POLL_SECS: u64 = 5;

/// Where newly seen nodes are placed before the simulation takes over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum InitialPlacement {
    #[default]
    Random,
    Circular,
    NearParent,
}

impl InitialPlacement {
    pub const ALL: [Self; 3] = [Self::Random, Self::Circular, Self::NearParent];

    pub fn label(self) -> &'static str {
        match self {
            Self::Random => "Random",
            Self::Circular => "Circular",
            Self::NearParent => "Near parent",
        }
    }
}

/// Where the graph snapshot comes from. Earlier variants win when several
/// flags are given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphSource {
    Url(String),
    File(PathBuf),
    Lineage(PathBuf),
    None,
}

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub graph_source: GraphSource,
    pub log_root: PathBuf,
    pub reflection_log: Option<PathBuf>,
    pub sigil_log: Option<PathBuf>,
    pub rebloom_log: Option<PathBuf>,
    pub thought_log: Option<PathBuf>,
    pub metrics_url: Option<String>,
    pub poll_interval: Duration,
    pub dev_mode: bool,
    pub export_dir: PathBuf,
    pub placement: InitialPlacement,
}

impl ViewerConfig {
    pub fn clamp_poll_secs(secs: u64) -> Duration {
        Duration::from_secs(secs.clamp(MIN_POLL_SECS, MAX_POLL_SECS))
    }

    pub fn source_label(&self) -> String {
        match &self.graph_source {
            GraphSource::Url(url) => url.clone(),
            GraphSource::File(path) | GraphSource::Lineage(path) => path.display().to_string(),
            GraphSource::None if self.dev_mode => "mock data".to_owned(),
            GraphSource::None => "no source".to_owned(),
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            graph_source: GraphSource::None,
            log_root: PathBuf::from("."),
            reflection_log: None,
            sigil_log: None,
            rebloom_log: None,
            thought_log: None,
            metrics_url: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            dev_mode: false,
            export_dir: PathBuf::from("exports"),
            placement: InitialPlacement::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_interval_is_clamped() {
        assert_eq!(ViewerConfig::clamp_poll_secs(0), Duration::from_secs(1));
        assert_eq!(ViewerConfig::clamp_poll_secs(5), Duration::from_secs(5));
        assert_eq!(ViewerConfig::clamp_poll_secs(3600), Duration::from_secs(60));
    }

    #[test]
    fn source_label_reflects_mode() {
        let mut config = ViewerConfig::default();
        assert_eq!(config.source_label(), "no source");
        config.dev_mode = true;
        assert_eq!(config.source_label(), "mock data");
        config.graph_source = GraphSource::Url("http://localhost:8000/graph".to_owned());
        assert_eq!(config.source_label(), "http://localhost:8000/graph");
    }
}
