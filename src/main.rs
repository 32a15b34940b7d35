mod app;
mod config;
mod error;
mod feed;
mod lineage;
mod logs;
mod provider;
mod util;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{GraphSource, InitialPlacement, ViewerConfig};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// HTTP endpoint serving graph snapshots as JSON.
    #[arg(long)]
    snapshot_url: Option<String>,

    /// JSON snapshot file, re-read on every poll.
    #[arg(long)]
    snapshot_file: Option<PathBuf>,

    /// Rebloom log to lay out as an ancestry tree, relative to the log root.
    #[arg(long)]
    rebloom_log: Option<PathBuf>,

    #[arg(long, default_value = ".")]
    log_root: PathBuf,

    #[arg(long)]
    reflection_log: Option<PathBuf>,

    #[arg(long)]
    sigil_log: Option<PathBuf>,

    /// Thought trace (forecasts and actions), relative to the log root.
    #[arg(long)]
    thought_log: Option<PathBuf>,

    /// HTTP endpoint serving engine metrics.
    #[arg(long)]
    metrics_url: Option<String>,

    /// Seconds between polls, clamped to 1..=60.
    #[arg(long, default_value_t = config::DEFAULT_POLL_SECS)]
    poll_secs: u64,

    /// Development mode: fall back to mock data when a source fails.
    #[arg(long)]
    dev: bool,

    #[arg(long, default_value = "exports")]
    export_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = InitialPlacement::Random)]
    placement: InitialPlacement,
}

impl Args {
    fn into_config(self) -> ViewerConfig {
        let graph_source = if let Some(url) = self.snapshot_url {
            GraphSource::Url(url)
        } else if let Some(path) = self.snapshot_file {
            GraphSource::File(path)
        } else if let Some(path) = self.rebloom_log.clone() {
            GraphSource::Lineage(path)
        } else {
            GraphSource::None
        };

        ViewerConfig {
            graph_source,
            log_root: self.log_root,
            reflection_log: self.reflection_log,
            sigil_log: self.sigil_log,
            rebloom_log: self.rebloom_log,
            thought_log: self.thought_log,
            metrics_url: self.metrics_url,
            poll_interval: ViewerConfig::clamp_poll_secs(self.poll_secs),
            dev_mode: self.dev,
            export_dir: self.export_dir,
            placement: self.placement,
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config();
    tracing::info!(
        source = %config.source_label(),
        poll_secs = config.poll_interval.as_secs(),
        dev = config.dev_mode,
        "starting viewer"
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "mycelium-view",
        options,
        Box::new(move |cc| Ok(Box::new(app::MyceliumApp::new(cc, config)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_wins_over_file_and_lineage() {
        let args = Args::parse_from([
            "mycelium-view",
            "--snapshot-url",
            "http://localhost:8000/graph",
            "--snapshot-file",
            "graph.json",
            "--rebloom-log",
            "runtime/memory/rebloom_log.jsonl",
            "--poll-secs",
            "0",
        ]);
        let config = args.into_config();
        assert_eq!(
            config.graph_source,
            GraphSource::Url("http://localhost:8000/graph".to_owned())
        );
        assert_eq!(
            config.rebloom_log,
            Some(PathBuf::from("runtime/memory/rebloom_log.jsonl"))
        );
        assert_eq!(config.poll_interval.as_secs(), 1);
    }

    #[test]
    fn placement_flag_parses() {
        let args = Args::parse_from([
            "mycelium-view",
            "--placement",
            "near-parent",
            "--dev",
            "--thought-log",
            "thought_trace.log",
        ]);
        let config = args.into_config();
        assert_eq!(config.thought_log, Some(PathBuf::from("thought_trace.log")));
        assert_eq!(config.placement, InitialPlacement::NearParent);
        assert!(config.dev_mode);
        assert_eq!(config.graph_source, GraphSource::None);
    }
}
