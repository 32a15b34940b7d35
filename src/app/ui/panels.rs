use std::collections::VecDeque;

use eframe::egui::{self, Align, Context, Layout, RichText};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::ViewerConfig;
use crate::feed::{ConnectionStatus, SnapshotFeed, Viewport};
use crate::lineage::LineageGraph;
use crate::logs::LogDigest;

use super::super::physics::SimulationParams;
use super::super::render_utils::{scup_color, status_color};
use super::super::{RenderGraph, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(config: &ViewerConfig, viewport: Viewport) -> Self {
        Self {
            graph: RenderGraph::default(),
            graph_revision: 0,
            params: SimulationParams::default(),
            placement: config.placement,
            live_physics: true,
            physics_moving: false,
            show_labels: false,
            search: String::new(),
            search_match_cache: None,
            hovered: None,
            selected: None,
            rng: StdRng::from_entropy(),
            digest: LogDigest::default(),
            lineage: LineageGraph::default(),
            engine: None,
            export_dir: config.export_dir.clone(),
            viewport,
            status_line: None,
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        feed: &SnapshotFeed,
        refresh_requested: &mut bool,
    ) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("mycelium-view");
                    ui.separator();
                    ui.label(feed.description());
                    ui.label(
                        RichText::new(format!("● {}", feed.status().label()))
                            .color(status_color(feed.status())),
                    );
                    ui.label(format!("nodes: {}", self.graph.nodes.len()));
                    ui.label(format!("edges: {}", self.graph.edges.len()));
                    if !self.graph.is_empty() {
                        ui.label(format!("source: {}", self.graph.origin.label()));
                    }
                    self.draw_engine_metrics(ui);

                    let refresh_button =
                        ui.add_enabled(!feed.is_loading(), egui::Button::new("Refresh"));
                    if refresh_button.clicked() {
                        *refresh_requested = true;
                    }
                    let has_graph = !self.graph.is_empty();
                    if ui.add_enabled(has_graph, egui::Button::new("Export JSON")).clicked() {
                        self.export_json();
                    }
                    if ui.add_enabled(has_graph, egui::Button::new("Export SVG")).clicked() {
                        self.export_svg();
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                        if let Some(status_line) = &self.status_line {
                            ui.small(status_line.as_str());
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.graph.is_empty() {
                draw_empty_state(ui, feed, refresh_requested);
            } else {
                self.draw_graph(ui);
            }
        });
    }

    fn draw_engine_metrics(&self, ui: &mut egui::Ui) {
        let Some(engine) = &self.engine else {
            return;
        };
        ui.separator();
        ui.label(format!("tick {}", engine.tick));
        ui.label(format!("entropy {:.2}", engine.entropy));
        ui.label(format!("heat {:.2}", engine.heat));
        ui.label(RichText::new(format!("SCUP {:.2}", engine.scup)).color(scup_color(engine.scup)));
        ui.label(format!("mood {}", engine.mood));
        ui.separator();
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        if self.selected == selected {
            return;
        }
        self.selected = selected;
    }

    pub(in crate::app) fn set_digest(&mut self, digest: LogDigest) {
        self.lineage = LineageGraph::from_events(&digest.reblooms);
        self.digest = digest;
    }
}

fn draw_empty_state(ui: &mut egui::Ui, feed: &SnapshotFeed, refresh_requested: &mut bool) {
    ui.vertical_centered(|ui| {
        ui.add_space(120.0);
        if feed.status() == ConnectionStatus::Loading {
            ui.heading("Loading graph...");
            ui.add_space(8.0);
            ui.spinner();
            return;
        }

        ui.heading("No graph data");
        ui.add_space(6.0);
        ui.label(
            RichText::new(format!("status: {}", feed.status().label()))
                .color(status_color(feed.status())),
        );
        if let Some(error) = feed.last_error() {
            ui.label(error);
        }
        ui.add_space(8.0);
        if ui
            .add_enabled(!feed.is_loading(), egui::Button::new("Retry"))
            .clicked()
        {
            *refresh_requested = true;
        }
    });
}
