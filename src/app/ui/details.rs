use eframe::egui::{self, RichText, Ui};

use crate::util::{format_age, short_label, unix_now};

use super::super::ViewModel;
use super::super::render_utils::risk_color;

const LOG_ROWS: usize = 40;
const LOG_TEXT_CHARS: usize = 160;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Node Details");
        ui.add_space(6.0);
        self.draw_node_details(ui);

        ui.separator();
        ui.heading("Logs");
        if !self.lineage.is_empty() {
            ui.small(format!("{} chunks in rebloom lineage", self.lineage.len()));
        }
        if self.digest.skipped > 0 {
            ui.small(format!("{} unparsed lines skipped", self.digest.skipped));
        }
        egui::ScrollArea::vertical()
            .id_salt("log_tails_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| self.draw_log_tails(ui));
    }

    fn draw_node_details(&mut self, ui: &mut Ui) {
        let index = self.hovered.or_else(|| {
            self.selected
                .as_ref()
                .and_then(|id| self.graph.index_by_id.get(id).copied())
        });
        let Some((index, node)) =
            index.and_then(|index| self.graph.nodes.get(index).map(|node| (index, node)))
        else {
            match &self.selected {
                Some(id) => ui.label(format!("{id} is not in the current graph.")),
                None => ui.label("Hover or click a node to inspect it."),
            };
            return;
        };

        ui.label(RichText::new(&node.label).strong());
        ui.small(node.id.as_str());
        ui.add_space(4.0);
        ui.label(format!("Kind: {}", node.kind.label()));
        let age = node
            .created_at_time
            .map(|created| format_age(unix_now() - created))
            .unwrap_or_else(|| "unknown".to_owned());
        ui.label(format!("Age: {age}"));
        if let Some(tick) = node.created_at_tick {
            ui.label(format!("Created at tick: {tick}"));
        }
        ui.label(format!("Degree: {}", self.graph.degree.get(index).copied().unwrap_or(0)));

        let ancestors = self.lineage.ancestors(&node.id);
        if let Some(topic) = self.lineage.topic_of(&node.id) {
            ui.label(format!("Topic: {topic}"));
        }
        if let Some(method) = self.lineage.method_of(&node.id) {
            ui.label(format!("Rebloom method: {method}"));
        }

        ui.add_space(4.0);
        ui.label(RichText::new("Lineage ancestors").strong());
        if ancestors.is_empty() {
            ui.label("None recorded.");
            return;
        }

        let mut clicked = None;
        for ancestor in &ancestors {
            if self.graph.index_by_id.contains_key(ancestor) {
                if ui.link(ancestor.as_str()).clicked() {
                    clicked = Some(ancestor.clone());
                }
            } else {
                ui.label(ancestor.as_str());
            }
        }
        if clicked.is_some() {
            self.set_selected(clicked);
        }
    }

    fn draw_log_tails(&self, ui: &mut Ui) {
        ui.collapsing(format!("Reflections ({})", self.digest.reflections.len()), |ui| {
            for entry in self.digest.reflections.iter().rev().take(LOG_ROWS) {
                ui.horizontal_wrapped(|ui| {
                    ui.label(
                        RichText::new(entry.risk_level.label())
                            .color(risk_color(entry.risk_level))
                            .strong(),
                    );
                    if let Some(tick) = entry.tick {
                        ui.small(format!("tick {tick}"));
                    }
                    ui.small(entry.mood.label());
                    if let Some(timestamp) = &entry.timestamp {
                        ui.small(timestamp.as_str());
                    }
                });
                ui.label(short_label(&entry.text, LOG_TEXT_CHARS));
                ui.add_space(4.0);
            }
        });

        ui.collapsing(format!("Sigils ({})", self.digest.sigils.len()), |ui| {
            for sigil in self.digest.sigils.iter().rev().take(LOG_ROWS) {
                let mut line = sigil.name.clone();
                if let Some(entropy) = sigil.entropy {
                    line.push_str(&format!("  entropy {entropy:.2}"));
                }
                if let Some(heat) = sigil.heat {
                    line.push_str(&format!("  heat {heat:.2}"));
                }
                ui.label(line);
            }
        });

        ui.collapsing(format!("Reblooms ({})", self.digest.reblooms.len()), |ui| {
            for event in self.digest.reblooms.iter().rev().take(LOG_ROWS) {
                ui.label(format!("{} → {}", event.source_id, event.rebloom_id));
                ui.small(format!("{} / {}", event.method, event.topic));
                if let Some(reason) = &event.reason {
                    ui.small(reason.as_str());
                }
            }
        });

        ui.collapsing(format!("Thoughts ({})", self.digest.thoughts.len()), |ui| {
            for thought in self.digest.thoughts.iter().rev().take(LOG_ROWS) {
                ui.horizontal_wrapped(|ui| {
                    if let Some(tick) = thought.tick {
                        ui.small(format!("tick {tick}"));
                    }
                    if let Some(timestamp) = &thought.timestamp {
                        ui.small(timestamp.as_str());
                    }
                });
                if !thought.text.is_empty() {
                    ui.label(short_label(&thought.text, LOG_TEXT_CHARS));
                }
                if let Some(forecast) = &thought.forecast {
                    ui.small(format!("forecast: {forecast}"));
                }
                if let Some(action) = &thought.action {
                    ui.small(format!("action: {action}"));
                }
                ui.add_space(4.0);
            }
        });
    }
}
