use std::ops::RangeInclusive;

use eframe::egui::{self, Ui};

use crate::config::InitialPlacement;

use super::super::ViewModel;
use super::super::physics::SimulationParams;

fn param_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    text: &str,
    hover: &str,
) -> bool {
    ui.add(
        egui::Slider::new(value, range)
            .text(text)
            .clamping(egui::SliderClamping::Always),
    )
    .on_hover_text(hover)
    .changed()
}

impl ViewModel {
    /// Restores default strengths while keeping the current canvas size.
    fn reset_params(&mut self) {
        self.params = SimulationParams {
            width: self.params.width,
            height: self.params.height,
            ..SimulationParams::default()
        };
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search (label or id)")
            .on_hover_text("Fuzzy-highlight matching nodes without changing the graph.");
        ui.text_edit_singleline(&mut self.search);
        if let Some(matches) = self.cached_search_matches() {
            ui.small(format!("{} matching nodes", matches.len()));
        }

        ui.separator();

        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Step the force layout every frame.");
        ui.checkbox(&mut self.show_labels, "Show all labels")
            .on_hover_text("Label every node instead of only the hovered and selected ones.");
        ui.checkbox(&mut self.show_fps_bar, "FPS display")
            .on_hover_text("Show a live FPS readout in the header.");

        ui.separator();

        egui::ComboBox::from_label("New node placement")
            .selected_text(self.placement.label())
            .show_ui(ui, |ui| {
                for placement in InitialPlacement::ALL {
                    ui.selectable_value(&mut self.placement, placement, placement.label());
                }
            })
            .response
            .on_hover_text(
                "Where nodes without a layout hint appear. Existing nodes keep their place.",
            );

        ui.collapsing("Physics tuning", |ui| {
            let params = &mut self.params;
            let mut changed = false;
            changed |= param_slider(
                ui,
                &mut params.center_strength,
                0.0..=0.05,
                "Centering",
                "Pull toward the canvas centre.",
            );
            changed |= param_slider(
                ui,
                &mut params.link_strength,
                0.0..=0.2,
                "Link spring",
                "How strongly linked nodes pull toward the rest length.",
            );
            changed |= param_slider(
                ui,
                &mut params.charge_strength,
                -1000.0..=0.0,
                "Charge",
                "Negative values push nearby nodes apart.",
            );
            changed |= param_slider(
                ui,
                &mut params.damping,
                0.5..=0.99,
                "Velocity damping",
                "Fraction of velocity kept each step.",
            );
            changed |= param_slider(
                ui,
                &mut params.rest_length,
                10.0..=300.0,
                "Rest length",
                "Preferred distance between linked nodes.",
            );
            changed |= param_slider(
                ui,
                &mut params.repulsion_cutoff,
                10.0..=400.0,
                "Repulsion cutoff",
                "Nodes farther apart than this do not repel.",
            );
            changed |= param_slider(
                ui,
                &mut params.margin,
                0.0..=100.0,
                "Margin",
                "Distance kept from the canvas edges.",
            );

            if ui.button("Reset to defaults").clicked() {
                self.reset_params();
                changed = true;
            }
            if changed {
                self.physics_moving = true;
            }
        });
    }
}
