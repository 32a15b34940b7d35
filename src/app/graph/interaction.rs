use eframe::egui::{self, Rect, Vec2};

use super::super::{RenderNode, ViewModel};

/// Extra pick distance around each node, in canvas pixels.
pub(in crate::app) const HIT_SLOP: f32 = 3.0;

/// First node, in iteration order, whose disc (grown by `slop`) contains `point`.
pub(in crate::app) fn hit_test(nodes: &[RenderNode], point: Vec2, slop: f32) -> Option<usize> {
    nodes
        .iter()
        .position(|node| (node.pos - point).length() <= node.radius + slop)
}

impl ViewModel {
    /// Updates hover from the pointer; leaving the canvas clears it.
    pub(in crate::app) fn update_hover(
        &mut self,
        ui: &egui::Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| response.hovered() && rect.contains(*pointer));

        self.hovered =
            pointer.and_then(|pointer| hit_test(&self.graph.nodes, pointer - rect.min, HIT_SLOP));
        if self.hovered.is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }
    }

    pub(in crate::app) fn handle_graph_click(&mut self, response: &egui::Response) {
        if !response.clicked_by(egui::PointerButton::Primary) {
            return;
        }
        let selected = self
            .hovered
            .and_then(|index| self.graph.nodes.get(index))
            .map(|node| node.id.clone());
        self.set_selected(selected);
    }
}
