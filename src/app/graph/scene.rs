use std::collections::HashSet;

use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Stroke, Vec2, pos2};

use crate::util::short_label;

use super::super::RenderGraph;
use super::super::render_utils::{
    BACKGROUND, HIGHLIGHT, HOVER, LABEL, NODE_OUTLINE, SEARCH_MATCH, blend_color, dim_color,
    edge_color, kind_color, with_alpha,
};

/// Edges and nodes younger than this are drawn highlighted.
pub(in crate::app) const HIGHLIGHT_WINDOW_SECS: f64 = 5.0;
const LABEL_MAX_CHARS: usize = 28;
const LABEL_SIZE: f32 = 12.0;

/// A resolved drawing command in canvas coordinates (origin top-left).
#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) enum Primitive {
    Line {
        from: Pos2,
        to: Pos2,
        width: f32,
        color: Color32,
    },
    Circle {
        center: Pos2,
        radius: f32,
        fill: Color32,
        stroke: Option<(f32, Color32)>,
    },
    Text {
        anchor: Pos2,
        text: String,
        size: f32,
        color: Color32,
    },
}

pub(in crate::app) struct Scene {
    pub size: Vec2,
    pub background: Color32,
    pub primitives: Vec<Primitive>,
}

#[derive(Clone, Copy, Default)]
pub(in crate::app) struct SceneOptions<'a> {
    pub hovered: Option<usize>,
    pub selected: Option<usize>,
    pub matches: Option<&'a HashSet<usize>>,
    pub show_labels: bool,
    pub now: f64,
}

/// `1 − age / window` for items inside the highlight window, else `None`.
pub(in crate::app) fn highlight_alpha(created_at: Option<f64>, now: f64) -> Option<f32> {
    let age = now - created_at?;
    if !(0.0..HIGHLIGHT_WINDOW_SECS).contains(&age) {
        return None;
    }
    Some((1.0 - age / HIGHLIGHT_WINDOW_SECS) as f32)
}

pub(in crate::app) fn build_scene(
    graph: &RenderGraph,
    size: Vec2,
    options: SceneOptions<'_>,
) -> Scene {
    let mut primitives = Vec::with_capacity(graph.edges.len() + graph.nodes.len() * 2);
    let searching = options.matches.is_some_and(|matches| !matches.is_empty());

    for edge in &graph.edges {
        let (Some(from), Some(to)) = (edge.from, edge.to) else {
            continue;
        };
        let (Some(start), Some(end)) = (graph.nodes.get(from), graph.nodes.get(to)) else {
            continue;
        };

        let opacity = 0.25 + 0.65 * edge.weight.clamp(0.0, 1.0);
        let mut color = edge_color(edge.kind);
        let mut width = 1.0 + edge.weight.clamp(0.0, 3.0) * 0.6;
        if let Some(alpha) = highlight_alpha(edge.created_at_time, options.now) {
            color = blend_color(color, HIGHLIGHT, alpha);
            width += alpha * 1.5;
        }
        let touches_hover = options
            .hovered
            .is_some_and(|hovered| hovered == from || hovered == to);
        if touches_hover {
            color = blend_color(color, HOVER, 0.6);
        }

        // Opacity goes on last so the blends above mix opaque channels.
        primitives.push(Primitive::Line {
            from: start.pos.to_pos2(),
            to: end.pos.to_pos2(),
            width,
            color: with_alpha(color, opacity),
        });
    }

    for (index, node) in graph.nodes.iter().enumerate() {
        let is_hovered = options.hovered == Some(index);
        let is_selected = options.selected == Some(index);
        let is_match = options.matches.is_some_and(|matches| matches.contains(&index));

        let mut fill = kind_color(node.kind);
        if let Some(alpha) = highlight_alpha(node.created_at_time, options.now) {
            fill = blend_color(fill, Color32::WHITE, alpha * 0.5);
        }
        fill = if is_hovered {
            HOVER
        } else if is_match {
            blend_color(fill, SEARCH_MATCH, 0.68)
        } else if searching {
            dim_color(fill, 0.4)
        } else {
            fill
        };

        let radius = if is_hovered { node.radius * 1.35 } else { node.radius };
        let stroke = if is_selected {
            (2.4, HIGHLIGHT)
        } else {
            (1.0, NODE_OUTLINE)
        };
        primitives.push(Primitive::Circle {
            center: node.pos.to_pos2(),
            radius,
            fill,
            stroke: Some(stroke),
        });

        if options.show_labels || is_hovered || is_selected {
            primitives.push(Primitive::Text {
                anchor: pos2(node.pos.x + radius + 5.0, node.pos.y),
                text: short_label(&node.label, LABEL_MAX_CHARS),
                size: LABEL_SIZE,
                color: LABEL,
            });
        }
    }

    Scene {
        size,
        background: BACKGROUND,
        primitives,
    }
}

impl Scene {
    /// Paints every primitive offset by `rect.min`.
    pub(in crate::app) fn paint(&self, painter: &Painter, rect: Rect) {
        painter.rect_filled(rect, 0.0, self.background);
        let offset = rect.min.to_vec2();

        for primitive in &self.primitives {
            match primitive {
                Primitive::Line {
                    from,
                    to,
                    width,
                    color,
                } => {
                    painter.line_segment(
                        [*from + offset, *to + offset],
                        Stroke::new(*width, *color),
                    );
                }
                Primitive::Circle {
                    center,
                    radius,
                    fill,
                    stroke,
                } => {
                    painter.circle_filled(*center + offset, *radius, *fill);
                    if let Some((width, color)) = stroke {
                        painter.circle_stroke(
                            *center + offset,
                            *radius,
                            Stroke::new(*width, *color),
                        );
                    }
                }
                Primitive::Text {
                    anchor,
                    text,
                    size,
                    color,
                } => {
                    painter.text(
                        *anchor + offset,
                        Align2::LEFT_CENTER,
                        text,
                        FontId::proportional(*size),
                        *color,
                    );
                }
            }
        }
    }
}
