use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use eframe::egui::vec2;
use tracing::{info, warn};

use crate::feed::{GraphEdge, GraphNode, Snapshot, SnapshotOrigin};
use crate::util::unix_now;

use super::graph::scene::{Primitive, Scene, SceneOptions, build_scene};
use super::render_utils::svg_color;
use super::{RenderGraph, ViewModel};

/// The render graph as a snapshot, with current positions as layout hints.
pub(super) fn graph_snapshot(graph: &RenderGraph, now: f64) -> Snapshot {
    let nodes = graph
        .nodes
        .iter()
        .map(|node| {
            let mut exported = GraphNode::new(node.id.clone(), node.kind);
            exported.label = node.label.clone();
            exported.created_at_tick = node.created_at_tick;
            exported.created_at_time = node.created_at_time;
            exported.x = Some(node.pos.x);
            exported.y = Some(node.pos.y);
            exported
        })
        .collect();

    let edges = graph
        .edges
        .iter()
        .map(|edge| GraphEdge {
            id: edge.id.clone(),
            from: edge.from_id.clone(),
            to: edge.to_id.clone(),
            kind: edge.kind,
            weight: edge.weight,
            created_at_time: edge.created_at_time,
        })
        .collect();

    Snapshot::new(nodes, edges, SnapshotOrigin::Export, now)
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub(super) fn scene_to_svg(scene: &Scene) -> String {
    let (width, height) = (scene.size.x, scene.size.y);
    let mut svg = String::new();
    let (background, _) = svg_color(scene.background);

    // Writing into a String cannot fail.
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" \
         viewBox=\"0 0 {width:.0} {height:.0}\">"
    );
    let _ = writeln!(svg, r#"  <rect width="100%" height="100%" fill="{background}"/>"#);

    for primitive in &scene.primitives {
        match primitive {
            Primitive::Line {
                from,
                to,
                width,
                color,
            } => {
                let (stroke, opacity) = svg_color(*color);
                let _ = writeln!(
                    svg,
                    "  <line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" \
                     stroke=\"{stroke}\" stroke-opacity=\"{opacity:.3}\" \
                     stroke-width=\"{width:.2}\"/>",
                    from.x, from.y, to.x, to.y
                );
            }
            Primitive::Circle {
                center,
                radius,
                fill,
                stroke,
            } => {
                let (fill, fill_opacity) = svg_color(*fill);
                let stroke = stroke
                    .map(|(width, color)| {
                        let (color, opacity) = svg_color(color);
                        format!(
                            " stroke=\"{color}\" stroke-opacity=\"{opacity:.3}\" \
                             stroke-width=\"{width:.2}\""
                        )
                    })
                    .unwrap_or_default();
                let _ = writeln!(
                    svg,
                    "  <circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{radius:.2}\" fill=\"{fill}\" \
                     fill-opacity=\"{fill_opacity:.3}\"{stroke}/>",
                    center.x, center.y
                );
            }
            Primitive::Text {
                anchor,
                text,
                size,
                color,
            } => {
                let (fill, _) = svg_color(*color);
                let _ = writeln!(
                    svg,
                    "  <text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{size:.1}\" \
                     font-family=\"sans-serif\" dominant-baseline=\"middle\" \
                     fill=\"{fill}\">{}</text>",
                    anchor.x,
                    anchor.y,
                    escape_xml(text)
                );
            }
        }
    }

    svg.push_str("</svg>\n");
    svg
}

fn write_export(dir: &Path, extension: &str, contents: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;

    let millis = (unix_now() * 1000.0) as u64;
    let path = dir.join(format!("mycelium-{millis}.{extension}"));
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

pub(super) fn export_json(graph: &RenderGraph, dir: &Path) -> Result<PathBuf> {
    let snapshot = graph_snapshot(graph, unix_now());
    let json = serde_json::to_string_pretty(&snapshot).context("failed to serialize snapshot")?;
    write_export(dir, "json", &json)
}

pub(super) fn export_svg(scene: &Scene, dir: &Path) -> Result<PathBuf> {
    write_export(dir, "svg", &scene_to_svg(scene))
}

impl ViewModel {
    fn report_export(&mut self, what: &str, result: Result<PathBuf>) {
        self.status_line = Some(match result {
            Ok(path) => {
                info!(path = %path.display(), "{what} export written");
                format!("Exported {what} to {}", path.display())
            }
            Err(error) => {
                warn!(error = format!("{error:#}"), "{what} export failed");
                format!("{what} export failed: {error:#}")
            }
        });
    }

    pub(in crate::app) fn export_json(&mut self) {
        let result = export_json(&self.graph, &self.export_dir);
        self.report_export("JSON", result);
    }

    pub(in crate::app) fn export_svg(&mut self) {
        let matches = self.cached_search_matches();
        let scene = build_scene(
            &self.graph,
            vec2(self.params.width, self.params.height),
            SceneOptions {
                matches: matches.as_deref(),
                show_labels: self.show_labels,
                now: unix_now(),
                ..SceneOptions::default()
            },
        );
        let result = export_svg(&scene, &self.export_dir);
        self.report_export("SVG", result);
    }
}
