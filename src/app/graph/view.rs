use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{Align2, Color32, FontId, Sense, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::{format_age, unix_now};

use super::super::physics::step_physics;
use super::super::{SearchMatchCache, ViewModel};
use super::scene::{SceneOptions, build_scene, highlight_alpha};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    pub(in crate::app) fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.graph_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .graph
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                fuzzy_match_score(&matcher, &node.label, query).is_some()
                    || fuzzy_match_score(&matcher, &node.id, query).is_some()
            })
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph_revision: self.graph_revision,
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());
        let painter = ui.painter_at(rect);

        self.params.width = rect.width();
        self.params.height = rect.height();
        self.viewport.set(rect.width(), rect.height());

        if self.live_physics {
            self.physics_moving = step_physics(&mut self.graph, &self.params);
        }

        self.update_hover(ui, rect, &response);
        self.handle_graph_click(&response);

        let matches = self.cached_search_matches();
        let now = unix_now();
        let selected = self
            .selected
            .as_ref()
            .and_then(|id| self.graph.index_by_id.get(id).copied());
        let scene = build_scene(
            &self.graph,
            rect.size(),
            SceneOptions {
                hovered: self.hovered,
                selected,
                matches: matches.as_deref(),
                show_labels: self.show_labels,
                now,
            },
        );
        scene.paint(&painter, rect);

        if let Some(node) = self.hovered.and_then(|index| self.graph.nodes.get(index)) {
            let age = node
                .created_at_time
                .map(|created| format_age(now - created))
                .unwrap_or_else(|| "age unknown".to_owned());
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{}  |  {}  |  {}", node.label, node.kind.label(), age),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        let fading = self
            .graph
            .edges
            .iter()
            .map(|edge| edge.created_at_time)
            .chain(self.graph.nodes.iter().map(|node| node.created_at_time))
            .any(|created| highlight_alpha(created, now).is_some());
        if (self.live_physics && self.physics_moving) || fading {
            ui.ctx().request_repaint();
        }
    }
}
