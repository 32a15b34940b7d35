use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::feed::{EdgeKind, GraphEdge, GraphNode, NodeKind, Snapshot, SnapshotOrigin};
use crate::logs::RebloomEvent;

/// Deepest level laid out below a root (the root is depth 0).
pub const MAX_DEPTH: usize = 5;
const ROW_HEIGHT: f32 = 34.0;
const MARGIN: f32 = 24.0;

#[derive(Clone, Debug, Default)]
struct LineageInfo {
    topic: Option<String>,
    method: Option<String>,
}

/// Parent→child rebloom relations. Source data may contain cycles.
#[derive(Clone, Debug, Default)]
pub struct LineageGraph {
    order: Vec<String>,
    children: BTreeMap<String, Vec<String>>,
    parents: BTreeMap<String, Vec<String>>,
    info: HashMap<String, LineageInfo>,
}

#[derive(Clone, Debug, Default)]
pub struct LineageLayout {
    /// Placed ids in placement order with their canvas position.
    pub positions: Vec<(String, f32, f32)>,
    /// Nodes left out because of the depth bound or the vertical bound.
    pub truncated: usize,
}

impl LineageLayout {
    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        self.positions.iter().any(|(placed, _, _)| placed == id)
    }
}

struct LayoutWalk<'a> {
    graph: &'a LineageGraph,
    visited: HashSet<&'a str>,
    placed: Vec<(String, f32, f32)>,
    next_row: usize,
    max_rows: usize,
    column_width: f32,
    truncated: usize,
}

impl<'a> LayoutWalk<'a> {
    /// Returns the row centre of the placed subtree, or `None` if nothing fit.
    fn place(&mut self, id: &'a str, depth: usize) -> Option<f32> {
        if !self.visited.insert(id) {
            return None;
        }

        let graph = self.graph;
        let mut child_rows = Vec::new();
        if depth < MAX_DEPTH {
            for child in graph.children_of(id) {
                if self.visited.contains(child.as_str()) {
                    continue;
                }
                if let Some(row) = self.place(child.as_str(), depth + 1) {
                    child_rows.push(row);
                }
            }
        } else {
            let hidden = graph
                .children_of(id)
                .iter()
                .filter(|child| !self.visited.contains(child.as_str()))
                .count();
            self.truncated += hidden;
        }

        let row = if child_rows.is_empty() {
            if self.next_row >= self.max_rows {
                self.truncated += 1;
                return None;
            }
            let row = self.next_row as f32;
            self.next_row += 1;
            row
        } else {
            child_rows.iter().sum::<f32>() / child_rows.len() as f32
        };

        let x = MARGIN + depth as f32 * self.column_width;
        let y = MARGIN + ROW_HEIGHT * 0.5 + row * ROW_HEIGHT;
        self.placed.push((id.to_owned(), x, y));
        Some(row)
    }
}

impl LineageGraph {
    pub fn from_events(events: &[RebloomEvent]) -> Self {
        let mut graph = Self::default();
        for event in events {
            graph.touch(&event.source_id);
            graph.touch(&event.rebloom_id);

            let info = graph.info.entry(event.rebloom_id.clone()).or_default();
            info.topic = Some(event.topic.clone());
            info.method = Some(event.method.clone());

            if event.source_id == event.rebloom_id {
                continue;
            }
            let children = graph.children.entry(event.source_id.clone()).or_default();
            if !children.contains(&event.rebloom_id) {
                children.push(event.rebloom_id.clone());
                graph
                    .parents
                    .entry(event.rebloom_id.clone())
                    .or_default()
                    .push(event.source_id.clone());
            }
        }
        graph
    }

    fn touch(&mut self, id: &str) {
        if !self.info.contains_key(id) {
            self.info.insert(id.to_owned(), LineageInfo::default());
            self.order.push(id.to_owned());
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn children_of(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn parents_of(&self, id: &str) -> &[String] {
        self.parents.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn topic_of(&self, id: &str) -> Option<&str> {
        self.info.get(id).and_then(|info| info.topic.as_deref())
    }

    pub fn method_of(&self, id: &str) -> Option<&str> {
        self.info.get(id).and_then(|info| info.method.as_deref())
    }

    /// Nodes without parents, in first-seen order. A graph made only of
    /// cycles falls back to its lexicographically smallest id.
    pub fn roots(&self) -> Vec<&str> {
        let roots = self
            .order
            .iter()
            .filter(|id| self.parents_of(id).is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>();
        if !roots.is_empty() {
            return roots;
        }
        self.order.iter().map(String::as_str).min().into_iter().collect()
    }

    fn reachable_from<'s>(&'s self, starts: &[&'s str]) -> HashSet<&'s str> {
        let mut reachable = starts.iter().copied().collect::<HashSet<_>>();
        let mut queue = starts.iter().copied().collect::<VecDeque<_>>();
        while let Some(current) = queue.pop_front() {
            for child in self.children_of(current) {
                if reachable.insert(child.as_str()) {
                    queue.push_back(child.as_str());
                }
            }
        }
        reachable
    }

    /// Every ancestor of `id`, nearest first. Terminates on cyclic data.
    pub fn ancestors(&self, id: &str) -> Vec<String> {
        let mut visited = HashSet::from([id]);
        let mut queue = VecDeque::from([id]);
        let mut ancestors = Vec::new();

        while let Some(current) = queue.pop_front() {
            for parent in self.parents_of(current) {
                if visited.insert(parent.as_str()) {
                    ancestors.push(parent.clone());
                    queue.push_back(parent.as_str());
                }
            }
        }
        ancestors
    }

    /// Left-to-right tree layout inside `width` × `height`.
    ///
    /// Roots come first; a component unreachable from any root (a pure cycle)
    /// is entered from its first-seen node. Rows that would cross the bottom
    /// edge are dropped.
    pub fn layout(&self, width: f32, height: f32) -> LineageLayout {
        let usable_height = (height - MARGIN * 2.0).max(ROW_HEIGHT);
        let usable_width = (width - MARGIN * 2.0).max(0.0);
        let mut walk = LayoutWalk {
            graph: self,
            visited: HashSet::with_capacity(self.order.len()),
            placed: Vec::with_capacity(self.order.len()),
            next_row: 0,
            max_rows: (usable_height / ROW_HEIGHT).floor().max(1.0) as usize,
            column_width: usable_width / MAX_DEPTH as f32,
            truncated: 0,
        };

        let roots = self.roots();
        let mut reachable = self.reachable_from(&roots);
        for root in roots {
            walk.place(root, 0);
        }
        for id in &self.order {
            if reachable.contains(id.as_str()) {
                continue;
            }
            reachable.extend(self.reachable_from(&[id.as_str()]));
            walk.place(id.as_str(), 0);
        }

        LineageLayout {
            positions: walk.placed,
            truncated: walk.truncated,
        }
    }

    pub fn to_snapshot(&self, layout: &LineageLayout, now: f64) -> Snapshot {
        let placed = layout
            .positions
            .iter()
            .map(|(id, _, _)| id.as_str())
            .collect::<HashSet<_>>();

        let nodes = layout
            .positions
            .iter()
            .map(|(id, x, y)| {
                let kind = if self.parents_of(id).is_empty() {
                    NodeKind::Hub
                } else {
                    NodeKind::MemoryChunk
                };
                let mut node = GraphNode::new(id.clone(), kind);
                if let Some(topic) = self.topic_of(id) {
                    node.label = format!("{id} · {topic}");
                }
                node.x = Some(*x);
                node.y = Some(*y);
                node
            })
            .collect::<Vec<_>>();

        let mut edges = Vec::new();
        for (parent, children) in &self.children {
            if !placed.contains(parent.as_str()) {
                continue;
            }
            for child in children {
                if placed.contains(child.as_str()) {
                    edges.push(GraphEdge::new(parent.clone(), child.clone(), EdgeKind::Lineage));
                }
            }
        }

        Snapshot::new(nodes, edges, SnapshotOrigin::Lineage, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(source: &str, rebloom: &str) -> RebloomEvent {
        RebloomEvent {
            timestamp: None,
            source_id: source.to_owned(),
            rebloom_id: rebloom.to_owned(),
            method: "auto".to_owned(),
            topic: "drift".to_owned(),
            reason: None,
        }
    }

    #[test]
    fn two_node_cycle_terminates() {
        let graph = LineageGraph::from_events(&[event("A", "B"), event("B", "A")]);
        assert_eq!(graph.roots(), vec!["A"]);

        let layout = graph.layout(800.0, 600.0);
        assert_eq!(layout.positions.len(), 2);
        assert!(layout.contains("A") && layout.contains("B"));

        let ancestors = graph.ancestors("A");
        assert_eq!(ancestors, vec!["B".to_owned()]);

        let snapshot = graph.to_snapshot(&layout, 0.0);
        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.edges.len(), 2);
    }

    #[test]
    fn depth_is_bounded() {
        let chain = (0..10)
            .map(|index| event(&format!("n{index}"), &format!("n{}", index + 1)))
            .collect::<Vec<_>>();
        let graph = LineageGraph::from_events(&chain);
        let layout = graph.layout(1000.0, 800.0);

        assert_eq!(layout.positions.len(), MAX_DEPTH + 1);
        assert!(layout.contains("n5"));
        assert!(!layout.contains("n6"));
        assert!(layout.truncated >= 1);
    }

    #[test]
    fn rows_beyond_vertical_bound_are_truncated() {
        let fan = (0..40)
            .map(|index| event("root", &format!("leaf{index}")))
            .collect::<Vec<_>>();
        let graph = LineageGraph::from_events(&fan);
        let height = 200.0;
        let layout = graph.layout(600.0, height);

        assert!(layout.positions.len() < 41);
        assert!(layout.truncated > 0);
        for (_, x, y) in &layout.positions {
            assert!(*y <= height - MARGIN + 0.001, "y {y} beyond bound");
            assert!(*x >= MARGIN);
        }
    }

    #[test]
    fn children_sit_right_of_parents() {
        let graph = LineageGraph::from_events(&[event("p", "c1"), event("p", "c2")]);
        let layout = graph.layout(600.0, 400.0);
        let find = |id: &str| {
            layout
                .positions
                .iter()
                .find(|(placed, _, _)| placed == id)
                .map(|(_, x, y)| (*x, *y))
                .expect("placed")
        };
        let (px, py) = find("p");
        let (c1x, c1y) = find("c1");
        let (c2x, c2y) = find("c2");
        assert!(c1x > px && c2x > px);
        assert!((py - (c1y + c2y) / 2.0).abs() < 0.001);
    }
}
