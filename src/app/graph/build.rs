use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use rand::Rng;

use crate::config::InitialPlacement;
use crate::feed::{GraphEdge, Snapshot};
use crate::util::stable_pair;

use super::super::physics::SimulationParams;
use super::super::{RenderEdge, RenderGraph, RenderNode, ViewModel};

const NEAR_PARENT_OFFSET: f32 = 40.0;

fn clamp_to_canvas(position: Vec2, params: &SimulationParams) -> Vec2 {
    let low = vec2(
        params.margin.min(params.width * 0.5),
        params.margin.min(params.height * 0.5),
    );
    let high = vec2(
        (params.width - params.margin).max(low.x),
        (params.height - params.margin).max(low.y),
    );
    position.clamp(low, high)
}

fn random_position<R: Rng + ?Sized>(rng: &mut R, params: &SimulationParams) -> Vec2 {
    let (low, high) = (params.margin, (params.width - params.margin).max(params.margin + 1.0));
    let x = rng.gen_range(low..high);
    let (low, high) = (params.margin, (params.height - params.margin).max(params.margin + 1.0));
    let y = rng.gen_range(low..high);
    clamp_to_canvas(vec2(x, y), params)
}

fn circular_position(index: usize, count: usize, params: &SimulationParams) -> Vec2 {
    let radius = (params.width.min(params.height) * 0.5 - params.margin).max(0.0) * 0.6;
    let angle = (index as f32 / count.max(1) as f32) * std::f32::consts::TAU;
    clamp_to_canvas(params.center() + vec2(angle.cos(), angle.sin()) * radius, params)
}

/// Offset from an already-placed node that links to `id`, if there is one.
fn near_parent_position(
    id: &str,
    incoming: &HashMap<&str, Vec<&str>>,
    placed: &HashMap<String, Vec2>,
    params: &SimulationParams,
) -> Option<Vec2> {
    let parent = incoming
        .get(id)?
        .iter()
        .find_map(|parent| placed.get(*parent))?;
    let (jx, jy) = stable_pair(id);
    let mut direction = vec2(jx, jy);
    direction = if direction.length_sq() <= 0.0001 {
        vec2(1.0, 0.0)
    } else {
        direction.normalized()
    };
    Some(clamp_to_canvas(*parent + direction * NEAR_PARENT_OFFSET, params))
}

fn render_edge(edge: &GraphEdge) -> RenderEdge {
    RenderEdge {
        id: edge.id.clone(),
        from_id: edge.from.clone(),
        to_id: edge.to.clone(),
        from: None,
        to: None,
        kind: edge.kind,
        weight: edge.weight,
        created_at_time: edge.created_at_time,
    }
}

/// Turns a fresh snapshot into the next render graph.
///
/// Nodes already on screen keep their position and velocity; everything else
/// about them comes from `snapshot`. New nodes go to their layout hint when
/// the source gave one, otherwise wherever `placement` puts them. Nodes
/// missing from `snapshot` are dropped and edges are replaced wholesale.
pub(in crate::app) fn reconcile<R: Rng + ?Sized>(
    previous: RenderGraph,
    snapshot: &Snapshot,
    params: &SimulationParams,
    placement: InitialPlacement,
    rng: &mut R,
) -> RenderGraph {
    let RenderGraph {
        nodes: prior_nodes,
        physics_scratch,
        ..
    } = previous;
    let mut prior_nodes = prior_nodes
        .into_iter()
        .map(|node| (node.id.clone(), node))
        .collect::<HashMap<_, _>>();

    let mut incoming = HashMap::<&str, Vec<&str>>::new();
    for edge in &snapshot.edges {
        incoming.entry(edge.to.as_str()).or_default().push(edge.from.as_str());
    }

    let mut placed = prior_nodes
        .iter()
        .filter(|(id, _)| snapshot.nodes.iter().any(|node| &node.id == *id))
        .map(|(id, node)| (id.clone(), node.pos))
        .collect::<HashMap<_, _>>();

    let count = snapshot.nodes.len();
    let mut nodes = Vec::with_capacity(count);
    for (index, node) in snapshot.nodes.iter().enumerate() {
        if let Some(mut existing) = prior_nodes.remove(&node.id) {
            existing.refresh_from(node);
            nodes.push(existing);
            continue;
        }

        let position = match node.position_hint() {
            Some((x, y)) => clamp_to_canvas(vec2(x, y), params),
            None => match placement {
                InitialPlacement::Random => random_position(rng, params),
                InitialPlacement::Circular => circular_position(index, count, params),
                InitialPlacement::NearParent => {
                    near_parent_position(&node.id, &incoming, &placed, params)
                        .unwrap_or_else(|| random_position(rng, params))
                }
            },
        };
        placed.insert(node.id.clone(), position);
        nodes.push(RenderNode::from_graph_node(node, position));
    }

    let edges = snapshot.edges.iter().map(render_edge).collect();
    let mut graph = RenderGraph::from_parts(nodes, edges);
    graph.origin = snapshot.metadata.source;
    graph.physics_scratch = physics_scratch;
    graph
}

impl ViewModel {
    pub(in crate::app) fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        let hovered_id = self
            .hovered
            .and_then(|index| self.graph.nodes.get(index))
            .map(|node| node.id.clone());

        let previous = std::mem::take(&mut self.graph);
        self.graph = reconcile(previous, snapshot, &self.params, self.placement, &mut self.rng);
        self.graph_revision = self.graph_revision.wrapping_add(1);
        self.search_match_cache = None;
        self.hovered = hovered_id.and_then(|id| self.graph.index_by_id.get(&id).copied());
        self.physics_moving = true;

        let dangling = self.graph.dangling_edge_count();
        if dangling > 0 {
            tracing::debug!(dangling, "snapshot has edges with missing endpoints");
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::feed::{EdgeKind, GraphNode, NodeKind, SnapshotOrigin};

    fn snapshot(ids: &[&str], links: &[(&str, &str)]) -> Snapshot {
        Snapshot::new(
            ids.iter().map(|id| GraphNode::new(*id, NodeKind::MemoryChunk)).collect(),
            links
                .iter()
                .map(|(from, to)| GraphEdge::new(*from, *to, EdgeKind::Association))
                .collect(),
            SnapshotOrigin::Live,
            0.0,
        )
    }

    fn position_of(graph: &RenderGraph, id: &str) -> Vec2 {
        graph.nodes[graph.index_by_id[id]].pos
    }

    #[test]
    fn surviving_nodes_keep_position_and_velocity() {
        let params = SimulationParams::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut graph = reconcile(
            RenderGraph::default(),
            &snapshot(&["a", "b", "c"], &[("a", "b")]),
            &params,
            InitialPlacement::Random,
            &mut rng,
        );
        let a_index = graph.index_by_id["a"];
        graph.nodes[a_index].pos = vec2(123.0, 234.0);
        graph.nodes[a_index].velocity = vec2(1.5, -2.0);

        let mut next = snapshot(&["c", "a", "d"], &[("a", "d"), ("a", "ghost")]);
        next.nodes[1].label = "renamed".to_owned();
        next.nodes[1].kind = NodeKind::Hub;
        let graph = reconcile(graph, &next, &params, InitialPlacement::Random, &mut rng);

        assert_eq!(graph.nodes.len(), 3);
        assert!(!graph.index_by_id.contains_key("b"));
        let a = &graph.nodes[graph.index_by_id["a"]];
        assert_eq!(a.pos, vec2(123.0, 234.0));
        assert_eq!(a.velocity, vec2(1.5, -2.0));
        assert_eq!(a.label, "renamed");
        assert_eq!(a.kind, NodeKind::Hub);

        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.dangling_edge_count(), 1);
        assert_eq!(graph.degree[graph.index_by_id["a"]], 1);
    }

    #[test]
    fn new_nodes_use_layout_hints_clamped_to_canvas() {
        let params = SimulationParams::default();
        let mut next = snapshot(&["hinted", "outside"], &[]);
        next.nodes[0].x = Some(300.0);
        next.nodes[0].y = Some(200.0);
        next.nodes[1].x = Some(5_000.0);
        next.nodes[1].y = Some(-40.0);

        let graph = reconcile(
            RenderGraph::default(),
            &next,
            &params,
            InitialPlacement::Circular,
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(position_of(&graph, "hinted"), vec2(300.0, 200.0));
        assert_eq!(
            position_of(&graph, "outside"),
            vec2(params.width - params.margin, params.margin)
        );
    }

    #[test]
    fn placement_strategies_stay_inside_canvas() {
        let params = SimulationParams::default();
        let ids = (0..12).map(|index| format!("n{index}")).collect::<Vec<_>>();
        let id_refs = ids.iter().map(String::as_str).collect::<Vec<_>>();
        let next = snapshot(&id_refs, &[("n0", "n1"), ("n1", "n2")]);

        for placement in InitialPlacement::ALL {
            let graph = reconcile(
                RenderGraph::default(),
                &next,
                &params,
                placement,
                &mut StdRng::seed_from_u64(9),
            );
            for node in &graph.nodes {
                assert!(node.pos.x >= params.margin && node.pos.x <= params.width - params.margin);
                assert!(node.pos.y >= params.margin && node.pos.y <= params.height - params.margin);
            }
        }
    }

    #[test]
    fn near_parent_places_children_beside_their_parent() {
        let params = SimulationParams::default();
        let mut rng = StdRng::seed_from_u64(5);
        let graph = reconcile(
            RenderGraph::default(),
            &snapshot(&["root"], &[]),
            &params,
            InitialPlacement::Random,
            &mut rng,
        );
        let root = position_of(&graph, "root");

        let graph = reconcile(
            graph,
            &snapshot(&["root", "child"], &[("root", "child")]),
            &params,
            InitialPlacement::NearParent,
            &mut rng,
        );
        let child = position_of(&graph, "child");
        assert!((child - root).length() <= NEAR_PARENT_OFFSET + 0.01);
        assert_eq!(position_of(&graph, "root"), root);
    }
}
