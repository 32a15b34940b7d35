use rand::Rng;

use super::graph::{EdgeKind, GraphEdge, GraphNode, NodeKind, Snapshot, SnapshotOrigin};

const MOCK_KINDS: [NodeKind; 4] = [
    NodeKind::MemoryChunk,
    NodeKind::Hub,
    NodeKind::Tracer,
    NodeKind::Organ,
];

/// Placeholder graph shown in development mode when the real source fails.
pub fn mock_snapshot<R: Rng + ?Sized>(rng: &mut R, now: f64) -> Snapshot {
    let node_count = rng.gen_range(6..=10);

    let nodes = (0..node_count)
        .map(|index| {
            let kind = if index == 0 {
                NodeKind::Hub
            } else {
                MOCK_KINDS[rng.gen_range(0..MOCK_KINDS.len())]
            };
            let mut node = GraphNode::new(format!("mock-{index}"), kind);
            node.label = format!("{} {index}", kind.label());
            node.created_at_time = Some(now - rng.gen_range(0.0..30.0));
            node
        })
        .collect::<Vec<_>>();

    let mut edges = Vec::new();
    for from in 0..node_count {
        for to in (from + 1)..node_count {
            if rng.gen_bool(0.22) {
                let mut edge = GraphEdge::new(
                    nodes[from].id.clone(),
                    nodes[to].id.clone(),
                    EdgeKind::Association,
                );
                edge.weight = rng.gen_range(0.2..1.0);
                edge.created_at_time = Some(now - rng.gen_range(0.0..10.0));
                edges.push(edge);
            }
        }
    }

    // At least one edge, hub first.
    if edges.is_empty() {
        edges.push(GraphEdge::new(
            nodes[0].id.clone(),
            nodes[1].id.clone(),
            EdgeKind::Association,
        ));
    }

    Snapshot::new(nodes, edges, SnapshotOrigin::Mock, now)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn mock_snapshot_is_small_and_consistent() {
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let snapshot = mock_snapshot(&mut rng, 1_000.0);
            assert!((6..=10).contains(&snapshot.nodes.len()));
            assert!(!snapshot.edges.is_empty());
            assert_eq!(snapshot.dangling_edge_count(), 0);
            assert_eq!(snapshot.metadata.source, SnapshotOrigin::Mock);
            assert_eq!(snapshot.node_ids().len(), snapshot.nodes.len());
        }
    }
}
