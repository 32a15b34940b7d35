use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    MemoryChunk,
    Hub,
    Tracer,
    Organ,
    Sigil,
    #[default]
    #[serde(other)]
    Unknown,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::MemoryChunk => "memory-chunk",
            Self::Hub => "hub",
            Self::Tracer => "tracer",
            Self::Organ => "organ",
            Self::Sigil => "sigil",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    Lineage,
    Association,
    Flow,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotOrigin {
    #[default]
    Live,
    File,
    Lineage,
    Mock,
    Export,
}

impl SnapshotOrigin {
    pub fn label(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::File => "file",
            Self::Lineage => "lineage",
            Self::Mock => "mock",
            Self::Export => "export",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_tick: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_time: Option<f64>,
    /// Layout hint from the source. Only consulted when the node is first placed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            kind,
            created_at_tick: None,
            created_at_time: None,
            x: None,
            y: None,
        }
    }

    pub fn position_hint(&self) -> Option<(f32, f32)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        }
    }
}

fn default_weight() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    #[serde(default)]
    pub id: String,
    #[serde(alias = "source")]
    pub from: String,
    #[serde(alias = "target")]
    pub to: String,
    #[serde(default)]
    pub kind: EdgeKind,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_time: Option<f64>,
}

impl GraphEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
        let from = from.into();
        let to = to.into();
        Self {
            id: format!("{from}->{to}"),
            from,
            to,
            kind,
            weight: 1.0,
            created_at_time: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    pub node_count: usize,
    pub edge_count: usize,
    pub source: SnapshotOrigin,
    pub timestamp: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub metadata: GraphMetadata,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Snapshot {
    pub fn new(
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
        source: SnapshotOrigin,
        timestamp: f64,
    ) -> Self {
        Self {
            metadata: GraphMetadata {
                node_count: nodes.len(),
                edge_count: edges.len(),
                source,
                timestamp,
            },
            nodes,
            edges,
        }
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|node| node.id.as_str()).collect()
    }

    #[cfg(test)]
    pub fn edge_ids(&self) -> HashSet<&str> {
        self.edges.iter().map(|edge| edge.id.as_str()).collect()
    }

    /// Edges whose endpoints are not both present in this snapshot.
    pub fn dangling_edge_count(&self) -> usize {
        let ids = self.node_ids();
        self.edges
            .iter()
            .filter(|edge| !ids.contains(edge.from.as_str()) || !ids.contains(edge.to.as_str()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_falls_back() {
        let node: GraphNode =
            serde_json::from_str(r#"{"id":"a","kind":"nebula"}"#).expect("valid node");
        assert_eq!(node.kind, NodeKind::Unknown);

        let node: GraphNode =
            serde_json::from_str(r#"{"id":"b","kind":"memory-chunk"}"#).expect("valid node");
        assert_eq!(node.kind, NodeKind::MemoryChunk);
    }

    #[test]
    fn dangling_edges_are_counted() {
        let snapshot = Snapshot::new(
            vec![GraphNode::new("a", NodeKind::Hub), GraphNode::new("b", NodeKind::Hub)],
            vec![
                GraphEdge::new("a", "b", EdgeKind::Flow),
                GraphEdge::new("a", "ghost", EdgeKind::Flow),
            ],
            SnapshotOrigin::Live,
            0.0,
        );
        assert_eq!(snapshot.dangling_edge_count(), 1);
        assert_eq!(snapshot.metadata.edge_count, 2);
    }

    #[test]
    fn position_hint_requires_both_axes() {
        let mut node = GraphNode::new("a", NodeKind::Organ);
        node.x = Some(10.0);
        assert_eq!(node.position_hint(), None);
        node.y = Some(f32::NAN);
        assert_eq!(node.position_hint(), None);
        node.y = Some(4.0);
        assert_eq!(node.position_hint(), Some((10.0, 4.0)));
    }
}
