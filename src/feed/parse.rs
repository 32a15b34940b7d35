use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::graph::{GraphEdge, GraphNode, Snapshot, SnapshotOrigin};

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    source: Option<Value>,
    #[serde(default)]
    timestamp: Option<Value>,
}

/// Parses a `{ metadata, nodes[], edges[] }` document.
///
/// Individual malformed nodes or edges are dropped rather than failing the
/// whole snapshot. Counts in the metadata are always recomputed.
pub fn parse_snapshot(raw: &str, fallback_origin: SnapshotOrigin, now: f64) -> Result<Snapshot> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON snapshot")?;
    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("unexpected JSON type for snapshot; expected an object"))?;

    let metadata = match object.get("metadata") {
        Some(value) => RawMetadata::deserialize(value).context("invalid metadata block")?,
        None => RawMetadata::default(),
    };

    let raw_nodes = object
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("snapshot has no nodes array"))?;

    let mut seen_nodes = HashSet::with_capacity(raw_nodes.len());
    let mut nodes = Vec::with_capacity(raw_nodes.len());
    let mut rejected_nodes = 0usize;
    for value in raw_nodes {
        let Ok(mut node) = GraphNode::deserialize(value) else {
            rejected_nodes += 1;
            continue;
        };
        if node.id.is_empty() {
            rejected_nodes += 1;
            continue;
        }
        if !seen_nodes.insert(node.id.clone()) {
            warn!(id = %node.id, "duplicate node id in snapshot; keeping first occurrence");
            continue;
        }
        if node.label.is_empty() {
            node.label = node.id.clone();
        }
        nodes.push(node);
    }

    let raw_edges = object
        .get("edges")
        .or_else(|| object.get("links"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut seen_edges = HashSet::with_capacity(raw_edges.len());
    let mut edges = Vec::with_capacity(raw_edges.len());
    let mut rejected_edges = 0usize;
    for value in raw_edges {
        let Ok(mut edge) = GraphEdge::deserialize(value) else {
            rejected_edges += 1;
            continue;
        };
        if edge.from.is_empty() || edge.to.is_empty() {
            rejected_edges += 1;
            continue;
        }
        if !edge.weight.is_finite() || edge.weight < 0.0 {
            edge.weight = 0.0;
        }
        if edge.id.is_empty() {
            edge.id = format!("{}->{}", edge.from, edge.to);
        }
        if !seen_edges.insert(edge.id.clone()) {
            let base = edge.id.clone();
            let mut suffix = 1usize;
            while !seen_edges.insert(format!("{base}#{suffix}")) {
                suffix += 1;
            }
            edge.id = format!("{base}#{suffix}");
        }
        edges.push(edge);
    }

    if rejected_nodes > 0 || rejected_edges > 0 {
        warn!(
            rejected_nodes,
            rejected_edges, "dropped malformed entries while parsing snapshot"
        );
    }

    Ok(Snapshot::new(
        nodes,
        edges,
        metadata
            .source
            .and_then(|value| SnapshotOrigin::deserialize(value).ok())
            .unwrap_or(fallback_origin),
        metadata
            .timestamp
            .as_ref()
            .and_then(Value::as_f64)
            .filter(|ts| ts.is_finite())
            .unwrap_or(now),
    ))
}
