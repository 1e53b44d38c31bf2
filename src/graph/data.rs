//! Input records and the adjacency store
//!
//! Records deserialize from the JSON shapes the external interface accepts,
//! including the alternate field names (`position.x` for `x`, `sourceID` for
//! `source`, `size` for `weight`). The loaded [`Graph`] keeps node identity
//! dual-keyed: input id and dense index resolve to each other through a
//! bidirectional lookup, and the dense index is the node's permanent slot in
//! every parallel array.

use std::collections::HashMap;

use serde::Deserialize;

use crate::color::parse_color;
use crate::error::ViewerError;

/// Nested `position` object accepted as an alternative to flat `x`/`y`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PositionInput {
    pub x: f32,
    pub y: f32,
}

/// A node as supplied by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeInput {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub position: Option<PositionInput>,
    #[serde(default)]
    pub size: Option<f32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

/// An edge as supplied by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeInput {
    #[serde(alias = "sourceID")]
    pub source: String,
    #[serde(alias = "targetID")]
    pub target: String,
    #[serde(default, alias = "size")]
    pub weight: Option<f32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

/// Top-level dataset container.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkData {
    #[serde(default)]
    pub nodes: Option<Vec<NodeInput>>,
    #[serde(default)]
    pub edges: Option<Vec<EdgeInput>>,
}

/// A resolved node: immutable after load.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub id: String,
    pub label: String,
    /// World position as authored, before viewport scaling.
    pub x: f32,
    pub y: f32,
    pub size: f32,
    /// `None` when the record had no parseable color; the buffer pass
    /// substitutes the default.
    pub color: Option<[f32; 4]>,
    pub attributes: HashMap<String, serde_json::Value>,
}

/// A resolved edge with endpoints as dense node indices.
#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub source: usize,
    pub target: usize,
    pub weight: Option<f32>,
    pub color: Option<[f32; 4]>,
}

/// One hop of a node's adjacency, in input-id terms, as handed to consumers.
#[derive(Debug, Clone)]
pub struct LinkInfo {
    pub source: String,
    pub target: String,
    pub weight: Option<f32>,
}

/// The node object shape delivered through events and the tooltip sink.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: String,
    pub label: String,
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: [f32; 4],
    pub links: Vec<LinkInfo>,
    pub attributes: HashMap<String, serde_json::Value>,
}

/// The loaded network: node table, edge table, adjacency.
///
/// Treated as an opaque store by the rest of the engine; only construction
/// and read-only queries exist.
#[derive(Debug)]
pub struct Graph {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
    index_of: HashMap<String, usize>,
    /// One-hop undirected adjacency: node index -> neighbor indices.
    neighbors: Vec<Vec<usize>>,
    /// Node index -> indices into `edges` touching it.
    incident: Vec<Vec<usize>>,
}

impl Graph {
    /// Validates and resolves the raw dataset.
    ///
    /// Fatal conditions (missing containers, nodes without positions) fail
    /// fast here; recoverable ones (bad colors, unknown edge endpoints,
    /// duplicate ids) degrade with a log line.
    pub fn build(data: NetworkData, edges_required: bool) -> Result<Self, ViewerError> {
        let inputs = data.nodes.ok_or(ViewerError::MissingNodes)?;
        if inputs.is_empty() {
            return Err(ViewerError::EmptyNodes);
        }
        let edge_inputs = match data.edges {
            Some(edges) => edges,
            None if edges_required => return Err(ViewerError::MissingEdges),
            None => Vec::new(),
        };

        let mut nodes = Vec::with_capacity(inputs.len());
        let mut index_of = HashMap::with_capacity(inputs.len());
        for input in inputs {
            let (x, y) = match (input.x, input.y, input.position) {
                (Some(x), Some(y), _) => (x, y),
                (_, _, Some(p)) => (p.x, p.y),
                _ => return Err(ViewerError::NodePosition { id: input.id }),
            };
            if index_of.contains_key(&input.id) {
                log::warn!("duplicate node id `{}` ignored", input.id);
                continue;
            }
            let index = nodes.len();
            index_of.insert(input.id.clone(), index);
            let color = input.color.as_deref().and_then(parse_color);
            nodes.push(NodeRecord {
                label: input.label.unwrap_or_else(|| input.id.clone()),
                id: input.id,
                x,
                y,
                // Absent sizes fall back to unit size, never to zero.
                size: input.size.unwrap_or(1.0),
                color,
                attributes: input.attributes,
            });
        }

        let mut edges = Vec::with_capacity(edge_inputs.len());
        let mut neighbors = vec![Vec::new(); nodes.len()];
        let mut incident = vec![Vec::new(); nodes.len()];
        for input in edge_inputs {
            let (Some(&source), Some(&target)) =
                (index_of.get(&input.source), index_of.get(&input.target))
            else {
                log::warn!(
                    "edge `{}` -> `{}` references an unknown node, skipped",
                    input.source,
                    input.target
                );
                continue;
            };
            let edge_index = edges.len();
            edges.push(EdgeRecord {
                source,
                target,
                weight: input.weight,
                color: input.color.as_deref().and_then(parse_color),
            });
            incident[source].push(edge_index);
            neighbors[source].push(target);
            if source != target {
                incident[target].push(edge_index);
                neighbors[target].push(source);
            }
        }

        Ok(Self {
            nodes,
            edges,
            index_of,
            neighbors,
            incident,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn node(&self, index: usize) -> Option<&NodeRecord> {
        self.nodes.get(index)
    }

    /// Dense index for an input id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_of.get(id).copied()
    }

    /// One-hop undirected neighbor indices, inbound and outbound links alike.
    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.neighbors.get(index).map_or(&[], Vec::as_slice)
    }

    /// Assembles the consumer-facing node object for `index`.
    pub fn node_info(&self, index: usize) -> Option<NodeInfo> {
        let node = self.nodes.get(index)?;
        let links = self.incident[index]
            .iter()
            .map(|&e| {
                let edge = &self.edges[e];
                LinkInfo {
                    source: self.nodes[edge.source].id.clone(),
                    target: self.nodes[edge.target].id.clone(),
                    weight: edge.weight,
                }
            })
            .collect();
        Some(NodeInfo {
            id: node.id.clone(),
            label: node.label.clone(),
            index,
            x: node.x,
            y: node.y,
            size: node.size,
            color: node.color.unwrap_or([1.0, 1.0, 1.0, 1.0]),
            links,
            attributes: node.attributes.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_data() -> NetworkData {
        serde_json::from_str(
            r#"{
                "nodes": [
                    {"id": "a", "x": 0, "y": 0, "size": 10},
                    {"id": "b", "x": 100, "y": 0, "size": 10}
                ],
                "edges": [{"source": "a", "target": "b", "weight": 1}]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_build_resolves_indices() {
        let graph = Graph::build(two_node_data(), true).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.index_of("a"), Some(0));
        assert_eq!(graph.index_of("b"), Some(1));
        assert_eq!(graph.neighbors(0), &[1]);
        assert_eq!(graph.neighbors(1), &[0]);
    }

    #[test]
    fn test_alternate_field_names() {
        let data: NetworkData = serde_json::from_str(
            r#"{
                "nodes": [
                    {"id": "a", "position": {"x": 3.0, "y": 4.0}},
                    {"id": "b", "x": 1.0, "y": 2.0}
                ],
                "edges": [{"sourceID": "a", "targetID": "b", "size": 2.5}]
            }"#,
        )
        .unwrap();
        let graph = Graph::build(data, true).unwrap();
        assert_eq!(graph.node(0).unwrap().x, 3.0);
        assert_eq!(graph.node(0).unwrap().y, 4.0);
        assert_eq!(graph.edges()[0].weight, Some(2.5));
    }

    #[test]
    fn test_missing_containers() {
        assert!(matches!(
            Graph::build(NetworkData::default(), true),
            Err(ViewerError::MissingNodes)
        ));

        let no_edges: NetworkData =
            serde_json::from_str(r#"{"nodes": [{"id": "a", "x": 0, "y": 0}]}"#).unwrap();
        assert!(matches!(
            Graph::build(no_edges.clone(), true),
            Err(ViewerError::MissingEdges)
        ));
        // Edges optional when disabled.
        assert!(Graph::build(no_edges, false).is_ok());
    }

    #[test]
    fn test_node_without_position_fails() {
        let data: NetworkData =
            serde_json::from_str(r#"{"nodes": [{"id": "a"}], "edges": []}"#).unwrap();
        match Graph::build(data, true) {
            Err(ViewerError::NodePosition { id }) => assert_eq!(id, "a"),
            other => panic!("expected NodePosition error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_edge_endpoint_skipped() {
        let data: NetworkData = serde_json::from_str(
            r#"{
                "nodes": [{"id": "a", "x": 0, "y": 0}],
                "edges": [{"source": "a", "target": "ghost"}]
            }"#,
        )
        .unwrap();
        let graph = Graph::build(data, true).unwrap();
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_node_info_shape() {
        let graph = Graph::build(two_node_data(), true).unwrap();
        let info = graph.node_info(0).unwrap();
        assert_eq!(info.id, "a");
        assert_eq!(info.index, 0);
        assert_eq!(info.links.len(), 1);
        assert_eq!(info.links[0].target, "b");
        // No color supplied: default white.
        assert_eq!(info.color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_malformed_color_degrades() {
        let data: NetworkData = serde_json::from_str(
            r#"{
                "nodes": [{"id": "a", "x": 0, "y": 0, "color": "not-a-color"}],
                "edges": []
            }"#,
        )
        .unwrap();
        let graph = Graph::build(data, true).unwrap();
        assert_eq!(graph.node(0).unwrap().color, None);
    }
}
