//! Buffer construction: graph records to renderer-ready columnar arrays
//!
//! One wholesale pass per load. Extents for position, size and weight are
//! gathered in a single sweep, node positions are fitted into the viewport
//! with a uniform aspect-preserving scale, and edges are grouped into
//! weight buckets because line width is a per-draw uniform. There is no
//! incremental update path; a changed dataset means a full rebuild.

use crate::color::parse_color_or;
use crate::config::ViewerOptions;
use crate::graph::data::Graph;

/// One renderable edge with endpoint positions resolved into viewport space.
#[derive(Debug, Clone, Copy)]
pub struct EdgeDraw {
    pub source: [f32; 2],
    pub target: [f32; 2],
    pub source_index: usize,
    pub target_index: usize,
    pub color: [f32; 4],
}

/// Edges sharing one rendered line width; drawn with a single call.
#[derive(Debug, Clone)]
pub struct EdgeBucket {
    pub width: f32,
    pub edges: Vec<EdgeDraw>,
}

/// Columnar node arrays plus bucketed edges, all in viewport pixel space.
///
/// The parallel arrays are indexed by the node's dense index; slot `i`
/// always belongs to input node `i`.
#[derive(Debug, Clone, Default)]
pub struct RenderBuffers {
    pub positions: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub sizes: Vec<f32>,
    pub edge_buckets: Vec<EdgeBucket>,
}

impl RenderBuffers {
    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_buckets.iter().map(|b| b.edges.len()).sum()
    }
}

/// Linear map from `domain` onto `range`; a degenerate domain collapses to
/// the range minimum instead of dividing by zero.
fn scale_linear(domain: (f32, f32), range: (f32, f32)) -> impl Fn(f32) -> f32 {
    let span = domain.1 - domain.0;
    move |v: f32| {
        if span <= 0.0 {
            range.0
        } else {
            range.0 + (v - domain.0) / span * (range.1 - range.0)
        }
    }
}

/// Builds render buffers from a loaded graph for the given viewport size.
pub fn load(graph: &Graph, options: &ViewerOptions, viewport: [f32; 2]) -> RenderBuffers {
    let margin = options.graph_margin;
    let usable = [
        (viewport[0] - 2.0 * margin).max(1.0),
        (viewport[1] - 2.0 * margin).max(1.0),
    ];

    // Single pass over both tables for every extent we need.
    let mut x_ext = (f32::INFINITY, f32::NEG_INFINITY);
    let mut y_ext = (f32::INFINITY, f32::NEG_INFINITY);
    let mut size_ext = (f32::INFINITY, f32::NEG_INFINITY);
    for node in graph.nodes() {
        x_ext = (x_ext.0.min(node.x), x_ext.1.max(node.x));
        y_ext = (y_ext.0.min(node.y), y_ext.1.max(node.y));
        size_ext = (size_ext.0.min(node.size), size_ext.1.max(node.size));
    }
    let mut weight_ext = (f32::INFINITY, f32::NEG_INFINITY);
    for edge in graph.edges() {
        let w = edge.weight.unwrap_or(1.0);
        weight_ext = (weight_ext.0.min(w), weight_ext.1.max(w));
    }

    // Uniform fit: the tighter axis sets the scale, the slack axis is
    // centered by inflating its margin with the leftover space.
    let x_range = x_ext.1 - x_ext.0;
    let y_range = y_ext.1 - y_ext.0;
    let scale_x = if x_range > 0.0 {
        usable[0] / x_range
    } else {
        f32::INFINITY
    };
    let scale_y = if y_range > 0.0 {
        usable[1] / y_range
    } else {
        f32::INFINITY
    };
    let mut scale = scale_x.min(scale_y);
    if !scale.is_finite() {
        scale = 1.0;
    }
    let offset_x = margin + (usable[0] - x_range * scale) / 2.0;
    let offset_y = margin + (usable[1] - y_range * scale) / 2.0;

    let size_of = scale_linear(size_ext, (options.nodes_size_range[0], options.nodes_size_range[1]));

    let mut positions = Vec::with_capacity(graph.node_count());
    let mut colors = Vec::with_capacity(graph.node_count());
    let mut sizes = Vec::with_capacity(graph.node_count());
    for node in graph.nodes() {
        positions.push([
            offset_x + (node.x - x_ext.0) * scale,
            offset_y + (node.y - y_ext.0) * scale,
        ]);
        colors.push(node.color.unwrap_or([1.0, 1.0, 1.0, 1.0]));
        sizes.push(size_of(node.size));
    }

    let default_edge_color =
        parse_color_or(&options.default_edges_color, [0.63, 0.63, 0.63, 1.0]);
    let width_of = scale_linear(
        weight_ext,
        (options.edges_weight_range[0], options.edges_weight_range[1]),
    );

    // Bucket by rendered width. Positive widths order the same as their bit
    // patterns, so the raw bits serve as the map key.
    let mut buckets: std::collections::BTreeMap<u32, Vec<EdgeDraw>> =
        std::collections::BTreeMap::new();
    for edge in graph.edges() {
        let width = width_of(edge.weight.unwrap_or(1.0)).max(0.0);
        buckets.entry(width.to_bits()).or_default().push(EdgeDraw {
            source: positions[edge.source],
            target: positions[edge.target],
            source_index: edge.source,
            target_index: edge.target,
            color: edge.color.unwrap_or(default_edge_color),
        });
    }

    RenderBuffers {
        positions,
        colors,
        sizes,
        edge_buckets: buckets
            .into_iter()
            .map(|(bits, edges)| EdgeBucket {
                width: f32::from_bits(bits),
                edges,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::data::NetworkData;

    fn build(json: &str) -> Graph {
        let data: NetworkData = serde_json::from_str(json).unwrap();
        Graph::build(data, true).unwrap()
    }

    #[test]
    fn test_buffer_lengths_and_index_stability() {
        let graph = build(
            r#"{
                "nodes": [
                    {"id": "a", "x": 0, "y": 0, "size": 1},
                    {"id": "b", "x": 10, "y": 5, "size": 2},
                    {"id": "c", "x": 20, "y": 10, "size": 3}
                ],
                "edges": [{"source": "a", "target": "c"}]
            }"#,
        );
        let buffers = load(&graph, &ViewerOptions::default(), [500.0, 500.0]);
        assert_eq!(buffers.positions.len(), graph.node_count());
        assert_eq!(buffers.colors.len(), graph.node_count());
        assert_eq!(buffers.sizes.len(), graph.node_count());
        // Slot i belongs to input node i: "a" is leftmost, "c" rightmost.
        assert!(buffers.positions[0][0] < buffers.positions[1][0]);
        assert!(buffers.positions[1][0] < buffers.positions[2][0]);
    }

    #[test]
    fn test_uniform_margin_fit() {
        // graphMargin=50, 500x500 viewport, x in [0,100], y in [0,200]:
        // both axes must use the same scale, the narrow axis is centered.
        let graph = build(
            r#"{
                "nodes": [
                    {"id": "a", "x": 0, "y": 0},
                    {"id": "b", "x": 100, "y": 200}
                ],
                "edges": []
            }"#,
        );
        let mut options = ViewerOptions::default();
        options.graph_margin = 50.0;
        let buffers = load(&graph, &options, [500.0, 500.0]);

        let x_span = buffers.positions[1][0] - buffers.positions[0][0];
        let y_span = buffers.positions[1][1] - buffers.positions[0][1];
        let scale_x = x_span / 100.0;
        let scale_y = y_span / 200.0;
        assert!((scale_x - scale_y).abs() < 1e-4);
        assert!((scale_y - 2.0).abs() < 1e-4);
        // The tight axis touches its margins, the slack axis is centered.
        assert!((buffers.positions[0][1] - 50.0).abs() < 1e-4);
        assert!((buffers.positions[1][1] - 450.0).abs() < 1e-4);
        assert!((buffers.positions[0][0] - 150.0).abs() < 1e-4);
        assert!((buffers.positions[1][0] - 350.0).abs() < 1e-4);
    }

    #[test]
    fn test_weightless_edges_form_single_bucket() {
        let graph = build(
            r#"{
                "nodes": [
                    {"id": "a", "x": 0, "y": 0, "size": 10},
                    {"id": "b", "x": 100, "y": 0, "size": 10}
                ],
                "edges": [{"source": "a", "target": "b", "weight": 1}]
            }"#,
        );
        let buffers = load(&graph, &ViewerOptions::default(), [500.0, 500.0]);
        assert_eq!(buffers.positions.len(), 2);
        assert_eq!(buffers.edge_buckets.len(), 1);
        // Degenerate weight domain collapses onto the range minimum.
        assert!((buffers.edge_buckets[0].width - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_weight_buckets_scale_into_range() {
        let graph = build(
            r#"{
                "nodes": [
                    {"id": "a", "x": 0, "y": 0},
                    {"id": "b", "x": 1, "y": 1},
                    {"id": "c", "x": 2, "y": 0}
                ],
                "edges": [
                    {"source": "a", "target": "b", "weight": 1},
                    {"source": "b", "target": "c", "weight": 5},
                    {"source": "a", "target": "c", "weight": 5}
                ]
            }"#,
        );
        let buffers = load(&graph, &ViewerOptions::default(), [500.0, 500.0]);
        assert_eq!(buffers.edge_buckets.len(), 2);
        assert!((buffers.edge_buckets[0].width - 1.0).abs() < 1e-6);
        assert!((buffers.edge_buckets[1].width - 4.0).abs() < 1e-6);
        assert_eq!(buffers.edge_buckets[1].edges.len(), 2);
        assert_eq!(buffers.edge_count(), 3);
    }

    #[test]
    fn test_degenerate_sizes_collapse_to_range_min() {
        let graph = build(
            r#"{
                "nodes": [
                    {"id": "a", "x": 0, "y": 0, "size": 7},
                    {"id": "b", "x": 1, "y": 0, "size": 7}
                ],
                "edges": []
            }"#,
        );
        let options = ViewerOptions::default();
        let buffers = load(&graph, &options, [500.0, 500.0]);
        assert_eq!(buffers.sizes[0], options.nodes_size_range[0]);
        assert_eq!(buffers.sizes[1], options.nodes_size_range[0]);
    }

    #[test]
    fn test_edge_color_fallback() {
        let graph = build(
            r##"{
                "nodes": [
                    {"id": "a", "x": 0, "y": 0},
                    {"id": "b", "x": 1, "y": 0}
                ],
                "edges": [
                    {"source": "a", "target": "b", "color": "#ff0000"},
                    {"source": "a", "target": "b", "color": "garbage"}
                ]
            }"##,
        );
        let mut options = ViewerOptions::default();
        options.default_edges_color = "#00ff00".to_string();
        let buffers = load(&graph, &options, [500.0, 500.0]);
        let edges = &buffers.edge_buckets[0].edges;
        assert_eq!(edges[0].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(edges[1].color, [0.0, 1.0, 0.0, 1.0]);
    }
}
