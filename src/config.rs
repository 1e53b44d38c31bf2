//! Viewer configuration
//!
//! Options deserialize from the camelCase names of the external interface
//! and can be read or written one at a time by name; writes trigger a
//! re-render from the viewer side.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::ViewerError;
use crate::graph::NodeInfo;

/// Formats a node into tooltip text.
pub type TooltipFormat = Arc<dyn Fn(&NodeInfo) -> String + Send + Sync>;

/// Recognized options, with the defaults applied field by field.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerOptions {
    /// Margin in pixels kept between the graph extents and the viewport.
    pub graph_margin: f32,
    pub show_edges: bool,
    /// Keep drawing edges while a drag-pan is in progress.
    pub show_edges_on_move: bool,
    /// Pixel range node sizes are scaled into.
    pub nodes_size_range: [f32; 2],
    /// Pixel range edge weights are scaled into (rendered line widths).
    pub edges_weight_range: [f32; 2],
    pub default_nodes_opacity: f32,
    pub default_edges_opacity: f32,
    /// Fallback for edges without a parseable color.
    pub default_edges_color: String,
    /// Outer padding subtracted from the widget rect before layout.
    pub container_margin: f32,
    /// Allowed `[min, max]` zoom factors.
    pub zoom_extent: [f32; 2],
    pub draw_selected_circle: bool,
    pub selected_circle_color: String,
    /// Segment count of the selection ring outline.
    pub selected_circle_points: u32,
    /// Attribute names appended to the default tooltip text.
    pub tooltip_attributes: Vec<String>,
    /// Custom tooltip formatter; overrides the default composition.
    #[serde(skip)]
    pub tooltip_format: Option<TooltipFormat>,
    /// Gates engine-side info logging.
    pub log: bool,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            graph_margin: 20.0,
            show_edges: true,
            show_edges_on_move: false,
            nodes_size_range: [2.0, 16.0],
            edges_weight_range: [1.0, 4.0],
            default_nodes_opacity: 1.0,
            default_edges_opacity: 0.6,
            default_edges_color: "#a0a0a0".to_string(),
            container_margin: 0.0,
            zoom_extent: [0.1, 8.0],
            draw_selected_circle: true,
            selected_circle_color: "#f08c00".to_string(),
            selected_circle_points: 36,
            tooltip_attributes: Vec::new(),
            tooltip_format: None,
            log: false,
        }
    }
}

impl fmt::Debug for ViewerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerOptions")
            .field("graph_margin", &self.graph_margin)
            .field("show_edges", &self.show_edges)
            .field("show_edges_on_move", &self.show_edges_on_move)
            .field("nodes_size_range", &self.nodes_size_range)
            .field("edges_weight_range", &self.edges_weight_range)
            .field("zoom_extent", &self.zoom_extent)
            .field("draw_selected_circle", &self.draw_selected_circle)
            .finish_non_exhaustive()
    }
}

impl ViewerOptions {
    /// Reads one option by its interface name.
    pub fn get(&self, name: &str) -> Option<serde_json::Value> {
        use serde_json::json;
        let value = match name {
            "graphMargin" => json!(self.graph_margin),
            "showEdges" => json!(self.show_edges),
            "showEdgesOnMove" => json!(self.show_edges_on_move),
            "nodesSizeRange" => json!(self.nodes_size_range),
            "edgesWeightRange" => json!(self.edges_weight_range),
            "defaultNodesOpacity" => json!(self.default_nodes_opacity),
            "defaultEdgesOpacity" => json!(self.default_edges_opacity),
            "defaultEdgesColor" => json!(self.default_edges_color),
            "containerMargin" => json!(self.container_margin),
            "zoomExtent" => json!(self.zoom_extent),
            "drawSelectedCircle" => json!(self.draw_selected_circle),
            "selectedCircleColor" => json!(self.selected_circle_color),
            "selectedCirclePoints" => json!(self.selected_circle_points),
            "tooltipAttributes" => json!(self.tooltip_attributes),
            "log" => json!(self.log),
            _ => return None,
        };
        Some(value)
    }

    /// Writes one option by its interface name.
    pub fn set(&mut self, name: &str, value: serde_json::Value) -> Result<(), ViewerError> {
        fn read<T: serde::de::DeserializeOwned>(
            name: &str,
            value: serde_json::Value,
        ) -> Result<T, ViewerError> {
            serde_json::from_value(value).map_err(|e| ViewerError::InvalidOption {
                name: name.to_string(),
                reason: e.to_string(),
            })
        }

        match name {
            "graphMargin" => self.graph_margin = read(name, value)?,
            "showEdges" => self.show_edges = read(name, value)?,
            "showEdgesOnMove" => self.show_edges_on_move = read(name, value)?,
            "nodesSizeRange" => self.nodes_size_range = read(name, value)?,
            "edgesWeightRange" => self.edges_weight_range = read(name, value)?,
            "defaultNodesOpacity" => self.default_nodes_opacity = read(name, value)?,
            "defaultEdgesOpacity" => self.default_edges_opacity = read(name, value)?,
            "defaultEdgesColor" => self.default_edges_color = read(name, value)?,
            "containerMargin" => self.container_margin = read(name, value)?,
            "zoomExtent" => self.zoom_extent = read(name, value)?,
            "drawSelectedCircle" => self.draw_selected_circle = read(name, value)?,
            "selectedCircleColor" => self.selected_circle_color = read(name, value)?,
            "selectedCirclePoints" => self.selected_circle_points = read(name, value)?,
            "tooltipAttributes" => self.tooltip_attributes = read(name, value)?,
            "log" => self.log = read(name, value)?,
            _ => return Err(ViewerError::UnknownOption(name.to_string())),
        }
        Ok(())
    }
}
