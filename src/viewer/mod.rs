//! The network viewer widget
//!
//! Orchestrates everything: pointer input, the interaction state machine,
//! the pan/zoom transform, the animated zoom reset, and the per-frame GPU
//! draw data handed to the paint callback. Embeds into any egui container;
//! the host owns window and canvas creation.

use std::sync::Arc;

use glam::{Mat3, Vec2};

use crate::color::parse_color_or;
use crate::config::ViewerOptions;
use crate::constants::{interact, render};
use crate::error::ViewerError;
use crate::events::{EventBus, EventKind, TransformInfo, ViewerEvent};
use crate::gpu::instance::{self, FrameData, FrameUniforms, NodeInstance, RingUniforms};
use crate::gpu::GraphPaintCallback;
use crate::graph::buffers::{self, RenderBuffers};
use crate::graph::data::{Graph, NetworkData, NodeInfo};
use crate::interaction::{HoverChange, InteractionState};
use crate::spatial::SpatialIndex;
use crate::transform;

/// External tooltip collaborator: receives a node object plus show/hide
/// calls, nothing else.
pub trait TooltipSink {
    fn show(&mut self, node: &NodeInfo, text: &str, screen_pos: egui::Pos2);
    fn hide(&mut self);
}

/// In-flight zoom reset transition.
struct ZoomReset {
    start: f64,
    from_pan: Vec2,
    from_scale: f32,
}

/// GPU network graph viewer widget.
pub struct NetworkViewer {
    graph: Graph,
    options: ViewerOptions,
    buffers: RenderBuffers,
    index: SpatialIndex,
    interaction: InteractionState,
    events: EventBus,
    tooltip: Option<Box<dyn TooltipSink>>,

    node_instances: Arc<Vec<NodeInstance>>,
    edge_instances: Arc<Vec<instance::EdgeInstance>>,
    bucket_widths: Vec<f32>,
    bucket_ranges: Vec<(u32, u32)>,
    /// Bumped on every wholesale buffer rebuild; the renderer re-uploads
    /// the static buffers when it changes.
    data_version: u64,

    /// Layout viewport captured at load time; node buffers live in this
    /// pixel space.
    viewport: Vec2,
    /// Current widget size; projection, picking and tooltip placement all
    /// use this so they stay consistent after a resize.
    view_size: Vec2,
    loaded: bool,
    pan: Vec2,
    scale: f32,
    emitted_transform: Option<TransformInfo>,
    zoom_anim: Option<ZoomReset>,
}

impl NetworkViewer {
    /// Validates the dataset and builds the viewer. Fails fast on missing
    /// containers or nodes without positions; edges are required unless
    /// `showEdges` is off.
    pub fn new(data: NetworkData, options: ViewerOptions) -> Result<Self, ViewerError> {
        let graph = Graph::build(data, options.show_edges)?;
        if options.log {
            log::info!(
                "viewer created: {} nodes, {} edges",
                graph.node_count(),
                graph.edge_count()
            );
        }
        Ok(Self {
            graph,
            options,
            buffers: RenderBuffers::default(),
            index: SpatialIndex::build(&[]),
            interaction: InteractionState::new(),
            events: EventBus::new(),
            tooltip: None,
            node_instances: Arc::new(Vec::new()),
            edge_instances: Arc::new(Vec::new()),
            bucket_widths: Vec::new(),
            bucket_ranges: Vec::new(),
            data_version: 0,
            viewport: Vec2::ZERO,
            view_size: Vec2::ZERO,
            loaded: false,
            pan: Vec2::ZERO,
            scale: 1.0,
            emitted_transform: None,
            zoom_anim: None,
        })
    }

    /// Registers an event handler; handlers per kind fire in registration
    /// order.
    pub fn on(&mut self, kind: EventKind, handler: impl FnMut(&ViewerEvent) + 'static) {
        self.events.on(kind, handler);
    }

    /// Installs the tooltip collaborator.
    pub fn set_tooltip(&mut self, sink: Box<dyn TooltipSink>) {
        self.tooltip = Some(sink);
    }

    /// Replaces the dataset wholesale: buffers, spatial index and
    /// interaction state are all rebuilt from scratch.
    pub fn reload(&mut self, data: NetworkData) -> Result<(), ViewerError> {
        self.graph = Graph::build(data, self.options.show_edges)?;
        self.interaction.clear();
        if self.loaded {
            self.rebuild_buffers();
        }
        Ok(())
    }

    /// Reads one option by its interface name.
    pub fn option(&self, name: &str) -> Option<serde_json::Value> {
        self.options.get(name)
    }

    /// Writes one option by its interface name and re-renders.
    pub fn set_option(&mut self, name: &str, value: serde_json::Value) -> Result<(), ViewerError> {
        self.options.set(name, value)?;
        if self.loaded {
            self.rebuild_buffers();
        }
        Ok(())
    }

    /// Installs an externally supplied highlight set by node ids. Clears
    /// any active selection; unknown ids are skipped.
    pub fn highlight<S: AsRef<str>>(&mut self, ids: &[S]) {
        let indices = ids
            .iter()
            .filter_map(|id| {
                let index = self.graph.index_of(id.as_ref());
                if index.is_none() {
                    log::warn!("highlight id `{}` not in graph", id.as_ref());
                }
                index
            })
            .collect();
        self.interaction.highlight(indices);
    }

    // === engine handle accessors ===

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn render_buffers(&self) -> &RenderBuffers {
        &self.buffers
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Current pan/zoom state.
    pub fn transform_info(&self) -> TransformInfo {
        TransformInfo {
            tx: self.pan.x,
            ty: self.pan.y,
            scale: self.scale,
        }
    }

    /// Lays out the buffers for a viewport size. Called implicitly on first
    /// show; the layout space then stays fixed until a reload.
    pub fn layout(&mut self, size: [f32; 2]) {
        self.viewport = Vec2::new(size[0], size[1]);
        self.view_size = self.viewport;
        self.loaded = true;
        self.rebuild_buffers();
    }

    fn rebuild_buffers(&mut self) {
        self.buffers = buffers::load(&self.graph, &self.options, self.viewport.into());
        self.index = SpatialIndex::build(&self.buffers.positions);
        self.node_instances = Arc::new(instance::node_instances(&self.buffers));
        let (edges, widths, ranges) = instance::edge_instances(&self.buffers);
        self.edge_instances = Arc::new(edges);
        self.bucket_widths = widths;
        self.bucket_ranges = ranges;
        self.data_version += 1;
        if self.options.log {
            log::info!(
                "buffers rebuilt: {} nodes, {} edges in {} buckets (v{})",
                self.buffers.node_count(),
                self.buffers.edge_count(),
                self.bucket_widths.len(),
                self.data_version
            );
        }
    }

    /// Starts the animated transition back to the identity transform.
    pub fn reset_zoom(&mut self, now: f64) {
        self.zoom_anim = Some(ZoomReset {
            start: now,
            from_pan: self.pan,
            from_scale: self.scale,
        });
    }

    /// Anchored zoom: the world point under `anchor` stays put.
    fn zoom_at(&mut self, anchor: Vec2, factor: f32) {
        let projection = transform::projection(self.view_size.x, self.view_size.y);
        let model = transform::compose(self.pan.x, self.pan.y, self.scale);
        let world = transform::screen_to_world(anchor, self.view_size, &projection, &model);
        let new_scale =
            (self.scale * factor).clamp(self.options.zoom_extent[0], self.options.zoom_extent[1]);
        let (tx, ty, scale) = transform::zoom_about(anchor, world, new_scale);
        self.pan = Vec2::new(tx, ty);
        self.scale = scale;
        // A pointer-driven transform write cancels the reset transition.
        self.zoom_anim = None;
    }

    /// Resolves a raycast at a widget-local cursor position.
    fn pick(&self, local: Vec2, device_pixel_ratio: f32) -> Option<usize> {
        let projection = transform::projection(self.view_size.x, self.view_size.y);
        let model = transform::compose(self.pan.x, self.pan.y, self.scale);
        let world = transform::screen_to_world(local, self.view_size, &projection, &model);
        self.index.raycast(world, self.scale, device_pixel_ratio)
    }

    fn tooltip_text(&self, node: &NodeInfo) -> String {
        if let Some(format) = &self.options.tooltip_format {
            return format(node);
        }
        let mut text = node.label.clone();
        for name in &self.options.tooltip_attributes {
            if let Some(value) = node.attributes.get(name) {
                text.push('\n');
                text.push_str(name);
                text.push_str(": ");
                match value.as_str() {
                    Some(s) => text.push_str(s),
                    None => text.push_str(&value.to_string()),
                }
            }
        }
        text
    }

    /// Shows the viewer, processing input and queueing the GPU paint
    /// callback for this frame.
    pub fn ui(&mut self, ui: &mut egui::Ui) -> egui::Response {
        let response =
            ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect.shrink(self.options.container_margin);
        if rect.width() < 1.0 || rect.height() < 1.0 {
            return response;
        }
        if !self.loaded {
            self.layout([rect.width(), rect.height()]);
        }
        self.view_size = Vec2::new(rect.width(), rect.height());

        let dpr = ui.ctx().pixels_per_point();
        let now = ui.input(|i| i.time);
        let to_local =
            |pos: egui::Pos2| -> Vec2 { Vec2::new(pos.x - rect.min.x, pos.y - rect.min.y) };

        // Drag-pan. Picking is suppressed while dragging.
        if response.dragged_by(egui::PointerButton::Primary) {
            let delta = response.drag_delta();
            self.pan += Vec2::new(delta.x, delta.y);
            self.interaction.set_dragging(true);
            self.zoom_anim = None;
        }
        if response.drag_stopped() {
            self.interaction.set_dragging(false);
        }

        // Wheel zoom anchored at the cursor.
        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                if let Some(pos) = response.hover_pos() {
                    let factor = 1.0 + scroll * interact::ZOOM_SENSITIVITY;
                    self.zoom_at(to_local(pos), factor);
                }
            }
        }

        // Hover picking.
        if !self.interaction.dragging() {
            let hit = response
                .hover_pos()
                .and_then(|pos| self.pick(to_local(pos), dpr));
            let change = self.interaction.set_hovered(hit, &self.graph);
            match change {
                HoverChange::Entered(index) => {
                    if let Some(info) = self.graph.node_info(index) {
                        self.show_tooltip(&info, rect);
                        self.events.emit(&ViewerEvent::NodeOver(info));
                    }
                    ui.ctx().request_repaint();
                }
                HoverChange::Moved(index) => {
                    if let Some(info) = self.graph.node_info(index) {
                        self.show_tooltip(&info, rect);
                    }
                    ui.ctx().request_repaint();
                }
                HoverChange::Left(index) => {
                    if let Some(sink) = &mut self.tooltip {
                        sink.hide();
                    }
                    if let Some(info) = self.graph.node_info(index) {
                        self.events.emit(&ViewerEvent::NodeOut(info));
                    }
                    ui.ctx().request_repaint();
                }
                HoverChange::None => {}
            }
            if self.interaction.hovered().is_some() {
                ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
            }
        }

        // Click selection.
        if response.clicked() {
            let hit = response
                .interact_pointer_pos()
                .and_then(|pos| self.pick(to_local(pos), dpr));
            let change = self.interaction.select(hit, &self.graph);
            let info = change.selected.and_then(|index| self.graph.node_info(index));
            if let Some(info) = &info {
                self.events.emit(&ViewerEvent::NodeSelect(info.clone()));
            }
            self.events.emit(&ViewerEvent::Click { node: info });
            ui.ctx().request_repaint();
        }

        // R resets the view, as does double-clicking empty space.
        if response.hovered() && ui.input(|i| i.key_pressed(egui::Key::R)) {
            self.reset_zoom(now);
        }

        // Double-click over empty space starts the zoom reset transition.
        if response.double_clicked() {
            let hit = response
                .interact_pointer_pos()
                .and_then(|pos| self.pick(to_local(pos), dpr));
            if hit.is_none() {
                self.reset_zoom(now);
            }
        }

        // Zoom reset transition tick; a newer pointer-driven write above
        // has already discarded the animation if the two raced.
        if let Some(anim) = &self.zoom_anim {
            let t = ((now - anim.start) / (interact::ZOOM_RESET_MS as f64 / 1000.0))
                .clamp(0.0, 1.0) as f32;
            let eased = t * t * (3.0 - 2.0 * t);
            self.pan = anim.from_pan * (1.0 - eased);
            self.scale = anim.from_scale + (1.0 - anim.from_scale) * eased;
            if t >= 1.0 {
                self.zoom_anim = None;
            }
            ui.ctx().request_repaint();
        }

        // Transform change notification.
        let info = self.transform_info();
        if self.emitted_transform != Some(info) {
            if self.emitted_transform.is_some() {
                self.events.emit(&ViewerEvent::Zoom(info));
            }
            self.emitted_transform = Some(info);
        }

        let frame = self.frame_data(rect);
        ui.painter()
            .add(egui_wgpu::Callback::new_paint_callback(
                rect,
                GraphPaintCallback { frame },
            ));

        response
    }

    fn show_tooltip(&mut self, info: &NodeInfo, rect: egui::Rect) {
        let text = self.tooltip_text(info);
        if let Some(sink) = &mut self.tooltip {
            let projection = transform::projection(self.view_size.x, self.view_size.y);
            let model = transform::compose(self.pan.x, self.pan.y, self.scale);
            let world = Vec2::from(self.buffers.positions[info.index]);
            let screen = transform::world_to_screen(world, self.view_size, &projection, &model);
            sink.show(
                info,
                &text,
                egui::pos2(rect.min.x + screen.x, rect.min.y + screen.y),
            );
        }
    }

    /// Assembles this frame's GPU draw data in the mandated layer order.
    fn frame_data(&self, rect: egui::Rect) -> FrameData {
        let viewport = [rect.width(), rect.height()];
        let projection = transform::projection(viewport[0], viewport[1]);
        let model = transform::compose(self.pan.x, self.pan.y, self.scale);
        let matrix: Mat3 = projection * model;
        let zoom = transform::zoom_of(&model);

        let hovered = self.interaction.hovered();
        let selected = self.interaction.selected();
        let dimming = self.interaction.emphasis_active();
        let base_uniforms = FrameUniforms::new(
            matrix,
            viewport,
            zoom,
            1.0,
            hovered,
            selected,
            dimming,
            self.options.default_nodes_opacity,
            self.options.default_edges_opacity,
        );
        let overlay_uniforms = base_uniforms.overlay();

        // Edges draw when enabled by configuration or implicitly by an
        // active hover/selection, unless suppressed by a drag.
        let edges_wanted =
            self.options.show_edges || hovered.is_some() || selected.is_some();
        let drag_suppressed = self.interaction.dragging() && !self.options.show_edges_on_move;
        let draw_edges = edges_wanted && !drag_suppressed && !self.edge_instances.is_empty();

        // Emphasis subsets, re-uploaded every frame they are needed.
        let mut emphasis = Vec::new();
        let mut subset = |indices: &[usize], extra: Option<usize>| -> (u32, u32) {
            let start = emphasis.len() as u32;
            for &index in extra.iter().chain(indices.iter()) {
                if let Some(instance) = self.node_instances.get(index) {
                    emphasis.push(*instance);
                }
            }
            (start, emphasis.len() as u32)
        };
        let hover_range = subset(self.interaction.hover_neighbors(), hovered);
        let selection_range = subset(self.interaction.selected_neighbors(), selected);
        let highlight_range = subset(self.interaction.highlighted(), None);

        let ring = selected
            .filter(|_| self.options.draw_selected_circle)
            .and_then(|index| self.node_instances.get(index))
            .map(|instance| RingUniforms {
                center: instance.position,
                radius: transform::ring_screen_size(
                    instance.size + render::RING_MARGIN,
                    zoom,
                ),
                segments: self.options.selected_circle_points.max(3) as f32,
                color: parse_color_or(
                    &self.options.selected_circle_color,
                    [1.0, 0.55, 0.0, 1.0],
                ),
            });

        FrameData {
            base_uniforms,
            overlay_uniforms,
            data_version: self.data_version,
            node_instances: Arc::clone(&self.node_instances),
            edge_instances: Arc::clone(&self.edge_instances),
            bucket_widths: self.bucket_widths.clone(),
            bucket_ranges: self.bucket_ranges.clone(),
            draw_edges,
            emphasis,
            hover_range,
            selection_range,
            highlight_range,
            ring,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_viewer() -> NetworkViewer {
        let data: NetworkData = serde_json::from_str(
            r#"{
                "nodes": [
                    {"id": "a", "x": 0, "y": 0, "size": 10},
                    {"id": "b", "x": 100, "y": 0, "size": 10}
                ],
                "edges": [{"source": "a", "target": "b", "weight": 1}]
            }"#,
        )
        .unwrap();
        NetworkViewer::new(data, ViewerOptions::default()).unwrap()
    }

    #[test]
    fn test_construction_validation() {
        let missing: NetworkData = serde_json::from_str(r#"{}"#).unwrap();
        assert!(matches!(
            NetworkViewer::new(missing, ViewerOptions::default()),
            Err(ViewerError::MissingNodes)
        ));

        // Edges optional once showEdges is off.
        let no_edges: NetworkData =
            serde_json::from_str(r#"{"nodes": [{"id": "a", "x": 0, "y": 0}]}"#).unwrap();
        let mut options = ViewerOptions::default();
        assert!(matches!(
            NetworkViewer::new(no_edges.clone(), options.clone()),
            Err(ViewerError::MissingEdges)
        ));
        options.show_edges = false;
        assert!(NetworkViewer::new(no_edges, options).is_ok());
    }

    #[test]
    fn test_two_node_scenario() {
        let mut viewer = two_node_viewer();
        viewer.layout([500.0, 500.0]);
        assert_eq!(viewer.render_buffers().positions.len(), 2);
        assert_eq!(viewer.render_buffers().edge_buckets.len(), 1);
        // Picking at node "a"'s layout position resolves node "a".
        let position = viewer.render_buffers().positions[0];
        let hit = viewer
            .spatial_index()
            .raycast(Vec2::from(position), 1.0, 1.0);
        assert_eq!(hit, Some(0));
        assert_eq!(viewer.graph().node(0).unwrap().id, "a");
    }

    #[test]
    fn test_highlight_resolves_ids_and_clears_selection() {
        let mut viewer = two_node_viewer();
        viewer.layout([500.0, 500.0]);
        viewer.interaction.select(Some(0), &viewer.graph);
        viewer.highlight(&["b", "ghost"]);
        assert_eq!(viewer.interaction().selected(), None);
        assert_eq!(viewer.interaction().highlighted(), &[1]);
    }

    #[test]
    fn test_set_option_rebuilds_buffers() {
        let mut viewer = two_node_viewer();
        viewer.layout([500.0, 500.0]);
        let before = viewer.data_version;
        viewer
            .set_option("graphMargin", serde_json::json!(50.0))
            .unwrap();
        assert!(viewer.data_version > before);
        assert_eq!(viewer.option("graphMargin"), Some(serde_json::json!(50.0)));
    }

    #[test]
    fn test_reload_rebuilds_everything() {
        let mut viewer = two_node_viewer();
        viewer.layout([500.0, 500.0]);
        viewer.interaction.select(Some(0), &viewer.graph);
        let data: NetworkData = serde_json::from_str(
            r#"{
                "nodes": [
                    {"id": "x", "x": 0, "y": 0},
                    {"id": "y", "x": 1, "y": 1},
                    {"id": "z", "x": 2, "y": 2}
                ],
                "edges": [{"source": "x", "target": "z"}]
            }"#,
        )
        .unwrap();
        viewer.reload(data).unwrap();
        assert_eq!(viewer.render_buffers().positions.len(), 3);
        assert_eq!(viewer.spatial_index().len(), 3);
        // Interaction state does not survive a dataset swap.
        assert_eq!(viewer.interaction().selected(), None);
    }

    #[test]
    fn test_frame_data_layer_sets() {
        let mut viewer = two_node_viewer();
        viewer.layout([500.0, 500.0]);
        viewer.interaction.set_hovered(Some(0), &viewer.graph);
        let frame = viewer.frame_data(egui::Rect::from_min_size(
            egui::pos2(0.0, 0.0),
            egui::vec2(500.0, 500.0),
        ));
        // Hover subset: the node plus its single neighbor.
        assert_eq!(frame.hover_range, (0, 2));
        assert_eq!(frame.selection_range, (2, 2));
        assert!(frame.ring.is_none());
        assert_eq!(frame.base_uniforms.hovered, 0.0);
        assert_eq!(frame.base_uniforms.dimming, 1.0);
        assert_eq!(frame.overlay_uniforms.dimming, 0.0);
        // Hover implies edges even though nothing else changed.
        assert!(frame.draw_edges);
    }

    #[test]
    fn test_drag_suppresses_edges() {
        let mut viewer = two_node_viewer();
        viewer.layout([500.0, 500.0]);
        viewer.interaction.set_dragging(true);
        let rect =
            egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(500.0, 500.0));
        assert!(!viewer.frame_data(rect).draw_edges);
        // Unless configured to keep them.
        viewer.options.show_edges_on_move = true;
        assert!(viewer.frame_data(rect).draw_edges);
    }

    #[test]
    fn test_selected_ring_present() {
        let mut viewer = two_node_viewer();
        viewer.layout([500.0, 500.0]);
        viewer.interaction.select(Some(1), &viewer.graph);
        let rect =
            egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(500.0, 500.0));
        let frame = viewer.frame_data(rect);
        let ring = frame.ring.expect("selection draws a ring");
        assert_eq!(ring.center, viewer.render_buffers().positions[1]);
        assert_eq!(ring.segments, 36.0);
    }
}
