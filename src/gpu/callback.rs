//! GPU rendering callback implementation
//!
//! Bridges the viewer's per-frame draw data into egui's wgpu paint callback.
//! The renderer itself lives in the callback resources type map, created on
//! first use from the device the host hands us; nothing global.

use super::instance::FrameData;
use super::renderer::GraphRenderer;
use crate::gpu::config::GraphicsConfig;

/// Paint callback carrying one frame of graph draw data
pub struct GraphPaintCallback {
    pub frame: FrameData,
}

impl egui_wgpu::CallbackTrait for GraphPaintCallback {
    fn prepare(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        _screen_descriptor: &egui_wgpu::ScreenDescriptor,
        _egui_encoder: &mut wgpu::CommandEncoder,
        callback_resources: &mut egui_wgpu::CallbackResources,
    ) -> Vec<wgpu::CommandBuffer> {
        if callback_resources.get::<GraphRenderer>().is_none() {
            let format = GraphicsConfig::global().texture_format;
            callback_resources.insert(GraphRenderer::new(device, format));
        }
        let Some(renderer) = callback_resources.get_mut::<GraphRenderer>() else {
            return Vec::new();
        };

        let frame = &self.frame;
        renderer.update_uniforms(queue, &frame.base_uniforms, &frame.overlay_uniforms);
        renderer.upload_static(
            queue,
            frame.data_version,
            &frame.node_instances,
            &frame.edge_instances,
        );
        if frame.draw_edges {
            renderer.update_bucket_uniforms(queue, &frame.bucket_widths);
        }
        renderer.update_emphasis(queue, &frame.emphasis);
        if let Some(ring) = &frame.ring {
            renderer.update_ring(queue, ring);
        }
        Vec::new()
    }

    fn paint(
        &self,
        info: egui::PaintCallbackInfo,
        render_pass: &mut wgpu::RenderPass<'static>,
        callback_resources: &egui_wgpu::CallbackResources,
    ) {
        let Some(renderer) = callback_resources.get::<GraphRenderer>() else {
            return;
        };

        // Map the widget-local NDC onto the widget's pixel rect.
        let viewport = info.viewport_in_pixels();
        render_pass.set_viewport(
            viewport.left_px as f32,
            viewport.top_px as f32,
            (viewport.width_px as f32).max(1.0),
            (viewport.height_px as f32).max(1.0),
            0.0,
            1.0,
        );

        let frame = &self.frame;

        // Layer order is mandatory: edges under nodes under emphasis
        // overlays; alpha compositing depends on it.
        if frame.draw_edges {
            renderer.render_edges(render_pass, &frame.bucket_ranges);
        }
        renderer.render_nodes(render_pass, frame.node_instances.len() as u32);
        renderer.render_emphasis(render_pass, frame.hover_range);
        renderer.render_emphasis(render_pass, frame.selection_range);
        if let Some(ring) = &frame.ring {
            renderer.render_ring(render_pass, ring.segments as u32);
        }
        renderer.render_emphasis(render_pass, frame.highlight_range);
    }
}
