//! GPU instance data structures and per-frame draw data
//!
//! Instance structs are `bytemuck` Pod types uploaded verbatim into vertex
//! buffers. The node identity rides along as a dedicated per-instance
//! attribute so the shaders can compare "am I the hovered/selected node"
//! against the scalar uniforms without any CPU round trip.

use std::sync::Arc;

use glam::{Mat3, Mat4, Vec4};

use crate::constants::render;
use crate::graph::buffers::RenderBuffers;

/// Instance data for a single node disc in GPU memory
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeInstance {
    pub position: [f32; 2],
    /// Disc radius in viewport pixels, before zoom attenuation.
    pub size: f32,
    /// Dense node index as the GPU-side identity attribute.
    pub node_index: f32,
    pub color: [f32; 4],
}

/// Instance data for a single edge segment in GPU memory
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EdgeInstance {
    pub source: [f32; 2],
    pub target: [f32; 2],
    /// Dense indices of both endpoints, for relevance tests in the shader.
    pub endpoints: [f32; 2],
    pub color: [f32; 4],
}

/// Uniform data shared by all three pipelines
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    /// `projection * model`, widened to 4x4 for WGSL.
    pub matrix: [[f32; 4]; 4],
    pub viewport: [f32; 2],
    pub zoom: f32,
    pub device_pixel_ratio: f32,
    /// Hovered node index, or -1.0 for none.
    pub hovered: f32,
    /// Selected node index, or -1.0 for none.
    pub selected: f32,
    /// 1.0 while any emphasis state is active (non-relevant primitives dim).
    pub dimming: f32,
    pub dim_factor: f32,
    pub nodes_opacity: f32,
    pub edges_opacity: f32,
    pub _padding: [f32; 2],
}

/// Per-draw uniform slot for one edge-weight bucket
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BucketUniforms {
    /// Rendered line width in pixels, before zoom attenuation.
    pub width: f32,
    pub _padding: [f32; 3],
}

/// Uniform data for the selection ring outline
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RingUniforms {
    /// Ring center in viewport-space node coordinates.
    pub center: [f32; 2],
    /// Ring radius in the same space, already zoom-attenuated.
    pub radius: f32,
    /// Segment count of the outline.
    pub segments: f32,
    pub color: [f32; 4],
}

/// Widens a 2D affine matrix to the 4x4 form the shaders consume.
pub fn mat3_to_mat4(m: Mat3) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(m.x_axis.x, m.x_axis.y, 0.0, 0.0),
        Vec4::new(m.y_axis.x, m.y_axis.y, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(m.z_axis.x, m.z_axis.y, 0.0, 1.0),
    )
}

impl FrameUniforms {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        matrix: Mat3,
        viewport: [f32; 2],
        zoom: f32,
        device_pixel_ratio: f32,
        hovered: Option<usize>,
        selected: Option<usize>,
        dimming: bool,
        nodes_opacity: f32,
        edges_opacity: f32,
    ) -> Self {
        let index_or_none = |i: Option<usize>| i.map_or(-1.0, |i| i as f32);
        Self {
            matrix: mat3_to_mat4(matrix).to_cols_array_2d(),
            viewport,
            zoom,
            device_pixel_ratio,
            hovered: index_or_none(hovered),
            selected: index_or_none(selected),
            dimming: if dimming { 1.0 } else { 0.0 },
            dim_factor: render::DIM_FACTOR,
            nodes_opacity,
            edges_opacity,
            _padding: [0.0, 0.0],
        }
    }

    /// Variant for the emphasis overlay passes: full opacity, no dimming.
    pub fn overlay(&self) -> Self {
        Self {
            dimming: 0.0,
            nodes_opacity: 1.0,
            ..*self
        }
    }
}

/// Builds the full node instance array from loaded buffers.
pub fn node_instances(buffers: &RenderBuffers) -> Vec<NodeInstance> {
    buffers
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| NodeInstance {
            position,
            size: buffers.sizes[i],
            node_index: i as f32,
            color: buffers.colors[i],
        })
        .collect()
}

/// Flattens the weight buckets into one edge instance array plus the
/// per-bucket widths and instance ranges (one draw call each).
pub fn edge_instances(buffers: &RenderBuffers) -> (Vec<EdgeInstance>, Vec<f32>, Vec<(u32, u32)>) {
    let mut instances = Vec::with_capacity(buffers.edge_count());
    let mut widths = Vec::with_capacity(buffers.edge_buckets.len());
    let mut ranges = Vec::with_capacity(buffers.edge_buckets.len());
    for bucket in &buffers.edge_buckets {
        let start = instances.len() as u32;
        for edge in &bucket.edges {
            instances.push(EdgeInstance {
                source: edge.source,
                target: edge.target,
                endpoints: [edge.source_index as f32, edge.target_index as f32],
                color: edge.color,
            });
        }
        widths.push(bucket.width);
        ranges.push((start, instances.len() as u32));
    }
    (instances, widths, ranges)
}

/// Everything one frame hands to the paint callback.
///
/// The static node/edge arrays are shared by `Arc` and re-uploaded only when
/// `data_version` changes; the emphasis subsets are tiny and rebuilt every
/// frame they are needed.
pub struct FrameData {
    pub base_uniforms: FrameUniforms,
    pub overlay_uniforms: FrameUniforms,
    pub data_version: u64,
    pub node_instances: Arc<Vec<NodeInstance>>,
    pub edge_instances: Arc<Vec<EdgeInstance>>,
    pub bucket_widths: Vec<f32>,
    pub bucket_ranges: Vec<(u32, u32)>,
    pub draw_edges: bool,
    /// Hover, selection and highlight subsets, concatenated.
    pub emphasis: Vec<NodeInstance>,
    pub hover_range: (u32, u32),
    pub selection_range: (u32, u32),
    pub highlight_range: (u32, u32),
    pub ring: Option<RingUniforms>,
}
