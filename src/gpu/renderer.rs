//! Core GPU renderer for the network graph
//!
//! This module provides the main [`GraphRenderer`] struct which manages the
//! wgpu render pipelines, buffers, and draw calls for instanced rendering of
//! edge segments, node discs, and the selection ring.

use wgpu::util::DeviceExt;

use super::config::GraphicsConfig;
use super::instance::{BucketUniforms, EdgeInstance, FrameUniforms, NodeInstance, RingUniforms};
use crate::constants::render;

/// Stride of one bucket uniform slot; dynamic offsets must be aligned to
/// the device's minimum uniform alignment.
const BUCKET_SLOT: u64 = 256;

/// GPU-accelerated edge, node, and selection-ring renderer
pub struct GraphRenderer {
    node_pipeline: wgpu::RenderPipeline,
    edge_pipeline: wgpu::RenderPipeline,
    ring_pipeline: wgpu::RenderPipeline,
    quad_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
    node_instance_buffer: wgpu::Buffer,
    edge_instance_buffer: wgpu::Buffer,
    emphasis_instance_buffer: wgpu::Buffer,
    base_uniform_buffer: wgpu::Buffer,
    overlay_uniform_buffer: wgpu::Buffer,
    bucket_uniform_buffer: wgpu::Buffer,
    ring_uniform_buffer: wgpu::Buffer,
    base_bind_group: wgpu::BindGroup,
    overlay_bind_group: wgpu::BindGroup,
    bucket_bind_group: wgpu::BindGroup,
    ring_bind_group: wgpu::BindGroup,
    /// Data version of the static buffers currently resident on the GPU.
    uploaded_version: u64,
}

impl GraphRenderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let node_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Node Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("./shaders/node.wgsl").into()),
        });
        let edge_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Edge Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("./shaders/edge.wgsl").into()),
        });
        let ring_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Ring Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("./shaders/ring.wgsl").into()),
        });

        // Unit quad shared by the node and edge pipelines
        #[rustfmt::skip]
        let vertices: &[f32] = &[
            // Position, TexCoord
            0.0, 0.0,  0.0, 0.0, // Bottom-left
            1.0, 0.0,  1.0, 0.0, // Bottom-right
            1.0, 1.0,  1.0, 1.0, // Top-right
            0.0, 1.0,  0.0, 1.0, // Top-left
        ];
        let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let indices: &[u16] = &[0, 1, 2, 2, 3, 0];
        let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let node_instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Node Instance Buffer"),
            size: (render::MAX_NODE_INSTANCES * std::mem::size_of::<NodeInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let edge_instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Edge Instance Buffer"),
            size: (render::MAX_EDGE_INSTANCES * std::mem::size_of::<EdgeInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        // Transient per-frame buffer for the hover/selection/highlight subsets
        let emphasis_instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Emphasis Instance Buffer"),
            size: (render::MAX_EMPHASIS_INSTANCES * std::mem::size_of::<NodeInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_size = std::mem::size_of::<FrameUniforms>() as u64;
        let base_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Base Uniform Buffer"),
            size: uniform_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let overlay_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Overlay Uniform Buffer"),
            size: uniform_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bucket_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Bucket Uniform Buffer"),
            size: render::MAX_EDGE_BUCKETS as u64 * BUCKET_SLOT,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let ring_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ring Uniform Buffer"),
            size: std::mem::size_of::<RingUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bucket_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bucket Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<BucketUniforms>() as u64
                    ),
                },
                count: None,
            }],
        });
        let ring_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Ring Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let base_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Base Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: base_uniform_buffer.as_entire_binding(),
            }],
        });
        let overlay_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Overlay Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: overlay_uniform_buffer.as_entire_binding(),
            }],
        });
        let bucket_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bucket Bind Group"),
            layout: &bucket_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &bucket_uniform_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<BucketUniforms>() as u64),
                }),
            }],
        });
        let ring_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Ring Bind Group"),
            layout: &ring_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ring_uniform_buffer.as_entire_binding(),
            }],
        });

        let quad_vertex_layout = wgpu::VertexBufferLayout {
            array_stride: 4 * 4, // 4 floats * 4 bytes
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 8,
                    shader_location: 1,
                },
            ],
        };
        let node_instance_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<NodeInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 2,
                },
                // Size
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32,
                    offset: 8,
                    shader_location: 3,
                },
                // Identity attribute
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32,
                    offset: 12,
                    shader_location: 4,
                },
                // Color
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 16,
                    shader_location: 5,
                },
            ],
        };
        let edge_instance_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<EdgeInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Source position
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 2,
                },
                // Target position
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 8,
                    shader_location: 3,
                },
                // Endpoint identity attributes
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 16,
                    shader_location: 4,
                },
                // Color
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 24,
                    shader_location: 5,
                },
            ],
        };

        let color_target = wgpu::ColorTargetState {
            format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        };
        let primitive = wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        };

        let node_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Node Pipeline Layout"),
                bind_group_layouts: &[&frame_layout],
                push_constant_ranges: &[],
            });
        let node_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            cache: None,
            label: Some("Node Render Pipeline"),
            layout: Some(&node_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &node_shader,
                entry_point: Some("vs_main"),
                buffers: &[quad_vertex_layout.clone(), node_instance_layout],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive,
            depth_stencil: None,
            multisample: GraphicsConfig::global().multisample_state(),
            fragment: Some(wgpu::FragmentState {
                module: &node_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(color_target.clone())],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
        });

        let edge_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Edge Pipeline Layout"),
                bind_group_layouts: &[&frame_layout, &bucket_layout],
                push_constant_ranges: &[],
            });
        let edge_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            cache: None,
            label: Some("Edge Render Pipeline"),
            layout: Some(&edge_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &edge_shader,
                entry_point: Some("vs_main"),
                buffers: &[quad_vertex_layout, edge_instance_layout],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive,
            depth_stencil: None,
            multisample: GraphicsConfig::global().multisample_state(),
            fragment: Some(wgpu::FragmentState {
                module: &edge_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(color_target.clone())],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
        });

        let ring_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Ring Pipeline Layout"),
                bind_group_layouts: &[&frame_layout, &ring_layout],
                push_constant_ranges: &[],
            });
        let ring_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            cache: None,
            label: Some("Ring Render Pipeline"),
            layout: Some(&ring_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &ring_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: GraphicsConfig::global().multisample_state(),
            fragment: Some(wgpu::FragmentState {
                module: &ring_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(color_target)],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
        });

        Self {
            node_pipeline,
            edge_pipeline,
            ring_pipeline,
            quad_vertex_buffer,
            quad_index_buffer,
            node_instance_buffer,
            edge_instance_buffer,
            emphasis_instance_buffer,
            base_uniform_buffer,
            overlay_uniform_buffer,
            bucket_uniform_buffer,
            ring_uniform_buffer,
            base_bind_group,
            overlay_bind_group,
            bucket_bind_group,
            ring_bind_group,
            uploaded_version: 0,
        }
    }

    pub fn update_uniforms(
        &self,
        queue: &wgpu::Queue,
        base: &FrameUniforms,
        overlay: &FrameUniforms,
    ) {
        queue.write_buffer(&self.base_uniform_buffer, 0, bytemuck::cast_slice(&[*base]));
        queue.write_buffer(
            &self.overlay_uniform_buffer,
            0,
            bytemuck::cast_slice(&[*overlay]),
        );
    }

    /// Uploads the node/edge instance arrays, but only when the data
    /// version differs from what is already resident. The static buffers
    /// are owned here; the render pass only reads them.
    pub fn upload_static(
        &mut self,
        queue: &wgpu::Queue,
        version: u64,
        nodes: &[NodeInstance],
        edges: &[EdgeInstance],
    ) {
        if version == self.uploaded_version {
            return;
        }
        if nodes.len() > render::MAX_NODE_INSTANCES {
            log::warn!(
                "node count {} exceeds instance buffer capacity {}, skipping upload",
                nodes.len(),
                render::MAX_NODE_INSTANCES
            );
            return;
        }
        if edges.len() > render::MAX_EDGE_INSTANCES {
            log::warn!(
                "edge count {} exceeds instance buffer capacity {}, skipping upload",
                edges.len(),
                render::MAX_EDGE_INSTANCES
            );
            return;
        }
        if !nodes.is_empty() {
            queue.write_buffer(&self.node_instance_buffer, 0, bytemuck::cast_slice(nodes));
        }
        if !edges.is_empty() {
            queue.write_buffer(&self.edge_instance_buffer, 0, bytemuck::cast_slice(edges));
        }
        self.uploaded_version = version;
    }

    pub fn update_bucket_uniforms(&self, queue: &wgpu::Queue, widths: &[f32]) {
        if widths.len() > render::MAX_EDGE_BUCKETS {
            log::warn!(
                "{} weight buckets exceed the {} draw-call slots, extra buckets are not drawn",
                widths.len(),
                render::MAX_EDGE_BUCKETS
            );
        }
        for (i, &width) in widths.iter().take(render::MAX_EDGE_BUCKETS).enumerate() {
            let slot = BucketUniforms {
                width,
                _padding: [0.0; 3],
            };
            queue.write_buffer(
                &self.bucket_uniform_buffer,
                i as u64 * BUCKET_SLOT,
                bytemuck::cast_slice(&[slot]),
            );
        }
    }

    /// Uploads the per-frame emphasis subsets (hover/selection/highlight).
    pub fn update_emphasis(&self, queue: &wgpu::Queue, instances: &[NodeInstance]) {
        if instances.is_empty() {
            return;
        }
        if instances.len() > render::MAX_EMPHASIS_INSTANCES {
            log::warn!(
                "emphasis subset {} exceeds buffer capacity {}, truncating",
                instances.len(),
                render::MAX_EMPHASIS_INSTANCES
            );
        }
        let n = instances.len().min(render::MAX_EMPHASIS_INSTANCES);
        queue.write_buffer(
            &self.emphasis_instance_buffer,
            0,
            bytemuck::cast_slice(&instances[..n]),
        );
    }

    pub fn update_ring(&self, queue: &wgpu::Queue, ring: &RingUniforms) {
        queue.write_buffer(&self.ring_uniform_buffer, 0, bytemuck::cast_slice(&[*ring]));
    }

    /// One draw call per weight bucket, each with its own width uniform
    /// selected through a dynamic offset.
    pub fn render_edges(&self, render_pass: &mut wgpu::RenderPass, ranges: &[(u32, u32)]) {
        render_pass.set_pipeline(&self.edge_pipeline);
        render_pass.set_bind_group(0, &self.base_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.edge_instance_buffer.slice(..));
        render_pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        for (bucket, &(start, end)) in ranges.iter().take(render::MAX_EDGE_BUCKETS).enumerate() {
            if start == end {
                continue;
            }
            let offset = (bucket as u64 * BUCKET_SLOT) as u32;
            render_pass.set_bind_group(1, &self.bucket_bind_group, &[offset]);
            render_pass.draw_indexed(0..6, 0, start..end);
        }
    }

    /// The base node pass: every node in one instanced draw.
    pub fn render_nodes(&self, render_pass: &mut wgpu::RenderPass, instance_count: u32) {
        if instance_count == 0 {
            return;
        }
        render_pass.set_pipeline(&self.node_pipeline);
        render_pass.set_bind_group(0, &self.base_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.node_instance_buffer.slice(..));
        render_pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..6, 0, 0..instance_count);
    }

    /// An emphasis overlay pass: a slice of the transient subset buffer at
    /// forced full opacity.
    pub fn render_emphasis(&self, render_pass: &mut wgpu::RenderPass, range: (u32, u32)) {
        if range.0 == range.1 {
            return;
        }
        render_pass.set_pipeline(&self.node_pipeline);
        render_pass.set_bind_group(0, &self.overlay_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.emphasis_instance_buffer.slice(..));
        render_pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..6, 0, range.0..range.1);
    }

    /// The selection ring outline around the selected node.
    pub fn render_ring(&self, render_pass: &mut wgpu::RenderPass, segments: u32) {
        render_pass.set_pipeline(&self.ring_pipeline);
        render_pass.set_bind_group(0, &self.overlay_bind_group, &[]);
        render_pass.set_bind_group(1, &self.ring_bind_group, &[]);
        // Close the strip by repeating the first vertex.
        render_pass.draw(0..segments + 1, 0..1);
    }
}
