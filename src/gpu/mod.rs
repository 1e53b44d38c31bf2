//! GPU rendering module
//!
//! All wgpu-facing functionality: instance data structures, the render
//! pipelines for the three primitive kinds (node discs, edge segments,
//! selection ring), and the egui paint-callback integration.
//!
//! ## Architecture
//!
//! - [`instance`] - Pod instance/uniform structs and per-frame draw data
//! - [`renderer`] - pipelines, GPU buffers and draw calls
//! - [`callback`] - egui paint callback integration
//! - `shaders/` - WGSL programs for the three pipelines

pub mod callback;
pub mod config;
pub mod instance;
pub mod renderer;

pub use callback::GraphPaintCallback;
pub use config::GraphicsConfig;
pub use instance::{
    BucketUniforms, EdgeInstance, FrameData, FrameUniforms, NodeInstance, RingUniforms,
};
pub use renderer::GraphRenderer;
