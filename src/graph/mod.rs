//! Network data model and GPU-facing buffer construction
//!
//! [`data`] owns the input records and the adjacency store; [`buffers`]
//! turns a loaded graph into the columnar arrays and edge-weight buckets the
//! renderer consumes.

pub mod buffers;
pub mod data;

pub use buffers::{EdgeBucket, RenderBuffers};
pub use data::{EdgeInput, Graph, LinkInfo, NetworkData, NodeInfo, NodeInput};
