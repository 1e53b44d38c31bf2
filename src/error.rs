//! Construction-time validation errors
//!
//! Everything here is fatal and raised synchronously while a viewer is being
//! built. Recoverable conditions (bad color strings, degenerate ranges,
//! singular transforms) are handled in place by local substitution and never
//! surface as errors.

use thiserror::Error;

/// Errors raised while validating input data or options.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The dataset has no node container at all.
    #[error("network data is missing the `nodes` array")]
    MissingNodes,

    /// The node container exists but holds nothing renderable.
    #[error("network data contains an empty `nodes` array")]
    EmptyNodes,

    /// Edges are enabled (the default) but the dataset has none.
    #[error("edges are enabled but the network data is missing the `edges` array")]
    MissingEdges,

    /// A node record carries neither `x`/`y` nor a `position` object.
    #[error("node `{id}` has no position (`x`/`y` or `position.x`/`position.y`)")]
    NodePosition { id: String },

    /// `set_option` was called with a name the viewer does not recognize.
    #[error("unknown option `{0}`")]
    UnknownOption(String),

    /// `set_option` was called with a value of the wrong shape.
    #[error("invalid value for option `{name}`: {reason}")]
    InvalidOption { name: String, reason: String },
}
