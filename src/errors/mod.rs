//! Error types.

mod layer_error;

pub use layer_error::LayerError;
