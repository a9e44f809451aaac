//! Pixelwise feature vector normalization.

use crate::layers::Transform;
use burn::{
    module::Module,
    tensor::{Tensor, backend::Backend},
};

const PIXEL_NORM_EPSILON: f64 = 1e-8;

/// Normalizes each pixel's feature vector to unit root mean square.
///
/// It performs: output = x / sqrt(mean_c(x^2) + 1e-8)
#[derive(Module, Clone, Debug, Default)]
pub struct PixelwiseNorm;

impl PixelwiseNorm {
    pub fn new() -> Self {
        Self
    }

    /// Normalizes a `[batch, channels, height, width]` tensor across channels.
    pub fn forward<B: Backend>(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let norm = input
            .clone()
            .powf_scalar(2.0)
            .mean_dim(1)
            .add_scalar(PIXEL_NORM_EPSILON)
            .sqrt();
        input / norm
    }
}

impl<B: Backend> Transform<Tensor<B, 4>> for PixelwiseNorm {
    type Output = Tensor<B, 4>;

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        PixelwiseNorm::forward(self, input)
    }
}
