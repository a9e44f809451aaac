//! Nearest-neighbor 2x upsampling.

use crate::layers::Transform;
use burn::{
    module::Module,
    tensor::{
        Tensor,
        backend::Backend,
        module::interpolate,
        ops::{InterpolateMode, InterpolateOptions},
    },
};

/// Doubles height and width by repeating each pixel in a 2x2 block.
#[derive(Module, Clone, Debug, Default)]
pub struct Upsample;

impl Upsample {
    pub fn new() -> Self {
        Self
    }

    /// Maps `[N, C, H, W]` to `[N, C, 2H, 2W]`.
    pub fn forward<B: Backend>(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let [_, _, height, width] = input.dims();
        interpolate(
            input,
            [height * 2, width * 2],
            InterpolateOptions::new(InterpolateMode::Nearest),
        )
    }
}

impl<B: Backend> Transform<Tensor<B, 4>> for Upsample {
    type Output = Tensor<B, 4>;

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        Upsample::forward(self, input)
    }
}
