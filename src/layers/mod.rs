//! Neural network layer implementations.
//!
//! This module contains the building blocks of a progressively grown GAN:
//! equalized learning-rate layers, minibatch standard deviation, pixelwise
//! normalization, nearest-neighbor upsampling and the fade-in primitives used
//! while a new resolution is blended in.

pub mod activation;
pub mod equalized;
pub mod fade_in;
pub mod minibatch_stddev;
pub mod pixel_norm;
pub mod upsample;

pub use activation::Activation;
pub use equalized::{
    EqualizedConv2d, EqualizedConv2dConfig, EqualizedDeconv2d, EqualizedDeconv2dConfig,
    EqualizedLinear, EqualizedLinearConfig,
};
pub use fade_in::{ConcatTable, FadeIn};
pub use minibatch_stddev::{MinibatchStddev, MinibatchStddevConfig};
pub use pixel_norm::PixelwiseNorm;
pub use upsample::Upsample;

/// A single input to output transform.
///
/// Every layer in this module implements it for its natural input type, which
/// lets [`ConcatTable`] run arbitrary branches and lets model-assembly code
/// chain layers generically.
pub trait Transform<I> {
    type Output;

    fn forward(&self, input: I) -> Self::Output;
}
