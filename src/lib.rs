//! # progan-layers
//!
//! Building blocks for progressively grown generative adversarial networks
//! (ProGAN), written against the Burn tensor framework.
//!
//! ## Features
//!
//! - **Equalized learning rate**: [`EqualizedConv2d`], [`EqualizedDeconv2d`] and
//!   [`EqualizedLinear`] store unit-variance weights and rescale their input
//!   at runtime by a constant captured at initialization.
//! - **Minibatch standard deviation**: [`MinibatchStddev`] appends a feature
//!   map describing per-group sample diversity.
//! - **Pixelwise normalization**: [`PixelwiseNorm`] normalizes every pixel's
//!   feature vector across channels.
//! - **Progressive growing**: [`ConcatTable`] runs the old and new paths of a
//!   growing network side by side and [`FadeIn`] blends them with a clamped
//!   `alpha` driven by the training loop.
//! - **Upsampling**: [`Upsample`] doubles spatial resolution with nearest
//!   neighbor replication.
//!
//! Model assembly, optimizers and training loops are left to the caller.
//!
//! ## Example
//!
//! ```
//! use progan_layers::prelude::*;
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//!
//! type Backend = NdArray;
//!
//! let device = <Backend as burn::tensor::backend::Backend>::Device::default();
//!
//! // Grow a 4x4 stage to 8x8 and blend the new path in
//! let to_rgb_old: EqualizedConv2d<Backend> = EqualizedConv2dConfig::new(16, 3, 1)
//!     .init(&device)
//!     .expect("valid config");
//! let to_rgb_new: EqualizedConv2d<Backend> = EqualizedConv2dConfig::new(16, 3, 1)
//!     .init(&device)
//!     .expect("valid config");
//!
//! let features = Upsample::new().forward(Tensor::<Backend, 4>::ones([2, 16, 4, 4], &device));
//! let branches: ConcatTable<Backend, _, _> = ConcatTable::new(to_rgb_old, to_rgb_new);
//!
//! let mut fade = FadeIn::new(0.0);
//! fade.update_alpha(0.25);
//!
//! let image = fade.forward(branches.forward(features));
//! assert_eq!(image.dims(), [2, 3, 8, 8]);
//! ```

pub mod errors;
pub mod layers;

// Re-exports for convenience
pub use errors::LayerError;
pub use layers::{
    Activation, ConcatTable, EqualizedConv2d, EqualizedConv2dConfig, EqualizedDeconv2d,
    EqualizedDeconv2dConfig, EqualizedLinear, EqualizedLinearConfig, FadeIn, MinibatchStddev,
    MinibatchStddevConfig, PixelwiseNorm, Transform, Upsample,
};

/// Backend type alias for WGPU with autodiff support.
pub type Backend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Backend type for inference (no autodiff).
pub type InferenceBackend = burn::backend::Wgpu;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::errors::LayerError;
    pub use crate::layers::{
        Activation, ConcatTable, EqualizedConv2d, EqualizedConv2dConfig, EqualizedDeconv2d,
        EqualizedDeconv2dConfig, EqualizedLinear, EqualizedLinearConfig, FadeIn,
        MinibatchStddev, MinibatchStddevConfig, PixelwiseNorm, Transform, Upsample,
    };
    pub use crate::{Backend, InferenceBackend};
}
