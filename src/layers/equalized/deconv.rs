//! Equalized 2D transposed convolution.

use super::{EqualizedWeight, add_channel_bias, zero_bias};
use crate::errors::LayerError;
use crate::layers::{Activation, Transform};
use burn::{
    module::{Module, Param},
    tensor::{Tensor, backend::Backend, module::conv_transpose2d, ops::ConvTransposeOptions},
};
use serde::{Deserialize, Serialize};

/// Configuration for an [`EqualizedDeconv2d`] layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqualizedDeconv2dConfig {
    /// Number of input channels.
    pub in_features: usize,
    /// Number of output channels.
    pub out_features: usize,
    /// Side of the square kernel.
    pub kernel_size: usize,
    /// Stride in both spatial dimensions.
    pub stride: usize,
    /// Padding removed from both spatial dimensions of the output.
    pub padding: usize,
    /// Whether to add a learnable per-channel bias.
    pub bias: bool,
    /// Activation whose Kaiming gain scales the initial weight draw.
    pub init_activation: Activation,
}

impl EqualizedDeconv2dConfig {
    /// Creates a config with stride 1, no padding and a bias.
    pub fn new(in_features: usize, out_features: usize, kernel_size: usize) -> Self {
        Self {
            in_features,
            out_features,
            kernel_size,
            stride: 1,
            padding: 0,
            bias: true,
            init_activation: Activation::None,
        }
    }

    /// Sets the stride.
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    /// Sets the padding.
    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    /// Enables or disables the bias.
    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    /// Sets the activation used to pick the initialization gain.
    pub fn with_init_activation(mut self, activation: Activation) -> Self {
        self.init_activation = activation;
        self
    }

    /// Initializes the layer on the given device.
    ///
    /// The kernel is laid out `[in_features, out_features, k, k]`, so the
    /// fan-in used for the initial draw is `out_features * k * k`.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<EqualizedDeconv2d<B>, LayerError> {
        LayerError::ensure_positive("in_features", self.in_features)?;
        LayerError::ensure_positive("out_features", self.out_features)?;
        LayerError::ensure_positive("kernel_size", self.kernel_size)?;
        LayerError::ensure_positive("stride", self.stride)?;

        let k = self.kernel_size;
        let EqualizedWeight { weight, scale } = EqualizedWeight::init(
            [self.in_features, self.out_features, k, k],
            self.out_features * k * k,
            self.in_features * k * k,
            self.init_activation,
            device,
        );
        log::debug!(
            "EqualizedDeconv2d {}->{} (k={}) initialized with scale {:.6}",
            self.in_features,
            self.out_features,
            k,
            scale
        );

        Ok(EqualizedDeconv2d {
            weight,
            bias: self.bias.then(|| zero_bias(self.out_features, device)),
            scale,
            in_features: self.in_features,
            out_features: self.out_features,
            stride: self.stride,
            padding: self.padding,
        })
    }
}

/// Transposed 2D convolution with equalized learning rate.
#[derive(Module, Debug)]
pub struct EqualizedDeconv2d<B: Backend> {
    weight: Param<Tensor<B, 4>>,
    bias: Option<Param<Tensor<B, 1>>>,
    scale: f32,
    in_features: usize,
    out_features: usize,
    stride: usize,
    padding: usize,
}

impl<B: Backend> EqualizedDeconv2d<B> {
    /// Performs the forward pass on a `[batch, in_features, height, width]` input.
    ///
    /// Output side is `(side - 1) * stride - 2 * padding + kernel_size`.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let options =
            ConvTransposeOptions::new([self.stride; 2], [self.padding; 2], [0, 0], [1, 1], 1);
        let output = conv_transpose2d(
            input.mul_scalar(self.scale),
            self.weight.val(),
            None,
            options,
        );

        match &self.bias {
            Some(bias) => add_channel_bias(output, bias.val()),
            None => output,
        }
    }

    /// Returns the construction-time weight scale.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Returns the current weight, shape `[in_features, out_features, k, k]`.
    pub fn weight(&self) -> Tensor<B, 4> {
        self.weight.val()
    }

    /// Returns the bias, if enabled.
    pub fn bias(&self) -> Option<Tensor<B, 1>> {
        self.bias.as_ref().map(|bias| bias.val())
    }

    /// Returns the number of input channels of this layer.
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Returns the number of output channels of this layer.
    pub fn out_features(&self) -> usize {
        self.out_features
    }
}

impl<B: Backend> Transform<Tensor<B, 4>> for EqualizedDeconv2d<B> {
    type Output = Tensor<B, 4>;

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        EqualizedDeconv2d::forward(self, input)
    }
}
