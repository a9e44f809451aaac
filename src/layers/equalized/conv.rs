//! Equalized 2D convolution.

use super::{EqualizedWeight, add_channel_bias, zero_bias};
use crate::errors::LayerError;
use crate::layers::{Activation, Transform};
use burn::{
    module::{Module, Param},
    tensor::{Tensor, backend::Backend, module::conv2d, ops::ConvOptions},
};
use serde::{Deserialize, Serialize};

/// Configuration for an [`EqualizedConv2d`] layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqualizedConv2dConfig {
    /// Number of input channels.
    pub in_features: usize,
    /// Number of output channels.
    pub out_features: usize,
    /// Side of the square kernel.
    pub kernel_size: usize,
    /// Stride in both spatial dimensions.
    pub stride: usize,
    /// Zero padding in both spatial dimensions.
    pub padding: usize,
    /// Whether to add a learnable per-channel bias.
    pub bias: bool,
    /// Activation whose Kaiming gain scales the initial weight draw.
    pub init_activation: Activation,
}

impl EqualizedConv2dConfig {
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
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<EqualizedConv2d<B>, LayerError> {
        LayerError::ensure_positive("in_features", self.in_features)?;
        LayerError::ensure_positive("out_features", self.out_features)?;
        LayerError::ensure_positive("kernel_size", self.kernel_size)?;
        LayerError::ensure_positive("stride", self.stride)?;

        let k = self.kernel_size;
        let EqualizedWeight { weight, scale } = EqualizedWeight::init(
            [self.out_features, self.in_features, k, k],
            self.in_features * k * k,
            self.out_features * k * k,
            self.init_activation,
            device,
        );
        log::debug!(
            "EqualizedConv2d {}->{} (k={}) initialized with scale {:.6}",
            self.in_features,
            self.out_features,
            k,
            scale
        );

        Ok(EqualizedConv2d {
            weight,
            bias: self.bias.then(|| zero_bias(self.out_features, device)),
            scale,
            in_features: self.in_features,
            out_features: self.out_features,
            kernel_size: k,
            stride: self.stride,
            padding: self.padding,
        })
    }
}

/// 2D convolution with equalized learning rate.
///
/// Computes `conv2d(input * scale, weight) + bias`, where the weight has shape
/// `[out_features, in_features, k, k]` and unit mean square at initialization.
#[derive(Module, Debug)]
pub struct EqualizedConv2d<B: Backend> {
    weight: Param<Tensor<B, 4>>,
    bias: Option<Param<Tensor<B, 1>>>,
    /// Fixed at construction; not trainable.
    scale: f32,
    in_features: usize,
    out_features: usize,
    kernel_size: usize,
    stride: usize,
    padding: usize,
}

impl<B: Backend> EqualizedConv2d<B> {
    /// Performs the forward pass on a `[batch, in_features, height, width]` input.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let options = ConvOptions::new([self.stride; 2], [self.padding; 2], [1, 1], 1);
        let output = conv2d(
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

    /// Returns the current (normalized) weight tensor.
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

    /// Returns the side of the square kernel.
    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }
}

impl<B: Backend> Transform<Tensor<B, 4>> for EqualizedConv2d<B> {
    type Output = Tensor<B, 4>;

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        EqualizedConv2d::forward(self, input)
    }
}
