//! Equalized fully connected layer.

use super::{EqualizedWeight, zero_bias};
use crate::errors::LayerError;
use crate::layers::{Activation, Transform};
use burn::{
    module::{Module, Param},
    tensor::{Tensor, backend::Backend},
};
use serde::{Deserialize, Serialize};

/// Configuration for an [`EqualizedLinear`] layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqualizedLinearConfig {
    /// Number of input features, after flattening all non-batch dimensions.
    pub in_features: usize,
    /// Number of output features.
    pub out_features: usize,
    /// Whether to add a learnable bias.
    pub bias: bool,
    /// Activation whose Kaiming gain scales the initial weight draw.
    pub init_activation: Activation,
}

impl EqualizedLinearConfig {
    /// Creates a new config with a bias.
    pub fn new(in_features: usize, out_features: usize) -> Self {
        Self {
            in_features,
            out_features,
            bias: true,
            init_activation: Activation::None,
        }
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
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<EqualizedLinear<B>, LayerError> {
        LayerError::ensure_positive("in_features", self.in_features)?;
        LayerError::ensure_positive("out_features", self.out_features)?;

        let EqualizedWeight { weight, scale } = EqualizedWeight::init(
            [self.in_features, self.out_features],
            self.in_features,
            self.out_features,
            self.init_activation,
            device,
        );
        log::debug!(
            "EqualizedLinear {}->{} initialized with scale {:.6}",
            self.in_features,
            self.out_features,
            scale
        );

        Ok(EqualizedLinear {
            weight,
            bias: self.bias.then(|| zero_bias(self.out_features, device)),
            scale,
            in_features: self.in_features,
            out_features: self.out_features,
        })
    }
}

/// Fully connected layer with equalized learning rate.
///
/// It performs: output = (flatten(input) * scale) @ weight + bias
///
/// The weight is stored `[in_features, out_features]`.
#[derive(Module, Debug)]
pub struct EqualizedLinear<B: Backend> {
    weight: Param<Tensor<B, 2>>,
    bias: Option<Param<Tensor<B, 1>>>,
    scale: f32,
    in_features: usize,
    out_features: usize,
}

impl<B: Backend> EqualizedLinear<B> {
    /// Performs the forward pass.
    ///
    /// Every dimension after the batch is flattened, so `[batch, c, h, w]`
    /// requires `in_features == c * h * w`.
    ///
    /// # Panics
    ///
    /// Panics if the input has rank below 2, since there is no batch axis to
    /// keep.
    pub fn forward<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, 2> {
        assert!(
            D >= 2,
            "EqualizedLinear expects an input of rank >= 2, got rank {}",
            D
        );
        let flat: Tensor<B, 2> = input.flatten(1, D - 1);
        let output = flat.mul_scalar(self.scale).matmul(self.weight.val());

        match &self.bias {
            Some(bias) => output + bias.val().reshape([1, self.out_features]),
            None => output,
        }
    }

    /// Returns the construction-time weight scale.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Returns the current weight, shape `[in_features, out_features]`.
    pub fn weight(&self) -> Tensor<B, 2> {
        self.weight.val()
    }

    /// Returns the bias, if enabled.
    pub fn bias(&self) -> Option<Tensor<B, 1>> {
        self.bias.as_ref().map(|bias| bias.val())
    }

    /// Returns the number of input features of this layer.
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Returns the number of output features of this layer.
    pub fn out_features(&self) -> usize {
        self.out_features
    }
}

impl<B: Backend, const D: usize> Transform<Tensor<B, D>> for EqualizedLinear<B> {
    type Output = Tensor<B, 2>;

    fn forward(&self, input: Tensor<B, D>) -> Tensor<B, 2> {
        EqualizedLinear::forward(self, input)
    }
}
