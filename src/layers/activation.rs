//! Activation functions used around the progressive-growing layers.

use burn::tensor::{Tensor, backend::Backend};
use serde::{Deserialize, Serialize};

/// Slope used by the leaky ReLU throughout ProGAN generators and discriminators.
pub const PROGAN_LEAKY_SLOPE: f64 = 0.2;

/// Supported activation functions.
///
/// Besides applying the nonlinearity, each variant knows the Kaiming gain
/// that keeps activations at unit variance when it follows a layer. The
/// equalized layers use that gain for their initial normal fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Activation {
    /// No activation (identity function).
    #[default]
    None,
    /// Rectified Linear Unit: f(x) = max(0, x)
    Relu,
    /// Leaky ReLU: f(x) = x for x >= 0, else negative_slope * x
    LeakyRelu { negative_slope: f64 },
    /// Hyperbolic tangent: f(x) = tanh(x)
    Tanh,
    /// Sigmoid: f(x) = 1 / (1 + exp(-x))
    Sigmoid,
}

impl Activation {
    /// Leaky ReLU with the slope ProGAN uses between layers.
    pub fn leaky_relu() -> Self {
        Activation::LeakyRelu {
            negative_slope: PROGAN_LEAKY_SLOPE,
        }
    }

    /// Applies the activation function to a tensor.
    pub fn apply<B: Backend, const D: usize>(&self, tensor: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Activation::None => tensor,
            Activation::Relu => burn::tensor::activation::relu(tensor),
            Activation::LeakyRelu { negative_slope } => {
                burn::tensor::activation::leaky_relu(tensor, *negative_slope)
            }
            Activation::Tanh => burn::tensor::activation::tanh(tensor),
            Activation::Sigmoid => burn::tensor::activation::sigmoid(tensor),
        }
    }

    /// Returns the recommended Kaiming gain for this nonlinearity.
    pub fn gain(&self) -> f64 {
        match self {
            Activation::None | Activation::Sigmoid => 1.0,
            Activation::Relu => 2.0_f64.sqrt(),
            Activation::LeakyRelu { negative_slope } => {
                (2.0 / (1.0 + negative_slope * negative_slope)).sqrt()
            }
            Activation::Tanh => 5.0 / 3.0,
        }
    }
}
