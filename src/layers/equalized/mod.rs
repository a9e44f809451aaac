//! Equalized learning-rate layers.
//!
//! Each layer draws its weight from a Kaiming normal distribution, records the
//! root mean square of that draw as `scale`, and stores `weight / scale` as the
//! trainable parameter. At forward time the input is multiplied by `scale`
//! before the linear operation, so the effective weight matches the initial
//! draw while every layer trains on unit-variance parameters.
//!
//! `scale` is captured once at construction and kept as a constant module
//! field: it is not a parameter and never tracks later weight updates.

mod conv;
mod deconv;
mod linear;

pub use conv::{EqualizedConv2d, EqualizedConv2dConfig};
pub use deconv::{EqualizedDeconv2d, EqualizedDeconv2dConfig};
pub use linear::{EqualizedLinear, EqualizedLinearConfig};

use crate::layers::Activation;
use burn::{
    module::Param,
    nn::Initializer,
    tensor::{ElementConversion, Tensor, backend::Backend},
};

/// Initial fill for an equalized layer, already divided by its scale.
pub(crate) struct EqualizedWeight<B: Backend, const D: usize> {
    pub weight: Param<Tensor<B, D>>,
    pub scale: f32,
}

impl<B: Backend, const D: usize> EqualizedWeight<B, D> {
    /// Draws a Kaiming-normal weight of `shape` and normalizes it to unit RMS.
    pub fn init(
        shape: [usize; D],
        fan_in: usize,
        fan_out: usize,
        activation: Activation,
        device: &B::Device,
    ) -> Self {
        let initializer = Initializer::KaimingNormal {
            gain: activation.gain(),
            fan_out_only: false,
        };
        let drawn: Param<Tensor<B, D>> =
            initializer.init_with(shape, Some(fan_in), Some(fan_out), device);
        let initial = drawn.val();

        let scale = root_mean_square(initial.clone());
        // Stored weight must be a leaf for `Param` to track it on autodiff.
        Self {
            weight: Param::from_tensor(initial.div_scalar(scale).detach()),
            scale,
        }
    }
}

/// Computes `sqrt(mean(tensor^2))` as a host scalar.
pub(crate) fn root_mean_square<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> f32 {
    tensor
        .powf_scalar(2.0)
        .mean()
        .sqrt()
        .into_scalar()
        .elem::<f32>()
}

/// Zero-initialized bias vector of length `features`.
pub(crate) fn zero_bias<B: Backend>(features: usize, device: &B::Device) -> Param<Tensor<B, 1>> {
    Param::from_tensor(Tensor::zeros([features], device))
}

/// Adds a per-channel bias to a `[batch, channels, height, width]` tensor.
pub(crate) fn add_channel_bias<B: Backend>(
    output: Tensor<B, 4>,
    bias: Tensor<B, 1>,
) -> Tensor<B, 4> {
    let [channels] = bias.dims();
    output + bias.reshape([1, channels, 1, 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{EqualizedConv2dConfig, EqualizedDeconv2dConfig, EqualizedLinearConfig};
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = NdArray;
    type TrainingBackend = Autodiff<NdArray>;

    #[test]
    fn test_equalized_weight_has_unit_rms() {
        let device = <TestBackend as Backend>::Device::default();
        let init =
            EqualizedWeight::<TestBackend, 2>::init([64, 32], 64, 32, Activation::None, &device);

        let rms = root_mean_square(init.weight.val());
        assert!((rms - 1.0).abs() < 1e-4, "rms after division = {}", rms);
    }

    #[test]
    fn test_equalized_weight_scale_tracks_gain() {
        let device = <TestBackend as Backend>::Device::default();
        // 128 * 3 * 3 = 1152 fan-in, 64 * 1152 draws
        let fan_in = 128 * 9;
        let init = EqualizedWeight::<TestBackend, 4>::init(
            [64, 128, 3, 3],
            fan_in,
            64 * 9,
            Activation::Relu,
            &device,
        );

        let expected = (2.0_f32.sqrt()) / (fan_in as f32).sqrt();
        assert!(
            (init.scale - expected).abs() / expected < 0.05,
            "scale {} too far from {}",
            init.scale,
            expected
        );
    }

    #[test]
    fn test_add_channel_bias_broadcasts() {
        let device = <TestBackend as Backend>::Device::default();
        let output = Tensor::<TestBackend, 4>::zeros([2, 3, 2, 2], &device);
        let bias = Tensor::<TestBackend, 1>::from_floats([1.0, -1.0, 0.5], &device);

        let result: Vec<f32> = add_channel_bias(output, bias).to_data().to_vec().unwrap();
        assert_eq!(result.len(), 24);
        for (index, value) in result.iter().enumerate() {
            let channel = (index / 4) % 3;
            let expected = [1.0, -1.0, 0.5][channel];
            assert_eq!(*value, expected);
        }
    }

    #[test]
    fn test_layers_build_on_autodiff_backend() {
        let device = <TrainingBackend as Backend>::Device::default();

        let conv = EqualizedConv2dConfig::new(3, 4, 3)
            .init::<TrainingBackend>(&device)
            .expect("valid config");
        let deconv = EqualizedDeconv2dConfig::new(4, 2, 4)
            .init::<TrainingBackend>(&device)
            .expect("valid config");
        let linear = EqualizedLinearConfig::new(8, 2)
            .init::<TrainingBackend>(&device)
            .expect("valid config");

        assert!((root_mean_square(conv.weight()) - 1.0).abs() < 1e-4);
        assert!((root_mean_square(deconv.weight()) - 1.0).abs() < 1e-4);
        assert!((root_mean_square(linear.weight()) - 1.0).abs() < 1e-4);
        assert!(conv.weight().is_require_grad());
        assert!(deconv.weight().is_require_grad());
        assert!(linear.weight().is_require_grad());
    }
}
