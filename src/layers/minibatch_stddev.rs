//! Minibatch standard deviation feature layer.

use crate::errors::LayerError;
use crate::layers::Transform;
use burn::{
    module::Module,
    tensor::{Tensor, backend::Backend},
};
use serde::{Deserialize, Serialize};

/// Added to the group variance before the square root.
const STDDEV_EPSILON: f64 = 1e-8;

/// Configuration for a [`MinibatchStddev`] layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinibatchStddevConfig {
    /// Number of samples that share one statistic.
    pub group_size: usize,
}

impl Default for MinibatchStddevConfig {
    fn default() -> Self {
        Self { group_size: 4 }
    }
}

impl MinibatchStddevConfig {
    /// Creates a config with the default group size of 4.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the group size.
    pub fn with_group_size(mut self, group_size: usize) -> Self {
        self.group_size = group_size;
        self
    }

    /// Builds the layer, rejecting a zero group size.
    pub fn init(&self) -> Result<MinibatchStddev, LayerError> {
        LayerError::ensure_positive("group_size", self.group_size)?;
        Ok(MinibatchStddev {
            group_size: self.group_size,
        })
    }
}

/// Appends the average per-group standard deviation as an extra feature map.
///
/// The batch is split into groups of `G` samples; every sample in a group
/// receives the same constant channel, the mean over channels and pixels of
/// the standard deviation across that group. The layer has no parameters.
#[derive(Module, Clone, Debug)]
pub struct MinibatchStddev {
    group_size: usize,
}

impl Default for MinibatchStddev {
    fn default() -> Self {
        Self { group_size: 4 }
    }
}

impl MinibatchStddev {
    /// Returns the configured number of samples per group.
    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Returns `(G, M)`: samples per group and number of groups for `batch`.
    ///
    /// A batch that the group size does not divide is treated as one group.
    pub fn grouping(&self, batch: usize) -> (usize, usize) {
        let group = if batch % self.group_size == 0 {
            self.group_size.min(batch)
        } else {
            log::debug!(
                "batch of {} not divisible by group size {}; using the whole batch as one group",
                batch,
                self.group_size
            );
            batch
        };
        (group, batch / group.max(1))
    }

    /// Maps `[N, C, H, W]` to `[N, C + 1, H, W]`.
    pub fn forward<B: Backend>(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, channels, height, width] = input.dims();
        let (group, groups) = self.grouping(batch);

        // [G, M, C, H, W]: sample n is member n / M of group n % M
        let y = input.clone().reshape([group, groups, channels, height, width]);
        let centered = y.clone() - y.mean_dim(0);
        let variance: Tensor<B, 4> = centered.powf_scalar(2.0).mean_dim(0).squeeze(0);
        let stddev = variance.add_scalar(STDDEV_EPSILON).sqrt();

        // [M] -> [1, M, 1, 1], averaged over feature maps and pixels
        let per_group = stddev
            .reshape([groups, channels * height * width])
            .mean_dim(1)
            .reshape([1, groups, 1, 1]);

        let feature = Tensor::<B, 4>::ones([group, groups, height, width], &input.device())
            .mul(per_group)
            .reshape([batch, 1, height, width]);

        Tensor::cat(vec![input, feature], 1)
    }
}

impl<B: Backend> Transform<Tensor<B, 4>> for MinibatchStddev {
    type Output = Tensor<B, 4>;

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        MinibatchStddev::forward(self, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn stddev_channel(output: Tensor<TestBackend, 4>) -> Vec<f32> {
        let [_, channels, _, _] = output.dims();
        output
            .narrow(1, channels - 1, 1)
            .to_data()
            .to_vec()
            .unwrap()
    }

    #[test]
    fn test_config_rejects_zero_group_size() {
        let result = MinibatchStddevConfig::new().with_group_size(0).init();
        assert!(matches!(result, Err(LayerError::InvalidLayerConfig { .. })));
        assert_eq!(MinibatchStddevConfig::new().init().unwrap().group_size(), 4);
    }

    #[test]
    fn test_grouping_policy() {
        let layer = MinibatchStddev::default();
        assert_eq!(layer.grouping(8), (4, 2));
        assert_eq!(layer.grouping(4), (4, 1));
        // Irregular batches fall back to a single group
        assert_eq!(layer.grouping(5), (5, 1));
        assert_eq!(layer.grouping(2), (2, 1));

        let small = MinibatchStddevConfig::new().with_group_size(1).init().unwrap();
        assert_eq!(small.grouping(3), (1, 3));
    }

    #[test]
    fn test_appends_one_channel() {
        let device = <TestBackend as Backend>::Device::default();
        let layer = MinibatchStddev::default();
        let input = Tensor::<TestBackend, 4>::ones([8, 6, 4, 4], &device);

        let output = layer.forward(input.clone());
        assert_eq!(output.dims(), [8, 7, 4, 4]);

        // Original channels are passed through untouched
        let passthrough: Vec<f32> = output.narrow(1, 0, 6).to_data().to_vec().unwrap();
        let original: Vec<f32> = input.to_data().to_vec().unwrap();
        assert_eq!(passthrough, original);
    }

    #[test]
    fn test_identical_samples_have_zero_stddev() {
        let device = <TestBackend as Backend>::Device::default();
        let sample = Tensor::<TestBackend, 4>::random(
            [1, 3, 2, 2],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        let input = Tensor::cat(vec![sample.clone(), sample.clone(), sample.clone(), sample], 0);

        let channel = stddev_channel(MinibatchStddev::default().forward(input));
        assert_eq!(channel.len(), 16);
        for value in channel {
            // Only sqrt(1e-8) remains
            assert!(value.abs() < 1e-3, "expected ~0, got {}", value);
        }
    }

    #[test]
    fn test_irregular_batch_uses_whole_batch() {
        let device = <TestBackend as Backend>::Device::default();
        // Samples hold the constants 0..5, one per sample
        let input = Tensor::<TestBackend, 1>::from_floats([0.0, 1.0, 2.0, 3.0, 4.0], &device)
            .reshape([5, 1, 1, 1])
            .mul(Tensor::ones([5, 2, 3, 3], &device));

        let output = MinibatchStddev::default().forward(input);
        assert_eq!(output.dims(), [5, 3, 3, 3]);

        // Population stddev of 0..5 is sqrt(2)
        let expected = (2.0_f32 + 1e-8).sqrt();
        for value in stddev_channel(output) {
            assert!((value - expected).abs() < 1e-5, "{} vs {}", value, expected);
        }
    }

    #[test]
    fn test_groups_are_interleaved() {
        let device = <TestBackend as Backend>::Device::default();
        // N=4, group_size=2 -> G=2, M=2; group 0 is samples {0, 2}, group 1 is {1, 3}
        let input = Tensor::<TestBackend, 1>::from_floats([0.0, 5.0, 2.0, 5.0], &device)
            .reshape([4, 1, 1, 1])
            .mul(Tensor::ones([4, 1, 2, 2], &device));

        let layer = MinibatchStddevConfig::new().with_group_size(2).init().unwrap();
        let channel = stddev_channel(layer.forward(input));

        let spread = (1.0_f32 + 1e-8).sqrt();
        let flat = 1e-4_f32;
        for (sample, expected) in [spread, flat, spread, flat].iter().enumerate() {
            for pixel in 0..4 {
                let value = channel[sample * 4 + pixel];
                assert!(
                    (value - expected).abs() < 1e-5,
                    "sample {} pixel {}: {} vs {}",
                    sample,
                    pixel,
                    value,
                    expected
                );
            }
        }
    }
}
