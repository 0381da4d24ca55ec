//! # Residual Block Wrapper
//!
//! [`ResidualBlockMeta`] is the capability API shared by both block
//! variants and their configs: channel bookkeeping, stride, and
//! resolution arithmetic.
//!
//! [`ResidualBlock`] wraps the two concrete variants behind one
//! `Module` type, dispatching statically on the variant.

use crate::models::resnet::basic_block::{
    BASIC_BLOCK_EXPANSION, BasicBlock, BasicBlockConfig,
};
use crate::models::resnet::block_spec::BlockSpec;
use crate::models::resnet::bottleneck::{
    BOTTLENECK_BLOCK_EXPANSION, BottleneckBlock, BottleneckBlockConfig,
};
use crate::models::resnet::util::stride_div_output_resolution;
use burn::config::Config;
use burn::prelude::{Backend, Module, Tensor};

/// [`ResidualBlock`] Meta API.
///
/// Implemented by both block variants and their configs.
pub trait ResidualBlockMeta {
    /// The number of input feature planes.
    fn in_planes(&self) -> usize;

    /// The base output width.
    fn planes(&self) -> usize;

    /// Multiplier from base width to actual output channels.
    fn expansion_factor(&self) -> usize;

    /// The number of output feature planes.
    ///
    /// ``out_planes = planes * expansion_factor``
    fn out_planes(&self) -> usize {
        self.planes() * self.expansion_factor()
    }

    /// The stride of the block's spatial convolution.
    ///
    /// Affects shortcut behavior.
    fn stride(&self) -> usize;

    /// Get the output resolution for a given input resolution.
    ///
    /// The input must be a multiple of the stride.
    ///
    /// # Arguments
    ///
    /// - `input_resolution`: ``[in_height=out_height*stride, in_width=out_width*stride]``.
    ///
    /// # Returns
    ///
    /// ``[out_height, out_width]``
    ///
    /// # Panics
    ///
    /// If the input resolution is not a multiple of the stride.
    fn output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> [usize; 2] {
        stride_div_output_resolution(input_resolution, self.stride())
    }
}

/// Residual block variant selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockVariant {
    /// Two 3x3 convolutions; expansion 1.
    Basic,

    /// 1x1 reduce, 3x3 spatial, 1x1 expand; expansion 4.
    Bottleneck,
}

impl BlockVariant {
    /// Multiplier from base width to actual block output channels.
    pub const fn expansion(&self) -> usize {
        match self {
            BlockVariant::Basic => BASIC_BLOCK_EXPANSION,
            BlockVariant::Bottleneck => BOTTLENECK_BLOCK_EXPANSION,
        }
    }
}

/// [`ResidualBlock`] Config.
#[derive(Config, Debug)]
pub enum ResidualBlockConfig {
    /// A `ResNet` [`BasicBlock`].
    Basic(BasicBlockConfig),

    /// A `ResNet` [`BottleneckBlock`].
    Bottleneck(BottleneckBlockConfig),
}

impl From<BasicBlockConfig> for ResidualBlockConfig {
    fn from(config: BasicBlockConfig) -> Self {
        Self::Basic(config)
    }
}

impl From<BottleneckBlockConfig> for ResidualBlockConfig {
    fn from(config: BottleneckBlockConfig) -> Self {
        Self::Bottleneck(config)
    }
}

impl ResidualBlockMeta for ResidualBlockConfig {
    fn in_planes(&self) -> usize {
        match self {
            Self::Basic(config) => config.in_planes(),
            Self::Bottleneck(config) => config.in_planes(),
        }
    }

    fn planes(&self) -> usize {
        match self {
            Self::Basic(config) => config.planes(),
            Self::Bottleneck(config) => config.planes(),
        }
    }

    fn expansion_factor(&self) -> usize {
        match self {
            Self::Basic(config) => config.expansion_factor(),
            Self::Bottleneck(config) => config.expansion_factor(),
        }
    }

    fn stride(&self) -> usize {
        match self {
            Self::Basic(config) => config.stride(),
            Self::Bottleneck(config) => config.stride(),
        }
    }
}

impl ResidualBlockConfig {
    /// Build a block config of the given variant.
    pub fn build(
        variant: BlockVariant,
        in_planes: usize,
        planes: usize,
        spec: BlockSpec,
    ) -> Self {
        match variant {
            BlockVariant::Basic => BasicBlockConfig::new(in_planes, planes)
                .with_spec(spec)
                .into(),
            BlockVariant::Bottleneck => BottleneckBlockConfig::new(in_planes, planes)
                .with_spec(spec)
                .into(),
        }
    }

    /// Initialize a [`ResidualBlock`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> ResidualBlock<B> {
        match self {
            Self::Basic(config) => ResidualBlock::Basic(config.clone().init(device)),
            Self::Bottleneck(config) => ResidualBlock::Bottleneck(config.clone().init(device)),
        }
    }
}

/// A `ResNet` [`BasicBlock`] or [`BottleneckBlock`] wrapper.
#[derive(Module, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum ResidualBlock<B: Backend> {
    /// A `ResNet` [`BasicBlock`].
    Basic(BasicBlock<B>),

    /// A `ResNet` [`BottleneckBlock`].
    Bottleneck(BottleneckBlock<B>),
}

impl<B: Backend> From<BasicBlock<B>> for ResidualBlock<B> {
    fn from(block: BasicBlock<B>) -> Self {
        Self::Basic(block)
    }
}

impl<B: Backend> From<BottleneckBlock<B>> for ResidualBlock<B> {
    fn from(block: BottleneckBlock<B>) -> Self {
        Self::Bottleneck(block)
    }
}

impl<B: Backend> ResidualBlockMeta for ResidualBlock<B> {
    fn in_planes(&self) -> usize {
        match self {
            Self::Basic(block) => block.in_planes(),
            Self::Bottleneck(block) => block.in_planes(),
        }
    }

    fn planes(&self) -> usize {
        match self {
            Self::Basic(block) => block.planes(),
            Self::Bottleneck(block) => block.planes(),
        }
    }

    fn expansion_factor(&self) -> usize {
        match self {
            Self::Basic(block) => block.expansion_factor(),
            Self::Bottleneck(block) => block.expansion_factor(),
        }
    }

    fn stride(&self) -> usize {
        match self {
            Self::Basic(block) => block.stride(),
            Self::Bottleneck(block) => block.stride(),
        }
    }
}

impl<B: Backend> ResidualBlock<B> {
    /// Apply the wrapped block to the input.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_planes, in_height=out_height*stride, in_width=out_width*stride]``.
    ///
    /// # Returns
    ///
    /// A ``[batch, out_planes=planes*expansion, out_height, out_width]`` tensor.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        match self {
            Self::Basic(block) => block.forward(input),
            Self::Bottleneck(block) => block.forward(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bimm_contracts::assert_shape_contract;
    use burn::backend::NdArray;

    #[test]
    fn test_block_variant_expansion() {
        assert_eq!(BlockVariant::Basic.expansion(), 1);
        assert_eq!(BlockVariant::Bottleneck.expansion(), 4);
    }

    #[test]
    fn test_residual_block_config() {
        let in_planes = 16;
        let planes = 32;

        {
            let cfg = ResidualBlockConfig::build(
                BlockVariant::Basic,
                in_planes,
                planes,
                BlockSpec::new().with_stride(2),
            );
            assert!(matches!(cfg, ResidualBlockConfig::Basic(_)));
            assert_eq!(cfg.in_planes(), in_planes);
            assert_eq!(cfg.out_planes(), planes);
            assert_eq!(cfg.stride(), 2);
            assert_eq!(cfg.output_resolution([20, 20]), [10, 10]);
        }

        {
            let cfg = ResidualBlockConfig::build(
                BlockVariant::Bottleneck,
                in_planes,
                planes,
                BlockSpec::new().with_stride(2),
            );
            assert!(matches!(cfg, ResidualBlockConfig::Bottleneck(_)));
            assert_eq!(cfg.in_planes(), in_planes);
            assert_eq!(cfg.out_planes(), 4 * planes);
            assert_eq!(cfg.stride(), 2);
        }
    }

    #[test]
    fn test_residual_block_basic_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        let batch_size = 2;
        let in_planes = 16;
        let planes = 32;
        let in_height = 8;
        let in_width = 8;

        let cfg = ResidualBlockConfig::build(
            BlockVariant::Basic,
            in_planes,
            planes,
            BlockSpec::new().with_stride(2),
        );

        let block: ResidualBlock<B> = cfg.init(&device);
        assert!(matches!(block, ResidualBlock::Basic(_)));
        assert_eq!(block.in_planes(), in_planes);
        assert_eq!(block.out_planes(), planes);
        assert_eq!(block.stride(), 2);

        let input = Tensor::ones([batch_size, in_planes, in_height, in_width], &device);
        let output = block.forward(input);

        assert_shape_contract!(
            ["batch", "out_planes", "out_height", "out_width"],
            &output,
            &[
                ("batch", batch_size),
                ("out_planes", planes),
                ("out_height", in_height / 2),
                ("out_width", in_width / 2)
            ],
        );
    }

    #[test]
    fn test_residual_block_bottleneck_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        let batch_size = 2;
        let in_planes = 16;
        let planes = 8;
        let in_height = 8;
        let in_width = 8;

        let cfg = ResidualBlockConfig::build(
            BlockVariant::Bottleneck,
            in_planes,
            planes,
            BlockSpec::new().with_stride(2),
        );

        let block: ResidualBlock<B> = cfg.init(&device);
        assert!(matches!(block, ResidualBlock::Bottleneck(_)));
        assert_eq!(block.out_planes(), 4 * planes);

        let input = Tensor::ones([batch_size, in_planes, in_height, in_width], &device);
        let output = block.forward(input);

        assert_shape_contract!(
            ["batch", "out_planes", "out_height", "out_width"],
            &output,
            &[
                ("batch", batch_size),
                ("out_planes", 4 * planes),
                ("out_height", in_height / 2),
                ("out_width", in_width / 2)
            ],
        );
    }
}
