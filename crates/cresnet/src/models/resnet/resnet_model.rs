//! # `ResNet` Core Model
//!
//! [`ResNetConfig::build`] assembles a CIFAR-style residual network
//! from a block variant, per-stage depths, and per-stage lists of
//! [`BlockSpec`] records.
//!
//! [`ResNetConfig`] implements [`Config`], and provides
//! [`ResNetConfig::init`] to initialize a [`ResNet`].
//!
//! [`ResNet`] implements [`Module`], and provides [`ResNet::forward`].
//!
//! ## Input resolution
//!
//! The head pools over a fixed square window, so the stem and stages
//! must reduce the input to exactly that size: input height and width
//! must equal ``pool_size * stride()``. With the standard per-stage
//! strides ``[1, 2, 2, 2]`` and the default 4x4 pool window, that is
//! a 32x32 input. See [`ResNet::expected_input_resolution`].

use crate::compat::activation_wrapper::ActivationConfig;
use crate::compat::normalization_wrapper::NormalizationConfig;
use crate::layers::blocks::conv_norm_act::{
    ConvNormAct2d, ConvNormAct2dConfig, ConvNormAct2dMeta,
};
use crate::models::resnet::block_spec::BlockSpec;
use crate::models::resnet::layer_block::{LayerBlock, LayerBlockConfig, LayerBlockMeta};
use crate::models::resnet::residual_block::BlockVariant;
use crate::models::resnet::util::scalar_to_array;
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::module::Module;
use burn::nn::conv::Conv2dConfig;
use burn::nn::pool::{AvgPool2d, AvgPool2dConfig};
use burn::nn::{BatchNormConfig, Linear, LinearConfig, PaddingConfig2d};
use burn::prelude::{Backend, Config, Tensor};

/// The number of image input channels.
pub const IMAGE_CHANNELS: usize = 3;

/// Per-stage base channel widths.
pub const STAGE_PLANES: [usize; 4] = [64, 128, 256, 512];

/// `ResNet` structure configuration.
#[derive(Config, Debug)]
pub struct ResNetConfig {
    /// The stem conv/norm/act configuration.
    pub stem: ConvNormAct2dConfig,

    /// The residual stage configurations.
    pub stages: Vec<LayerBlockConfig>,

    /// The number of classification classes.
    #[config(default = 10)]
    pub num_classes: usize,

    /// Square pooling window of the head.
    ///
    /// The stages must reduce the input to exactly this spatial size.
    #[config(default = 4)]
    pub pool_size: usize,
}

impl ResNetConfig {
    /// Assemble a network configuration.
    ///
    /// The stem is a stride-1 3x3 convolution to [`STAGE_PLANES`]`[0]`
    /// channels; the four stages run at the [`STAGE_PLANES`] base
    /// widths, with the running input width threaded across stage
    /// boundaries.
    ///
    /// # Arguments
    ///
    /// - `variant`: the block variant for every block in the network.
    /// - `depths`: per-stage block counts.
    /// - `stage_specs`: one [`BlockSpec`] list per stage; each list's
    ///   length must equal the stage's depth.
    /// - `num_classes`: the number of classification classes.
    ///
    /// # Errors
    ///
    /// If any stage's spec-list length differs from its depth.
    pub fn build(
        variant: BlockVariant,
        depths: [usize; 4],
        stage_specs: [Vec<BlockSpec>; 4],
        num_classes: usize,
    ) -> Result<Self, String> {
        let stem = ConvNormAct2dConfig::new(
            Conv2dConfig::new([IMAGE_CHANNELS, STAGE_PLANES[0]], scalar_to_array(3))
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_bias(false),
            NormalizationConfig::Batch(BatchNormConfig::new(0)),
        )
        .with_act(ActivationConfig::Relu);

        let mut in_planes = STAGE_PLANES[0];
        let mut stages = Vec::with_capacity(depths.len());
        for (idx, (depth, specs)) in depths.into_iter().zip(stage_specs).enumerate() {
            let stage =
                LayerBlockConfig::build(variant, in_planes, STAGE_PLANES[idx], depth, specs)
                    .map_err(|err| format!("stage[{}]: {}", idx, err))?;
            in_planes = stage.out_planes();
            stages.push(stage);
        }

        Ok(Self::new(stem, stages).with_num_classes(num_classes))
    }

    /// Check if the config is valid.
    ///
    /// # Returns
    ///
    /// A `Result<(), String>`
    pub fn try_validate(&self) -> Result<(), String> {
        if self.stages.is_empty() {
            return Err("stages is empty".to_string());
        }

        let mut in_planes = self.stem.out_channels();
        for (idx, stage) in self.stages.iter().enumerate() {
            stage
                .try_validate()
                .map_err(|err| format!("stage[{}]: {}", idx, err))?;
            if stage.in_planes() != in_planes {
                return Err(format!(
                    "stage[{}].in_planes({}) != {}",
                    idx,
                    stage.in_planes(),
                    in_planes,
                ));
            }
            in_planes = stage.out_planes();
        }
        Ok(())
    }

    /// Panic if `try_validate` returns an error.
    pub fn expect_valid(&self) {
        match self.try_validate() {
            Ok(_) => (),
            Err(err) => panic!("{}", err),
        }
    }

    /// Combined stride of the stages.
    pub fn stride(&self) -> usize {
        self.stages.iter().map(|stage| stage.stride()).product()
    }

    /// The square input resolution the head pooling assumes.
    ///
    /// The stem is stride 1, so input height and width must equal
    /// ``pool_size * stride()``.
    pub fn expected_input_resolution(&self) -> [usize; 2] {
        scalar_to_array(self.pool_size * self.stride())
    }

    /// Initialize a [`ResNet`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> ResNet<B> {
        self.expect_valid();

        let head_planes = self.stages.last().unwrap().out_planes();

        ResNet {
            stem: self.stem.init(device),

            stages: self
                .stages
                .into_iter()
                .map(|stage| stage.init(device))
                .collect(),

            pool: AvgPool2dConfig::new(scalar_to_array(self.pool_size))
                .with_strides(scalar_to_array(self.pool_size))
                .init(),
            fc: LinearConfig::new(head_planes, self.num_classes).init(device),
        }
    }
}

/// `ResNet` classifier model.
#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    /// Stem conv/norm/act.
    pub stem: ConvNormAct2d<B>,

    /// The residual stages.
    pub stages: Vec<LayerBlock<B>>,

    /// Head pooling.
    pub pool: AvgPool2d,

    /// Head classifier.
    pub fc: Linear<B>,
}

impl<B: Backend> ResNet<B> {
    /// Combined stride of the stages.
    pub fn stride(&self) -> usize {
        self.stages.iter().map(|stage| stage.stride()).product()
    }

    /// Square pooling window of the head.
    pub fn pool_size(&self) -> usize {
        self.pool.kernel_size[0]
    }

    /// The channel width entering the head.
    pub fn head_planes(&self) -> usize {
        let [head_planes, _num_classes] = self.fc.weight.dims();
        head_planes
    }

    /// The number of classification classes.
    pub fn num_classes(&self) -> usize {
        let [_head_planes, num_classes] = self.fc.weight.dims();
        num_classes
    }

    /// The square input resolution the head pooling assumes.
    ///
    /// The stem is stride 1, so input height and width must equal
    /// ``pool_size * stride()``.
    pub fn expected_input_resolution(&self) -> [usize; 2] {
        scalar_to_array(self.pool_size() * self.stride())
    }

    /// `ResNet` forward pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, 3, in_height, in_width]``; the spatial
    ///   size must equal [`ResNet::expected_input_resolution`].
    ///
    /// # Returns
    ///
    /// A ``[batch, num_classes]`` tensor of per-class logits;
    /// no probability normalization is applied.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        // Prep block
        let x = self.stem.forward(input);

        // Residual stages
        let x = self.stages.iter().fold(x, |x, stage| stage.forward(x));

        // The head pools over a fixed window; the stages must have
        // reduced the input to exactly that size.
        let [batch] = unpack_shape_contract!(
            ["batch", "head_planes", "pool_size", "pool_size"],
            &x,
            &["batch"],
            &[
                ("head_planes", self.head_planes()),
                ("pool_size", self.pool_size())
            ],
        );

        // Head
        let x = self.pool.forward(x);
        // Reshape [B, C, 1, 1] -> [B, C]
        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = self.fc.forward(x);

        assert_shape_contract_periodically!(
            ["batch", "num_classes"],
            &x,
            &[("batch", batch), ("num_classes", self.num_classes())],
        );

        x
    }
}
