//! # Basic Block
//!
//! [`BasicBlock`] is the two-conv `ResNet` residual unit.
//!
//! [`BasicBlockConfig`] implements [`Config`], and provides
//! [`BasicBlockConfig::init`] to initialize a [`BasicBlock`].
//!
//! [`BasicBlock`] implements [`Module`], and provides
//! [`BasicBlock::forward`].
//!
//! Both implement the shared [`ResidualBlockMeta`] API.

use crate::layers::blocks::conv_norm_act::{
    ConvNormAct2d, ConvNormAct2dConfig, ConvNormAct2dMeta,
};
use crate::models::resnet::block_spec::BlockSpec;
use crate::models::resnet::downsample::{Downsample, DownsampleConfig};
use crate::models::resnet::residual_block::ResidualBlockMeta;
use crate::models::resnet::util::scalar_to_array;
use burn::nn::PaddingConfig2d;
use burn::nn::conv::Conv2dConfig;
use burn::prelude::{Backend, Config, Module, Tensor};

/// Channel expansion factor for [`BasicBlock`].
pub const BASIC_BLOCK_EXPANSION: usize = 1;

/// [`BasicBlock`] Config.
///
/// Implements [`ResidualBlockMeta`].
#[derive(Config, Debug)]
pub struct BasicBlockConfig {
    /// The size of the in channels dimension.
    pub in_planes: usize,

    /// Base output width; ``out_planes = planes * expansion``.
    pub planes: usize,

    /// Per-block settings, consumed at construction time.
    #[config(default = "BlockSpec::new()")]
    pub spec: BlockSpec,
}

impl ResidualBlockMeta for BasicBlockConfig {
    fn in_planes(&self) -> usize {
        self.in_planes
    }

    fn planes(&self) -> usize {
        self.planes
    }

    fn expansion_factor(&self) -> usize {
        BASIC_BLOCK_EXPANSION
    }

    fn stride(&self) -> usize {
        self.spec.stride
    }
}

impl BasicBlockConfig {
    /// Initialize a [`BasicBlock`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> BasicBlock<B> {
        let in_planes = self.in_planes;
        let planes = self.planes;
        let out_planes = self.out_planes();
        let stride = self.spec.stride;

        let downsample = if stride != 1 || in_planes != out_planes {
            Some(
                DownsampleConfig::new(in_planes, out_planes)
                    .with_stride(stride)
                    .with_norm(self.spec.normalization.clone()),
            )
        } else {
            None
        };

        let cna1 = ConvNormAct2dConfig::new(
            self.spec.conv.build([in_planes, planes], stride),
            self.spec.normalization.clone(),
        )
        .with_act(self.spec.activation.clone());

        let cna2 = ConvNormAct2dConfig::new(
            Conv2dConfig::new([planes, out_planes], scalar_to_array(3))
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_bias(false),
            self.spec.normalization.clone(),
        )
        .with_act(self.spec.activation.clone());

        BasicBlock {
            downsample: downsample.as_ref().map(|cfg| cfg.init(device)),

            cna1: cna1.init(device),
            cna2: cna2.init(device),
        }
    }
}

/// Basic Block for `ResNet`.
///
/// Implements [`ResidualBlockMeta`].
#[derive(Module, Debug)]
pub struct BasicBlock<B: Backend> {
    /// Optional shortcut projection; `None` means identity skip.
    pub downsample: Option<Downsample<B>>,

    /// First Conv/Norm/Act transform.
    pub cna1: ConvNormAct2d<B>,

    /// Second Conv/Norm transform; the skip join and trailing
    /// activation run in its hook.
    pub cna2: ConvNormAct2d<B>,
}

impl<B: Backend> ResidualBlockMeta for BasicBlock<B> {
    fn in_planes(&self) -> usize {
        self.cna1.in_channels()
    }

    fn planes(&self) -> usize {
        self.cna1.out_channels()
    }

    fn expansion_factor(&self) -> usize {
        BASIC_BLOCK_EXPANSION
    }

    fn stride(&self) -> usize {
        self.cna1.stride()[0]
    }
}

impl<B: Backend> BasicBlock<B> {
    /// Forward Pass.
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
        #[cfg(debug_assertions)]
        let [batch, out_height, out_width] = bimm_contracts::unpack_shape_contract!(
            [
                "batch",
                "in_planes",
                "in_height" = "out_height" * "stride",
                "in_width" = "out_width" * "stride"
            ],
            &input,
            &["batch", "out_height", "out_width"],
            &[("in_planes", self.in_planes()), ("stride", self.stride())],
        );

        let identity = match &self.downsample {
            Some(downsample) => downsample.forward(input.clone()),
            None => input.clone(),
        };

        let x = self.cna1.forward(input);

        let x = self.cna2.hook_forward(x, |x| x + identity);

        #[cfg(debug_assertions)]
        bimm_contracts::assert_shape_contract_periodically!(
            ["batch", "out_planes", "out_height", "out_width"],
            &x,
            &[
                ("batch", batch),
                ("out_planes", self.out_planes()),
                ("out_height", out_height),
                ("out_width", out_width)
            ]
        );

        x
    }
}
