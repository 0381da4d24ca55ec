//! # Per-Block Configuration Records
//!
//! A [`BlockSpec`] selects the convolution constructor, stride, and
//! auxiliary layer choices for one residual block. It is immutable
//! once built, and read exactly once, when the owning block is
//! constructed.
//!
//! [`ConvSpec`] is the convolution constructor selection: each variant
//! knows how to produce the [`Conv2dConfig`] for a block's spatial
//! convolution from a channel pair and a stride.

use crate::compat::activation_wrapper::ActivationConfig;
use crate::compat::normalization_wrapper::NormalizationConfig;
use crate::models::resnet::util::scalar_to_array;
use burn::nn::conv::Conv2dConfig;
use burn::nn::{BatchNormConfig, PaddingConfig2d};
use burn::prelude::Config;

/// Grouped 3x3 convolution settings.
#[derive(Config, Debug)]
pub struct GroupedConvSpec {
    /// Channel groups of the conv filters.
    ///
    /// Must divide both the in and out channel counts.
    pub groups: usize,
}

/// Dilated 3x3 convolution settings.
#[derive(Config, Debug)]
pub struct DilatedConvSpec {
    /// Dilation rate; padding is matched to keep resolution.
    pub dilation: usize,
}

/// Convolution constructor selection for a block's spatial conv.
#[derive(Config, Debug)]
#[non_exhaustive]
pub enum ConvSpec {
    /// Plain 3x3 convolution, padding 1.
    Standard,

    /// Grouped 3x3 convolution.
    Grouped(GroupedConvSpec),

    /// Dilated 3x3 convolution.
    Dilated(DilatedConvSpec),
}

impl Default for ConvSpec {
    fn default() -> Self {
        Self::Standard
    }
}

impl From<GroupedConvSpec> for ConvSpec {
    fn from(spec: GroupedConvSpec) -> Self {
        Self::Grouped(spec)
    }
}

impl From<DilatedConvSpec> for ConvSpec {
    fn from(spec: DilatedConvSpec) -> Self {
        Self::Dilated(spec)
    }
}

impl ConvSpec {
    /// Build the [`Conv2dConfig`] for a ``channels[0] -> channels[1]``
    /// spatial convolution with the given stride.
    ///
    /// Bias is always disabled; the normalization layer that follows
    /// the convolution owns the affine shift.
    pub fn build(
        &self,
        channels: [usize; 2],
        stride: usize,
    ) -> Conv2dConfig {
        let conv = Conv2dConfig::new(channels, scalar_to_array(3))
            .with_stride(scalar_to_array(stride))
            .with_bias(false);

        match self {
            ConvSpec::Standard => conv.with_padding(PaddingConfig2d::Explicit(1, 1)),
            ConvSpec::Grouped(spec) => conv
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_groups(spec.groups),
            ConvSpec::Dilated(spec) => conv
                .with_dilation(scalar_to_array(spec.dilation))
                .with_padding(PaddingConfig2d::Explicit(spec.dilation, spec.dilation)),
        }
    }
}

/// Per-block configuration record.
///
/// Consumed at block-construction time; the owning block reads it once
/// and never keeps it.
#[derive(Config, Debug)]
pub struct BlockSpec {
    /// Convolution constructor for the block's spatial conv.
    #[config(default = "ConvSpec::Standard")]
    pub conv: ConvSpec,

    /// Stride of the block's spatial conv.
    ///
    /// Affects shortcut behavior.
    #[config(default = 1)]
    pub stride: usize,

    /// [`NormalizationConfig`] applied after every convolution.
    ///
    /// The feature size of this config will be replaced
    /// with the appropriate feature size for each layer.
    #[config(default = "NormalizationConfig::Batch(BatchNormConfig::new(0))")]
    pub normalization: NormalizationConfig,

    /// [`ActivationConfig`] for the block nonlinearities.
    #[config(default = "ActivationConfig::Relu")]
    pub activation: ActivationConfig,
}
